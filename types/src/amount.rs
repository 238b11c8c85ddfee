//! Raw ledger amounts.
//!
//! Amounts are represented as integers (u128) in the ledger's smallest unit to
//! avoid floating-point errors. The ledger's balance field is 128 bits wide, so
//! every representable balance fits, and every operation here is checked.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// An amount in raw units.
///
/// Crosses every JSON boundary as a decimal string, never as a JSON number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Raw(u128);

impl Raw {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u128::MAX);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Big-endian encoding as it appears in the hashed block body.
    pub fn to_be_bytes(&self) -> [u8; 16] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for Raw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Raw {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // u128::from_str accepts a leading '+', which the node never sends.
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::Amount(s.to_string()));
        }
        s.parse::<u128>()
            .map(Self)
            .map_err(|_| ParseError::Amount(s.to_string()))
    }
}

impl From<u128> for Raw {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

impl Serialize for Raw {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Raw {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
