//! Block hash type for the block lattice.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{decode_hex_fixed, ParseError};

/// A 32-byte block hash identifying a block in an account's chain.
///
/// The all-zero hash is the frontier of an account that has never been opened.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockHash([u8; 32]);

impl Default for BlockHash {
    fn default() -> Self {
        Self::ZERO
    }
}

impl BlockHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash(")?;
        for b in &self.0[..4] {
            write!(f, "{:02X}", b)?;
        }
        write!(f, "\u{2026})")
    }
}

/// Uppercase hex, the form the node prints.
impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl FromStr for BlockHash {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_hex_fixed::<32>(s).map(Self)
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parse_roundtrip() {
        let hash = BlockHash::new([0xAB; 32]);
        let text = hash.to_string();
        assert_eq!(text.len(), 64);
        assert!(text.starts_with("ABAB"));
        assert_eq!(text.parse::<BlockHash>().unwrap(), hash);
        assert_eq!(text.to_lowercase().parse::<BlockHash>().unwrap(), hash);
    }

    #[test]
    fn wrong_length_rejected() {
        assert_eq!(
            "ABCD".parse::<BlockHash>(),
            Err(ParseError::HexLength {
                expected: 64,
                actual: 4
            })
        );
    }

    #[test]
    fn zero_is_default() {
        assert!(BlockHash::default().is_zero());
        assert!(!BlockHash::new([1; 32]).is_zero());
    }
}
