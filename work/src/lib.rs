//! Anti-spam proof-of-work.
//!
//! Every block carries a work nonce tied to its *root*: the previous block
//! hash, or the account's public key for the first block of a chain. The
//! relay obtains work through a [`WorkProvider`]: either the external work
//! service or the local multi-threaded generator.

pub mod error;
pub mod generator;
pub mod provider;
pub mod thresholds;
pub mod validator;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub use error::WorkError;
pub use generator::WorkGenerator;
pub use provider::{HttpWorkProvider, LocalWorkProvider, WorkProvider};
pub use thresholds::{WorkBlockKind, WorkThresholds};
pub use validator::{validate_work, work_value};

/// The result of PoW generation.
///
/// Printed as 16 lowercase hex digits, the form the node expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkNonce(pub u64);

impl fmt::Display for WorkNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for WorkNonce {
    type Err = WorkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() > 16 {
            return Err(WorkError::MalformedWork(s.to_string()));
        }
        u64::from_str_radix(s, 16)
            .map(WorkNonce)
            .map_err(|_| WorkError::MalformedWork(s.to_string()))
    }
}

impl Serialize for WorkNonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WorkNonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
