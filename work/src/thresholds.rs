//! Block-type-aware PoW difficulty thresholds.
//!
//! The ledger asks more work of sends than of receives:
//! - Send blocks: `fffffff800000000`
//! - Receive/Open blocks: `fffffe0000000000`
//!
//! Thresholds travel as 16-digit hex strings in both the config file and the
//! work service API.

use serde::{Deserialize, Serialize};

use crate::WorkError;

/// Block kind for PoW threshold selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkBlockKind {
    Send,
    /// Receive, including the first (open) block of a chain.
    Receive,
}

const SEND_THRESHOLD: u64 = 0xFFFF_FFF8_0000_0000;
const RECEIVE_THRESHOLD: u64 = 0xFFFF_FE00_0000_0000;

/// Per-block-type PoW thresholds. Higher values = harder work required.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkThresholds {
    #[serde(with = "hex_difficulty")]
    pub send: u64,
    #[serde(with = "hex_difficulty")]
    pub receive: u64,
}

impl WorkThresholds {
    pub fn new() -> Self {
        Self {
            send: SEND_THRESHOLD,
            receive: RECEIVE_THRESHOLD,
        }
    }

    /// The same threshold for every block kind (useful in tests or low-difficulty devnets).
    pub fn uniform(threshold: u64) -> Self {
        Self {
            send: threshold,
            receive: threshold,
        }
    }

    /// Get the required work difficulty for a specific block kind.
    pub fn threshold_for(&self, kind: WorkBlockKind) -> u64 {
        match kind {
            WorkBlockKind::Send => self.send,
            WorkBlockKind::Receive => self.receive,
        }
    }
}

impl Default for WorkThresholds {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a difficulty the way the node prints it.
pub fn format_difficulty(difficulty: u64) -> String {
    format!("{difficulty:016x}")
}

/// Parse a difficulty written as up to 16 hex digits.
pub fn parse_difficulty(s: &str) -> Result<u64, WorkError> {
    if s.is_empty() || s.len() > 16 {
        return Err(WorkError::InvalidDifficulty(s.to_string()));
    }
    u64::from_str_radix(s, 16).map_err(|_| WorkError::InvalidDifficulty(s.to_string()))
}

pub(crate) mod hex_difficulty {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_difficulty(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_difficulty(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_harder_than_receive() {
        let thresholds = WorkThresholds::new();
        let send = thresholds.threshold_for(WorkBlockKind::Send);
        let receive = thresholds.threshold_for(WorkBlockKind::Receive);
        assert!(send > receive, "send threshold ({send:x}) must exceed receive ({receive:x})");
    }

    #[test]
    fn uniform_applies_to_both() {
        let thresholds = WorkThresholds::uniform(1000);
        assert_eq!(thresholds.threshold_for(WorkBlockKind::Send), 1000);
        assert_eq!(thresholds.threshold_for(WorkBlockKind::Receive), 1000);
    }

    #[test]
    fn difficulty_text_roundtrip() {
        assert_eq!(format_difficulty(SEND_THRESHOLD), "fffffff800000000");
        assert_eq!(parse_difficulty("fffffe0000000000").unwrap(), RECEIVE_THRESHOLD);
        assert!(parse_difficulty("not-hex").is_err());
        assert!(parse_difficulty("").is_err());
    }

    #[test]
    fn serde_uses_hex_strings() {
        let json = serde_json::to_value(WorkThresholds::new()).unwrap();
        assert_eq!(json["send"], "fffffff800000000");
        assert_eq!(json["receive"], "fffffe0000000000");
        let back: WorkThresholds = serde_json::from_value(json).unwrap();
        assert_eq!(back, WorkThresholds::new());
    }
}
