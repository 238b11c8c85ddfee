//! Parse errors for the textual forms of the value types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {expected} hex characters, got {actual}")]
    HexLength { expected: usize, actual: usize },

    #[error("invalid hex: {0}")]
    Hex(String),

    #[error("invalid raw amount {0:?}: expected a non-negative decimal integer")]
    Amount(String),
}

/// Decode a fixed-width hex string (either case) into a byte array.
pub(crate) fn decode_hex_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseError> {
    if s.len() != N * 2 {
        return Err(ParseError::HexLength {
            expected: N * 2,
            actual: s.len(),
        });
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(s, &mut out).map_err(|e| ParseError::Hex(e.to_string()))?;
    Ok(out)
}
