use thiserror::Error;

/// Errors from parsing key material and addresses.
///
/// Both variants are input errors: they are raised before any network I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid secret format: {0}")]
    InvalidSecretFormat(String),

    #[error("invalid account address: {0}")]
    InvalidAddress(String),
}

/// Errors from sealing and opening relayed messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    #[error("sealed message is too short ({0} bytes)")]
    Truncated(usize),

    #[error("encryption failed")]
    Encryption,

    #[error("decryption failed: authentication check failed")]
    Authentication,
}
