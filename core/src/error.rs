use relay_crypto::{CipherError, KeyError};
use relay_ledger::BuildError;
use relay_rpc::LedgerError;
use relay_types::{Account, BlockHash};
use thiserror::Error;

use crate::stage::{RelayStage, RelayState};

/// Token and message sealing failures.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("encryption failed: {0}")]
    Encryption(CipherError),

    #[error("invalid address in token: {0}")]
    InvalidAddress(#[from] KeyError),
}

/// What stopped a relay.
#[derive(Debug, Error)]
pub enum RelayFailure {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("send {expected} never became receivable at {account} after {attempts} polls")]
    ReceivableNotFound {
        account: Account,
        expected: BlockHash,
        attempts: u32,
    },

    #[error("nothing to recover: {secondary} holds no funds and none are on their way back")]
    NothingToRecover { secondary: Account },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// A failed relay, with enough context to log it and to resume it.
#[derive(Debug, Error)]
#[error("relay aborted at {stage} on {account}: {source}")]
pub struct RelayError {
    /// The last stage the relay completed.
    pub stage: RelayStage,
    /// The account being operated on when it failed.
    pub account: Account,
    /// Blocks the ledger had already accepted, oldest first.
    pub submitted: Vec<BlockHash>,
    #[source]
    pub source: RelayFailure,
}

impl RelayError {
    pub fn state(&self) -> RelayState {
        RelayState::Aborted {
            at: self.stage,
            reason: self.source.to_string(),
        }
    }

    /// Whether funds may be sitting somewhere other than where they started.
    pub fn left_funds_in_flight(&self) -> bool {
        !self.submitted.is_empty()
    }
}

/// Failures of [`crate::reveal`].
#[derive(Debug, Error)]
pub enum RevealError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("provenance lookup failed: {0}")]
    Ledger(#[from] LedgerError),
}

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("invalid TOML: {0}")]
    Parse(String),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
