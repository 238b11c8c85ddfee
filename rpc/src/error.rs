//! Ledger client error types.

use relay_types::Account;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("node unreachable: {0}")]
    Transport(String),

    #[error("no receivable transaction for {account}")]
    NoReceivable { account: Account },

    #[error("block rejected by node: {0}")]
    SubmissionRejected(String),

    #[error("no send from {from} to {to} in the last {limit} blocks")]
    NoMatchingTransaction {
        from: Account,
        to: Account,
        limit: usize,
    },

    #[error("node error: {0}")]
    Node(String),

    #[error("malformed node response: {0}")]
    MalformedResponse(String),
}

impl LedgerError {
    /// Whether waiting and asking again can change the outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NoReceivable { .. })
    }
}
