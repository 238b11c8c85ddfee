//! Node API reply shapes.
//!
//! Requests are built with `serde_json::json!` at the call site; only replies
//! get types, because that is where the node's quirks live.

use std::collections::BTreeMap;

use relay_ledger::PendingTransaction;
use relay_types::{Account, BlockHash, Raw};
use serde::Deserialize;

use crate::client::HistoryEntry;

/// The error string the node uses for an account with no blocks.
pub const ACCOUNT_NOT_FOUND: &str = "Account not found";

// ── account_info ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AccountInfoReply {
    pub frontier: BlockHash,
    pub balance: Raw,
    #[serde(default)]
    pub representative: Option<Account>,
}

// ── receivable ───────────────────────────────────────────────────────────

/// `blocks` is a hash-keyed object, or an empty string when there is nothing.
#[derive(Debug, Deserialize)]
pub struct ReceivableReply {
    #[serde(default)]
    pub blocks: ReceivableBlocks,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ReceivableBlocks {
    Found(BTreeMap<BlockHash, ReceivableDetail>),
    Nothing(String),
}

impl Default for ReceivableBlocks {
    fn default() -> Self {
        Self::Nothing(String::new())
    }
}

/// With `source: true` each entry is an object; without it, a bare amount.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ReceivableDetail {
    WithSource {
        amount: Raw,
        #[serde(default)]
        source: Option<Account>,
    },
    Amount(Raw),
}

impl ReceivableReply {
    pub fn into_pending(self) -> Vec<PendingTransaction> {
        match self.blocks {
            ReceivableBlocks::Nothing(_) => Vec::new(),
            ReceivableBlocks::Found(blocks) => blocks
                .into_iter()
                .map(|(hash, detail)| match detail {
                    ReceivableDetail::WithSource { amount, source } => PendingTransaction {
                        hash,
                        amount,
                        source,
                    },
                    ReceivableDetail::Amount(amount) => PendingTransaction {
                        hash,
                        amount,
                        source: None,
                    },
                })
                .collect(),
        }
    }
}

// ── process ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProcessReply {
    pub hash: BlockHash,
}

// ── account_history ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryReply {
    #[serde(default)]
    pub history: HistoryList,
}

/// Like `blocks` above, an empty history comes back as `""`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HistoryList {
    Entries(Vec<HistoryEntry>),
    Nothing(String),
}

impl Default for HistoryList {
    fn default() -> Self {
        Self::Nothing(String::new())
    }
}

impl HistoryReply {
    pub fn into_entries(self) -> Vec<HistoryEntry> {
        match self.history {
            HistoryList::Entries(entries) => entries,
            HistoryList::Nothing(_) => Vec::new(),
        }
    }
}
