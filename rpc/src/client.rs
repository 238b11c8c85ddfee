//! The ledger access seam.

use std::sync::Arc;

use async_trait::async_trait;
use relay_ledger::{AccountState, PendingTransaction, SignedBlock};
use relay_types::{Account, BlockHash, Raw, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Direction of a history entry, from the queried account's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Send,
    Receive,
    /// Anything else the node reports (representative changes and the like).
    #[serde(other)]
    Other,
}

/// One confirmed block in an account's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    /// The counterparty: destination of a send, source of a receive.
    pub account: Account,
    pub amount: Raw,
    pub local_timestamp: Timestamp,
    pub hash: BlockHash,
}

/// Read and extend account chains on a ledger node.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Current state of `account`; the unopened sentinel when the node has never
    /// seen it.
    async fn get_account_state(&self, account: &Account) -> Result<AccountState, LedgerError>;

    /// Up to `count` receivable transactions of at least `min_amount`.
    async fn receivable(
        &self,
        account: &Account,
        min_amount: Raw,
        count: usize,
    ) -> Result<Vec<PendingTransaction>, LedgerError>;

    /// Submit a signed block. Rejections are final.
    async fn submit(&self, block: &SignedBlock) -> Result<BlockHash, LedgerError>;

    /// Confirmed history of `account`, newest first.
    async fn get_history(
        &self,
        account: &Account,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, LedgerError>;

    /// The first receivable transaction, or [`LedgerError::NoReceivable`].
    async fn get_first_receivable(
        &self,
        account: &Account,
        min_amount: Raw,
    ) -> Result<PendingTransaction, LedgerError> {
        self.receivable(account, min_amount, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::NoReceivable {
                account: account.clone(),
            })
    }

    /// The newest send from `from` to `to` within the last `limit` blocks of
    /// `from`'s chain.
    async fn find_send(
        &self,
        from: &Account,
        to: &Account,
        limit: usize,
    ) -> Result<HistoryEntry, LedgerError> {
        self.get_history(from, limit)
            .await?
            .into_iter()
            .find(|entry| entry.kind == HistoryKind::Send && same_account(&entry.account, to))
            .ok_or_else(|| LedgerError::NoMatchingTransaction {
                from: from.clone(),
                to: to.clone(),
                limit,
            })
    }
}

#[async_trait]
impl<T: LedgerClient + ?Sized> LedgerClient for Arc<T> {
    async fn get_account_state(&self, account: &Account) -> Result<AccountState, LedgerError> {
        (**self).get_account_state(account).await
    }

    async fn receivable(
        &self,
        account: &Account,
        min_amount: Raw,
        count: usize,
    ) -> Result<Vec<PendingTransaction>, LedgerError> {
        (**self).receivable(account, min_amount, count).await
    }

    async fn submit(&self, block: &SignedBlock) -> Result<BlockHash, LedgerError> {
        (**self).submit(block).await
    }

    async fn get_history(
        &self,
        account: &Account,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, LedgerError> {
        (**self).get_history(account, limit).await
    }
}

/// Address equality that ignores the `nano_`/`xrb_` prefix choice.
fn same_account(a: &Account, b: &Account) -> bool {
    match (
        relay_crypto::decode_address(a.as_str()),
        relay_crypto::decode_address(b.as_str()),
    ) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}
