//! Nullable ledger node: account chains held in memory.
//!
//! Submitted blocks are checked the way a node checks them (hash, signature,
//! chaining, balance arithmetic, receivability) and then applied, so a relay
//! run against it exercises the same invariants a real node enforces. Work is
//! not checked.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use relay_crypto::{blake2b_256_multi, decode_address, derive_address};
use relay_ledger::{
    default_representative, AccountState, BlockSubtype, PendingTransaction, SignedBlock,
};
use relay_rpc::{HistoryEntry, HistoryKind, LedgerClient, LedgerError};
use relay_types::{Account, BlockHash, PublicKey, Raw};

use crate::clock::NullClock;
use crate::lock;

struct Chain {
    frontier: BlockHash,
    balance: Raw,
    representative: Account,
    /// Oldest first.
    history: Vec<HistoryEntry>,
}

struct Pending {
    tx: PendingTransaction,
    /// Receivable queries that still won't see this entry.
    hidden_for: u32,
}

#[derive(Default)]
struct Inner {
    chains: HashMap<PublicKey, Chain>,
    pending: HashMap<PublicKey, Vec<Pending>>,
    withheld: HashSet<PublicKey>,
    lag: u32,
    reject_next: Option<String>,
    submitted: Vec<SignedBlock>,
    receivable_calls: usize,
}

/// An in-memory ledger node.
pub struct NullLedger {
    inner: Mutex<Inner>,
    clock: NullClock,
}

impl NullLedger {
    pub fn new() -> Self {
        Self::with_clock(NullClock::default())
    }

    /// A ledger that stamps history entries with `clock`.
    pub fn with_clock(clock: NullClock) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            clock,
        }
    }

    /// Open `account` with `balance`, as if it had received funds earlier.
    /// Returns the synthetic frontier.
    pub fn fund(&self, account: &Account, balance: Raw) -> BlockHash {
        let key = key_of(account);
        let frontier = BlockHash::new(blake2b_256_multi(&[b"null-ledger-open", key.as_bytes()]));
        lock(&self.inner).chains.insert(
            key,
            Chain {
                frontier,
                balance,
                representative: default_representative(),
                history: Vec::new(),
            },
        );
        frontier
    }

    /// Put a receivable transaction in front of `to`.
    pub fn add_pending(
        &self,
        to: &Account,
        hash: BlockHash,
        amount: Raw,
        source: Option<Account>,
    ) {
        let mut inner = lock(&self.inner);
        let hidden_for = inner.lag;
        inner.pending.entry(key_of(to)).or_default().push(Pending {
            tx: PendingTransaction { hash, amount, source },
            hidden_for,
        });
    }

    /// New receivables stay invisible to the first `polls` receivable queries
    /// for their account, like a send that has not confirmed yet.
    pub fn set_receivable_lag(&self, polls: u32) {
        lock(&self.inner).lag = polls;
    }

    /// Never report receivables for `account`.
    pub fn withhold_receivables(&self, account: &Account) {
        lock(&self.inner).withheld.insert(key_of(account));
    }

    /// Undo [`Self::withhold_receivables`] and any lag for `account`: everything
    /// pending there becomes visible at once.
    pub fn release_receivables(&self, account: &Account) {
        let key = key_of(account);
        let mut inner = lock(&self.inner);
        inner.withheld.remove(&key);
        if let Some(entries) = inner.pending.get_mut(&key) {
            for entry in entries {
                entry.hidden_for = 0;
            }
        }
    }

    /// Reject the next submitted block with `reason`.
    pub fn reject_next_submission(&self, reason: impl Into<String>) {
        lock(&self.inner).reject_next = Some(reason.into());
    }

    /// Current state of `account` (the unopened sentinel when unknown).
    pub fn state(&self, account: &Account) -> AccountState {
        state_of(&lock(&self.inner), account)
    }

    /// Every accepted block, in submission order.
    pub fn submitted(&self) -> Vec<SignedBlock> {
        lock(&self.inner).submitted.clone()
    }

    /// Receivables for `account`, visible or not.
    pub fn pending_for(&self, account: &Account) -> Vec<PendingTransaction> {
        lock(&self.inner)
            .pending
            .get(&key_of(account))
            .map(|entries| entries.iter().map(|p| p.tx.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of receivable queries answered so far.
    pub fn receivable_calls(&self) -> usize {
        lock(&self.inner).receivable_calls
    }

    fn apply(&self, inner: &mut Inner, signed: &SignedBlock) -> Result<(), String> {
        let block = &signed.block;
        let computed = block
            .compute_hash()
            .map_err(|_| "Bad account number".to_string())?;
        if computed != signed.hash {
            return Err("Block hash mismatch".into());
        }
        if !block.verify_signature().unwrap_or(false) {
            return Err("Bad signature".into());
        }

        let key = key_of(&block.account);
        let current = state_of(inner, &block.account);
        if block.previous != current.frontier {
            return Err(if current.is_unopened() {
                "Gap previous block".into()
            } else {
                "Fork".into()
            });
        }

        let timestamp = self.clock.now();
        let entry = match signed.subtype {
            BlockSubtype::Send => {
                let amount = current
                    .balance
                    .checked_sub(block.balance)
                    .filter(|amount| !amount.is_zero())
                    .ok_or_else(|| "Balance mismatch".to_string())?;
                if amount != signed.amount {
                    return Err("Balance mismatch".into());
                }
                let destination = PublicKey(*block.link.as_bytes());
                let hidden_for = inner.lag;
                inner.pending.entry(destination).or_default().push(Pending {
                    tx: PendingTransaction {
                        hash: signed.hash,
                        amount,
                        source: Some(block.account.clone()),
                    },
                    hidden_for,
                });
                HistoryEntry {
                    kind: HistoryKind::Send,
                    account: derive_address(&destination),
                    amount,
                    local_timestamp: timestamp,
                    hash: signed.hash,
                }
            }
            BlockSubtype::Receive | BlockSubtype::Open => {
                if (signed.subtype == BlockSubtype::Open) != current.is_unopened() {
                    return Err("Block position".into());
                }
                let queue = inner.pending.entry(key).or_default();
                let index = queue
                    .iter()
                    .position(|p| p.tx.hash == block.link)
                    .ok_or_else(|| "Unreceivable".to_string())?;
                let amount = queue[index].tx.amount;
                if current.balance.checked_add(amount) != Some(block.balance) {
                    return Err("Balance mismatch".into());
                }
                let source = queue.remove(index).tx.source;
                HistoryEntry {
                    kind: HistoryKind::Receive,
                    account: source.unwrap_or_else(|| block.account.clone()),
                    amount,
                    local_timestamp: timestamp,
                    hash: signed.hash,
                }
            }
        };

        let chain = inner.chains.entry(key).or_insert_with(|| Chain {
            frontier: BlockHash::ZERO,
            balance: Raw::ZERO,
            representative: block.representative.clone(),
            history: Vec::new(),
        });
        chain.frontier = signed.hash;
        chain.balance = block.balance;
        chain.representative = block.representative.clone();
        chain.history.push(entry);
        Ok(())
    }
}

impl Default for NullLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Accounts are keyed by public key so `xrb_` and `nano_` spellings agree.
/// Undecodable text gets a key of its own that no real account can have.
fn key_of(account: &Account) -> PublicKey {
    decode_address(account.as_str())
        .unwrap_or_else(|| PublicKey(blake2b_256_multi(&[b"bad", account.as_str().as_bytes()])))
}

fn state_of(inner: &Inner, account: &Account) -> AccountState {
    match inner.chains.get(&key_of(account)) {
        Some(chain) => AccountState {
            account: account.clone(),
            frontier: chain.frontier,
            balance: chain.balance,
            representative: chain.representative.clone(),
        },
        None => AccountState::unopened(account.clone(), default_representative()),
    }
}

#[async_trait]
impl LedgerClient for NullLedger {
    async fn get_account_state(&self, account: &Account) -> Result<AccountState, LedgerError> {
        Ok(self.state(account))
    }

    async fn receivable(
        &self,
        account: &Account,
        min_amount: Raw,
        count: usize,
    ) -> Result<Vec<PendingTransaction>, LedgerError> {
        let key = key_of(account);
        let mut inner = lock(&self.inner);
        inner.receivable_calls += 1;
        if inner.withheld.contains(&key) {
            return Ok(Vec::new());
        }
        let Some(entries) = inner.pending.get_mut(&key) else {
            return Ok(Vec::new());
        };
        let mut visible = Vec::new();
        for entry in entries.iter_mut() {
            if entry.hidden_for > 0 {
                entry.hidden_for -= 1;
            } else if entry.tx.amount >= min_amount && visible.len() < count {
                visible.push(entry.tx.clone());
            }
        }
        tracing::trace!(account = %account, visible = visible.len(), "null receivable");
        Ok(visible)
    }

    async fn submit(&self, block: &SignedBlock) -> Result<BlockHash, LedgerError> {
        let mut inner = lock(&self.inner);
        if let Some(reason) = inner.reject_next.take() {
            return Err(LedgerError::SubmissionRejected(reason));
        }
        self.apply(&mut inner, block)
            .map_err(LedgerError::SubmissionRejected)?;
        inner.submitted.push(block.clone());
        Ok(block.hash)
    }

    async fn get_history(
        &self,
        account: &Account,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, LedgerError> {
        let inner = lock(&self.inner);
        Ok(inner
            .chains
            .get(&key_of(account))
            .map(|chain| chain.history.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
