//! Immutable account state passed between relay stages.

use relay_crypto::derive_address;
use relay_types::{Account, BlockHash, PublicKey, Raw};
use serde::{Deserialize, Serialize};

/// Public key of the ledger's genesis account, the fallback representative.
const DEFAULT_REPRESENTATIVE_KEY: [u8; 32] = [
    0xE8, 0x92, 0x08, 0xDD, 0x03, 0x8F, 0xBB, 0x26, 0x99, 0x87, 0x68, 0x96, 0x21, 0xD5, 0x22, 0x92,
    0xAE, 0x9C, 0x35, 0x94, 0x1A, 0x74, 0x84, 0x75, 0x6E, 0xCC, 0xED, 0x92, 0xA6, 0x50, 0x93, 0xBA,
];

/// The representative used when an account has none (or has never been opened).
pub fn default_representative() -> Account {
    derive_address(&PublicKey(DEFAULT_REPRESENTATIVE_KEY))
}

/// A request-scoped snapshot of one account's chain position.
///
/// Never mutated: applying a block yields a new value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub account: Account,
    /// Hash of the newest block, or [`BlockHash::ZERO`] when unopened.
    pub frontier: BlockHash,
    pub balance: Raw,
    pub representative: Account,
}

impl AccountState {
    /// The sentinel state of an account with no blocks.
    pub fn unopened(account: Account, representative: Account) -> Self {
        Self {
            account,
            frontier: BlockHash::ZERO,
            balance: Raw::ZERO,
            representative,
        }
    }

    pub fn is_unopened(&self) -> bool {
        self.frontier.is_zero()
    }

    /// The root work is computed against: the frontier, or the account's
    /// public key for the first block of the chain.
    pub fn work_root(&self, public_key: &PublicKey) -> BlockHash {
        if self.is_unopened() {
            BlockHash::new(public_key.0)
        } else {
            self.frontier
        }
    }

    /// The state after a block with `hash` leaves the account at `balance`.
    pub fn advance(&self, hash: BlockHash, balance: Raw) -> Self {
        Self {
            account: self.account.clone(),
            frontier: hash,
            balance,
            representative: self.representative.clone(),
        }
    }
}

/// An incoming transfer visible to its destination before it is received.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    /// Hash of the send block that created it.
    pub hash: BlockHash,
    pub amount: Raw,
    /// Sending account, when the node reports it.
    #[serde(default)]
    pub source: Option<Account>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_representative_is_genesis() {
        assert_eq!(
            default_representative().as_str(),
            "nano_3t6k35gi95xu6tergt6p69ck76ogmitsa8mnijtpxm9fkcm736xtoncuohr3"
        );
    }

    #[test]
    fn unopened_work_root_is_public_key() {
        let key = PublicKey([4u8; 32]);
        let state = AccountState::unopened(derive_address(&key), default_representative());
        assert!(state.is_unopened());
        assert_eq!(state.work_root(&key), BlockHash::new([4u8; 32]));
    }

    #[test]
    fn opened_work_root_is_frontier() {
        let key = PublicKey([4u8; 32]);
        let state = AccountState::unopened(derive_address(&key), default_representative())
            .advance(BlockHash::new([9u8; 32]), Raw::new(5));
        assert!(!state.is_unopened());
        assert_eq!(state.work_root(&key), BlockHash::new([9u8; 32]));
    }

    #[test]
    fn advance_leaves_original_untouched() {
        let key = PublicKey([4u8; 32]);
        let before = AccountState::unopened(derive_address(&key), default_representative());
        let after = before.advance(BlockHash::new([1u8; 32]), Raw::new(10));
        assert!(before.is_unopened());
        assert_eq!(before.balance, Raw::ZERO);
        assert_eq!(after.balance, Raw::new(10));
        assert_eq!(after.account, before.account);
    }
}
