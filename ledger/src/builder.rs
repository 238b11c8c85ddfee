//! Signed send/receive construction.
//!
//! Balance arithmetic happens here and only here, always on `Raw` with
//! checked operations.

use relay_crypto::{account_public_key, derive_address, public_from_private, sign_message};
use relay_types::{Account, BlockHash, PrivateKey, PublicKey, Raw};
use relay_work::{WorkBlockKind, WorkProvider, WorkThresholds};

use crate::account::{AccountState, PendingTransaction};
use crate::error::BuildError;
use crate::state_block::{hash_fields, BlockSubtype, StateBlock};

/// A fully constructed block, ready for submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedBlock {
    pub block: StateBlock,
    pub hash: BlockHash,
    pub subtype: BlockSubtype,
    /// Amount moved by this block.
    pub amount: Raw,
    /// The account state once this block is on the chain.
    pub resulting_state: AccountState,
}

/// Builds signed blocks, fetching work from a [`WorkProvider`].
pub struct BlockBuilder<'a, W: WorkProvider + ?Sized> {
    work: &'a W,
    thresholds: WorkThresholds,
}

impl<'a, W: WorkProvider + ?Sized> BlockBuilder<'a, W> {
    pub fn new(work: &'a W, thresholds: WorkThresholds) -> Self {
        Self { work, thresholds }
    }

    /// Send the entire balance of `state` to `to`. The resulting balance is zero.
    ///
    /// A zero balance is rejected before any work is requested.
    pub async fn build_send(
        &self,
        state: &AccountState,
        from_secret: &PrivateKey,
        to: &Account,
    ) -> Result<SignedBlock, BuildError> {
        if state.balance.is_zero() {
            return Err(BuildError::InsufficientBalance {
                account: state.account.clone(),
            });
        }
        let public = owning_key(state, from_secret)?;
        let destination = account_public_key(to)?;

        let amount = state.balance;
        let balance = Raw::ZERO;
        let link = BlockHash::new(destination.0);
        let root = state.work_root(&public);

        self.finish(
            state,
            from_secret,
            &public,
            root,
            balance,
            link,
            amount,
            BlockSubtype::Send,
            WorkBlockKind::Send,
        )
        .await
    }

    /// Receive `pending` into `state`. The resulting balance is `state.balance + pending.amount`.
    ///
    /// For an unopened account the work root is the account's public key.
    pub async fn build_receive(
        &self,
        state: &AccountState,
        to_secret: &PrivateKey,
        pending: &PendingTransaction,
    ) -> Result<SignedBlock, BuildError> {
        let public = owning_key(state, to_secret)?;
        let balance =
            state
                .balance
                .checked_add(pending.amount)
                .ok_or_else(|| BuildError::BalanceOverflow {
                    account: state.account.clone(),
                    balance: state.balance,
                    amount: pending.amount,
                })?;
        let subtype = if state.is_unopened() {
            BlockSubtype::Open
        } else {
            BlockSubtype::Receive
        };
        let root = state.work_root(&public);

        self.finish(
            state,
            to_secret,
            &public,
            root,
            balance,
            pending.hash,
            pending.amount,
            subtype,
            WorkBlockKind::Receive,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn finish(
        &self,
        state: &AccountState,
        secret: &PrivateKey,
        public: &PublicKey,
        root: BlockHash,
        balance: Raw,
        link: BlockHash,
        amount: Raw,
        subtype: BlockSubtype,
        kind: WorkBlockKind,
    ) -> Result<SignedBlock, BuildError> {
        let representative = account_public_key(&state.representative)?;
        let hash = hash_fields(public, &state.frontier, &representative, balance, &link);
        let signature = sign_message(hash.as_bytes(), secret);
        let work = self
            .work
            .generate_work(&root, self.thresholds.threshold_for(kind))
            .await?;

        tracing::debug!(
            account = %state.account,
            subtype = subtype.as_str(),
            hash = %hash,
            amount = %amount,
            balance = %balance,
            "built block"
        );

        Ok(SignedBlock {
            block: StateBlock {
                account: state.account.clone(),
                previous: state.frontier,
                representative: state.representative.clone(),
                balance,
                link,
                signature,
                work,
            },
            hash,
            subtype,
            amount,
            resulting_state: state.advance(hash, balance),
        })
    }
}

/// The public key of `secret`, provided it owns `state.account`.
fn owning_key(state: &AccountState, secret: &PrivateKey) -> Result<PublicKey, BuildError> {
    let public = public_from_private(secret);
    let derived = derive_address(&public);
    if derived != state.account {
        return Err(BuildError::KeyMismatch {
            expected: state.account.clone(),
            actual: derived,
        });
    }
    Ok(public)
}
