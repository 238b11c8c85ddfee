//! The two-account relay.
//!
//! ```text
//! Idle ──send all──▶ SentOut ──receive──▶ ReceivedBySecondary
//!      ──send all back──▶ SentBack ──receive──▶ ReceivedByOriginal
//! ```
//!
//! Every step starts from the account state the previous step produced and
//! is only taken once the ledger has accepted the previous block. Waiting for
//! a send to become receivable goes through the [`Scheduler`] with the
//! configured [`SettlementPolicy`].

use relay_crypto::{
    decode_address, derive_address, public_from_private, seed_hash, Blake3SeedHasher, SeedHasher,
};
use relay_ledger::{BlockBuilder, BuildError, PendingTransaction, SignedBlock};
use relay_rpc::LedgerClient;
use relay_types::{Account, BlockHash, PrivateKey, Raw};
use relay_utils::{format_duration, Scheduler};
use relay_work::{WorkProvider, WorkThresholds};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::{self, RelayToken};
use crate::error::{RelayError, RelayFailure};
use crate::settlement::SettlementPolicy;
use crate::stage::RelayStage;

/// Tunables of a relay run.
#[derive(Clone, Debug, PartialEq)]
pub struct RelayOptions {
    pub thresholds: WorkThresholds,
    pub settlement: SettlementPolicy,
    /// How many receivables to ask for per poll.
    pub receivable_count: usize,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            thresholds: WorkThresholds::new(),
            settlement: SettlementPolicy::default(),
            receivable_count: 32,
        }
    }
}

/// Hashes of the four blocks of a completed relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RelayBlocks {
    pub sent_out: BlockHash,
    pub received_by_secondary: BlockHash,
    pub sent_back: BlockHash,
    pub received_by_original: BlockHash,
}

/// Result of a completed relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RelayReceipt {
    pub original: Account,
    pub secondary: Account,
    /// What left the original account.
    pub amount: Raw,
    /// What came back to it.
    pub returned: Raw,
    pub original_balance: Raw,
    pub blocks: RelayBlocks,
    pub token: String,
}

/// Result of [`Relay::resume`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
    pub original: Account,
    pub secondary: Account,
    pub claimed_by_secondary: Vec<BlockHash>,
    pub sent_back: Option<BlockHash>,
    pub claimed_by_original: Vec<BlockHash>,
    pub returned: Raw,
}

/// Stage reached plus what the ledger has accepted so far.
struct Progress {
    stage: RelayStage,
    submitted: Vec<BlockHash>,
}

impl Progress {
    fn at(stage: RelayStage) -> Self {
        Self {
            stage,
            submitted: Vec::new(),
        }
    }

    fn fail(&self, account: &Account, source: impl Into<RelayFailure>) -> RelayError {
        let err = RelayError {
            stage: self.stage,
            account: account.clone(),
            submitted: self.submitted.clone(),
            source: source.into(),
        };
        warn!(
            stage = %err.stage,
            account = %err.account,
            submitted = err.submitted.len(),
            error = %err.source,
            "relay aborted"
        );
        err
    }
}

/// Running total of what came home to `account`.
fn add_returned(total: Raw, amount: Raw, account: &Account) -> Result<Raw, BuildError> {
    total
        .checked_add(amount)
        .ok_or_else(|| BuildError::BalanceOverflow {
            account: account.clone(),
            balance: total,
            amount,
        })
}

/// Drives relays against a ledger.
pub struct Relay<L, W, S, H = Blake3SeedHasher> {
    ledger: L,
    work: W,
    scheduler: S,
    seeds: H,
    options: RelayOptions,
}

impl<L, W, S> Relay<L, W, S>
where
    L: LedgerClient,
    W: WorkProvider,
    S: Scheduler,
{
    pub fn new(ledger: L, work: W, scheduler: S, options: RelayOptions) -> Self {
        Self {
            ledger,
            work,
            scheduler,
            seeds: Blake3SeedHasher,
            options,
        }
    }
}

impl<L, W, S, H> Relay<L, W, S, H>
where
    L: LedgerClient,
    W: WorkProvider,
    S: Scheduler,
    H: SeedHasher,
{
    /// Use a different message-to-secret derivation.
    pub fn with_seed_hasher<H2: SeedHasher>(self, seeds: H2) -> Relay<L, W, S, H2> {
        Relay {
            ledger: self.ledger,
            work: self.work,
            scheduler: self.scheduler,
            seeds,
            options: self.options,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn options(&self) -> &RelayOptions {
        &self.options
    }

    /// The secondary secret and address a message relays through.
    pub fn secondary_for(&self, message: &str) -> (PrivateKey, Account) {
        let secret = self.seeds.derive_secret(message.as_bytes());
        let account = derive_address(&public_from_private(&secret));
        (secret, account)
    }

    /// Move the whole balance of `original_secret`'s account through the
    /// secondary account derived from `message` and back, then seal `message`
    /// into a token.
    pub async fn run(
        &self,
        original_secret: &PrivateKey,
        message: &str,
    ) -> Result<RelayReceipt, RelayError> {
        let original = derive_address(&public_from_private(original_secret));
        let (secondary_secret, secondary) = self.secondary_for(message);
        let builder = BlockBuilder::new(&self.work, self.options.thresholds);
        let mut progress = Progress::at(RelayStage::Idle);
        info!(%original, %secondary, "relay starting");

        // Idle → SentOut
        let start = self
            .ledger
            .get_account_state(&original)
            .await
            .map_err(|e| progress.fail(&original, e))?;
        let sent_out = builder
            .build_send(&start, original_secret, &secondary)
            .await
            .map_err(|e| progress.fail(&original, e))?;
        self.submit(&mut progress, &sent_out, RelayStage::SentOut)
            .await?;

        // SentOut → ReceivedBySecondary
        let incoming = self
            .wait_for_receivable(&secondary, sent_out.hash, sent_out.amount)
            .await
            .map_err(|e| progress.fail(&secondary, e))?;
        let secondary_state = self
            .ledger
            .get_account_state(&secondary)
            .await
            .map_err(|e| progress.fail(&secondary, e))?;
        let received = builder
            .build_receive(&secondary_state, &secondary_secret, &incoming)
            .await
            .map_err(|e| progress.fail(&secondary, e))?;
        self.submit(&mut progress, &received, RelayStage::ReceivedBySecondary)
            .await?;

        // ReceivedBySecondary → SentBack
        self.settle().await;
        let sent_back = builder
            .build_send(&received.resulting_state, &secondary_secret, &original)
            .await
            .map_err(|e| progress.fail(&secondary, e))?;
        self.submit(&mut progress, &sent_back, RelayStage::SentBack)
            .await?;

        // SentBack → ReceivedByOriginal
        let returning = self
            .wait_for_receivable(&original, sent_back.hash, sent_back.amount)
            .await
            .map_err(|e| progress.fail(&original, e))?;
        let home = builder
            .build_receive(&sent_out.resulting_state, original_secret, &returning)
            .await
            .map_err(|e| progress.fail(&original, e))?;
        self.submit(&mut progress, &home, RelayStage::ReceivedByOriginal)
            .await?;

        let key_material = seed_hash(&secondary_secret);
        let ciphertext = codec::encrypt(message, &original, &key_material)
            .map_err(|e| progress.fail(&original, e))?;
        let token = RelayToken {
            secondary: secondary.clone(),
            seed_hash: key_material,
            ciphertext,
        };

        info!(%original, amount = %sent_out.amount, "relay complete");
        Ok(RelayReceipt {
            original,
            secondary,
            amount: sent_out.amount,
            returned: returning.amount,
            original_balance: home.resulting_state.balance,
            blocks: RelayBlocks {
                sent_out: sent_out.hash,
                received_by_secondary: received.hash,
                sent_back: sent_back.hash,
                received_by_original: home.hash,
            },
            token: token.encode(),
        })
    }

    /// Finish an interrupted relay of `message`: claim whatever waits at the
    /// secondary account, send its whole balance back and claim it at the
    /// original account. Only funds coming from the secondary are touched.
    pub async fn resume(
        &self,
        original_secret: &PrivateKey,
        message: &str,
    ) -> Result<RecoveryReport, RelayError> {
        let original = derive_address(&public_from_private(original_secret));
        let (secondary_secret, secondary) = self.secondary_for(message);
        let builder = BlockBuilder::new(&self.work, self.options.thresholds);
        let mut progress = Progress::at(RelayStage::SentOut);
        let mut report = RecoveryReport {
            original: original.clone(),
            secondary: secondary.clone(),
            claimed_by_secondary: Vec::new(),
            sent_back: None,
            claimed_by_original: Vec::new(),
            returned: Raw::ZERO,
        };
        info!(%original, %secondary, "resuming relay");

        let mut state = self
            .ledger
            .get_account_state(&secondary)
            .await
            .map_err(|e| progress.fail(&secondary, e))?;
        let waiting = self
            .ledger
            .receivable(&secondary, Raw::new(1), self.options.receivable_count)
            .await
            .map_err(|e| progress.fail(&secondary, e))?;
        for pending in &waiting {
            let claim = builder
                .build_receive(&state, &secondary_secret, pending)
                .await
                .map_err(|e| progress.fail(&secondary, e))?;
            let hash = self
                .submit(&mut progress, &claim, RelayStage::ReceivedBySecondary)
                .await?;
            report.claimed_by_secondary.push(hash);
            state = claim.resulting_state;
        }

        let incoming = if state.balance.is_zero() {
            self.receivable_from(&original, &secondary)
                .await
                .map_err(|e| progress.fail(&original, e))?
        } else {
            if !report.claimed_by_secondary.is_empty() {
                self.settle().await;
            }
            let back = builder
                .build_send(&state, &secondary_secret, &original)
                .await
                .map_err(|e| progress.fail(&secondary, e))?;
            let hash = self
                .submit(&mut progress, &back, RelayStage::SentBack)
                .await?;
            report.sent_back = Some(hash);
            vec![self
                .wait_for_receivable(&original, hash, back.amount)
                .await
                .map_err(|e| progress.fail(&original, e))?]
        };

        if report.claimed_by_secondary.is_empty()
            && report.sent_back.is_none()
            && incoming.is_empty()
        {
            return Err(progress.fail(
                &secondary,
                RelayFailure::NothingToRecover {
                    secondary: secondary.clone(),
                },
            ));
        }

        let mut home = self
            .ledger
            .get_account_state(&original)
            .await
            .map_err(|e| progress.fail(&original, e))?;
        for pending in &incoming {
            let claim = builder
                .build_receive(&home, original_secret, pending)
                .await
                .map_err(|e| progress.fail(&original, e))?;
            let hash = self
                .submit(&mut progress, &claim, RelayStage::ReceivedByOriginal)
                .await?;
            report.claimed_by_original.push(hash);
            report.returned = add_returned(report.returned, pending.amount, &original)
                .map_err(|e| progress.fail(&original, e))?;
            home = claim.resulting_state;
        }

        info!(%original, returned = %report.returned, "recovery complete");
        Ok(report)
    }

    async fn submit(
        &self,
        progress: &mut Progress,
        block: &SignedBlock,
        reached: RelayStage,
    ) -> Result<BlockHash, RelayError> {
        let hash = self
            .ledger
            .submit(block)
            .await
            .map_err(|e| progress.fail(&block.block.account, e))?;
        progress.submitted.push(hash);
        progress.stage = reached;
        info!(
            stage = %reached,
            account = %block.block.account,
            subtype = block.subtype.as_str(),
            %hash,
            amount = %block.amount,
            "block accepted"
        );
        Ok(hash)
    }

    /// Pause between steps so the previous block can propagate.
    async fn settle(&self) {
        let delay = self.options.settlement.initial_delay;
        debug!(delay = %format_duration(delay), "settling");
        self.scheduler.sleep(delay).await;
    }

    /// Poll `account`'s receivables until the send `expected` shows up.
    async fn wait_for_receivable(
        &self,
        account: &Account,
        expected: BlockHash,
        amount: Raw,
    ) -> Result<PendingTransaction, RelayFailure> {
        let mut attempts = 0u32;
        for delay in self.options.settlement.delays() {
            self.scheduler.sleep(delay).await;
            attempts += 1;
            match self
                .ledger
                .receivable(account, amount, self.options.receivable_count)
                .await
            {
                Ok(found) => {
                    if let Some(pending) = found.into_iter().find(|p| p.hash == expected) {
                        return Ok(pending);
                    }
                }
                Err(e) if e.is_retryable() => {}
                Err(e) => return Err(e.into()),
            }
            debug!(
                %account,
                %expected,
                attempt = attempts,
                waited = %format_duration(delay),
                "send not receivable yet"
            );
        }
        Err(RelayFailure::ReceivableNotFound {
            account: account.clone(),
            expected,
            attempts,
        })
    }

    /// Everything receivable at `account` that was sent by `from`.
    async fn receivable_from(
        &self,
        account: &Account,
        from: &Account,
    ) -> Result<Vec<PendingTransaction>, RelayFailure> {
        let sender = decode_address(from.as_str());
        let all = self
            .ledger
            .receivable(account, Raw::new(1), self.options.receivable_count)
            .await?;
        Ok(all
            .into_iter()
            .filter(|p| {
                p.source
                    .as_ref()
                    .and_then(|source| decode_address(source.as_str()))
                    .is_some_and(|key| Some(key) == sender)
            })
            .collect())
    }
}
