//! End-to-end relay scenarios against the in-memory ledger.
//!
//! Each test wires a [`Relay`] to a `NullLedger`, a `NullWorkProvider` and a
//! `NullScheduler`, so every step of the state machine runs for real while no
//! time passes and nothing touches the network.

use std::sync::Arc;
use std::time::Duration;

use relay_core::{
    reveal, CodecError, Relay, RelayFailure, RelayOptions, RelayStage, RelayState, RelayToken,
    RevealError, SettlementPolicy,
};
use relay_crypto::{derive_address, public_from_private};
use relay_ledger::{BlockSubtype, BuildError};
use relay_nullables::{NullClock, NullLedger, NullScheduler, NullWorkProvider};
use relay_rpc::LedgerError;
use relay_types::{Account, BlockHash, PrivateKey, Raw};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const BALANCE: u128 = 1_000_000;

type NullRelay = Relay<Arc<NullLedger>, Arc<NullWorkProvider>, Arc<NullScheduler>>;

struct Harness {
    ledger: Arc<NullLedger>,
    work: Arc<NullWorkProvider>,
    scheduler: Arc<NullScheduler>,
    relay: NullRelay,
}

fn policy() -> SettlementPolicy {
    SettlementPolicy {
        initial_delay: Duration::from_millis(1_000),
        backoff_factor: 2.0,
        max_delay: Duration::from_millis(4_000),
        max_attempts: 4,
    }
}

fn harness() -> Harness {
    let clock = NullClock::new(1_700_000_000);
    let ledger = Arc::new(NullLedger::with_clock(clock.clone()));
    let work = Arc::new(NullWorkProvider::new());
    let scheduler = Arc::new(NullScheduler::with_clock(clock));
    let relay = Relay::new(
        ledger.clone(),
        work.clone(),
        scheduler.clone(),
        RelayOptions {
            settlement: policy(),
            ..RelayOptions::default()
        },
    );
    Harness {
        ledger,
        work,
        scheduler,
        relay,
    }
}

fn original_key() -> PrivateKey {
    PrivateKey([0x11; 32])
}

fn address_of(secret: &PrivateKey) -> Account {
    derive_address(&public_from_private(secret))
}

fn blocks_of(ledger: &NullLedger, account: &Account) -> Vec<BlockSubtype> {
    ledger
        .submitted()
        .iter()
        .filter(|b| &b.block.account == account)
        .map(|b| b.subtype)
        .collect()
}

// ---------------------------------------------------------------------------
// Forward relay
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_relay_returns_the_balance() {
    let h = harness();
    let original = address_of(&original_key());
    h.ledger.fund(&original, Raw::new(BALANCE));

    let receipt = h.relay.run(&original_key(), "hello").await.unwrap();
    let (_, secondary) = h.relay.secondary_for("hello");

    assert_eq!(receipt.original, original);
    assert_eq!(receipt.secondary, secondary);
    assert_eq!(receipt.amount, Raw::new(BALANCE));
    assert_eq!(receipt.returned, Raw::new(BALANCE));
    assert_eq!(receipt.original_balance, Raw::new(BALANCE));

    let end = h.ledger.state(&original);
    assert_eq!(end.balance, Raw::new(BALANCE));
    assert_eq!(end.frontier, receipt.blocks.received_by_original);
    assert_eq!(
        blocks_of(&h.ledger, &original),
        vec![BlockSubtype::Send, BlockSubtype::Receive]
    );

    assert_eq!(h.ledger.state(&secondary).balance, Raw::ZERO);
    assert_eq!(
        blocks_of(&h.ledger, &secondary),
        vec![BlockSubtype::Open, BlockSubtype::Send]
    );

    let order: Vec<BlockHash> = h.ledger.submitted().iter().map(|b| b.hash).collect();
    assert_eq!(
        order,
        vec![
            receipt.blocks.sent_out,
            receipt.blocks.received_by_secondary,
            receipt.blocks.sent_back,
            receipt.blocks.received_by_original,
        ]
    );
}

#[tokio::test]
async fn token_opens_for_the_original_account() {
    let h = harness();
    let original = address_of(&original_key());
    h.ledger.fund(&original, Raw::new(BALANCE));

    let message = "meet, at the usual place; 100% sure";
    let receipt = h.relay.run(&original_key(), message).await.unwrap();
    let token = RelayToken::decode(&receipt.token).unwrap();

    assert_eq!(token.secondary, receipt.secondary);
    assert_eq!(token.open(&original).unwrap(), message);
    assert!(!receipt.token.contains(message));
}

#[tokio::test]
async fn unopened_secondary_uses_its_public_key_as_work_root() {
    let h = harness();
    let original = address_of(&original_key());
    h.ledger.fund(&original, Raw::new(BALANCE));
    let (secondary_secret, secondary) = h.relay.secondary_for("fresh");
    assert!(h.ledger.state(&secondary).is_unopened());

    h.relay.run(&original_key(), "fresh").await.unwrap();

    let roots = h.work.roots();
    assert_eq!(roots.len(), 4);
    let secondary_key = public_from_private(&secondary_secret);
    assert_eq!(roots[1], BlockHash::new(secondary_key.0));
    assert_ne!(roots[1], BlockHash::ZERO);
}

#[tokio::test]
async fn confirmation_lag_is_absorbed_by_polling() {
    let h = harness();
    let original = address_of(&original_key());
    h.ledger.fund(&original, Raw::new(BALANCE));
    h.ledger.set_receivable_lag(2);

    h.relay.run(&original_key(), "slow network").await.unwrap();

    assert_eq!(h.ledger.state(&original).balance, Raw::new(BALANCE));
    // Three polls per wait (two hidden, one found) plus one settle pause.
    let sleeps = h.scheduler.sleeps();
    assert_eq!(sleeps.len(), 3 + 1 + 3);
    assert_eq!(sleeps[..3], [1_000, 2_000, 4_000].map(Duration::from_millis));
}

#[tokio::test]
async fn relays_for_different_messages_use_different_secondaries() {
    let h = harness();
    let original = address_of(&original_key());
    h.ledger.fund(&original, Raw::new(BALANCE));

    let first = h.relay.run(&original_key(), "one").await.unwrap();
    let second = h.relay.run(&original_key(), "two").await.unwrap();

    assert_ne!(first.secondary, second.secondary);
    assert_eq!(h.ledger.state(&original).balance, Raw::new(BALANCE));
    assert_eq!(blocks_of(&h.ledger, &original).len(), 4);
}

// ---------------------------------------------------------------------------
// Aborts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn zero_balance_aborts_before_any_write() {
    let h = harness();
    let original = address_of(&original_key());

    let err = h.relay.run(&original_key(), "hello").await.unwrap_err();

    assert_eq!(err.stage, RelayStage::Idle);
    assert_eq!(err.account, original);
    assert!(err.submitted.is_empty());
    assert!(!err.left_funds_in_flight());
    assert!(matches!(
        err.source,
        RelayFailure::Build(BuildError::InsufficientBalance { .. })
    ));
    assert!(h.ledger.submitted().is_empty());
    assert!(h.work.requests().is_empty());
}

#[tokio::test]
async fn abort_at_step_two_names_secondary_and_expected_hash() {
    let h = harness();
    let original = address_of(&original_key());
    h.ledger.fund(&original, Raw::new(BALANCE));
    let (_, secondary) = h.relay.secondary_for("lost");
    h.ledger.withhold_receivables(&secondary);

    let err = h.relay.run(&original_key(), "lost").await.unwrap_err();

    let sent_out = h.ledger.submitted()[0].hash;
    assert_eq!(err.stage, RelayStage::SentOut);
    assert_eq!(err.account, secondary);
    assert_eq!(err.submitted, vec![sent_out]);
    match &err.source {
        RelayFailure::ReceivableNotFound {
            account,
            expected,
            attempts,
        } => {
            assert_eq!(account, &secondary);
            assert_eq!(*expected, sent_out);
            assert_eq!(*attempts, 4);
        }
        other => panic!("unexpected failure: {other}"),
    }
    assert!(matches!(err.state(), RelayState::Aborted { at: RelayStage::SentOut, .. }));

    // Nothing after the first send was built.
    assert_eq!(h.ledger.submitted().len(), 1);
    assert_eq!(h.work.requests().len(), 1);
    assert_eq!(h.scheduler.sleeps(), policy().delays().collect::<Vec<_>>());
}

#[tokio::test]
async fn rejected_submission_is_not_retried() {
    let h = harness();
    let original = address_of(&original_key());
    h.ledger.fund(&original, Raw::new(BALANCE));
    h.ledger.reject_next_submission("Fork");

    let err = h.relay.run(&original_key(), "hello").await.unwrap_err();

    assert_eq!(err.stage, RelayStage::Idle);
    assert!(matches!(
        err.source,
        RelayFailure::Ledger(LedgerError::SubmissionRejected(ref reason)) if reason == "Fork"
    ));
    assert!(h.ledger.submitted().is_empty());
    assert_eq!(h.ledger.state(&original).balance, Raw::new(BALANCE));
}

#[tokio::test]
async fn work_failure_aborts_the_step() {
    let h = harness();
    let original = address_of(&original_key());
    h.ledger.fund(&original, Raw::new(BALANCE));
    h.work.fail_with("no GPU");

    let err = h.relay.run(&original_key(), "hello").await.unwrap_err();

    assert_eq!(err.stage, RelayStage::Idle);
    assert!(matches!(err.source, RelayFailure::Build(BuildError::Work(_))));
    assert!(h.ledger.submitted().is_empty());
}

// ---------------------------------------------------------------------------
// Recovery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resume_finishes_a_relay_stuck_at_the_secondary() {
    let h = harness();
    let original = address_of(&original_key());
    h.ledger.fund(&original, Raw::new(BALANCE));
    let (_, secondary) = h.relay.secondary_for("stuck");
    h.ledger.withhold_receivables(&secondary);
    h.relay.run(&original_key(), "stuck").await.unwrap_err();
    assert_eq!(h.ledger.state(&original).balance, Raw::ZERO);

    h.ledger.release_receivables(&secondary);
    let report = h.relay.resume(&original_key(), "stuck").await.unwrap();

    assert_eq!(report.claimed_by_secondary.len(), 1);
    assert!(report.sent_back.is_some());
    assert_eq!(report.claimed_by_original.len(), 1);
    assert_eq!(report.returned, Raw::new(BALANCE));
    assert_eq!(h.ledger.state(&original).balance, Raw::new(BALANCE));
    assert_eq!(h.ledger.state(&secondary).balance, Raw::ZERO);
}

#[tokio::test]
async fn resume_claims_only_what_came_from_the_secondary() {
    let h = harness();
    let original = address_of(&original_key());
    h.ledger.fund(&original, Raw::new(BALANCE));
    h.ledger.withhold_receivables(&original);
    let err = h.relay.run(&original_key(), "almost").await.unwrap_err();
    assert_eq!(err.stage, RelayStage::SentBack);
    assert_eq!(err.submitted.len(), 3);

    let stranger = address_of(&PrivateKey([0x99; 32]));
    h.ledger.add_pending(&original, BlockHash::new([0x42; 32]), Raw::new(5), Some(stranger));
    h.ledger.release_receivables(&original);

    let report = h.relay.resume(&original_key(), "almost").await.unwrap();

    assert!(report.claimed_by_secondary.is_empty());
    assert!(report.sent_back.is_none());
    assert_eq!(report.claimed_by_original.len(), 1);
    assert_eq!(report.returned, Raw::new(BALANCE));
    assert_eq!(h.ledger.state(&original).balance, Raw::new(BALANCE));
    let left = h.ledger.pending_for(&original);
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].hash, BlockHash::new([0x42; 32]));
}

#[tokio::test]
async fn resume_returns_funds_parked_in_an_opened_secondary() {
    let h = harness();
    let original = address_of(&original_key());
    let (_, secondary) = h.relay.secondary_for("parked");
    h.ledger.fund(&secondary, Raw::new(BALANCE));

    let report = h.relay.resume(&original_key(), "parked").await.unwrap();

    assert!(report.claimed_by_secondary.is_empty());
    assert!(report.sent_back.is_some());
    assert_eq!(report.claimed_by_original.len(), 1);
    assert_eq!(report.returned, Raw::new(BALANCE));
    assert_eq!(h.ledger.state(&original).balance, Raw::new(BALANCE));
    assert_eq!(h.ledger.state(&secondary).balance, Raw::ZERO);
    // One poll for the send back, no settling since nothing was claimed.
    assert_eq!(h.scheduler.sleeps(), vec![policy().initial_delay]);
}

#[tokio::test]
async fn resume_with_nothing_in_flight_fails() {
    let h = harness();
    let original = address_of(&original_key());
    h.ledger.fund(&original, Raw::new(BALANCE));

    let err = h.relay.resume(&original_key(), "never sent").await.unwrap_err();

    assert!(matches!(err.source, RelayFailure::NothingToRecover { .. }));
    assert!(h.ledger.submitted().is_empty());
}

// ---------------------------------------------------------------------------
// Reveal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reveal_returns_message_and_provenance() {
    let h = harness();
    let original = address_of(&original_key());
    h.ledger.fund(&original, Raw::new(BALANCE));
    let receipt = h.relay.run(&original_key(), "the eagle has landed").await.unwrap();

    let revealed = reveal(h.ledger.as_ref(), &receipt.token, &original, 10)
        .await
        .unwrap();

    assert_eq!(revealed.message, "the eagle has landed");
    assert_eq!(revealed.secondary, receipt.secondary);
    assert_eq!(revealed.hash, receipt.blocks.sent_back);
    assert_eq!(revealed.amount, Raw::new(BALANCE));
    assert!(revealed.timestamp.as_secs() >= 1_700_000_000);
}

#[tokio::test]
async fn reveal_for_the_wrong_recipient_fails_to_decrypt() {
    let h = harness();
    let original = address_of(&original_key());
    h.ledger.fund(&original, Raw::new(BALANCE));
    let receipt = h.relay.run(&original_key(), "private").await.unwrap();
    let someone_else = address_of(&PrivateKey([0x22; 32]));

    let err = reveal(h.ledger.as_ref(), &receipt.token, &someone_else, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, RevealError::Codec(CodecError::DecryptionFailed)));
}

#[tokio::test]
async fn reveal_without_a_matching_send_fails() {
    let h = harness();
    let original = address_of(&original_key());
    let seed_hash = [3u8; 32];
    let token = RelayToken {
        secondary: address_of(&PrivateKey([0x33; 32])),
        seed_hash,
        ciphertext: relay_core::encrypt("orphan", &original, &seed_hash).unwrap(),
    };

    let err = reveal(h.ledger.as_ref(), &token.encode(), &original, 10)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RevealError::Ledger(LedgerError::NoMatchingTransaction { .. })
    ));
}

#[tokio::test]
async fn reveal_rejects_malformed_tokens() {
    let h = harness();
    let original = address_of(&original_key());
    let err = reveal(h.ledger.as_ref(), "only,two", &original, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, RevealError::Codec(CodecError::MalformedToken(_))));
}
