//! The two-account relay.
//!
//! Given a secret key and a message, a [`Relay`] derives a secondary account
//! from the message, moves the whole balance of the key's account through it
//! and back, and seals the message into a [`RelayToken`] keyed by the
//! secondary secret. [`reveal`] opens such a token and finds the send on the
//! ledger that vouches for it.

pub mod codec;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod reveal;
pub mod settlement;
pub mod stage;

pub use codec::{decode, decrypt, encode, encrypt, RelayToken};
pub use config::RelayConfig;
pub use error::{CodecError, ConfigError, RelayError, RelayFailure, RevealError};
pub use orchestrator::{RecoveryReport, Relay, RelayBlocks, RelayOptions, RelayReceipt};
pub use relay_utils::{Scheduler, TokioScheduler};
pub use reveal::{reveal, Revealed};
pub use settlement::{Delays, SettlementPolicy};
pub use stage::{RelayStage, RelayState};
