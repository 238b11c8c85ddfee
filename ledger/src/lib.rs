//! Account-chain block construction.
//!
//! Each account has its own chain (block lattice). This crate knows how to
//! describe an account's current position in its chain ([`AccountState`]) and
//! how to extend it with signed `send` and `receive` state blocks. Submission is
//! somebody else's job.

pub mod account;
pub mod builder;
pub mod error;
pub mod state_block;

pub use account::{default_representative, AccountState, PendingTransaction};
pub use builder::{BlockBuilder, SignedBlock};
pub use error::BuildError;
pub use state_block::{BlockSubtype, StateBlock};
