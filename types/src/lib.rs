//! Fundamental types for the account-chain relay.
//!
//! This crate defines the value types shared across every other crate in the workspace:
//! account addresses, block hashes, raw amounts, keys and timestamps.

pub mod address;
pub mod amount;
pub mod block;
pub mod error;
pub mod keys;
pub mod time;

pub use address::Account;
pub use amount::Raw;
pub use block::BlockHash;
pub use error::ParseError;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use time::Timestamp;
