//! Client side of the ledger node's HTTP JSON API.
//!
//! The relay only ever talks to a node through [`LedgerClient`]. Production
//! code uses [`HttpLedgerClient`]; tests use the in-memory ledger from
//! `relay-nullables`.

pub mod client;
pub mod error;
pub mod http;
pub mod messages;

pub use client::{HistoryEntry, HistoryKind, LedgerClient};
pub use error::LedgerError;
pub use http::{HttpLedgerClient, NodeTimeouts};
