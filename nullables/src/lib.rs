//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the relay (the ledger node, the work
//! service and the passage of time) sits behind a trait. This crate provides
//! test implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network or sleep for real
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod ledger;
pub mod scheduler;
pub mod work;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use clock::NullClock;
pub use ledger::NullLedger;
pub use scheduler::NullScheduler;
pub use work::NullWorkProvider;

/// Lock a mutex, carrying on past poisoning (a panicking test thread must not
/// cascade into every other assertion).
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
