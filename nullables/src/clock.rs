//! Nullable clock: deterministic time for testing.

use relay_types::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A deterministic clock shared between the null ledger (which stamps history
/// entries with it) and the null scheduler (which advances it).
///
/// Time only advances when you tell it to. Clones share the same time.
#[derive(Clone, Debug)]
pub struct NullClock {
    millis: Arc<AtomicU64>,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(initial_secs.saturating_mul(1000))),
        }
    }

    /// Get the current time.
    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.millis.load(Ordering::SeqCst) / 1000)
    }

    /// Advance time.
    pub fn advance(&self, by: Duration) {
        let millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Set the time to a specific value.
    pub fn set(&self, secs: u64) {
        self.millis.store(secs.saturating_mul(1000), Ordering::SeqCst);
    }
}

impl Default for NullClock {
    fn default() -> Self {
        Self::new(1_700_000_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_time() {
        let clock = NullClock::new(100);
        let other = clock.clone();
        other.advance(Duration::from_millis(2_500));
        assert_eq!(clock.now(), Timestamp::new(102));
        clock.set(7);
        assert_eq!(other.now(), Timestamp::new(7));
    }
}
