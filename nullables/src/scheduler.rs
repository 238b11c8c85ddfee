//! Nullable scheduler: waits that take no time.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use relay_utils::Scheduler;

use crate::clock::NullClock;
use crate::lock;

/// Records every requested sleep and returns immediately, advancing its
/// clock by the requested amount.
#[derive(Debug, Default)]
pub struct NullScheduler {
    clock: NullClock,
    sleeps: Mutex<Vec<Duration>>,
}

impl NullScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scheduler that advances `clock` (typically shared with a [`crate::NullLedger`]).
    pub fn with_clock(clock: NullClock) -> Self {
        Self {
            clock,
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        lock(&self.sleeps).clone()
    }

    /// Total time slept.
    pub fn total(&self) -> Duration {
        lock(&self.sleeps).iter().sum()
    }
}

#[async_trait]
impl Scheduler for NullScheduler {
    async fn sleep(&self, duration: Duration) {
        lock(&self.sleeps).push(duration);
        self.clock.advance(duration);
    }
}
