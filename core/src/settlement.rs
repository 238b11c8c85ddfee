//! Waiting for the ledger to confirm what was submitted.
//!
//! A block submitted to one account only becomes receivable at its
//! destination once the network has confirmed it. Instead of sleeping a fixed
//! interval and hoping, the relay polls with exponential backoff inside a
//! bounded budget.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backoff schedule for settlement polling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementPolicy {
    /// Wait before the first poll, and the settle delay between relay steps.
    #[serde(rename = "initial_delay_ms", with = "millis")]
    pub initial_delay: Duration,

    /// Each wait is the previous one times this factor.
    pub backoff_factor: f64,

    /// Upper bound on a single wait.
    #[serde(rename = "max_delay_ms", with = "millis")]
    pub max_delay: Duration,

    /// Polls before giving up.
    pub max_attempts: u32,
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(20),
            max_attempts: 8,
        }
    }
}

impl SettlementPolicy {
    /// The wait before each poll, `max_attempts` of them.
    pub fn delays(&self) -> Delays {
        Delays {
            next: self.initial_delay.min(self.max_delay),
            factor: if self.backoff_factor.is_finite() && self.backoff_factor >= 1.0 {
                self.backoff_factor
            } else {
                1.0
            },
            max: self.max_delay,
            remaining: self.max_attempts,
        }
    }

    /// Worst-case total wait.
    pub fn budget(&self) -> Duration {
        self.delays().sum()
    }
}

/// Iterator over the backoff schedule of a [`SettlementPolicy`].
#[derive(Clone, Debug)]
pub struct Delays {
    next: Duration,
    factor: f64,
    max: Duration,
    remaining: u32,
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next;
        let grown = (self.next.as_millis() as f64 * self.factor).round();
        self.next = if grown >= self.max.as_millis() as f64 {
            self.max
        } else {
            Duration::from_millis(grown as u64)
        };
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
