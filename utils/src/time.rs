//! Waiting, and talking about waits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

/// Source of delays. Production code sleeps on the tokio timer; tests inject a
/// scheduler that returns immediately and records what was asked of it.
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[async_trait]
impl<T: Scheduler + ?Sized> Scheduler for Arc<T> {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await
    }
}

/// Real delays on the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

/// Format a duration to a short human-readable string.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        format!("{}ms", duration.as_millis())
    } else if secs < 60 {
        format!("{}.{:01}s", secs, duration.subsec_millis() / 100)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_each_range() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(5_400)), "5.4s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(7_260)), "2h 1m");
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler_waits_on_the_timer() {
        let started = tokio::time::Instant::now();
        TokioScheduler.sleep(Duration::from_secs(3)).await;
        assert!(started.elapsed() >= Duration::from_secs(3));
    }
}
