//! Shared utilities for the relay crates.

pub mod logging;
pub mod time;

pub use logging::{init_logging, LogFormat, LoggingError};
pub use time::{format_duration, Scheduler, TokioScheduler};
