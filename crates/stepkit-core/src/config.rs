//! Configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

pub const SPIN_TIMEOUT_ENV: &str = "STEPKIT_SPIN_TIMEOUT_MS";
pub const SPIN_INTERVAL_ENV: &str = "STEPKIT_SPIN_INTERVAL_MS";

/// Timing for [`crate::Spinner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinnerConfig {
    /// How long to keep retrying before giving up.
    pub timeout: Duration,
    /// Pause between two failed attempts.
    pub interval: Duration,
}

impl Default for SpinnerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            interval: Duration::from_millis(100),
        }
    }
}

impl SpinnerConfig {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Defaults overridden by `STEPKIT_SPIN_TIMEOUT_MS` / `STEPKIT_SPIN_INTERVAL_MS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            timeout: millis_or(lookup(SPIN_TIMEOUT_ENV), SPIN_TIMEOUT_ENV, defaults.timeout),
            interval: millis_or(
                lookup(SPIN_INTERVAL_ENV),
                SPIN_INTERVAL_ENV,
                defaults.interval,
            ),
        }
    }
}

fn millis_or(raw: Option<String>, name: &str, default: Duration) -> Duration {
    match raw {
        None => default,
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(variable = name, value = %raw, "ignoring invalid duration, using default");
                default
            }
        },
    }
}
