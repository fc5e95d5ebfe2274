//! Retry-with-timeout polling for assertions against eventually consistent state.
//!
//! A spin keeps calling an action until it succeeds or the timeout elapses.
//! Failed attempts are swallowed; when time runs out the most recent error is
//! returned exactly as the action produced it.

use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

use crate::config::SpinnerConfig;

/// The timeout elapsed before the action could run even once.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Timed out after {timeout:?} before the first attempt could run")]
pub struct SpinTimeout {
    pub timeout: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct Spinner {
    config: SpinnerConfig,
}

impl Spinner {
    pub fn new(config: SpinnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SpinnerConfig {
        &self.config
    }

    /// Spin with the configured timeout.
    pub fn wait_for<T, E, F>(&self, action: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: From<SpinTimeout> + std::fmt::Display,
    {
        self.wait_for_with_timeout(self.config.timeout, action)
    }

    /// Call `action` until it returns `Ok` or `timeout` elapses.
    ///
    /// The action must be safe to call repeatedly.
    pub fn wait_for_with_timeout<T, E, F>(&self, timeout: Duration, mut action: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: From<SpinTimeout> + std::fmt::Display,
    {
        let start = Instant::now();
        let mut last_error = None;
        let mut attempt = 0u32;

        while start.elapsed() < timeout {
            attempt += 1;
            match action() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    debug!(attempt, error = %err, "spin attempt failed");
                    last_error = Some(err);
                }
            }
            std::thread::sleep(self.pause(timeout, start.elapsed()));
        }

        Err(last_error.unwrap_or_else(|| SpinTimeout { timeout }.into()))
    }

    /// Async flavour of [`Spinner::wait_for`] for use inside async step bodies.
    pub async fn wait_for_async<T, E, F, Fut>(&self, action: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<SpinTimeout> + std::fmt::Display,
    {
        self.wait_for_async_with_timeout(self.config.timeout, action)
            .await
    }

    pub async fn wait_for_async_with_timeout<T, E, F, Fut>(
        &self,
        timeout: Duration,
        mut action: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<SpinTimeout> + std::fmt::Display,
    {
        let start = tokio::time::Instant::now();
        let mut last_error = None;
        let mut attempt = 0u32;

        while start.elapsed() < timeout {
            attempt += 1;
            match action().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    debug!(attempt, error = %err, "spin attempt failed");
                    last_error = Some(err);
                }
            }
            tokio::time::sleep(self.pause(timeout, start.elapsed())).await;
        }

        Err(last_error.unwrap_or_else(|| SpinTimeout { timeout }.into()))
    }

    // Never sleep past the deadline.
    fn pause(&self, timeout: Duration, elapsed: Duration) -> Duration {
        self.config.interval.min(timeout.saturating_sub(elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, StepKitError};
    use std::cell::Cell;

    fn fast_spinner(timeout_ms: u64) -> Spinner {
        Spinner::new(
            SpinnerConfig::new(Duration::from_millis(timeout_ms))
                .with_interval(Duration::from_millis(1)),
        )
    }

    #[test]
    fn returns_first_success_without_waiting() {
        let calls = Cell::new(0);
        let value: Result<&str> = fast_spinner(1_000).wait_for(|| {
            calls.set(calls.get() + 1);
            Ok("ready")
        });

        assert_eq!(value.unwrap(), "ready");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn retries_until_action_succeeds() {
        let calls = Cell::new(0);
        let value: Result<u32> = fast_spinner(5_000).wait_for(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(StepKitError::assertion(format!("attempt {}", calls.get())))
            } else {
                Ok(calls.get())
            }
        });

        assert_eq!(value.unwrap(), 3);
    }

    #[test]
    fn surfaces_last_error_unchanged() {
        let calls = Cell::new(0);
        let err = fast_spinner(30)
            .wait_for(|| -> Result<()> {
                calls.set(calls.get() + 1);
                Err(StepKitError::ThingNotFound {
                    key: format!("attempt {}", calls.get()),
                })
            })
            .unwrap_err();

        assert!(calls.get() > 1);
        match err {
            StepKitError::ThingNotFound { key } => {
                assert_eq!(key, format!("attempt {}", calls.get()))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_timeout_never_runs_action() {
        let calls = Cell::new(0);
        let err = fast_spinner(0)
            .wait_for(|| -> Result<()> {
                calls.set(calls.get() + 1);
                Ok(())
            })
            .unwrap_err();

        assert_eq!(calls.get(), 0);
        assert!(matches!(err, StepKitError::SpinTimeout(SpinTimeout { timeout }) if timeout.is_zero()));
    }

    #[tokio::test(start_paused = true)]
    async fn async_spin_retries_on_paused_clock() {
        let spinner = Spinner::new(
            SpinnerConfig::new(Duration::from_secs(10)).with_interval(Duration::from_secs(1)),
        );
        let mut calls = 0;
        let value: Result<u32> = spinner
            .wait_for_async(|| {
                calls += 1;
                let current = calls;
                async move {
                    if current < 4 {
                        Err(StepKitError::assertion("not yet"))
                    } else {
                        Ok(current)
                    }
                }
            })
            .await;

        assert_eq!(value.unwrap(), 4);
    }

    #[test]
    fn async_spin_times_out_with_last_error() {
        let spinner = fast_spinner(20);
        let err = tokio_test::block_on(spinner.wait_for_async(|| async {
            Err::<(), _>(StepKitError::TableNotFound {
                name: "users".into(),
            })
        }))
        .unwrap_err();

        assert_eq!(err.to_string(), "No table found with name 'users'");
    }
}
