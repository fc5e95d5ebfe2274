//! Worker configuration

use serde::{Deserialize, Serialize};
use stepkit_core::{Result, StepKitError};

/// Which slice of the suite this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// 0-based index of this worker.
    pub current_worker: usize,
    pub total_workers: usize,
    /// Treat every feature as a single unit (suites pre-expanded to one
    /// scenario per feature reference).
    #[serde(default)]
    pub line_mode: bool,
}

impl WorkerConfig {
    pub fn new(current_worker: usize, total_workers: usize) -> Self {
        Self {
            current_worker,
            total_workers,
            line_mode: false,
        }
    }

    pub fn with_line_mode(mut self, line_mode: bool) -> Self {
        self.line_mode = line_mode;
        self
    }

    /// Build from signed command-line values, rejecting negatives.
    pub fn from_signed(current_worker: i64, total_workers: i64) -> Result<Self> {
        if total_workers <= 0 {
            return Err(StepKitError::InvalidWorkerConfig {
                reason: format!("total workers must be at least 1, got {total_workers}"),
            });
        }
        if current_worker < 0 {
            return Err(StepKitError::InvalidWorkerConfig {
                reason: format!("worker index must not be negative, got {current_worker}"),
            });
        }

        let config = Self::new(to_usize(current_worker)?, to_usize(total_workers)?);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_workers == 0 {
            return Err(StepKitError::InvalidWorkerConfig {
                reason: "total workers must be at least 1, got 0".to_string(),
            });
        }
        if self.current_worker >= self.total_workers {
            return Err(StepKitError::InvalidWorkerConfig {
                reason: format!(
                    "worker index {} must be less than the total worker count {}",
                    self.current_worker, self.total_workers
                ),
            });
        }
        Ok(())
    }
}

fn to_usize(value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| StepKitError::InvalidWorkerConfig {
        reason: format!("{value} does not fit this platform's worker range"),
    })
}
