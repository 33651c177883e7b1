//! Attempt budget, per-call timeout and retry backoff.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::SdkError;

/// Default attempt budget.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
/// Default timeout of a single send.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Default first retry delay.
pub const DEFAULT_MIN_BACKOFF: Duration = Duration::from_millis(250);
/// Default cap on the retry delay.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Settings of the attempt loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSettings {
    /// Attempts before giving up (at least 1)
    pub max_attempts: u32,
    /// Timeout of each send
    pub request_timeout: Duration,
    /// Delay before the first retry
    pub min_backoff: Duration,
    /// Cap on the retry delay
    pub max_backoff: Duration,
}

impl Default for ExecuteSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            min_backoff: DEFAULT_MIN_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl ExecuteSettings {
    /// Short timeouts for tests.
    pub fn for_testing() -> Self {
        Self {
            max_attempts: 5,
            request_timeout: Duration::from_secs(1),
            min_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(100),
        }
    }

    /// Check the settings are usable.
    pub fn validate(&self) -> Result<(), SdkError> {
        if self.max_attempts == 0 {
            return Err(SdkError::Config("max_attempts must be at least 1".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(SdkError::Config("request_timeout must be positive".into()));
        }
        if self.min_backoff > self.max_backoff {
            return Err(SdkError::Config(format!(
                "min_backoff {:?} exceeds max_backoff {:?}",
                self.min_backoff, self.max_backoff
            )));
        }
        Ok(())
    }

    /// Delay after the retryable attempt numbered `attempt` (zero-based):
    /// `min(min_backoff * 2^attempt, max_backoff)`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.min_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }
}
