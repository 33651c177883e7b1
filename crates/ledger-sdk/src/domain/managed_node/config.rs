//! Node backoff configuration.

use std::time::Duration;

use crate::domain::SdkError;

/// Default lower bound of a node's backoff.
pub const DEFAULT_NODE_MIN_BACKOFF: Duration = Duration::from_secs(8);
/// Default upper bound of a node's backoff.
pub const DEFAULT_NODE_MAX_BACKOFF: Duration = Duration::from_secs(3600);

/// Bounds of a node's backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Backoff of a fresh node, and the floor successes converge to
    pub min_backoff: Duration,
    /// Cap on the backoff after repeated failures
    pub max_backoff: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_backoff: DEFAULT_NODE_MIN_BACKOFF,
            max_backoff: DEFAULT_NODE_MAX_BACKOFF,
        }
    }
}

impl BackoffConfig {
    /// Short backoffs for tests
    pub fn for_testing() -> Self {
        Self {
            min_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(8),
        }
    }

    /// Reject a zero floor or a floor above the cap.
    pub fn validate(&self) -> Result<(), SdkError> {
        if self.min_backoff.is_zero() {
            return Err(SdkError::Config("node min backoff must be positive".into()));
        }
        if self.min_backoff > self.max_backoff {
            return Err(SdkError::Config(format!(
                "node min backoff {:?} exceeds max backoff {:?}",
                self.min_backoff, self.max_backoff
            )));
        }
        Ok(())
    }
}
