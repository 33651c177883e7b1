//! Wall-clock time source.

use crate::domain::Timestamp;
use crate::ports::TimeSource;

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
