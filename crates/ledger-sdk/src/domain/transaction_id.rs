//! # Timestamps and Transaction Ids

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity_id::AccountId;
use super::errors::SdkError;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Lower bound of the valid-start backtrack applied by [`TransactionId::generate`].
pub const MIN_VALID_START_BACKTRACK: Duration = Duration::from_millis(5_000);
/// Upper bound of the valid-start backtrack applied by [`TransactionId::generate`].
pub const MAX_VALID_START_BACKTRACK: Duration = Duration::from_millis(8_000);

/// Wall-clock instant with nanosecond precision.
///
/// `nanos` is always below one second.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Timestamp {
    /// Seconds since the Unix epoch
    pub seconds: i64,
    /// Nanoseconds within the second
    pub nanos: u32,
}

impl Timestamp {
    /// Construct, normalizing `nanos` overflow into seconds.
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self::from_total_nanos(i128::from(seconds) * NANOS_PER_SEC + i128::from(nanos))
    }

    /// From milliseconds since the epoch.
    pub fn from_millis(millis: i64) -> Self {
        Self::from_total_nanos(i128::from(millis) * 1_000_000)
    }

    /// Milliseconds since the epoch.
    pub fn as_millis(&self) -> i64 {
        (self.total_nanos() / 1_000_000) as i64
    }

    /// Current system time.
    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }

    /// Elapsed time since `earlier`, or `None` if `earlier` is later.
    pub fn duration_since(&self, earlier: Timestamp) -> Option<Duration> {
        let diff = self.total_nanos() - earlier.total_nanos();
        u64::try_from(diff).ok().map(Duration::from_nanos)
    }

    fn total_nanos(&self) -> i128 {
        i128::from(self.seconds) * NANOS_PER_SEC + i128::from(self.nanos)
    }

    fn from_total_nanos(total: i128) -> Self {
        Self {
            seconds: total.div_euclid(NANOS_PER_SEC) as i64,
            nanos: total.rem_euclid(NANOS_PER_SEC) as u32,
        }
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Self::from_total_nanos(after.as_nanos() as i128),
            Err(before) => Self::from_total_nanos(-(before.duration().as_nanos() as i128)),
        }
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Self::Output {
        Self::from_total_nanos(self.total_nanos() + rhs.as_nanos() as i128)
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self::from_total_nanos(self.total_nanos() - rhs.as_nanos() as i128)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

/// Identifier of a transaction: payer plus valid-start time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    /// Account paying for the transaction
    pub account_id: AccountId,
    /// Earliest consensus time at which the transaction is valid
    pub valid_start: Timestamp,
    /// Whether this id refers to a scheduled execution
    pub scheduled: bool,
    /// Child nonce (0 for user-submitted transactions)
    pub nonce: i32,
}

impl TransactionId {
    /// Build an id with an explicit valid start.
    pub fn with_valid_start(account_id: AccountId, valid_start: Timestamp) -> Self {
        Self {
            account_id,
            valid_start,
            scheduled: false,
            nonce: 0,
        }
    }

    /// Generate an id for `account_id`, backdating the valid start by a random
    /// 5 to 8 seconds so a node with a slightly slow clock still accepts it.
    pub fn generate(account_id: AccountId, now: Timestamp) -> Self {
        let min = MIN_VALID_START_BACKTRACK.as_millis() as u64;
        let max = MAX_VALID_START_BACKTRACK.as_millis() as u64;
        let backtrack = rand::thread_rng().gen_range(min..max);
        Self::with_valid_start(account_id, now - Duration::from_millis(backtrack))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.account_id, self.valid_start)?;
        if self.scheduled {
            write!(f, "?scheduled")?;
        }
        if self.nonce != 0 {
            write!(f, "/{}", self.nonce)?;
        }
        Ok(())
    }
}

impl FromStr for TransactionId {
    type Err = SdkError;

    /// Parses `0.0.5005@1640995200.000000123`, optionally followed by
    /// `?scheduled` and `/nonce`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_error = || SdkError::TransactionIdParse(s.to_string());

        let (account, rest) = s.split_once('@').ok_or_else(parse_error)?;
        let account_id: AccountId = account.parse().map_err(|_| parse_error())?;

        let (rest, nonce) = match rest.split_once('/') {
            Some((head, nonce)) => (head, nonce.parse::<i32>().map_err(|_| parse_error())?),
            None => (rest, 0),
        };
        let (time, scheduled) = match rest.strip_suffix("?scheduled") {
            Some(head) => (head, true),
            None => (rest, false),
        };

        let (secs, nanos) = time.split_once('.').ok_or_else(parse_error)?;
        if nanos.is_empty() || nanos.len() > 9 || !nanos.bytes().all(|b| b.is_ascii_digit()) {
            return Err(parse_error());
        }
        let seconds: i64 = secs.parse().map_err(|_| parse_error())?;
        // Right-pad so "5" means 500_000_000ns
        let nanos: u32 = format!("{nanos:0<9}").parse().map_err(|_| parse_error())?;

        Ok(Self {
            account_id,
            valid_start: Timestamp::new(seconds, nanos),
            scheduled,
            nonce,
        })
    }
}
