//! # Entity Identifiers
//!
//! `shard.realm.num` identifiers with an optional advisory checksum.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::checksum::{generate_checksum, validate_checksum, LedgerId};
use super::errors::SdkError;

/// Identifier of an account, topic or other network entity.
///
/// The checksum never takes part in equality, ordering, hashing or
/// serialization.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EntityId {
    /// Shard number
    pub shard: u64,
    /// Realm number
    pub realm: u64,
    /// Entity number
    pub num: u64,
    /// Checksum supplied by the user, if any
    #[serde(skip)]
    pub checksum: Option<String>,
}

/// Account identity (payers, operators and consensus nodes).
pub type AccountId = EntityId;

/// Consensus topic identity.
pub type TopicId = EntityId;

impl EntityId {
    /// Create an id without a checksum.
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self {
            shard,
            realm,
            num,
            checksum: None,
        }
    }

    /// Shorthand for `0.0.num`.
    pub const fn from_num(num: u64) -> Self {
        Self::new(0, 0, num)
    }

    /// Attach a checksum.
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    /// Render as `shard.realm.num-checksum` for the given network.
    pub fn to_string_with_checksum(&self, ledger_id: &LedgerId) -> String {
        let address = self.to_string();
        let checksum = generate_checksum(ledger_id, &address);
        format!("{address}-{checksum}")
    }

    /// Validate the supplied checksum (if any) against `ledger_id`.
    pub fn validate_checksum(&self, ledger_id: &LedgerId) -> Result<(), SdkError> {
        validate_checksum(
            self.shard,
            self.realm,
            self.num,
            self.checksum.as_deref(),
            ledger_id,
        )
    }

    fn key(&self) -> (u64, u64, u64) {
        (self.shard, self.realm, self.num)
    }
}

impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for EntityId {}

impl Hash for EntityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for EntityId {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_error = || SdkError::EntityIdParse(s.to_string());

        let (address, checksum) = match s.split_once('-') {
            Some((address, checksum)) => (address, Some(checksum)),
            None => (s, None),
        };

        if let Some(checksum) = checksum {
            if checksum.len() != 5 || !checksum.bytes().all(|b| b.is_ascii_lowercase()) {
                return Err(parse_error());
            }
        }

        let mut parts = address.split('.');
        let mut next = || -> Result<u64, SdkError> {
            let part = parts.next().ok_or_else(parse_error)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(parse_error());
            }
            part.parse().map_err(|_| parse_error())
        };

        let shard = next()?;
        let realm = next()?;
        let num = next()?;
        if parts.next().is_some() {
            return Err(parse_error());
        }

        Ok(Self {
            shard,
            realm,
            num,
            checksum: checksum.map(str::to_string),
        })
    }
}
