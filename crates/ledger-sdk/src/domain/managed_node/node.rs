//! Health record of a single consensus node.

use std::time::Duration;

use parking_lot::Mutex;

use super::config::BackoffConfig;
use crate::domain::{AccountId, NodeAddress, Timestamp};

/// Mutable health state, always accessed under the node's lock.
#[derive(Debug, Clone)]
struct NodeHealth {
    current_backoff: Duration,
    readmit_at: Option<Timestamp>,
    last_used: Option<Timestamp>,
    use_count: u64,
    failure_count: u64,
}

/// Point-in-time copy of a node's health.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStats {
    /// Node account id
    pub account_id: AccountId,
    /// Current backoff
    pub current_backoff: Duration,
    /// Time the node becomes healthy again, if benched
    pub readmit_at: Option<Timestamp>,
    /// Last time an attempt was sent to the node
    pub last_used: Option<Timestamp>,
    /// Attempts sent to the node
    pub use_count: u64,
    /// Failures charged to the node
    pub failure_count: u64,
}

/// A consensus node plus its health record.
///
/// Shared between all callers of one client; every update takes the node's
/// lock so concurrent failures are never lost.
#[derive(Debug)]
pub struct ManagedNode {
    address: NodeAddress,
    config: BackoffConfig,
    health: Mutex<NodeHealth>,
}

impl ManagedNode {
    /// Create a healthy node with `current_backoff = min_backoff`.
    pub fn new(address: NodeAddress, config: BackoffConfig) -> Self {
        Self {
            address,
            config,
            health: Mutex::new(NodeHealth {
                current_backoff: config.min_backoff,
                readmit_at: None,
                last_used: None,
                use_count: 0,
                failure_count: 0,
            }),
        }
    }

    /// Node account id.
    pub fn account_id(&self) -> &AccountId {
        &self.address.account_id
    }

    /// Node address.
    pub fn address(&self) -> &NodeAddress {
        &self.address
    }

    /// Backoff bounds.
    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    /// True iff the node is not benched at `now`.
    pub fn is_healthy(&self, now: Timestamp) -> bool {
        match self.health.lock().readmit_at {
            None => true,
            Some(readmit_at) => readmit_at < now,
        }
    }

    /// Double the backoff (capped) and bench the node until `now + backoff`.
    ///
    /// Returns the new backoff.
    pub fn record_failure(&self, now: Timestamp) -> Duration {
        let mut health = self.health.lock();
        health.failure_count += 1;
        health.current_backoff = health
            .current_backoff
            .saturating_mul(2)
            .min(self.config.max_backoff);
        health.readmit_at = Some(now + health.current_backoff);
        health.current_backoff
    }

    /// Halve the backoff (floored at the minimum).
    ///
    /// A pending readmit time is left to expire.
    pub fn record_success(&self) {
        let mut health = self.health.lock();
        health.current_backoff = (health.current_backoff / 2).max(self.config.min_backoff);
    }

    /// Count an attempt sent to this node.
    pub fn record_use(&self, now: Timestamp) {
        let mut health = self.health.lock();
        health.use_count += 1;
        health.last_used = Some(now);
    }

    /// Current backoff.
    pub fn current_backoff(&self) -> Duration {
        self.health.lock().current_backoff
    }

    /// Pending readmit time.
    pub fn readmit_at(&self) -> Option<Timestamp> {
        self.health.lock().readmit_at
    }

    /// Copy of the health record.
    pub fn snapshot(&self) -> NodeStats {
        let health = self.health.lock();
        NodeStats {
            account_id: self.address.account_id.clone(),
            current_backoff: health.current_backoff,
            readmit_at: health.readmit_at,
            last_used: health.last_used,
            use_count: health.use_count,
            failure_count: health.failure_count,
        }
    }
}
