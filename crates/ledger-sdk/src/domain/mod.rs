//! # Domain Layer
//!
//! Pure types of the SDK: identifiers, statuses, receipts, node health and
//! the checksum algorithm. Nothing in here performs I/O.

pub mod checksum;
pub mod entity_id;
pub mod errors;
pub mod managed_node;
pub mod node_address;
pub mod receipt;
pub mod status;
pub mod topic;
pub mod transaction_id;

pub use checksum::{generate_checksum, validate_checksum, LedgerId};
pub use entity_id::{AccountId, EntityId, TopicId};
pub use errors::{AttemptCause, Result, SdkError, TransportError};
pub use managed_node::{
    BackoffConfig, ManagedNode, NodeStats, DEFAULT_NODE_MAX_BACKOFF, DEFAULT_NODE_MIN_BACKOFF,
};
pub use node_address::{NodeAddress, TlsSettings, PLAINTEXT_PORT, TLS_PORT};
pub use receipt::{AccountBalance, TransactionReceipt, TransactionRecord};
pub use status::Status;
pub use topic::{TopicMessage, TopicQuery};
pub use transaction_id::{Timestamp, TransactionId};
