//! # Domain Errors
//!
//! Every call resolves to exactly one outcome. Transport faults and node
//! overload are retried inside the engine; everything below that reaches a
//! caller is final for that call.

use std::fmt;
use std::time::Duration;

use ledger_crypto::CryptoError;
use thiserror::Error;

use super::entity_id::AccountId;
use super::receipt::TransactionReceipt;
use super::status::Status;
use super::transaction_id::TransactionId;

/// Result alias used throughout the SDK.
pub type Result<T> = std::result::Result<T, SdkError>;

/// Failure to exchange bytes with a node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Could not establish a connection
    #[error("Failed to connect to {address}: {reason}")]
    Connect {
        /// Endpoint dialed
        address: String,
        /// Underlying cause
        reason: String,
    },

    /// No response within the per-call timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Channel was closed
    #[error("Channel closed")]
    Closed,

    /// Read or write failed mid-request
    #[error("I/O error: {0}")]
    Io(String),

    /// Peer sent a frame larger than allowed
    #[error("Frame of {size} bytes exceeds limit of {limit}")]
    FrameTooLarge {
        /// Announced frame size
        size: usize,
        /// Configured maximum
        limit: usize,
    },

    /// The channel factory cannot satisfy the network's TLS settings
    #[error("TLS is enabled but not supported by this channel factory")]
    TlsUnsupported,
}

impl TransportError {
    /// Failures caused by the client's own setup rather than the node.
    ///
    /// Not retried, and never charged to the node's health record.
    pub fn is_client_side(&self) -> bool {
        matches!(self, Self::TlsUnsupported)
    }
}

/// Last retryable condition seen before the attempt budget ran out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptCause {
    /// Transport-level failure
    Transport(TransportError),
    /// Retryable status code
    Status(Status),
}

impl fmt::Display for AttemptCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Status(s) => write!(f, "status: {s}"),
        }
    }
}

fn describe_cause(cause: &Option<AttemptCause>) -> String {
    cause
        .as_ref()
        .map_or_else(|| "none".to_string(), ToString::to_string)
}

fn describe_node(node: &Option<AccountId>) -> String {
    node.as_ref()
        .map_or_else(|| "none".to_string(), ToString::to_string)
}

fn describe_tx(id: &Option<TransactionId>) -> String {
    id.as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string)
}

/// SDK error taxonomy.
#[derive(Debug, Error)]
pub enum SdkError {
    /// Transport failure surfaced outside the retry loop
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// A node rejected the request before consensus
    #[error("Precheck rejected with {status} (transaction {}, node {node})", describe_tx(.transaction_id))]
    PrecheckRejection {
        /// Status returned by the node
        status: Status,
        /// Transaction the request carried, if any
        transaction_id: Option<TransactionId>,
        /// Node that answered
        node: AccountId,
    },

    /// A receipt reported a failed consensus outcome
    #[error("Receipt for transaction {transaction_id} has status {status}")]
    ReceiptRejection {
        /// Status in the receipt
        status: Status,
        /// Transaction the receipt belongs to
        transaction_id: TransactionId,
        /// The receipt itself
        receipt: Box<TransactionReceipt>,
    },

    /// Attempt budget consumed without a final outcome
    #[error("Gave up after {attempts} attempts (last node {}, last cause {})", describe_node(.last_node), describe_cause(.last_cause))]
    AttemptsExhausted {
        /// Attempts made
        attempts: u32,
        /// Node of the final attempt
        last_node: Option<AccountId>,
        /// Last retryable condition
        last_cause: Option<AttemptCause>,
    },

    /// A supplied checksum does not match the network
    #[error("Checksum mismatch for {entity}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Entity address
        entity: String,
        /// Recomputed checksum
        expected: String,
        /// Supplied checksum
        actual: String,
    },

    /// Malformed entity id string
    #[error("Invalid entity id: {0:?}")]
    EntityIdParse(String),

    /// Malformed transaction id string
    #[error("Invalid transaction id: {0:?}")]
    TransactionIdParse(String),

    /// Candidate set does not intersect the registry
    #[error("No eligible nodes for the requested candidates")]
    NoEligibleNodes,

    /// Node is not part of the network
    #[error("Node {0} is not part of the network")]
    UnknownNode(AccountId),

    /// Mutation attempted on a frozen transaction
    #[error("Transaction is already frozen")]
    AlreadyFrozen,

    /// Signing or serialization attempted before freezing
    #[error("Transaction must be frozen first")]
    NotFrozen,

    /// Transaction was already executed
    #[error("Transaction was already executed")]
    AlreadyExecuted,

    /// Freeze attempted without a transaction id
    #[error("Transaction id must be set before freezing")]
    TransactionIdRequired,

    /// Operation needs an operator and none is configured
    #[error("Client has no operator")]
    OperatorRequired,

    /// A signature on a body failed verification
    #[error("Invalid signature by {public_key} on body for node {node}")]
    SignatureVerification {
        /// Node whose body carries the signature
        node: AccountId,
        /// Hex of the signing key
        public_key: String,
    },

    /// Key material or signing failure
    #[error("Signing failed: {0}")]
    Signing(#[from] CryptoError),

    /// Wire encoding or decoding failure
    #[error("Codec error: {0}")]
    Codec(String),

    /// Node answered with an unexpected response body
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Streaming subscription failure
    #[error("Subscription failed: {0}")]
    Subscription(String),

    /// `join` did not complete in time
    #[error("Subscription did not finish within {0:?}")]
    JoinTimeout(Duration),
}

impl From<bincode::Error> for SdkError {
    fn from(e: bincode::Error) -> Self {
        Self::Codec(e.to_string())
    }
}

impl SdkError {
    /// Status carried by a rejection, if any.
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::PrecheckRejection { status, .. } | Self::ReceiptRejection { status, .. } => {
                Some(*status)
            }
            Self::AttemptsExhausted {
                last_cause: Some(AttemptCause::Status(status)),
                ..
            } => Some(*status),
            _ => None,
        }
    }
}
