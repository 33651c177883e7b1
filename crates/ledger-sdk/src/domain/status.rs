//! # Response Status Codes
//!
//! Codes returned by consensus nodes, both as a pre-consensus precheck and as
//! the final status inside a receipt.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status code reported by a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Precheck passed
    Ok,
    /// Transaction reached consensus and succeeded
    Success,
    /// Node is overloaded
    Busy,
    /// Node platform is not yet active
    PlatformNotActive,
    /// Node failed to create the platform transaction
    PlatformTransactionNotCreated,
    /// Consensus outcome not yet known
    Unknown,
    /// No receipt is stored for this transaction id yet
    ReceiptNotFound,
    /// No record is stored for this transaction id yet
    RecordNotFound,
    /// Transaction bytes could not be parsed
    InvalidTransaction,
    /// A required signature is missing or invalid
    InvalidSignature,
    /// A transaction with the same id was already submitted
    DuplicateTransaction,
    /// Valid-start plus valid-duration is in the past
    TransactionExpired,
    /// Valid-start is ahead of the node's clock
    InvalidTransactionStart,
    /// Valid duration outside the accepted range
    InvalidTransactionDuration,
    /// Embedded node account does not match the receiving node
    InvalidNodeAccount,
    /// Referenced account does not exist
    InvalidAccountId,
    /// Referenced topic does not exist
    InvalidTopicId,
    /// Fee offered is below the required fee
    InsufficientTxFee,
    /// Payer cannot cover the fee
    InsufficientPayerBalance,
    /// A debited account cannot cover the transfer
    InsufficientAccountBalance,
    /// Payer account does not exist
    PayerAccountNotFound,
    /// Referenced account was deleted
    AccountDeleted,
    /// Memo exceeds the maximum length
    MemoTooLong,
    /// Operation is not supported by this node
    NotSupported,
    /// Any code this client does not model
    Other(i32),
}

impl Status {
    /// Statuses that reflect a problem with the node rather than the request.
    ///
    /// Retried, and charged to the node's health record.
    pub fn is_node_fault(&self) -> bool {
        matches!(
            self,
            Self::Busy | Self::PlatformNotActive | Self::PlatformTransactionNotCreated
        )
    }

    /// Statuses meaning the outcome exists but has not been reported yet.
    pub fn is_not_yet_available(&self) -> bool {
        matches!(
            self,
            Self::Unknown | Self::ReceiptNotFound | Self::RecordNotFound
        )
    }

    /// Label used in metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Success => "SUCCESS",
            Self::Busy => "BUSY",
            Self::PlatformNotActive => "PLATFORM_NOT_ACTIVE",
            Self::PlatformTransactionNotCreated => "PLATFORM_TRANSACTION_NOT_CREATED",
            Self::Unknown => "UNKNOWN",
            Self::ReceiptNotFound => "RECEIPT_NOT_FOUND",
            Self::RecordNotFound => "RECORD_NOT_FOUND",
            Self::InvalidTransaction => "INVALID_TRANSACTION",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::DuplicateTransaction => "DUPLICATE_TRANSACTION",
            Self::TransactionExpired => "TRANSACTION_EXPIRED",
            Self::InvalidTransactionStart => "INVALID_TRANSACTION_START",
            Self::InvalidTransactionDuration => "INVALID_TRANSACTION_DURATION",
            Self::InvalidNodeAccount => "INVALID_NODE_ACCOUNT",
            Self::InvalidAccountId => "INVALID_ACCOUNT_ID",
            Self::InvalidTopicId => "INVALID_TOPIC_ID",
            Self::InsufficientTxFee => "INSUFFICIENT_TX_FEE",
            Self::InsufficientPayerBalance => "INSUFFICIENT_PAYER_BALANCE",
            Self::InsufficientAccountBalance => "INSUFFICIENT_ACCOUNT_BALANCE",
            Self::PayerAccountNotFound => "PAYER_ACCOUNT_NOT_FOUND",
            Self::AccountDeleted => "ACCOUNT_DELETED",
            Self::MemoTooLong => "MEMO_TOO_LONG",
            Self::NotSupported => "NOT_SUPPORTED",
            Self::Other(_) => "OTHER",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(code) => write!(f, "OTHER({code})"),
            other => f.write_str(other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_fault_set() {
        assert!(Status::Busy.is_node_fault());
        assert!(Status::PlatformNotActive.is_node_fault());
        assert!(Status::PlatformTransactionNotCreated.is_node_fault());
        assert!(!Status::Unknown.is_node_fault());
        assert!(!Status::InvalidSignature.is_node_fault());
    }

    #[test]
    fn test_not_yet_available_set() {
        assert!(Status::ReceiptNotFound.is_not_yet_available());
        assert!(!Status::Busy.is_not_yet_available());
    }

    #[test]
    fn test_display() {
        assert_eq!(Status::DuplicateTransaction.to_string(), "DUPLICATE_TRANSACTION");
        assert_eq!(Status::Other(999).to_string(), "OTHER(999)");
    }
}
