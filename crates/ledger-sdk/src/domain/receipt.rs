//! # Receipts and Records
//!
//! Post-consensus outcomes returned by receipt and record polls.

use serde::{Deserialize, Serialize};

use super::entity_id::{AccountId, TopicId};
use super::status::Status;
use super::transaction_id::{Timestamp, TransactionId};

/// Consensus outcome of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Final status
    pub status: Status,
    /// Transaction the receipt belongs to
    pub transaction_id: Option<TransactionId>,
    /// Account created by the transaction, if any
    pub account_id: Option<AccountId>,
    /// Topic created by the transaction, if any
    pub topic_id: Option<TopicId>,
    /// Sequence number of a submitted topic message
    pub topic_sequence_number: u64,
    /// Receipts of child transactions (only when requested)
    pub children: Vec<TransactionReceipt>,
    /// Receipts of duplicate submissions (only when requested)
    pub duplicates: Vec<TransactionReceipt>,
}

impl TransactionReceipt {
    /// Receipt carrying only a status.
    pub fn from_status(status: Status) -> Self {
        Self {
            status,
            transaction_id: None,
            account_id: None,
            topic_id: None,
            topic_sequence_number: 0,
            children: Vec::new(),
            duplicates: Vec::new(),
        }
    }
}

/// Full record of an executed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Receipt portion of the record
    pub receipt: TransactionReceipt,
    /// SHA-384 hash of the submitted signed transaction
    pub transaction_hash: Vec<u8>,
    /// Consensus timestamp
    pub consensus_timestamp: Option<Timestamp>,
    /// Memo of the transaction
    pub memo: String,
    /// Fee actually charged
    pub transaction_fee: u64,
    /// Records of child transactions (only when requested)
    pub children: Vec<TransactionRecord>,
    /// Records of duplicate submissions (only when requested)
    pub duplicates: Vec<TransactionRecord>,
}

/// Balance of an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Account queried
    pub account_id: AccountId,
    /// Balance in the smallest denomination
    pub balance: u64,
}
