//! Handle to a submitted transaction.

use crate::client::Client;
use crate::domain::{AccountId, Result, TransactionId, TransactionReceipt, TransactionRecord};
use crate::query::{TransactionReceiptQuery, TransactionRecordQuery};

/// What a node returned for an accepted submission.
///
/// Receipt and record polls go to the node that accepted the transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionResponse {
    /// Node that accepted the transaction
    pub node_id: AccountId,
    /// Id of the transaction
    pub transaction_id: TransactionId,
    /// SHA-384 of the signed transaction that was sent
    pub transaction_hash: Vec<u8>,
    /// Turn a non-success receipt into an error
    pub validate_status: bool,
}

impl TransactionResponse {
    /// Choose whether a non-success receipt is an error.
    pub fn with_validate_status(mut self, validate_status: bool) -> Self {
        self.validate_status = validate_status;
        self
    }

    /// Receipt poll pinned to the accepting node.
    pub fn receipt_query(&self) -> TransactionReceiptQuery {
        TransactionReceiptQuery::new(self.transaction_id.clone())
            .pinned_to(self.node_id.clone())
            .validate_status(self.validate_status)
    }

    /// Record poll pinned to the accepting node.
    pub fn record_query(&self) -> TransactionRecordQuery {
        TransactionRecordQuery::new(self.transaction_id.clone())
            .pinned_to(self.node_id.clone())
            .validate_status(self.validate_status)
    }

    /// Wait for the consensus receipt.
    pub async fn get_receipt(&self, client: &Client) -> Result<TransactionReceipt> {
        self.receipt_query().execute(client).await
    }

    /// Wait for the full record.
    pub async fn get_record(&self, client: &Client) -> Result<TransactionRecord> {
        self.record_query().execute(client).await
    }
}
