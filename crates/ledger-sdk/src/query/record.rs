//! Record polling.

use super::receipt::{classify_poll_precheck, classify_receipt_status};
use super::{Query, QueryData};
use crate::domain::{AccountId, Result, SdkError, Status, TransactionId, TransactionRecord};
use crate::execute::AttemptResult;
use crate::wire::{QueryBody, Response, ResponseBody};

/// Record poll parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRecordData {
    transaction_id: TransactionId,
    node: Option<AccountId>,
    include_children: bool,
    include_duplicates: bool,
    validate_status: bool,
}

/// Poll for the full record of a transaction.
pub type TransactionRecordQuery = Query<TransactionRecordData>;

impl TransactionRecordQuery {
    /// Poll for `transaction_id` on any node.
    pub fn new(transaction_id: TransactionId) -> Self {
        Self::from_data(TransactionRecordData {
            transaction_id,
            node: None,
            include_children: false,
            include_duplicates: false,
            validate_status: false,
        })
    }

    /// Send every attempt to `node`.
    pub fn pinned_to(mut self, node: AccountId) -> Self {
        self.data.node = Some(node);
        self
    }

    /// Also return records of child transactions.
    pub fn include_children(mut self, include: bool) -> Self {
        self.data.include_children = include;
        self
    }

    /// Also return records of duplicate submissions.
    pub fn include_duplicates(mut self, include: bool) -> Self {
        self.data.include_duplicates = include;
        self
    }

    /// Turn a record whose receipt status is not `SUCCESS` into
    /// [`SdkError::ReceiptRejection`].
    pub fn validate_status(mut self, validate: bool) -> Self {
        self.data.validate_status = validate;
        self
    }
}

impl QueryData for TransactionRecordData {
    type Output = TransactionRecord;

    fn name(&self) -> &str {
        "transaction_record"
    }

    fn body(&self) -> QueryBody {
        QueryBody::TransactionRecord {
            transaction_id: self.transaction_id.clone(),
            include_children: self.include_children,
            include_duplicates: self.include_duplicates,
        }
    }

    fn pinned_node(&self) -> Option<&AccountId> {
        self.node.as_ref()
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        Some(self.transaction_id.clone())
    }

    fn classify(&self, response: &Response) -> AttemptResult {
        if let Some(result) = classify_poll_precheck(response.precheck) {
            return result;
        }
        match &response.body {
            ResponseBody::Record(record) => {
                classify_receipt_status(record.receipt.status, self.validate_status)
            }
            _ => AttemptResult::Finished,
        }
    }

    fn response_status(&self, response: &Response) -> Status {
        match &response.body {
            ResponseBody::Record(record) if response.precheck == Status::Ok => {
                record.receipt.status
            }
            _ => response.precheck,
        }
    }

    fn make_error(&self, response: &Response, node: &AccountId) -> SdkError {
        match &response.body {
            ResponseBody::Record(record) if response.precheck == Status::Ok => {
                SdkError::ReceiptRejection {
                    status: record.receipt.status,
                    transaction_id: self.transaction_id.clone(),
                    receipt: Box::new(record.receipt.clone()),
                }
            }
            _ => SdkError::PrecheckRejection {
                status: response.precheck,
                transaction_id: Some(self.transaction_id.clone()),
                node: node.clone(),
            },
        }
    }

    fn map_response(&self, response: Response) -> Result<TransactionRecord> {
        match response.body {
            ResponseBody::Record(record) => Ok(record),
            other => Err(SdkError::UnexpectedResponse(format!(
                "expected a record, got {other:?}"
            ))),
        }
    }
}
