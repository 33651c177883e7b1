//! Receipt polling.

use super::{Query, QueryData};
use crate::domain::{AccountId, Result, SdkError, Status, TransactionId, TransactionReceipt};
use crate::execute::AttemptResult;
use crate::wire::{QueryBody, Response, ResponseBody};

/// Precheck of a poll: `None` when the node answered `OK`.
pub(super) fn classify_poll_precheck(status: Status) -> Option<AttemptResult> {
    match status {
        Status::Ok => None,
        Status::Busy | Status::PlatformNotActive => Some(AttemptResult::Retry),
        s if s.is_not_yet_available() => Some(AttemptResult::Retry),
        _ => Some(AttemptResult::Error),
    }
}

/// Status inside a receipt: anything short of a consensus outcome is
/// polled again.
pub(super) fn classify_receipt_status(status: Status, validate_status: bool) -> AttemptResult {
    match status {
        Status::Busy | Status::Ok | Status::PlatformNotActive => AttemptResult::Retry,
        s if s.is_not_yet_available() => AttemptResult::Retry,
        Status::Success => AttemptResult::Finished,
        _ if validate_status => AttemptResult::Error,
        _ => AttemptResult::Finished,
    }
}

/// Receipt poll parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionReceiptData {
    transaction_id: TransactionId,
    node: Option<AccountId>,
    include_children: bool,
    include_duplicates: bool,
    validate_status: bool,
}

/// Poll for the receipt of a transaction. Free.
pub type TransactionReceiptQuery = Query<TransactionReceiptData>;

impl TransactionReceiptQuery {
    /// Poll for `transaction_id` on any node.
    pub fn new(transaction_id: TransactionId) -> Self {
        Self::from_data(TransactionReceiptData {
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

    /// Also return receipts of child transactions.
    pub fn include_children(mut self, include: bool) -> Self {
        self.data.include_children = include;
        self
    }

    /// Also return receipts of duplicate submissions.
    pub fn include_duplicates(mut self, include: bool) -> Self {
        self.data.include_duplicates = include;
        self
    }

    /// Turn a receipt whose status is not `SUCCESS` into
    /// [`SdkError::ReceiptRejection`].
    pub fn validate_status(mut self, validate: bool) -> Self {
        self.data.validate_status = validate;
        self
    }
}

impl QueryData for TransactionReceiptData {
    type Output = TransactionReceipt;

    fn name(&self) -> &str {
        "transaction_receipt"
    }

    fn body(&self) -> QueryBody {
        QueryBody::TransactionReceipt {
            transaction_id: self.transaction_id.clone(),
            include_children: self.include_children,
            include_duplicates: self.include_duplicates,
        }
    }

    fn is_free(&self) -> bool {
        true
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
            ResponseBody::Receipt(receipt) => {
                classify_receipt_status(receipt.status, self.validate_status)
            }
            _ => AttemptResult::Finished,
        }
    }

    fn response_status(&self, response: &Response) -> Status {
        match &response.body {
            ResponseBody::Receipt(receipt) if response.precheck == Status::Ok => receipt.status,
            _ => response.precheck,
        }
    }

    fn make_error(&self, response: &Response, node: &AccountId) -> SdkError {
        match &response.body {
            ResponseBody::Receipt(receipt) if response.precheck == Status::Ok => {
                SdkError::ReceiptRejection {
                    status: receipt.status,
                    transaction_id: self.transaction_id.clone(),
                    receipt: Box::new(receipt.clone()),
                }
            }
            _ => SdkError::PrecheckRejection {
                status: response.precheck,
                transaction_id: Some(self.transaction_id.clone()),
                node: node.clone(),
            },
        }
    }

    fn map_response(&self, response: Response) -> Result<TransactionReceipt> {
        match response.body {
            ResponseBody::Receipt(receipt) => Ok(receipt),
            other => Err(SdkError::UnexpectedResponse(format!(
                "expected a receipt, got {other:?}"
            ))),
        }
    }
}
