//! # Queries
//!
//! Read-only requests run through the same attempt loop as transactions.
//!
//! A [`Query`] wraps a [`QueryData`] that knows the request body, how to
//! classify answers and how to turn the final answer into a value. The
//! wrapper owns the shared parts: candidate nodes, the optional payment
//! and per-query settings.
//!
//! ## Payment
//!
//! When a payment amount is set on a paid query, one crypto transfer from
//! the operator to each candidate node is frozen and signed up front, all
//! with the same transaction id. Each attempt carries the transfer for the
//! node it is sent to.

mod balance;
mod receipt;
mod record;

pub use balance::{AccountBalanceData, AccountBalanceQuery};
pub use receipt::{TransactionReceiptData, TransactionReceiptQuery};
pub use record::{TransactionRecordData, TransactionRecordQuery};

use std::collections::HashMap;

use tracing::debug;

use crate::client::Client;
use crate::domain::{AccountId, Result, SdkError, Status, TransactionId};
use crate::execute::{AttemptResult, Executable, ExecuteSettings};
use crate::network::Network;
use crate::transaction::Transaction;
use crate::wire::{
    AccountAmount, QueryBody, QueryHeader, QueryRequest, Request, Response, ResponseType,
    SignedTransaction,
};

/// Classification shared by most queries: `OK` finishes, node faults are
/// retried, everything else is a rejection.
pub fn classify_precheck(status: Status) -> AttemptResult {
    match status {
        Status::Ok => AttemptResult::Finished,
        status if status.is_node_fault() => AttemptResult::Retry,
        _ => AttemptResult::Error,
    }
}

/// The query-specific half of a [`Query`].
pub trait QueryData: Send + Sync {
    /// Value the query produces.
    type Output: Send;

    /// Query name for logs and metrics.
    fn name(&self) -> &str;

    /// Request payload.
    fn body(&self) -> QueryBody;

    /// Free queries never carry a payment.
    fn is_free(&self) -> bool {
        false
    }

    /// Node every attempt must go to.
    fn pinned_node(&self) -> Option<&AccountId> {
        None
    }

    /// Transaction the query concerns.
    fn transaction_id(&self) -> Option<TransactionId> {
        None
    }

    /// Entity ids whose checksums are validated before sending.
    fn entity_ids(&self) -> Vec<&AccountId> {
        Vec::new()
    }

    /// Decide what an answer means.
    fn classify(&self, response: &Response) -> AttemptResult {
        classify_precheck(response.precheck)
    }

    /// Whether a retryable answer is the node's fault.
    fn is_node_fault(&self, response: &Response) -> bool {
        response.precheck.is_node_fault()
    }

    /// Status reported for an answer.
    fn response_status(&self, response: &Response) -> Status {
        response.precheck
    }

    /// Error for a rejected answer.
    fn make_error(&self, response: &Response, node: &AccountId) -> SdkError {
        SdkError::PrecheckRejection {
            status: self.response_status(response),
            transaction_id: self.transaction_id(),
            node: node.clone(),
        }
    }

    /// Value of a finished answer.
    fn map_response(&self, response: Response) -> Result<Self::Output>;
}

/// A query ready to run.
#[derive(Clone, Debug)]
pub struct Query<D> {
    data: D,
    node_account_ids: Vec<AccountId>,
    payment: Option<u64>,
    settings: Option<ExecuteSettings>,
}

impl<D: QueryData> Query<D> {
    /// Query over `data`.
    pub fn from_data(data: D) -> Self {
        Self {
            data,
            node_account_ids: Vec::new(),
            payment: None,
            settings: None,
        }
    }

    /// Query-specific part.
    pub fn data(&self) -> &D {
        &self.data
    }

    /// Nodes the query may be sent to.
    pub fn node_account_ids(&self) -> &[AccountId] {
        &self.node_account_ids
    }

    /// Restrict the nodes the query may be sent to.
    pub fn set_node_account_ids(mut self, nodes: Vec<AccountId>) -> Self {
        self.node_account_ids = nodes;
        self
    }

    /// Pay `amount` to the answering node. Ignored by free queries.
    pub fn set_query_payment(mut self, amount: u64) -> Self {
        self.payment = Some(amount);
        self
    }

    /// Override the client's attempt settings.
    pub fn set_execute_settings(mut self, settings: ExecuteSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Run the query.
    pub async fn execute(&self, client: &Client) -> Result<D::Output> {
        let response = self.run(client, ResponseType::AnswerOnly).await?;
        self.data.map_response(response)
    }

    /// Ask a node what answering would cost.
    pub async fn get_cost(&self, client: &Client) -> Result<u64> {
        let response = self.run(client, ResponseType::CostAnswer).await?;
        Ok(response.cost)
    }

    pub(crate) async fn run(
        &self,
        client: &Client,
        response_type: ResponseType,
    ) -> Result<Response> {
        let network = client.network();
        if client.auto_validate_checksums() {
            for entity in self.data.entity_ids() {
                entity.validate_checksum(network.ledger_id())?;
            }
        }

        let pinned = self.data.pinned_node().cloned();
        let paid = response_type == ResponseType::AnswerOnly && !self.data.is_free();
        let mut candidates = match &pinned {
            Some(node) => vec![node.clone()],
            None => self.node_account_ids.clone(),
        };

        let payments = match self.payment {
            Some(amount) if paid => {
                if candidates.is_empty() {
                    candidates = network
                        .transaction_candidates(client.max_nodes_per_transaction(), client.now());
                }
                Some(build_payments(client, &network, &candidates, amount)?)
            }
            _ => None,
        };

        let attempts = Attempts {
            data: &self.data,
            candidates,
            pinned,
            payments,
            response_type,
            settings: self.settings.as_ref(),
        };
        client.execute(&attempts).await
    }
}

/// One crypto transfer per node paying `amount` from the operator.
fn build_payments(
    client: &Client,
    network: &Network,
    nodes: &[AccountId],
    amount: u64,
) -> Result<HashMap<AccountId, SignedTransaction>> {
    let operator = client.operator().ok_or(SdkError::OperatorRequired)?;
    let amount = i64::try_from(amount)
        .map_err(|_| SdkError::Config(format!("query payment {amount} is too large")))?;
    let transaction_id = TransactionId::generate(operator.account_id.clone(), client.now());

    let mut payments = HashMap::with_capacity(nodes.len());
    for node in nodes {
        let mut payment = Transaction::crypto_transfer(vec![
            AccountAmount {
                account_id: operator.account_id.clone(),
                amount: -amount,
            },
            AccountAmount {
                account_id: node.clone(),
                amount,
            },
        ]);
        payment
            .set_node_account_ids(vec![node.clone()])?
            .set_transaction_id(transaction_id.clone())?
            .freeze(network)?
            .sign(operator.signer.as_ref())?;
        payments.insert(node.clone(), payment.to_signed(node)?);
    }
    debug!(
        transaction_id = %transaction_id,
        nodes = payments.len(),
        "Query payments signed"
    );
    Ok(payments)
}

/// A query bound to one run's candidates and payments.
struct Attempts<'a, D> {
    data: &'a D,
    candidates: Vec<AccountId>,
    pinned: Option<AccountId>,
    payments: Option<HashMap<AccountId, SignedTransaction>>,
    response_type: ResponseType,
    settings: Option<&'a ExecuteSettings>,
}

impl<D: QueryData> Executable for Attempts<'_, D> {
    type Output = Response;

    fn name(&self) -> &str {
        self.data.name()
    }

    fn candidate_nodes(&self) -> &[AccountId] {
        &self.candidates
    }

    fn pinned_node(&self) -> Option<AccountId> {
        self.pinned.clone()
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        self.data.transaction_id()
    }

    fn settings(&self) -> Option<&ExecuteSettings> {
        self.settings
    }

    fn make_request(&self, node: &AccountId) -> Result<Request> {
        let payment = match &self.payments {
            Some(payments) => Some(
                payments
                    .get(node)
                    .cloned()
                    .ok_or_else(|| SdkError::UnknownNode(node.clone()))?,
            ),
            None => None,
        };
        Ok(Request::Query(QueryRequest {
            header: QueryHeader {
                payment,
                response_type: self.response_type,
            },
            body: self.data.body(),
        }))
    }

    fn classify(&self, response: &Response) -> AttemptResult {
        match self.response_type {
            ResponseType::CostAnswer => classify_precheck(response.precheck),
            ResponseType::AnswerOnly => self.data.classify(response),
        }
    }

    fn is_node_fault(&self, response: &Response) -> bool {
        self.data.is_node_fault(response)
    }

    fn response_status(&self, response: &Response) -> Status {
        self.data.response_status(response)
    }

    fn make_output(&self, response: Response, _node: &AccountId) -> Result<Response> {
        Ok(response)
    }

    fn make_error(&self, response: &Response, node: &AccountId) -> SdkError {
        self.data.make_error(response, node)
    }
}
