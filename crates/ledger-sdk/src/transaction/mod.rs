//! # Transactions
//!
//! Freeze, sign and submit.
//!
//! A transaction's signed bytes embed the node it is addressed to, so a
//! transaction that may go to any of N nodes exists as N bodies, each
//! signed separately. Only the body of the node the engine picks is sent.
//!
//! ```text
//! Unfrozen ──freeze──► Frozen(SignedBodies) ──execute──► Executed { node }
//!    │ setters            │ sign / add_signature
//! ```

mod bodies;
mod response;

pub use bodies::{FrozenBody, SignedBodies};
pub use response::TransactionResponse;

use std::time::Duration;

use ledger_crypto::{sha384, PublicKey, Sha384Digest};
use ledger_telemetry::log_tx_event;
use tracing::debug;

use crate::client::Client;
use crate::domain::{AccountId, Result, SdkError, Status, TopicId, TransactionId};
use crate::execute::{AttemptResult, Executable, ExecuteSettings};
use crate::network::Network;
use crate::ports::{Signer, Verifier};
use crate::wire::{
    self, AccountAmount, Request, Response, SignedTransaction, TransactionBody, TransactionData,
};

/// Default cap on the fee the payer accepts.
pub const DEFAULT_MAX_TRANSACTION_FEE: u64 = 200_000_000;
/// Default validity window after the valid start.
pub const DEFAULT_VALID_DURATION: Duration = Duration::from_secs(120);

/// Lifecycle of a transaction.
#[derive(Clone, Debug, Default)]
pub enum TransactionState {
    /// Fields may still change
    #[default]
    Unfrozen,
    /// Bodies are fixed; signatures may be added
    Frozen(SignedBodies),
    /// Submitted and accepted by `node`
    Executed {
        /// Node the transaction was sent to
        node: AccountId,
        /// SHA-384 of the signed transaction that was sent
        transaction_hash: Sha384Digest,
    },
}

/// A transaction under construction, frozen, or executed.
#[derive(Clone, Debug)]
pub struct Transaction {
    data: TransactionData,
    node_account_ids: Vec<AccountId>,
    transaction_id: Option<TransactionId>,
    max_transaction_fee: u64,
    valid_duration: Duration,
    memo: String,
    settings: Option<ExecuteSettings>,
    state: TransactionState,
}

impl Transaction {
    /// Transaction carrying `data`.
    pub fn new(data: TransactionData) -> Self {
        Self {
            data,
            node_account_ids: Vec::new(),
            transaction_id: None,
            max_transaction_fee: DEFAULT_MAX_TRANSACTION_FEE,
            valid_duration: DEFAULT_VALID_DURATION,
            memo: String::new(),
            settings: None,
            state: TransactionState::Unfrozen,
        }
    }

    /// Transfer between accounts. Amounts must sum to zero.
    pub fn crypto_transfer(transfers: Vec<AccountAmount>) -> Self {
        Self::new(TransactionData::CryptoTransfer { transfers })
    }

    /// Submit `message` to `topic_id`.
    pub fn submit_message(topic_id: TopicId, message: impl Into<Vec<u8>>) -> Self {
        Self::new(TransactionData::ConsensusSubmitMessage {
            topic_id,
            message: message.into(),
        })
    }

    fn ensure_unfrozen(&self) -> Result<()> {
        match self.state {
            TransactionState::Unfrozen => Ok(()),
            TransactionState::Frozen(_) => Err(SdkError::AlreadyFrozen),
            TransactionState::Executed { .. } => Err(SdkError::AlreadyExecuted),
        }
    }

    fn frozen_mut(&mut self) -> Result<&mut SignedBodies> {
        match &mut self.state {
            TransactionState::Frozen(bodies) => Ok(bodies),
            TransactionState::Unfrozen => Err(SdkError::NotFrozen),
            TransactionState::Executed { .. } => Err(SdkError::AlreadyExecuted),
        }
    }

    fn frozen(&self) -> Result<&SignedBodies> {
        match &self.state {
            TransactionState::Frozen(bodies) => Ok(bodies),
            TransactionState::Unfrozen => Err(SdkError::NotFrozen),
            TransactionState::Executed { .. } => Err(SdkError::AlreadyExecuted),
        }
    }

    // =========================================================================
    // Setters (Unfrozen only)
    // =========================================================================

    /// Restrict the nodes the transaction may be sent to.
    pub fn set_node_account_ids(&mut self, nodes: Vec<AccountId>) -> Result<&mut Self> {
        self.ensure_unfrozen()?;
        self.node_account_ids = nodes;
        Ok(self)
    }

    /// Set the transaction id explicitly.
    pub fn set_transaction_id(&mut self, transaction_id: TransactionId) -> Result<&mut Self> {
        self.ensure_unfrozen()?;
        self.transaction_id = Some(transaction_id);
        Ok(self)
    }

    /// Set the highest fee the payer accepts.
    pub fn set_max_transaction_fee(&mut self, fee: u64) -> Result<&mut Self> {
        self.ensure_unfrozen()?;
        self.max_transaction_fee = fee;
        Ok(self)
    }

    /// Set the memo.
    pub fn set_memo(&mut self, memo: impl Into<String>) -> Result<&mut Self> {
        self.ensure_unfrozen()?;
        self.memo = memo.into();
        Ok(self)
    }

    /// Set how long after the valid start the transaction is accepted.
    pub fn set_valid_duration(&mut self, valid_duration: Duration) -> Result<&mut Self> {
        self.ensure_unfrozen()?;
        self.valid_duration = valid_duration;
        Ok(self)
    }

    /// Override the client's attempt settings for this transaction.
    pub fn set_execute_settings(&mut self, settings: ExecuteSettings) -> &mut Self {
        self.settings = Some(settings);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Payload.
    pub fn data(&self) -> &TransactionData {
        &self.data
    }

    /// Candidate nodes: the frozen set once frozen, the requested set before.
    pub fn node_account_ids(&self) -> &[AccountId] {
        match &self.state {
            TransactionState::Frozen(bodies) => bodies.nodes(),
            _ => &self.node_account_ids,
        }
    }

    /// Transaction id, if assigned.
    pub fn transaction_id(&self) -> Option<&TransactionId> {
        self.transaction_id.as_ref()
    }

    /// Fee cap.
    pub fn max_transaction_fee(&self) -> u64 {
        self.max_transaction_fee
    }

    /// Memo.
    pub fn memo(&self) -> &str {
        &self.memo
    }

    /// Validity window.
    pub fn valid_duration(&self) -> Duration {
        self.valid_duration
    }

    /// Current lifecycle state.
    pub fn state(&self) -> &TransactionState {
        &self.state
    }

    /// True once frozen or executed.
    pub fn is_frozen(&self) -> bool {
        !matches!(self.state, TransactionState::Unfrozen)
    }

    // =========================================================================
    // Freezing
    // =========================================================================

    /// Fix the bodies against `network`.
    ///
    /// With no candidate nodes set, every node of the network is a
    /// candidate. Requires a transaction id.
    pub fn freeze(&mut self, network: &Network) -> Result<&mut Self> {
        self.ensure_unfrozen()?;
        let nodes = if self.node_account_ids.is_empty() {
            network.node_ids()
        } else {
            self.node_account_ids.clone()
        };
        self.freeze_for(network, nodes)
    }

    /// Fix the bodies using the client's operator and network.
    ///
    /// Fills in a transaction id from the operator, validates entity id
    /// checksums when the client asks for it, and with no candidate nodes
    /// set takes the healthy nodes first, capped by the client's
    /// `max_nodes_per_transaction`.
    pub fn freeze_with(&mut self, client: &Client) -> Result<&mut Self> {
        self.ensure_unfrozen()?;
        let network = client.network();

        if self.transaction_id.is_none() {
            let operator = client.operator().ok_or(SdkError::TransactionIdRequired)?;
            self.transaction_id = Some(TransactionId::generate(
                operator.account_id.clone(),
                client.now(),
            ));
        }

        if client.auto_validate_checksums() {
            let ledger_id = network.ledger_id();
            for entity in self.data.entity_ids() {
                entity.validate_checksum(ledger_id)?;
            }
            for node in &self.node_account_ids {
                node.validate_checksum(ledger_id)?;
            }
        }

        let nodes = if self.node_account_ids.is_empty() {
            network.transaction_candidates(client.max_nodes_per_transaction(), client.now())
        } else {
            self.node_account_ids.clone()
        };
        self.freeze_for(&network, nodes)
    }

    fn freeze_for(&mut self, network: &Network, nodes: Vec<AccountId>) -> Result<&mut Self> {
        let transaction_id = self
            .transaction_id
            .clone()
            .ok_or(SdkError::TransactionIdRequired)?;

        let mut bodies = SignedBodies::new();
        for node in nodes {
            if network.node(&node).is_none() {
                return Err(SdkError::UnknownNode(node));
            }
            let body = TransactionBody {
                transaction_id: transaction_id.clone(),
                node_account_id: node.clone(),
                transaction_fee: self.max_transaction_fee,
                valid_duration_secs: self.valid_duration.as_secs(),
                memo: self.memo.clone(),
                data: self.data.clone(),
            };
            bodies.insert(node, wire::encode_body(&body)?);
        }

        log_tx_event!(
            debug,
            "Transaction frozen",
            transaction_id,
            operation = self.data.kind(),
            nodes = bodies.nodes().len()
        );
        self.state = TransactionState::Frozen(bodies);
        Ok(self)
    }

    // =========================================================================
    // Signing
    // =========================================================================

    /// Sign every body with `signer`. Signing again with the same key
    /// replaces the earlier signatures.
    pub fn sign(&mut self, signer: &dyn Signer) -> Result<&mut Self> {
        self.frozen_mut()?.sign_all(signer)?;
        Ok(self)
    }

    /// Sign every body with the client's operator.
    pub fn sign_with_operator(&mut self, client: &Client) -> Result<&mut Self> {
        let operator = client.operator().ok_or(SdkError::OperatorRequired)?;
        self.sign(operator.signer.as_ref())
    }

    /// Attach a signature made offline over the body for `node`.
    pub fn add_signature(
        &mut self,
        node: &AccountId,
        public_key: &PublicKey,
        signature: Vec<u8>,
    ) -> Result<&mut Self> {
        self.frozen_mut()?
            .add_signature(node, public_key, signature)?;
        Ok(self)
    }

    /// Bytes to sign offline, per node.
    pub fn signable_bodies(&self) -> Result<Vec<(AccountId, Vec<u8>)>> {
        let bodies = self.frozen()?;
        Ok(bodies
            .nodes()
            .iter()
            .filter_map(|node| {
                bodies
                    .body(node)
                    .map(|body| (node.clone(), body.bytes.clone()))
            })
            .collect())
    }

    /// Check every collected signature.
    pub fn verify_signatures(&self, verifier: &dyn Verifier) -> Result<()> {
        self.frozen()?.verify(verifier)
    }

    /// Body and signatures as they would be sent to `node`.
    pub fn to_signed(&self, node: &AccountId) -> Result<SignedTransaction> {
        self.frozen()?.signed_transaction(node)
    }

    /// SHA-384 of the signed transaction for `node`.
    pub fn transaction_hash(&self, node: &AccountId) -> Result<Sha384Digest> {
        let signed = self.to_signed(node)?;
        Ok(sha384(&bincode::serialize(&signed)?))
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Submit the transaction.
    ///
    /// Freezes with the client if needed, signs with the operator when one
    /// is configured, then runs the attempt loop over the frozen nodes.
    pub async fn execute(&mut self, client: &Client) -> Result<TransactionResponse> {
        if let TransactionState::Executed { .. } = self.state {
            return Err(SdkError::AlreadyExecuted);
        }
        if !self.is_frozen() {
            self.freeze_with(client)?;
        }
        if client.operator().is_some() {
            self.sign_with_operator(client)?;
        }

        let transaction_id = self
            .transaction_id
            .clone()
            .ok_or(SdkError::TransactionIdRequired)?;
        let submit = Submit {
            name: self.data.kind(),
            transaction_id,
            bodies: self.frozen()?,
            settings: self.settings.as_ref(),
        };
        let response = client.execute(&submit).await?;
        let transaction_hash = self.transaction_hash(&response.node_id)?;

        log_tx_event!(
            info,
            "Transaction accepted",
            response.transaction_id,
            node = %response.node_id
        );
        self.state = TransactionState::Executed {
            node: response.node_id.clone(),
            transaction_hash,
        };
        Ok(response)
    }
}

/// One submission of a frozen transaction.
struct Submit<'a> {
    name: &'a str,
    transaction_id: TransactionId,
    bodies: &'a SignedBodies,
    settings: Option<&'a ExecuteSettings>,
}

impl Executable for Submit<'_> {
    type Output = TransactionResponse;

    fn name(&self) -> &str {
        self.name
    }

    fn candidate_nodes(&self) -> &[AccountId] {
        self.bodies.nodes()
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        Some(self.transaction_id.clone())
    }

    fn settings(&self) -> Option<&ExecuteSettings> {
        self.settings
    }

    fn make_request(&self, node: &AccountId) -> Result<Request> {
        Ok(Request::Transaction(self.bodies.signed_transaction(node)?))
    }

    fn classify(&self, response: &Response) -> AttemptResult {
        match response.precheck {
            Status::Ok => AttemptResult::Finished,
            status if status.is_node_fault() => AttemptResult::Retry,
            _ => AttemptResult::Error,
        }
    }

    fn make_output(&self, _response: Response, node: &AccountId) -> Result<TransactionResponse> {
        let signed = self.bodies.signed_transaction(node)?;
        debug!(node = %node, "Submission accepted");
        Ok(TransactionResponse {
            node_id: node.clone(),
            transaction_id: self.transaction_id.clone(),
            transaction_hash: sha384(&bincode::serialize(&signed)?).to_vec(),
            validate_status: true,
        })
    }
}
