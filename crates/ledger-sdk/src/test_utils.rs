//! # Test Utilities
//!
//! In-memory stand-ins for the outbound ports, so the engine can be driven
//! deterministically without sockets or wall-clock time.
//!
//! | Port | Stand-in |
//! |------|----------|
//! | `TimeSource` | [`ManualTimeSource`] |
//! | `Channel` | [`ScriptedNode`] |
//! | `ChannelFactory` | [`ScriptedChannelFactory`] |
//! | `Signer` | [`RecordingSigner`] |
//! | `MirrorConnector` | [`ScriptedMirror`] |
//!
//! Enabled for unit tests and, through the `test-utils` feature, for
//! downstream integration tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ledger_crypto::{KeyType, PrivateKey, PublicKey};
use parking_lot::Mutex;

use crate::client::Client;
use crate::domain::{
    AccountId, LedgerId, NodeAddress, SdkError, Status, Timestamp, TlsSettings, TopicMessage,
    TopicQuery, TransactionReceipt, TransportError,
};
use crate::execute::ExecuteSettings;
use crate::network::{Network, NetworkOptions};
use crate::ports::{Channel, ChannelFactory, MessageStream, MirrorConnector, Signer, TimeSource};
use crate::wire::{self, Request, Response, SignedTransaction, TransactionBody};

// =============================================================================
// TIME
// =============================================================================

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualTimeSource {
    now: Mutex<Timestamp>,
}

impl ManualTimeSource {
    /// Clock starting at `now`.
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock starting at `seconds` past the epoch.
    pub fn at_secs(seconds: i64) -> Self {
        Self::new(Timestamp::new(seconds, 0))
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = *now + by;
    }

    /// Jump to `now`.
    pub fn set(&self, now: Timestamp) {
        *self.now.lock() = now;
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}

// =============================================================================
// NODES
// =============================================================================

/// What a scripted node does with one request.
#[derive(Clone, Debug)]
pub enum ScriptedReply {
    /// Answer with this response
    Respond(Response),
    /// Answer with raw bytes
    Raw(Vec<u8>),
    /// Fail at the transport level
    Fail(TransportError),
    /// Never answer
    Hang,
}

impl ScriptedReply {
    /// Response carrying only `precheck`.
    pub fn status(precheck: Status) -> Self {
        Self::Respond(Response::status(precheck))
    }

    /// Receipt poll answer with the given receipt status.
    pub fn receipt(status: Status) -> Self {
        Self::Respond(Response::receipt(TransactionReceipt::from_status(status)))
    }
}

/// Address used for a scripted node `0.0.<num>`.
pub fn scripted_address(num: u64) -> NodeAddress {
    NodeAddress {
        account_id: AccountId::from_num(num),
        host: format!("node{num}.test"),
        port: crate::domain::PLAINTEXT_PORT,
        cert_hash: None,
    }
}

/// A node whose answers are queued up front.
///
/// Transactions and queries have separate queues. When a queue is empty the
/// fallback reply is used, which starts as an `OK` precheck.
#[derive(Debug)]
pub struct ScriptedNode {
    account_id: AccountId,
    transaction_replies: Mutex<VecDeque<ScriptedReply>>,
    query_replies: Mutex<VecDeque<ScriptedReply>>,
    fallback: Mutex<ScriptedReply>,
    received: Mutex<Vec<Request>>,
    closed: AtomicBool,
}

impl ScriptedNode {
    /// Node answering `OK` to everything.
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            transaction_replies: Mutex::new(VecDeque::new()),
            query_replies: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(ScriptedReply::status(Status::Ok)),
            received: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Node account id.
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Queue the reply to the next transaction submission.
    pub fn push_transaction_reply(&self, reply: ScriptedReply) {
        self.transaction_replies.lock().push_back(reply);
    }

    /// Queue the reply to the next query.
    pub fn push_query_reply(&self, reply: ScriptedReply) {
        self.query_replies.lock().push_back(reply);
    }

    /// Reply used once the matching queue is empty.
    pub fn set_fallback(&self, reply: ScriptedReply) {
        *self.fallback.lock() = reply;
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.received.lock().clone()
    }

    /// Number of requests received.
    pub fn request_count(&self) -> usize {
        self.received.lock().len()
    }

    /// Signed transactions received, in order.
    pub fn transactions(&self) -> Vec<SignedTransaction> {
        self.received
            .lock()
            .iter()
            .filter_map(|request| match request {
                Request::Transaction(signed) => Some(signed.clone()),
                Request::Query(_) => None,
            })
            .collect()
    }

    /// Decoded bodies of the transactions received.
    pub fn transaction_bodies(&self) -> Vec<TransactionBody> {
        self.transactions()
            .iter()
            .filter_map(|signed| wire::decode_body(&signed.body_bytes).ok())
            .collect()
    }

    /// True once the channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Channel for ScriptedNode {
    async fn send(&self, request: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let decoded =
            wire::decode_request(&request).map_err(|e| TransportError::Io(e.to_string()))?;
        let is_transaction = matches!(decoded, Request::Transaction(_));
        self.received.lock().push(decoded);

        let queued = if is_transaction {
            self.transaction_replies.lock().pop_front()
        } else {
            self.query_replies.lock().pop_front()
        };
        let reply = queued.unwrap_or_else(|| self.fallback.lock().clone());

        match reply {
            ScriptedReply::Respond(response) => {
                wire::encode_response(&response).map_err(|e| TransportError::Io(e.to_string()))
            }
            ScriptedReply::Raw(bytes) => Ok(bytes),
            ScriptedReply::Fail(error) => Err(error),
            ScriptedReply::Hang => {
                std::future::pending::<()>().await;
                Err(TransportError::Closed)
            }
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Hands out [`ScriptedNode`]s by account id.
#[derive(Debug, Default)]
pub struct ScriptedChannelFactory {
    nodes: Mutex<HashMap<AccountId, Arc<ScriptedNode>>>,
    opened: AtomicUsize,
}

impl ScriptedChannelFactory {
    /// Factory with no nodes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register node `0.0.<num>` and return it.
    pub fn add_node(&self, num: u64) -> Arc<ScriptedNode> {
        let id = AccountId::from_num(num);
        Arc::clone(
            self.nodes
                .lock()
                .entry(id.clone())
                .or_insert_with(|| Arc::new(ScriptedNode::new(id))),
        )
    }

    /// Node `0.0.<num>`, if registered.
    pub fn node(&self, num: u64) -> Option<Arc<ScriptedNode>> {
        self.nodes.lock().get(&AccountId::from_num(num)).cloned()
    }

    /// Channels opened so far.
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelFactory for ScriptedChannelFactory {
    async fn open(
        &self,
        address: &NodeAddress,
        tls: &TlsSettings,
    ) -> Result<Arc<dyn Channel>, TransportError> {
        let node = self
            .nodes
            .lock()
            .get(&address.account_id)
            .cloned()
            .ok_or_else(|| TransportError::Connect {
                address: address.endpoint(tls),
                reason: "no scripted node".into(),
            })?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(node)
    }
}

// =============================================================================
// SIGNING
// =============================================================================

/// Signer that keeps every message it signed.
#[derive(Debug)]
pub struct RecordingSigner {
    key: PrivateKey,
    signed: Mutex<Vec<Vec<u8>>>,
}

impl RecordingSigner {
    /// Signer over a fresh key.
    pub fn new(key_type: KeyType) -> Self {
        Self::from_key(PrivateKey::generate(key_type))
    }

    /// Signer over `key`.
    pub fn from_key(key: PrivateKey) -> Self {
        Self {
            key,
            signed: Mutex::new(Vec::new()),
        }
    }

    /// Messages signed so far.
    pub fn signed_messages(&self) -> Vec<Vec<u8>> {
        self.signed.lock().clone()
    }
}

impl Signer for RecordingSigner {
    fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SdkError> {
        self.signed.lock().push(message.to_vec());
        Ok(self.key.sign(message))
    }
}

// =============================================================================
// MIRROR
// =============================================================================

/// One event of a scripted stream.
#[derive(Clone, Debug)]
pub enum StreamEvent {
    /// Deliver a message
    Message(TopicMessage),
    /// Fail the stream
    Error(TransportError),
    /// Stay open without delivering anything
    Idle,
}

/// Mirror whose sessions are queued up front.
///
/// Each `subscribe` consumes one session. Once none are left the stream
/// stays open and idle.
#[derive(Debug, Default)]
pub struct ScriptedMirror {
    sessions: Mutex<VecDeque<Result<Vec<StreamEvent>, TransportError>>>,
    queries: Mutex<Vec<TopicQuery>>,
}

impl ScriptedMirror {
    /// Mirror with no sessions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a session delivering `events` and then completing.
    pub fn push_session(&self, events: Vec<StreamEvent>) {
        self.sessions.lock().push_back(Ok(events));
    }

    /// Queue a failed connection attempt.
    pub fn push_connect_failure(&self, error: TransportError) {
        self.sessions.lock().push_back(Err(error));
    }

    /// Queries received, one per connection attempt.
    pub fn queries(&self) -> Vec<TopicQuery> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl MirrorConnector for ScriptedMirror {
    async fn subscribe(
        &self,
        _address: &str,
        query: &TopicQuery,
    ) -> Result<Box<dyn MessageStream>, TransportError> {
        self.queries.lock().push(query.clone());
        let session = self
            .sessions
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![StreamEvent::Idle]));
        Ok(Box::new(ScriptedStream {
            events: session?.into(),
        }))
    }
}

/// Stream replaying a fixed list of events.
#[derive(Debug)]
pub struct ScriptedStream {
    events: VecDeque<StreamEvent>,
}

#[async_trait]
impl MessageStream for ScriptedStream {
    async fn next_message(&mut self) -> Option<Result<TopicMessage, TransportError>> {
        match self.events.pop_front()? {
            StreamEvent::Message(message) => Some(Ok(message)),
            StreamEvent::Error(error) => Some(Err(error)),
            StreamEvent::Idle => {
                std::future::pending::<()>().await;
                None
            }
        }
    }
}

// =============================================================================
// HARNESS
// =============================================================================

/// Account id of the harness operator.
pub const TEST_OPERATOR: AccountId = AccountId::from_num(1001);

/// A client wired to scripted nodes, a manual clock and a recording signer.
pub struct ScriptedEnvironment {
    /// Client under test
    pub client: Client,
    /// Source of the scripted nodes
    pub factory: Arc<ScriptedChannelFactory>,
    /// Clock driving node health and transaction ids
    pub time: Arc<ManualTimeSource>,
    /// Operator key
    pub signer: Arc<RecordingSigner>,
    /// Mirror for subscriptions
    pub mirror: Arc<ScriptedMirror>,
}

impl ScriptedEnvironment {
    /// Client over nodes `0.0.<num>` for each of `nums`, with operator
    /// [`TEST_OPERATOR`] and [`ExecuteSettings::for_testing`].
    pub fn new(nums: &[u64]) -> Self {
        let factory = Arc::new(ScriptedChannelFactory::new());
        for &num in nums {
            factory.add_node(num);
        }
        let time = Arc::new(ManualTimeSource::at_secs(1_700_000_000));
        let signer = Arc::new(RecordingSigner::new(KeyType::Ed25519));
        let mirror = Arc::new(ScriptedMirror::new());

        let network = Network::from_nodes(
            nums.iter().map(|&num| scripted_address(num)).collect(),
            Some("mirror.test:5600".into()),
            LedgerId::local_node(),
            factory.clone(),
            NetworkOptions {
                backoff: crate::domain::BackoffConfig::for_testing(),
                ..Default::default()
            },
        )
        .unwrap_or_else(|e| panic!("scripted network: {e}"));

        let client = Client::new(network)
            .with_operator(TEST_OPERATOR, signer.clone())
            .with_execute_settings(ExecuteSettings::for_testing())
            .with_time_source(time.clone())
            .with_mirror_connector(mirror.clone());

        Self {
            client,
            factory,
            time,
            signer,
            mirror,
        }
    }

    /// Scripted node `0.0.<num>`.
    pub fn node(&self, num: u64) -> Arc<ScriptedNode> {
        self.factory
            .node(num)
            .unwrap_or_else(|| panic!("no scripted node 0.0.{num}"))
    }
}
