//! # Wire Messages
//!
//! Requests and responses exchanged with consensus nodes, encoded with
//! `bincode`. The engine only ever looks at the precheck status and, for
//! receipt and record polls, the inner status.
//!
//! ```text
//! Request ──┬── Transaction(SignedTransaction { body_bytes, sig_map })
//!           └── Query(QueryRequest { header { payment, response_type }, body })
//!
//! Response { precheck, cost, body }
//! ```

use ledger_crypto::{KeyType, PublicKey};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AccountBalance, AccountId, SdkError, Status, TopicId, TransactionId, TransactionReceipt,
    TransactionRecord,
};

// =============================================================================
// TRANSACTIONS
// =============================================================================

/// Signed part of a transaction. One body exists per candidate node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBody {
    /// Transaction id
    pub transaction_id: TransactionId,
    /// Node the body is addressed to
    pub node_account_id: AccountId,
    /// Maximum fee the payer accepts
    pub transaction_fee: u64,
    /// Seconds after valid start during which the transaction is accepted
    pub valid_duration_secs: u64,
    /// Free-form memo
    pub memo: String,
    /// Operation payload
    pub data: TransactionData,
}

/// Transaction payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionData {
    /// Move value between accounts
    CryptoTransfer {
        /// Signed amounts; must sum to zero
        transfers: Vec<AccountAmount>,
    },
    /// Submit a message to a consensus topic
    ConsensusSubmitMessage {
        /// Target topic
        topic_id: TopicId,
        /// Message bytes
        message: Vec<u8>,
    },
    /// Payload produced by an external builder
    Opaque {
        /// Operation name, for logs
        kind: String,
        /// Encoded payload
        bytes: Vec<u8>,
    },
}

impl TransactionData {
    /// Operation name for logs and metrics.
    pub fn kind(&self) -> &str {
        match self {
            Self::CryptoTransfer { .. } => "crypto_transfer",
            Self::ConsensusSubmitMessage { .. } => "consensus_submit_message",
            Self::Opaque { kind, .. } => kind,
        }
    }

    /// Entity ids referenced by the payload.
    pub fn entity_ids(&self) -> Vec<&AccountId> {
        match self {
            Self::CryptoTransfer { transfers } => transfers.iter().map(|t| &t.account_id).collect(),
            Self::ConsensusSubmitMessage { topic_id, .. } => vec![topic_id],
            Self::Opaque { .. } => Vec::new(),
        }
    }
}

/// One leg of a transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAmount {
    /// Account credited (positive) or debited (negative)
    pub account_id: AccountId,
    /// Amount in the smallest denomination
    pub amount: i64,
}

/// Signature by one key over one body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePair {
    /// Public key bytes (32 for Ed25519, 33 for compressed secp256k1)
    pub public_key: Vec<u8>,
    /// Signature bytes
    pub signature: Vec<u8>,
}

impl SignaturePair {
    /// Recover the typed public key from its encoded length.
    pub fn public_key(&self) -> Result<PublicKey, SdkError> {
        let key_type = match self.public_key.len() {
            32 => KeyType::Ed25519,
            33 => KeyType::EcdsaSecp256k1,
            other => {
                return Err(SdkError::Codec(format!(
                    "signature pair has a {other}-byte public key"
                )))
            }
        };
        Ok(PublicKey::from_bytes(key_type, &self.public_key)?)
    }
}

/// Signatures over a single body, at most one per public key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureMap {
    pairs: Vec<SignaturePair>,
}

impl SignatureMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a signature, replacing any earlier signature by the same key.
    pub fn insert(&mut self, pair: SignaturePair) {
        match self
            .pairs
            .iter_mut()
            .find(|p| p.public_key == pair.public_key)
        {
            Some(existing) => *existing = pair,
            None => self.pairs.push(pair),
        }
    }

    /// Whether `public_key` has signed.
    pub fn contains(&self, public_key: &[u8]) -> bool {
        self.pairs.iter().any(|p| p.public_key == public_key)
    }

    /// Signature pairs in insertion order.
    pub fn pairs(&self) -> &[SignaturePair] {
        &self.pairs
    }

    /// Number of signatures.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if nothing has signed.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// A body plus the signatures over it, as sent to one node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Encoded [`TransactionBody`]
    pub body_bytes: Vec<u8>,
    /// Signatures over `body_bytes`
    pub sig_map: SignatureMap,
}

// =============================================================================
// QUERIES
// =============================================================================

/// What the caller wants back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseType {
    /// The answer itself
    AnswerOnly,
    /// Only the cost of answering
    CostAnswer,
}

/// Common query header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryHeader {
    /// Payment for paid queries, addressed to the queried node
    pub payment: Option<SignedTransaction>,
    /// Answer or cost
    pub response_type: ResponseType,
}

/// Query payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryBody {
    /// Receipt poll
    TransactionReceipt {
        /// Transaction to look up
        transaction_id: TransactionId,
        /// Also return child receipts
        include_children: bool,
        /// Also return receipts of duplicate submissions
        include_duplicates: bool,
    },
    /// Record poll
    TransactionRecord {
        /// Transaction to look up
        transaction_id: TransactionId,
        /// Also return child records
        include_children: bool,
        /// Also return records of duplicate submissions
        include_duplicates: bool,
    },
    /// Balance lookup
    AccountBalance {
        /// Account to look up
        account_id: AccountId,
    },
    /// Payload produced by an external builder
    Opaque {
        /// Query name, for logs
        kind: String,
        /// Encoded payload
        bytes: Vec<u8>,
    },
}

/// A query with its header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Header
    pub header: QueryHeader,
    /// Body
    pub body: QueryBody,
}

// =============================================================================
// ENVELOPES
// =============================================================================

/// Anything sent to a node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Transaction submission
    Transaction(SignedTransaction),
    /// Query
    Query(QueryRequest),
}

/// Answer payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseBody {
    /// Nothing beyond the precheck
    Empty,
    /// Receipt poll answer
    Receipt(TransactionReceipt),
    /// Record poll answer
    Record(TransactionRecord),
    /// Balance answer
    AccountBalance(AccountBalance),
    /// Answer to an opaque query
    Opaque(Vec<u8>),
}

/// Anything a node answers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Node-local precheck
    pub precheck: Status,
    /// Cost of the query, when asked for
    pub cost: u64,
    /// Payload
    pub body: ResponseBody,
}

impl Response {
    /// Response carrying only a precheck status.
    pub fn status(precheck: Status) -> Self {
        Self {
            precheck,
            cost: 0,
            body: ResponseBody::Empty,
        }
    }

    /// Successful receipt poll answer.
    pub fn receipt(receipt: TransactionReceipt) -> Self {
        Self {
            precheck: Status::Ok,
            cost: 0,
            body: ResponseBody::Receipt(receipt),
        }
    }
}

// =============================================================================
// CODEC
// =============================================================================

/// Encode a transaction body.
pub fn encode_body(body: &TransactionBody) -> Result<Vec<u8>, SdkError> {
    Ok(bincode::serialize(body)?)
}

/// Decode a transaction body.
pub fn decode_body(bytes: &[u8]) -> Result<TransactionBody, SdkError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Encode a request for sending.
pub fn encode_request(request: &Request) -> Result<Vec<u8>, SdkError> {
    Ok(bincode::serialize(request)?)
}

/// Decode a request (node side).
pub fn decode_request(bytes: &[u8]) -> Result<Request, SdkError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Encode a response (node side).
pub fn encode_response(response: &Response) -> Result<Vec<u8>, SdkError> {
    Ok(bincode::serialize(response)?)
}

/// Decode a received response.
pub fn decode_response(bytes: &[u8]) -> Result<Response, SdkError> {
    Ok(bincode::deserialize(bytes)?)
}
