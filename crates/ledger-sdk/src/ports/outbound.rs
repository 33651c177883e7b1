//! # Outbound Ports
//!
//! Traits for everything the engine does not implement itself.

use std::sync::Arc;

use async_trait::async_trait;
use ledger_crypto::PublicKey;

use crate::domain::{
    NodeAddress, SdkError, Timestamp, TlsSettings, TopicMessage, TopicQuery, TransportError,
};

/// A logical connection to one node address.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Send an encoded request and wait for the encoded response.
    async fn send(&self, request: Vec<u8>) -> Result<Vec<u8>, TransportError>;

    /// Release the connection. Later sends may reconnect or fail.
    async fn close(&self);
}

/// Opens channels to node addresses.
#[async_trait]
pub trait ChannelFactory: Send + Sync {
    /// Open a channel honoring the network's TLS settings.
    async fn open(
        &self,
        address: &NodeAddress,
        tls: &TlsSettings,
    ) -> Result<Arc<dyn Channel>, TransportError>;
}

/// Produces signatures for an account key.
pub trait Signer: Send + Sync {
    /// Key the signatures verify against.
    fn public_key(&self) -> PublicKey;

    /// Sign the exact bytes of `message`.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SdkError>;
}

/// Checks signatures.
pub trait Verifier: Send + Sync {
    /// True iff `signature` by `public_key` over `message` is valid.
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool;
}

/// Abstract interface for getting current time.
///
/// Drives node readmission and transaction id generation.
pub trait TimeSource: Send + Sync {
    /// Get the current timestamp.
    fn now(&self) -> Timestamp;
}

/// Opens topic message streams on a mirror endpoint.
#[async_trait]
pub trait MirrorConnector: Send + Sync {
    /// Start streaming messages matching `query` from `address`.
    async fn subscribe(
        &self,
        address: &str,
        query: &TopicQuery,
    ) -> Result<Box<dyn MessageStream>, TransportError>;
}

/// An open stream of topic messages.
#[async_trait]
pub trait MessageStream: Send {
    /// Next message, an error that ends this stream, or `None` once the
    /// stream is complete.
    async fn next_message(&mut self) -> Option<Result<TopicMessage, TransportError>>;
}
