//! # Ledger SDK
//!
//! Client-side execution engine for submitting transactions and queries to a
//! ledger network of consensus nodes.
//!
//! ## What it does
//!
//! - Picks a healthy node for every attempt and benches failing nodes with
//!   exponential backoff
//! - Runs every request through one attempt loop with a per-call timeout,
//!   bounded retries and retry backoff
//! - Freezes a transaction into one signed body per candidate node, so a
//!   retry on another node needs no new signature
//! - Validates entity id checksums against the network's ledger id
//! - Streams topic messages from a mirror with reconnect and resume
//!
//! ## Architecture
//!
//! - **Domain:** identifiers, statuses, receipts, node health, checksums
//! - **Ports:** channels, signing, time and mirror streams
//! - **Engine:** [`network`], [`execute`], [`transaction`], [`query`],
//!   [`subscription`]
//! - **Adapters:** wall clock, local keys, TCP
//! - **Façade:** [`Client`], optionally built from [`ClientConfig`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use ledger_sdk::{AccountAmount, AccountId, Client, ClientConfig, Transaction};
//!
//! let client = Client::from_config(&ClientConfig::load("ledger.toml")?)?;
//! let mut transfer = Transaction::crypto_transfer(vec![
//!     AccountAmount { account_id: AccountId::from_num(1001), amount: -10 },
//!     AccountAmount { account_id: AccountId::from_num(1002), amount: 10 },
//! ]);
//! let response = transfer.execute(&client).await?;
//! let receipt = response.get_receipt(&client).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod domain;
pub mod ports;
pub mod wire;

// =============================================================================
// ENGINE
// =============================================================================

pub mod execute;
pub mod network;
pub mod query;
pub mod subscription;
pub mod transaction;

// =============================================================================
// FAÇADE AND ADAPTERS
// =============================================================================

pub mod adapters;
pub mod client;
pub mod config;

/// Scripted nodes, mirror, clock and signer for tests.
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use domain::{
    generate_checksum, validate_checksum, AccountBalance, AccountId, AttemptCause, BackoffConfig,
    EntityId, LedgerId, ManagedNode, NodeAddress, NodeStats, Result, SdkError, Status, Timestamp,
    TlsSettings, TopicId, TopicMessage, TopicQuery, TransactionId, TransactionReceipt,
    TransactionRecord, TransportError,
};

pub use ports::{
    Channel, ChannelFactory, MessageStream, MirrorConnector, Signer, TimeSource, Verifier,
};

pub use adapters::{
    KeySigner, KeyVerifier, SystemTimeSource, TcpChannelFactory, TcpMirrorConnector,
};
pub use client::{Client, Operator};
pub use config::ClientConfig;
pub use execute::{AttemptResult, Executable, ExecuteSettings};
pub use network::{Network, NetworkOptions, NetworkPreset};
pub use query::{
    AccountBalanceQuery, Query, QueryData, TransactionReceiptQuery, TransactionRecordQuery,
};
pub use subscription::{SubscriptionHandle, TopicMessageQuery};
pub use transaction::{Transaction, TransactionResponse, TransactionState};
pub use wire::AccountAmount;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
