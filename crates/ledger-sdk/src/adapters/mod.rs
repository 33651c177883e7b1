//! # Adapters
//!
//! Concrete implementations of the outbound ports:
//!
//! - [`SystemTimeSource`]: wall clock
//! - [`KeySigner`] / [`KeyVerifier`]: local keys from `ledger-crypto`
//! - [`TcpChannelFactory`] / [`TcpMirrorConnector`]: length-prefixed bincode
//!   frames over plain TCP

mod signer;
mod tcp;
mod time;

pub use signer::{KeySigner, KeyVerifier};
pub use tcp::{TcpChannel, TcpChannelFactory, TcpMirrorConnector};
pub use time::SystemTimeSource;
