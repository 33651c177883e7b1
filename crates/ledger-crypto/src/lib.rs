//! # Ledger Crypto - Signing Primitives for the Ledger SDK
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `ed25519` | Ed25519 | Default operator and payer keys |
//! | `ecdsa` | secp256k1 | Accounts keyed with secp256k1 |
//! | `keys` | both | Algorithm-agnostic `PrivateKey` / `PublicKey` wrappers |
//! | `hashing` | SHA-384 | Transaction hashes, per-body signature keys |
//!
//! Signatures from both algorithms are deterministic and 64 bytes long, so a
//! body's signature map never grows when the same key signs it twice. Secret
//! bytes handed out for export come wrapped in `Zeroizing`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod ed25519;
pub mod errors;
pub mod hashing;
pub mod keys;

// Re-exports
pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey, SECP256K1_PUBLIC_KEY_LEN};
pub use ed25519::{Ed25519KeyPair, Ed25519PublicKey, ED25519_PUBLIC_KEY_LEN};
pub use errors::CryptoError;
pub use hashing::{sha384, Sha384Digest, SHA384_LEN};
pub use keys::{KeyType, PrivateKey, PublicKey};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
