//! # ECDSA (secp256k1) Keys
//!
//! Accounts may carry a secp256k1 key instead of an Ed25519 one. Public keys
//! travel compressed (33 bytes); signatures are the 64-byte `r || s` form,
//! with RFC 6979 nonces so re-signing a body is idempotent.

use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use zeroize::Zeroizing;

use crate::CryptoError;

/// Compressed public key length.
pub const SECP256K1_PUBLIC_KEY_LEN: usize = 33;

/// Compressed secp256k1 public key, validated on construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Secp256k1PublicKey([u8; SECP256K1_PUBLIC_KEY_LEN]);

impl Secp256k1PublicKey {
    /// Parse a 33-byte compressed SEC1 key.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let compressed: [u8; SECP256K1_PUBLIC_KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: SECP256K1_PUBLIC_KEY_LEN,
                    actual: bytes.len(),
                })?;
        VerifyingKey::from_sec1_bytes(&compressed).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(compressed))
    }

    fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(true);
        let mut compressed = [0u8; SECP256K1_PUBLIC_KEY_LEN];
        compressed.copy_from_slice(point.as_bytes());
        Self(compressed)
    }

    /// Compressed key.
    pub fn to_bytes(&self) -> [u8; SECP256K1_PUBLIC_KEY_LEN] {
        self.0
    }

    /// Check a raw 64-byte signature over `body`.
    pub fn verify(&self, body: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let key =
            VerifyingKey::from_sec1_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;
        let signature =
            Signature::from_slice(signature).map_err(|_| CryptoError::InvalidSignature)?;
        key.verify(body, &signature)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

/// secp256k1 secret key. The signing key wipes itself on drop.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Fresh random key.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    /// Key from its 32-byte scalar. Zero and out-of-range scalars are rejected.
    pub fn from_bytes(secret: &[u8; 32]) -> Result<Self, CryptoError> {
        SigningKey::from_bytes(secret.into())
            .map(|signing_key| Self { signing_key })
            .map_err(|_| CryptoError::InvalidPrivateKey)
    }

    /// Scalar, for writing the key back out.
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes().into())
    }

    /// Public half.
    pub fn public_key(&self) -> Secp256k1PublicKey {
        Secp256k1PublicKey::from_verifying_key(self.signing_key.verifying_key())
    }

    /// Sign a transaction body (SHA-256 prehash, low-S).
    pub fn sign(&self, body: &[u8]) -> [u8; 64] {
        let signature: Signature = self.signing_key.sign(body);
        signature.to_bytes().into()
    }
}
