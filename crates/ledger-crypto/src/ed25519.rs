//! # Ed25519 Keys
//!
//! Default operator key type. Signatures are deterministic, so re-signing a
//! transaction body with the same key reproduces the same 64 bytes.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use zeroize::Zeroizing;

use crate::CryptoError;

/// Encoded public key length.
pub const ED25519_PUBLIC_KEY_LEN: usize = 32;

/// Ed25519 public key, validated as a curve point on construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey(VerifyingKey);

impl Ed25519PublicKey {
    /// Parse a 32-byte encoded key.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let encoded: &[u8; ED25519_PUBLIC_KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: ED25519_PUBLIC_KEY_LEN,
                    actual: bytes.len(),
                })?;
        VerifyingKey::from_bytes(encoded)
            .map(Self)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Encoded key.
    pub fn to_bytes(&self) -> [u8; ED25519_PUBLIC_KEY_LEN] {
        self.0.to_bytes()
    }

    /// Check a raw 64-byte signature over `body`.
    pub fn verify(&self, body: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let signature =
            Signature::from_slice(signature).map_err(|_| CryptoError::InvalidSignature)?;
        self.0
            .verify(body, &signature)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

/// Ed25519 secret key. The signing key wipes itself on drop.
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
}

impl Ed25519KeyPair {
    /// Fresh random key.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut rand::thread_rng()),
        }
    }

    /// Key from its 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Seed, for writing the key back out.
    pub fn to_seed(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    /// Public half.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key())
    }

    /// Sign a transaction body.
    pub fn sign(&self, body: &[u8]) -> [u8; 64] {
        self.signing_key.sign(body).to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_signature_checks_against_own_key_only() {
        let operator = Ed25519KeyPair::generate();
        let other = Ed25519KeyPair::generate();
        let signature = operator.sign(b"body for 0.0.3");

        assert!(operator.public_key().verify(b"body for 0.0.3", &signature).is_ok());
        assert_eq!(
            operator.public_key().verify(b"body for 0.0.4", &signature),
            Err(CryptoError::SignatureVerificationFailed)
        );
        assert!(other.public_key().verify(b"body for 0.0.3", &signature).is_err());
    }

    #[test]
    fn test_resigning_reproduces_bytes() {
        let key = Ed25519KeyPair::from_seed(&[7u8; 32]);
        assert_eq!(key.sign(b"body"), key.sign(b"body"));
    }

    #[test]
    fn test_truncated_signature_rejected() {
        let key = Ed25519KeyPair::generate();
        let signature = key.sign(b"body");

        assert_eq!(
            key.public_key().verify(b"body", &signature[..63]),
            Err(CryptoError::InvalidSignature)
        );
    }

    #[test]
    fn test_public_key_length_checked() {
        assert_eq!(
            Ed25519PublicKey::from_slice(&[1u8; 31]),
            Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: 31
            })
        );
    }

    #[test]
    fn test_seed_restores_same_key() {
        let key = Ed25519KeyPair::generate();
        let restored = Ed25519KeyPair::from_seed(&key.to_seed());

        assert_eq!(key.public_key(), restored.public_key());
        assert_eq!(
            Ed25519PublicKey::from_slice(&key.public_key().to_bytes()),
            Ok(key.public_key())
        );
    }
}
