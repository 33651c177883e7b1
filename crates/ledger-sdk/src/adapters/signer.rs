//! Signing with keys held in process memory.

use ledger_crypto::{PrivateKey, PublicKey};

use crate::domain::SdkError;
use crate::ports::{Signer, Verifier};

/// Signs with a local private key.
#[derive(Debug)]
pub struct KeySigner {
    key: PrivateKey,
}

impl KeySigner {
    /// Signer for `key`.
    pub fn new(key: PrivateKey) -> Self {
        Self { key }
    }
}

impl Signer for KeySigner {
    fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SdkError> {
        Ok(self.key.sign(message))
    }
}

/// Verifies Ed25519 and secp256k1 signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyVerifier;

impl Verifier for KeyVerifier {
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
        public_key.verify(message, signature).is_ok()
    }
}
