//! The account that pays for and signs transactions by default.

use std::fmt;
use std::sync::Arc;

use ledger_crypto::{KeyType, PrivateKey};

use crate::adapters::KeySigner;
use crate::domain::{AccountId, Result};
use crate::ports::Signer;

/// Payer account plus the signer for its key.
#[derive(Clone)]
pub struct Operator {
    /// Paying account
    pub account_id: AccountId,
    /// Signer for the account key
    pub signer: Arc<dyn Signer>,
}

impl Operator {
    /// Operator with an arbitrary signer.
    pub fn new(account_id: AccountId, signer: Arc<dyn Signer>) -> Self {
        Self { account_id, signer }
    }

    /// Operator signing with a hex-encoded private key.
    pub fn from_private_key(account_id: AccountId, key_type: KeyType, hex_key: &str) -> Result<Self> {
        let key = PrivateKey::from_hex(key_type, hex_key)?;
        Ok(Self::new(account_id, Arc::new(KeySigner::new(key))))
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("account_id", &self.account_id)
            .field("public_key", &self.signer.public_key().to_string())
            .finish()
    }
}
