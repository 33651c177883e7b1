//! Per-node signed bodies of a frozen transaction.

use std::collections::HashMap;

use ledger_crypto::{sha384, PublicKey, Sha384Digest};

use crate::domain::{AccountId, Result, SdkError};
use crate::ports::{Signer, Verifier};
use crate::wire::{SignatureMap, SignaturePair, SignedTransaction};

/// One node's body: immutable bytes and their SHA-384 hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrozenBody {
    /// Encoded body with the node id embedded
    pub bytes: Vec<u8>,
    /// SHA-384 of `bytes`, the key of the body's signatures
    pub hash: Sha384Digest,
}

/// Bodies of a frozen transaction, one per candidate node, and the
/// signatures collected over each.
///
/// Signatures are keyed by body hash so two nodes can never share or
/// duplicate a signature list.
#[derive(Clone, Debug, Default)]
pub struct SignedBodies {
    order: Vec<AccountId>,
    bodies: HashMap<AccountId, FrozenBody>,
    signatures: HashMap<Sha384Digest, SignatureMap>,
}

impl SignedBodies {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, node: AccountId, bytes: Vec<u8>) {
        let hash = sha384(&bytes);
        self.signatures.entry(hash).or_default();
        if self.bodies.insert(node.clone(), FrozenBody { bytes, hash }).is_none() {
            self.order.push(node);
        }
    }

    /// Nodes in the order they were frozen.
    pub fn nodes(&self) -> &[AccountId] {
        &self.order
    }

    /// Body addressed to `node`.
    pub fn body(&self, node: &AccountId) -> Option<&FrozenBody> {
        self.bodies.get(node)
    }

    /// Signatures collected over the body addressed to `node`.
    pub fn signatures(&self, node: &AccountId) -> Option<&SignatureMap> {
        let body = self.bodies.get(node)?;
        self.signatures.get(&body.hash)
    }

    /// Sign every body with `signer`. A key that already signed has its
    /// signature replaced.
    pub fn sign_all(&mut self, signer: &dyn Signer) -> Result<()> {
        let public_key = signer.public_key().to_bytes();
        for node in &self.order {
            let body = &self.bodies[node];
            let signature = signer.sign(&body.bytes)?;
            self.signatures
                .entry(body.hash)
                .or_default()
                .insert(SignaturePair {
                    public_key: public_key.clone(),
                    signature,
                });
        }
        Ok(())
    }

    /// Attach a signature produced elsewhere over the body for `node`.
    pub fn add_signature(
        &mut self,
        node: &AccountId,
        public_key: &PublicKey,
        signature: Vec<u8>,
    ) -> Result<()> {
        let body = self
            .bodies
            .get(node)
            .ok_or_else(|| SdkError::UnknownNode(node.clone()))?;
        self.signatures
            .entry(body.hash)
            .or_default()
            .insert(SignaturePair {
                public_key: public_key.to_bytes(),
                signature,
            });
        Ok(())
    }

    /// Check every signature on every body.
    pub fn verify(&self, verifier: &dyn Verifier) -> Result<()> {
        for node in &self.order {
            let body = &self.bodies[node];
            let Some(map) = self.signatures.get(&body.hash) else {
                continue;
            };
            for pair in map.pairs() {
                let public_key = pair.public_key()?;
                if !verifier.verify(&public_key, &body.bytes, &pair.signature) {
                    return Err(SdkError::SignatureVerification {
                        node: node.clone(),
                        public_key: public_key.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Body and signatures as sent to `node`.
    pub fn signed_transaction(&self, node: &AccountId) -> Result<SignedTransaction> {
        let body = self
            .bodies
            .get(node)
            .ok_or_else(|| SdkError::UnknownNode(node.clone()))?;
        Ok(SignedTransaction {
            body_bytes: body.bytes.clone(),
            sig_map: self
                .signatures
                .get(&body.hash)
                .cloned()
                .unwrap_or_default(),
        })
    }
}
