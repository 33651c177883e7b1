//! # Algorithm-Agnostic Keys
//!
//! Operators configure a key as hex plus an algorithm name; the SDK only ever
//! needs "sign these bytes" and "which public key signed them".

use std::fmt;
use std::str::FromStr;

use zeroize::Zeroizing;

use crate::{CryptoError, Ed25519KeyPair, Ed25519PublicKey, Secp256k1KeyPair, Secp256k1PublicKey};

/// Signature algorithm of a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyType {
    /// Ed25519 (32-byte public keys, 64-byte signatures)
    Ed25519,
    /// ECDSA over secp256k1 (33-byte compressed public keys, 64-byte signatures)
    EcdsaSecp256k1,
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519 => write!(f, "ed25519"),
            Self::EcdsaSecp256k1 => write!(f, "ecdsa"),
        }
    }
}

impl FromStr for KeyType {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ed25519" => Ok(Self::Ed25519),
            "ecdsa" | "secp256k1" | "ecdsa_secp256k1" => Ok(Self::EcdsaSecp256k1),
            other => Err(CryptoError::UnknownKeyType(other.to_string())),
        }
    }
}

/// Public half of an operator or payer key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PublicKey {
    /// Ed25519 public key
    Ed25519(Ed25519PublicKey),
    /// Compressed secp256k1 public key
    EcdsaSecp256k1(Secp256k1PublicKey),
}

impl PublicKey {
    /// Algorithm of this key.
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Ed25519(_) => KeyType::Ed25519,
            Self::EcdsaSecp256k1(_) => KeyType::EcdsaSecp256k1,
        }
    }

    /// Raw key bytes (32 or 33 bytes).
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Ed25519(key) => key.to_bytes().to_vec(),
            Self::EcdsaSecp256k1(key) => key.to_bytes().to_vec(),
        }
    }

    /// Rebuild a public key from its algorithm and raw bytes.
    pub fn from_bytes(key_type: KeyType, bytes: &[u8]) -> Result<Self, CryptoError> {
        match key_type {
            KeyType::Ed25519 => Ed25519PublicKey::from_slice(bytes).map(Self::Ed25519),
            KeyType::EcdsaSecp256k1 => {
                Secp256k1PublicKey::from_slice(bytes).map(Self::EcdsaSecp256k1)
            }
        }
    }

    /// Verify `signature` over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        match self {
            Self::Ed25519(key) => key.verify(message, signature),
            Self::EcdsaSecp256k1(key) => key.verify(message, signature),
        }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key_type(), hex::encode(self.to_bytes()))
    }
}

/// Secret key usable as an operator key.
pub enum PrivateKey {
    /// Ed25519 key pair
    Ed25519(Ed25519KeyPair),
    /// secp256k1 key pair
    EcdsaSecp256k1(Secp256k1KeyPair),
}

impl PrivateKey {
    /// Generate a random key of the given type.
    pub fn generate(key_type: KeyType) -> Self {
        match key_type {
            KeyType::Ed25519 => Self::Ed25519(Ed25519KeyPair::generate()),
            KeyType::EcdsaSecp256k1 => Self::EcdsaSecp256k1(Secp256k1KeyPair::generate()),
        }
    }

    /// Parse a 32-byte secret from hex (an optional `0x` prefix is accepted).
    pub fn from_hex(key_type: KeyType, encoded: &str) -> Result<Self, CryptoError> {
        let trimmed = encoded.trim().trim_start_matches("0x");
        let bytes = Zeroizing::new(
            hex::decode(trimmed).map_err(|e| CryptoError::InvalidHex(e.to_string()))?,
        );
        let secret: &[u8; 32] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: 32,
                    actual: bytes.len(),
                })?;

        match key_type {
            KeyType::Ed25519 => Ok(Self::Ed25519(Ed25519KeyPair::from_seed(secret))),
            KeyType::EcdsaSecp256k1 => Secp256k1KeyPair::from_bytes(secret).map(Self::EcdsaSecp256k1),
        }
    }

    /// Hex encoding of the secret, as accepted by [`PrivateKey::from_hex`].
    pub fn to_hex(&self) -> Zeroizing<String> {
        match self {
            Self::Ed25519(pair) => Zeroizing::new(hex::encode(pair.to_seed().as_slice())),
            Self::EcdsaSecp256k1(pair) => Zeroizing::new(hex::encode(pair.to_bytes().as_slice())),
        }
    }

    /// Algorithm of this key.
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Ed25519(_) => KeyType::Ed25519,
            Self::EcdsaSecp256k1(_) => KeyType::EcdsaSecp256k1,
        }
    }

    /// Public half.
    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::Ed25519(pair) => PublicKey::Ed25519(pair.public_key()),
            Self::EcdsaSecp256k1(pair) => PublicKey::EcdsaSecp256k1(pair.public_key()),
        }
    }

    /// Sign `message`, returning the raw 64 signature bytes.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            Self::Ed25519(pair) => pair.sign(message).to_vec(),
            Self::EcdsaSecp256k1(pair) => pair.sign(message).to_vec(),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}
