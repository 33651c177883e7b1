//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Invalid key length
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid private key
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Invalid signature
    #[error("Invalid signature")]
    InvalidSignature,

    /// Key material was not valid hex
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    /// Unknown key algorithm name
    #[error("Unknown key type: {0}")]
    UnknownKeyType(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_length_error_display() {
        let err = CryptoError::InvalidKeyLength {
            expected: 32,
            actual: 31,
        };
        assert!(err.to_string().contains("expected 32, got 31"));
    }

    #[test]
    fn test_unknown_key_type_display() {
        let err = CryptoError::UnknownKeyType("rsa".to_string());
        assert!(err.to_string().contains("rsa"));
    }
}
