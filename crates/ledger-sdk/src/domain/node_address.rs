//! # Node Addresses
//!
//! Where a consensus node listens, and how to connect to it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::entity_id::AccountId;
use super::errors::SdkError;

/// Plaintext port used by consensus nodes.
pub const PLAINTEXT_PORT: u16 = 50211;
/// TLS port paired with [`PLAINTEXT_PORT`].
pub const TLS_PORT: u16 = 50212;

/// Transport security settings of a network.
///
/// The network passes these to its channel factory; it never speaks TLS
/// itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsSettings {
    /// Connect over TLS
    pub enabled: bool,
    /// Check node certificates against the pinned hash
    pub verify_certificates: bool,
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            verify_certificates: true,
        }
    }
}

/// Network address of a consensus node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeAddress {
    /// Account id of the node
    pub account_id: AccountId,
    /// Hostname or IP
    pub host: String,
    /// Plaintext port
    pub port: u16,
    /// SHA-384 hash of the node's TLS certificate, if pinned
    pub cert_hash: Option<Vec<u8>>,
}

impl NodeAddress {
    /// Create an address from an account id and `host:port`.
    pub fn new(account_id: AccountId, endpoint: &str) -> Result<Self, SdkError> {
        let (host, port) = endpoint
            .rsplit_once(':')
            .ok_or_else(|| SdkError::Config(format!("node address {endpoint:?} has no port")))?;
        if host.is_empty() {
            return Err(SdkError::Config(format!("node address {endpoint:?} has no host")));
        }
        let port = port
            .parse()
            .map_err(|_| SdkError::Config(format!("node address {endpoint:?} has an invalid port")))?;
        Ok(Self {
            account_id,
            host: host.to_string(),
            port,
            cert_hash: None,
        })
    }

    /// Pin the node's certificate hash.
    pub fn with_cert_hash(mut self, cert_hash: Vec<u8>) -> Self {
        self.cert_hash = Some(cert_hash);
        self
    }

    /// Port to dial for the given TLS mode.
    pub fn port_for(&self, tls: &TlsSettings) -> u16 {
        if tls.enabled && self.port == PLAINTEXT_PORT {
            TLS_PORT
        } else {
            self.port
        }
    }

    /// `host:port` to dial for the given TLS mode.
    pub fn endpoint(&self, tls: &TlsSettings) -> String {
        format!("{}:{}", self.host, self.port_for(tls))
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.account_id, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint() {
        let address = NodeAddress::new(AccountId::from_num(3), "127.0.0.1:50211").unwrap();
        assert_eq!(address.host, "127.0.0.1");
        assert_eq!(address.port, 50211);
    }

    #[test]
    fn test_bad_endpoints() {
        assert!(NodeAddress::new(AccountId::from_num(3), "localhost").is_err());
        assert!(NodeAddress::new(AccountId::from_num(3), ":50211").is_err());
        assert!(NodeAddress::new(AccountId::from_num(3), "localhost:port").is_err());
    }

    #[test]
    fn test_tls_port_mapping() {
        let address = NodeAddress::new(AccountId::from_num(3), "node:50211").unwrap();
        let tls = TlsSettings {
            enabled: true,
            verify_certificates: true,
        };
        assert_eq!(address.endpoint(&tls), "node:50212");
        assert_eq!(address.endpoint(&TlsSettings::default()), "node:50211");

        let custom = NodeAddress::new(AccountId::from_num(4), "node:443").unwrap();
        assert_eq!(custom.endpoint(&tls), "node:443");
    }
}
