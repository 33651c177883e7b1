//! # Client Configuration
//!
//! TOML configuration for [`Client::from_config`](crate::Client::from_config).
//!
//! ```toml
//! auto_validate_checksums = true
//! max_nodes_per_transaction = 3
//!
//! [network]
//! preset = "testnet"            # or an explicit node list:
//! # ledger_id = "03"
//! # mirror = "127.0.0.1:5600"
//! # [[network.nodes]]
//! # account_id = "0.0.3"
//! # address = "127.0.0.1:50211"
//! tls = false
//! verify_certificates = true
//!
//! [operator]
//! account_id = "0.0.1001"
//! private_key = "302e..."
//! key_type = "ed25519"
//!
//! [execution]
//! max_attempts = 10
//! request_timeout_ms = 10000
//! min_backoff_ms = 250
//! max_backoff_ms = 8000
//!
//! [node_backoff]
//! min_backoff_ms = 8000
//! max_backoff_ms = 3600000
//!
//! [transport]
//! max_frame_size = 4194304
//! ```
//!
//! Top-level keys must come before the first table.

use std::fs;
use std::path::Path;
use std::time::Duration;

use ledger_crypto::KeyType;
use serde::{Deserialize, Serialize};

use crate::client::Operator;
use crate::domain::{
    AccountId, BackoffConfig, LedgerId, NodeAddress, Result, SdkError, TlsSettings,
    DEFAULT_NODE_MAX_BACKOFF, DEFAULT_NODE_MIN_BACKOFF,
};
use crate::execute::{
    ExecuteSettings, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF, DEFAULT_MIN_BACKOFF,
    DEFAULT_REQUEST_TIMEOUT,
};
use crate::network::{NetworkOptions, NetworkPreset};

/// Largest frame the TCP adapters accept by default (4 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Validate entity id checksums before sending
    pub auto_validate_checksums: bool,
    /// Cap on the nodes a transaction is frozen for
    pub max_nodes_per_transaction: Option<usize>,
    /// Which nodes to talk to
    pub network: NetworkSection,
    /// Paying account
    pub operator: Option<OperatorSection>,
    /// Attempt loop
    pub execution: ExecutionSection,
    /// Node health
    pub node_backoff: NodeBackoffSection,
    /// TCP adapter limits
    pub transport: TransportSection,
}

/// `[network]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkSection {
    /// Named network (`mainnet`, `testnet`, `previewnet`, `local`)
    pub preset: Option<String>,
    /// Explicit node list, used when no preset is given
    pub nodes: Vec<NodeEntry>,
    /// Mirror endpoint; overrides the preset's
    pub mirror: Option<String>,
    /// Hex ledger id; required with an explicit node list
    pub ledger_id: Option<String>,
    /// Connect over TLS
    pub tls: bool,
    /// Check node certificates
    pub verify_certificates: bool,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            preset: None,
            nodes: Vec::new(),
            mirror: None,
            ledger_id: None,
            tls: false,
            verify_certificates: true,
        }
    }
}

/// One `[[network.nodes]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeEntry {
    /// Node account, e.g. `0.0.3`
    pub account_id: String,
    /// `host:port`
    pub address: String,
    /// Hex SHA-384 of the node certificate
    #[serde(default)]
    pub cert_hash: Option<String>,
}

/// `[operator]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperatorSection {
    /// Paying account
    pub account_id: String,
    /// Hex private key
    pub private_key: String,
    /// `ed25519` or `ecdsa`
    #[serde(default = "default_key_type")]
    pub key_type: String,
}

fn default_key_type() -> String {
    "ed25519".to_string()
}

/// `[execution]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionSection {
    /// Attempts before giving up
    pub max_attempts: u32,
    /// Per-send timeout
    pub request_timeout_ms: u64,
    /// First retry delay
    pub min_backoff_ms: u64,
    /// Retry delay cap
    pub max_backoff_ms: u64,
}

impl Default for ExecutionSection {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            min_backoff_ms: DEFAULT_MIN_BACKOFF.as_millis() as u64,
            max_backoff_ms: DEFAULT_MAX_BACKOFF.as_millis() as u64,
        }
    }
}

/// `[node_backoff]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeBackoffSection {
    /// Backoff of a fresh node
    pub min_backoff_ms: u64,
    /// Backoff cap
    pub max_backoff_ms: u64,
}

impl Default for NodeBackoffSection {
    fn default() -> Self {
        Self {
            min_backoff_ms: DEFAULT_NODE_MIN_BACKOFF.as_millis() as u64,
            max_backoff_ms: DEFAULT_NODE_MAX_BACKOFF.as_millis() as u64,
        }
    }
}

/// `[transport]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportSection {
    /// Largest frame accepted from a node or mirror
    pub max_frame_size: usize,
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Config`] if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            SdkError::Config(format!("cannot read {}: {e}", path.as_ref().display()))
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Local node with short timeouts.
    pub fn for_testing() -> Self {
        let settings = ExecuteSettings::for_testing();
        let backoff = BackoffConfig::for_testing();
        Self {
            network: NetworkSection {
                preset: Some(NetworkPreset::LocalNode.name().to_string()),
                ..Default::default()
            },
            execution: ExecutionSection {
                max_attempts: settings.max_attempts,
                request_timeout_ms: settings.request_timeout.as_millis() as u64,
                min_backoff_ms: settings.min_backoff.as_millis() as u64,
                max_backoff_ms: settings.max_backoff.as_millis() as u64,
            },
            node_backoff: NodeBackoffSection {
                min_backoff_ms: backoff.min_backoff.as_millis() as u64,
                max_backoff_ms: backoff.max_backoff.as_millis() as u64,
            },
            ..Default::default()
        }
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        self.execute_settings().validate()?;
        self.backoff_config().validate()?;
        self.network.resolve()?;
        self.operator()?;
        if self.max_nodes_per_transaction == Some(0) {
            return Err(SdkError::Config(
                "max_nodes_per_transaction must be at least 1".into(),
            ));
        }
        if self.transport.max_frame_size == 0 {
            return Err(SdkError::Config("max_frame_size must be positive".into()));
        }
        Ok(())
    }

    /// Attempt loop settings.
    pub fn execute_settings(&self) -> ExecuteSettings {
        ExecuteSettings {
            max_attempts: self.execution.max_attempts,
            request_timeout: Duration::from_millis(self.execution.request_timeout_ms),
            min_backoff: Duration::from_millis(self.execution.min_backoff_ms),
            max_backoff: Duration::from_millis(self.execution.max_backoff_ms),
        }
    }

    /// Node backoff bounds.
    pub fn backoff_config(&self) -> BackoffConfig {
        BackoffConfig {
            min_backoff: Duration::from_millis(self.node_backoff.min_backoff_ms),
            max_backoff: Duration::from_millis(self.node_backoff.max_backoff_ms),
        }
    }

    /// Settings shared by every node.
    pub fn network_options(&self) -> NetworkOptions {
        NetworkOptions {
            tls: TlsSettings {
                enabled: self.network.tls,
                verify_certificates: self.network.verify_certificates,
            },
            backoff: self.backoff_config(),
        }
    }

    /// Operator built from `[operator]`, if present.
    pub fn operator(&self) -> Result<Option<Operator>> {
        let Some(section) = &self.operator else {
            return Ok(None);
        };
        let account_id: AccountId = section.account_id.parse()?;
        let key_type: KeyType = section
            .key_type
            .parse()
            .map_err(|e| SdkError::Config(format!("operator key type: {e}")))?;
        Operator::from_private_key(account_id, key_type, &section.private_key)
            .map(Some)
            .map_err(|e| SdkError::Config(format!("operator private key: {e}")))
    }
}

impl NetworkSection {
    /// Node addresses, mirror endpoint and ledger id.
    pub fn resolve(&self) -> Result<(Vec<NodeAddress>, Option<String>, LedgerId)> {
        match (&self.preset, self.nodes.is_empty()) {
            (Some(_), false) => Err(SdkError::Config(
                "set either network.preset or network.nodes, not both".into(),
            )),
            (None, true) => Err(SdkError::Config(
                "network needs a preset or at least one node".into(),
            )),
            (Some(name), true) => {
                let preset: NetworkPreset = name.parse()?;
                let ledger_id = match &self.ledger_id {
                    Some(hex) => LedgerId::from_hex(hex)?,
                    None => preset.ledger_id(),
                };
                let mirror = self
                    .mirror
                    .clone()
                    .unwrap_or_else(|| preset.mirror_address().to_string());
                Ok((preset.node_addresses()?, Some(mirror), ledger_id))
            }
            (None, false) => {
                let hex = self.ledger_id.as_deref().ok_or_else(|| {
                    SdkError::Config("network.ledger_id is required with explicit nodes".into())
                })?;
                let addresses = self
                    .nodes
                    .iter()
                    .map(NodeEntry::to_address)
                    .collect::<Result<Vec<_>>>()?;
                Ok((addresses, self.mirror.clone(), LedgerId::from_hex(hex)?))
            }
        }
    }
}

impl NodeEntry {
    fn to_address(&self) -> Result<NodeAddress> {
        let account_id: AccountId = self.account_id.parse()?;
        let address = NodeAddress::new(account_id, &self.address)?;
        match &self.cert_hash {
            Some(encoded) => {
                let hash = hex::decode(encoded.trim_start_matches("0x")).map_err(|e| {
                    SdkError::Config(format!("cert_hash of node {}: {e}", self.account_id))
                })?;
                Ok(address.with_cert_hash(hash))
            }
            None => Ok(address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_crypto::PrivateKey;
    use std::io::Write;

    const NODES_TOML: &str = r#"
        max_nodes_per_transaction = 2

        [network]
        ledger_id = "03"
        mirror = "127.0.0.1:5600"
        tls = true

        [[network.nodes]]
        account_id = "0.0.3"
        address = "127.0.0.1:50211"

        [[network.nodes]]
        account_id = "0.0.4"
        address = "127.0.0.1:50212"
        cert_hash = "abcd"

        [execution]
        max_attempts = 3
        request_timeout_ms = 500
    "#;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.execute_settings(), ExecuteSettings::default());
        assert_eq!(config.backoff_config(), BackoffConfig::default());
        assert!(config.network.verify_certificates);
        // No network configured
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_for_testing_is_valid() {
        let config = ClientConfig::for_testing();
        assert!(config.validate().is_ok());
        let (addresses, mirror, ledger_id) = config.network.resolve().unwrap();
        assert_eq!(addresses.len(), 1);
        assert_eq!(mirror.as_deref(), Some("127.0.0.1:5600"));
        assert_eq!(ledger_id, LedgerId::local_node());
    }

    #[test]
    fn test_parse_explicit_nodes() {
        let config = ClientConfig::parse(NODES_TOML).unwrap();
        config.validate().unwrap();

        assert_eq!(config.max_nodes_per_transaction, Some(2));
        assert_eq!(config.execute_settings().max_attempts, 3);
        assert_eq!(
            config.execute_settings().request_timeout,
            Duration::from_millis(500)
        );
        // Unset keys keep their defaults
        assert_eq!(config.execute_settings().min_backoff, DEFAULT_MIN_BACKOFF);

        let (addresses, mirror, ledger_id) = config.network.resolve().unwrap();
        assert_eq!(addresses[1].cert_hash, Some(vec![0xab, 0xcd]));
        assert_eq!(mirror.as_deref(), Some("127.0.0.1:5600"));
        assert_eq!(ledger_id, LedgerId::local_node());
        assert!(config.network_options().tls.enabled);
    }

    #[test]
    fn test_preset_and_nodes_conflict() {
        let mut config = ClientConfig::parse(NODES_TOML).unwrap();
        config.network.preset = Some("testnet".into());
        assert!(matches!(config.validate(), Err(SdkError::Config(_))));
    }

    #[test]
    fn test_explicit_nodes_need_ledger_id() {
        let mut config = ClientConfig::parse(NODES_TOML).unwrap();
        config.network.ledger_id = None;
        assert!(config.network.resolve().is_err());
    }

    #[test]
    fn test_unknown_preset() {
        let config = ClientConfig::parse("[network]\npreset = \"devnet\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(ClientConfig::parse("[network]\npresett = \"testnet\"\n").is_err());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config =
            ClientConfig::parse("[network]\npreset = \"local\"\n[execution]\nmax_attempts = 0\n")
                .unwrap();
        assert!(matches!(config.validate(), Err(SdkError::Config(_))));
    }

    #[test]
    fn test_operator_section() {
        let key = PrivateKey::generate(KeyType::Ed25519);
        let expected = key.public_key();
        let toml = format!(
            "[network]\npreset = \"local\"\n[operator]\naccount_id = \"0.0.1001\"\nprivate_key = \"{}\"\n",
            key.to_hex().as_str()
        );

        let config = ClientConfig::parse(&toml).unwrap();
        let operator = config.operator().unwrap().unwrap();
        assert_eq!(operator.account_id, AccountId::from_num(1001));
        assert_eq!(operator.signer.public_key(), expected);
    }

    #[test]
    fn test_bad_operator_key() {
        let toml = "[network]\npreset = \"local\"\n[operator]\naccount_id = \"0.0.1001\"\nprivate_key = \"zz\"\n";
        let config = ClientConfig::parse(toml).unwrap();
        assert!(matches!(config.validate(), Err(SdkError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[network]\npreset = \"testnet\"\n").unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.network.preset.as_deref(), Some("testnet"));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            ClientConfig::load("/nonexistent/ledger.toml"),
            Err(SdkError::Config(_))
        ));
    }
}
