//! Named network presets.

use std::fmt;
use std::str::FromStr;

use crate::domain::{AccountId, LedgerId, NodeAddress, SdkError};

const MAINNET_NODES: &[(u64, &str)] = &[
    (3, "35.237.200.180:50211"),
    (4, "35.186.191.247:50211"),
    (5, "35.192.2.25:50211"),
    (6, "35.199.161.108:50211"),
    (7, "35.203.82.240:50211"),
    (8, "35.236.5.219:50211"),
    (9, "35.197.192.225:50211"),
    (10, "35.242.233.154:50211"),
    (11, "35.240.118.96:50211"),
    (12, "35.204.86.32:50211"),
];

const TESTNET_NODES: &[(u64, &str)] = &[
    (3, "0.testnet.hedera.com:50211"),
    (4, "1.testnet.hedera.com:50211"),
    (5, "2.testnet.hedera.com:50211"),
    (6, "3.testnet.hedera.com:50211"),
    (7, "4.testnet.hedera.com:50211"),
    (8, "5.testnet.hedera.com:50211"),
    (9, "6.testnet.hedera.com:50211"),
];

const PREVIEWNET_NODES: &[(u64, &str)] = &[
    (3, "0.previewnet.hedera.com:50211"),
    (4, "1.previewnet.hedera.com:50211"),
    (5, "2.previewnet.hedera.com:50211"),
    (6, "3.previewnet.hedera.com:50211"),
    (7, "4.previewnet.hedera.com:50211"),
    (8, "5.previewnet.hedera.com:50211"),
    (9, "6.previewnet.hedera.com:50211"),
];

const LOCAL_NODES: &[(u64, &str)] = &[(3, "127.0.0.1:50211")];

/// A well-known network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NetworkPreset {
    /// Production network
    Mainnet,
    /// Public test network
    Testnet,
    /// Preview of upcoming releases
    Previewnet,
    /// Single node on localhost
    LocalNode,
}

impl NetworkPreset {
    /// Preset name as accepted by `FromStr`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Previewnet => "previewnet",
            Self::LocalNode => "local",
        }
    }

    /// Network identity used for checksums.
    pub fn ledger_id(&self) -> LedgerId {
        match self {
            Self::Mainnet => LedgerId::mainnet(),
            Self::Testnet => LedgerId::testnet(),
            Self::Previewnet => LedgerId::previewnet(),
            Self::LocalNode => LedgerId::local_node(),
        }
    }

    /// Mirror endpoint for streaming subscriptions.
    pub fn mirror_address(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet-public.mirrornode.hedera.com:443",
            Self::Testnet => "testnet.mirrornode.hedera.com:443",
            Self::Previewnet => "previewnet.mirrornode.hedera.com:443",
            Self::LocalNode => "127.0.0.1:5600",
        }
    }

    /// Consensus node addresses.
    pub fn node_addresses(&self) -> Result<Vec<NodeAddress>, SdkError> {
        let table = match self {
            Self::Mainnet => MAINNET_NODES,
            Self::Testnet => TESTNET_NODES,
            Self::Previewnet => PREVIEWNET_NODES,
            Self::LocalNode => LOCAL_NODES,
        };
        table
            .iter()
            .map(|(num, endpoint)| NodeAddress::new(AccountId::from_num(*num), endpoint))
            .collect()
    }
}

impl fmt::Display for NetworkPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NetworkPreset {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "previewnet" => Ok(Self::Previewnet),
            "local" | "localhost" | "local-node" => Ok(Self::LocalNode),
            other => Err(SdkError::Config(format!("unknown network preset {other:?}"))),
        }
    }
}
