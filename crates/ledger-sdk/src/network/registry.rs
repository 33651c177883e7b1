//! The node registry: node health, selection and channel cache.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::preset::NetworkPreset;
use crate::domain::{
    AccountId, BackoffConfig, LedgerId, ManagedNode, NodeAddress, NodeStats, SdkError, Timestamp,
    TlsSettings, TransportError,
};
use crate::ports::{Channel, ChannelFactory};

/// Settings shared by every node of a network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkOptions {
    /// Transport security passed to the channel factory
    pub tls: TlsSettings,
    /// Node backoff bounds
    pub backoff: BackoffConfig,
}

/// Resolved set of consensus nodes for one client.
pub struct Network {
    nodes: Vec<Arc<ManagedNode>>,
    index: HashMap<AccountId, usize>,
    ledger_id: LedgerId,
    mirror_address: Option<String>,
    options: NetworkOptions,
    factory: Arc<dyn ChannelFactory>,
    channels: Mutex<HashMap<String, Arc<dyn Channel>>>,
    cursor: Mutex<usize>,
}

impl Network {
    /// Build a network from a named preset.
    pub fn from_preset(
        preset: NetworkPreset,
        factory: Arc<dyn ChannelFactory>,
        options: NetworkOptions,
    ) -> Result<Self, SdkError> {
        Self::from_nodes(
            preset.node_addresses()?,
            Some(preset.mirror_address().to_string()),
            preset.ledger_id(),
            factory,
            options,
        )
    }

    /// Build a network from an explicit node list.
    ///
    /// Requires at least one node and unique node account ids.
    pub fn from_nodes(
        addresses: Vec<NodeAddress>,
        mirror_address: Option<String>,
        ledger_id: LedgerId,
        factory: Arc<dyn ChannelFactory>,
        options: NetworkOptions,
    ) -> Result<Self, SdkError> {
        options.backoff.validate()?;
        let nodes = addresses
            .into_iter()
            .map(|address| Arc::new(ManagedNode::new(address, options.backoff)))
            .collect();
        Self::assemble(nodes, mirror_address, ledger_id, factory, options)
    }

    fn assemble(
        nodes: Vec<Arc<ManagedNode>>,
        mirror_address: Option<String>,
        ledger_id: LedgerId,
        factory: Arc<dyn ChannelFactory>,
        options: NetworkOptions,
    ) -> Result<Self, SdkError> {
        if nodes.is_empty() {
            return Err(SdkError::Config("network requires at least one node".into()));
        }

        let mut index = HashMap::with_capacity(nodes.len());
        for (position, node) in nodes.iter().enumerate() {
            if index.insert(node.account_id().clone(), position).is_some() {
                return Err(SdkError::Config(format!(
                    "duplicate node account id {}",
                    node.account_id()
                )));
            }
        }

        Ok(Self {
            nodes,
            index,
            ledger_id,
            mirror_address,
            options,
            factory,
            channels: Mutex::new(HashMap::new()),
            cursor: Mutex::new(0),
        })
    }

    /// Network identity bytes.
    pub fn ledger_id(&self) -> &LedgerId {
        &self.ledger_id
    }

    /// Mirror endpoint, if configured.
    pub fn mirror_address(&self) -> Option<&str> {
        self.mirror_address.as_deref()
    }

    /// TLS settings.
    pub fn tls(&self) -> &TlsSettings {
        &self.options.tls
    }

    /// Shared node settings.
    pub fn options(&self) -> &NetworkOptions {
        &self.options
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a constructed network.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids in registry order.
    pub fn node_ids(&self) -> Vec<AccountId> {
        self.nodes.iter().map(|n| n.account_id().clone()).collect()
    }

    /// Nodes in registry order.
    pub fn nodes(&self) -> &[Arc<ManagedNode>] {
        &self.nodes
    }

    /// Look up a node by account id.
    pub fn node(&self, account_id: &AccountId) -> Option<Arc<ManagedNode>> {
        self.index
            .get(account_id)
            .map(|&position| Arc::clone(&self.nodes[position]))
    }

    /// Ids of nodes healthy at `now`, in registry order.
    pub fn healthy_nodes(&self, now: Timestamp) -> Vec<AccountId> {
        self.nodes
            .iter()
            .filter(|n| n.is_healthy(now))
            .map(|n| n.account_id().clone())
            .collect()
    }

    /// Health snapshot of every node.
    pub fn stats(&self) -> Vec<NodeStats> {
        self.nodes.iter().map(|n| n.snapshot()).collect()
    }

    /// Default candidate set for a transaction: healthy nodes first, then
    /// the rest, each group in registry order, truncated to `limit`. A
    /// limit of zero or `None` keeps every node.
    pub fn transaction_candidates(&self, limit: Option<usize>, now: Timestamp) -> Vec<AccountId> {
        let (healthy, benched): (Vec<_>, Vec<_>) =
            self.nodes.iter().partition(|n| n.is_healthy(now));
        let limit = limit.filter(|&n| n > 0).unwrap_or(usize::MAX);
        healthy
            .into_iter()
            .chain(benched)
            .take(limit)
            .map(|n| n.account_id().clone())
            .collect()
    }

    /// Choose the node for the next attempt.
    ///
    /// Eligible nodes are the registry nodes named in `candidates` (all of
    /// them when `candidates` is empty). A round-robin pointer walks the
    /// eligible nodes and the first healthy one wins. When none is healthy
    /// the node with the smallest backoff is used, ties going to the earliest
    /// readmit time and then to registry order.
    pub fn select_node(
        &self,
        candidates: &[AccountId],
        now: Timestamp,
    ) -> Result<Arc<ManagedNode>, SdkError> {
        let eligible: Vec<&Arc<ManagedNode>> = if candidates.is_empty() {
            self.nodes.iter().collect()
        } else {
            let wanted: HashSet<&AccountId> = candidates.iter().collect();
            self.nodes
                .iter()
                .filter(|n| wanted.contains(n.account_id()))
                .collect()
        };
        if eligible.is_empty() {
            return Err(SdkError::NoEligibleNodes);
        }

        let mut cursor = self.cursor.lock();
        let start = *cursor % eligible.len();
        for offset in 0..eligible.len() {
            let position = (start + offset) % eligible.len();
            let node = eligible[position];
            if node.is_healthy(now) {
                *cursor = position + 1;
                debug!(node = %node.account_id(), "Selected healthy node");
                return Ok(Arc::clone(node));
            }
        }

        let (position, node) = eligible
            .iter()
            .enumerate()
            .map(|(position, node)| (position, node, node.snapshot()))
            .min_by(|(pa, _, a), (pb, _, b)| {
                a.current_backoff
                    .cmp(&b.current_backoff)
                    .then(a.readmit_at.cmp(&b.readmit_at))
                    .then(pa.cmp(pb))
            })
            .map(|(position, node, _)| (position, *node))
            .ok_or(SdkError::NoEligibleNodes)?;
        *cursor = position + 1;
        debug!(
            node = %node.account_id(),
            backoff = ?node.current_backoff(),
            "No healthy node, using the one closest to readmission"
        );
        Ok(Arc::clone(node))
    }

    /// Channel to `node`, opened on first use and cached per endpoint.
    pub async fn channel(&self, node: &ManagedNode) -> Result<Arc<dyn Channel>, TransportError> {
        let endpoint = node.address().endpoint(&self.options.tls);
        let cached = self.channels.lock().get(&endpoint).cloned();
        if let Some(channel) = cached {
            return Ok(channel);
        }

        let opened = self.factory.open(node.address(), &self.options.tls).await?;
        debug!(node = %node.account_id(), endpoint = %endpoint, "Opened channel");
        let mut channels = self.channels.lock();
        Ok(Arc::clone(channels.entry(endpoint).or_insert(opened)))
    }

    /// Close every cached channel.
    pub async fn close(&self) {
        let channels: Vec<_> = self.channels.lock().drain().map(|(_, c)| c).collect();
        for channel in channels {
            channel.close().await;
        }
        info!("Network channels closed");
    }

    /// Build a network over `addresses` that keeps the health record and
    /// channel of every node whose account and address are unchanged.
    /// Channels of nodes that are gone are closed.
    pub async fn rebuild(&self, addresses: Vec<NodeAddress>) -> Result<Network, SdkError> {
        let nodes: Vec<Arc<ManagedNode>> = addresses
            .into_iter()
            .map(|address| match self.node(&address.account_id) {
                Some(existing) if *existing.address() == address => existing,
                _ => Arc::new(ManagedNode::new(address, self.options.backoff)),
            })
            .collect();

        let network = Self::assemble(
            nodes,
            self.mirror_address.clone(),
            self.ledger_id.clone(),
            Arc::clone(&self.factory),
            self.options,
        )?;

        let keep: HashSet<String> = network
            .nodes
            .iter()
            .map(|n| n.address().endpoint(&self.options.tls))
            .collect();

        let dropped: Vec<(String, Arc<dyn Channel>)> = {
            let mut channels = self.channels.lock();
            let mut inherited = network.channels.lock();
            let mut dropped = Vec::new();
            for (endpoint, channel) in channels.drain() {
                if keep.contains(&endpoint) {
                    inherited.insert(endpoint, channel);
                } else {
                    dropped.push((endpoint, channel));
                }
            }
            dropped
        };

        for (endpoint, channel) in dropped {
            debug!(endpoint = %endpoint, "Closing channel of removed node");
            channel.close().await;
        }
        info!(nodes = network.len(), "Network rebuilt");
        Ok(network)
    }
}
