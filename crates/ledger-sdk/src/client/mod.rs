//! # Client
//!
//! Entry point of the SDK: a network, an operator, attempt settings and the
//! outbound adapters, shared by every call made through it.
//!
//! A `Client` is `Send + Sync`; concurrent callers share the same node
//! health records. The network can be swapped at runtime with
//! [`Client::set_network`]; calls already running finish on the network
//! they started with.

mod operator;

pub use operator::Operator;

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::adapters::{SystemTimeSource, TcpChannelFactory, TcpMirrorConnector};
use crate::config::ClientConfig;
use crate::domain::{
    AccountId, LedgerId, NodeAddress, Result, SdkError, Timestamp,
};
use crate::execute::{self, Executable, ExecuteSettings};
use crate::network::{Network, NetworkOptions, NetworkPreset};
use crate::ports::{ChannelFactory, MirrorConnector, Signer, TimeSource};
use crate::query::AccountBalanceQuery;
use crate::wire::ResponseType;

/// Handle for submitting transactions and queries to one network.
pub struct Client {
    network: RwLock<Arc<Network>>,
    operator: Option<Operator>,
    settings: ExecuteSettings,
    auto_validate_checksums: bool,
    max_nodes_per_transaction: Option<usize>,
    time: Arc<dyn TimeSource>,
    mirror: Option<Arc<dyn MirrorConnector>>,
}

impl Client {
    /// Client over `network` with default settings and no operator.
    pub fn new(network: Network) -> Self {
        Self {
            network: RwLock::new(Arc::new(network)),
            operator: None,
            settings: ExecuteSettings::default(),
            auto_validate_checksums: false,
            max_nodes_per_transaction: None,
            time: Arc::new(SystemTimeSource),
            mirror: None,
        }
    }

    /// Client over a named network.
    pub fn for_preset(preset: NetworkPreset, factory: Arc<dyn ChannelFactory>) -> Result<Self> {
        let network = Network::from_preset(preset, factory, NetworkOptions::default())?;
        info!(network = %preset, nodes = network.len(), "Client created");
        Ok(Self::new(network))
    }

    /// Client from configuration, using the TCP adapters.
    ///
    /// The TCP adapters speak plaintext only, so `network.tls = true` is
    /// rejected here; supply a TLS-capable factory to
    /// [`Client::from_config_with`] instead.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        if config.network.tls {
            return Err(SdkError::Config(
                "network.tls requires a TLS-capable channel factory".into(),
            ));
        }
        let factory = Arc::new(TcpChannelFactory::new(config.transport.max_frame_size));
        let mirror = Arc::new(TcpMirrorConnector::new(config.transport.max_frame_size));
        Ok(Self::from_config_with(config, factory)?.with_mirror_connector(mirror))
    }

    /// Client from configuration with a caller-supplied channel factory.
    pub fn from_config_with(
        config: &ClientConfig,
        factory: Arc<dyn ChannelFactory>,
    ) -> Result<Self> {
        config.validate()?;
        let (addresses, mirror, ledger_id) = config.network.resolve()?;
        let network = Network::from_nodes(
            addresses,
            mirror,
            ledger_id,
            factory,
            config.network_options(),
        )?;

        let mut client = Self::new(network)
            .with_execute_settings(config.execute_settings())
            .with_auto_validate_checksums(config.auto_validate_checksums)
            .with_max_nodes_per_transaction(config.max_nodes_per_transaction);
        if let Some(operator) = config.operator()? {
            client.operator = Some(operator);
        }
        info!(
            nodes = client.network().len(),
            operator = ?client.operator.as_ref().map(|o| o.account_id.to_string()),
            "Client created from configuration"
        );
        Ok(client)
    }

    // =========================================================================
    // Builders
    // =========================================================================

    /// Pay for and sign transactions as `account_id`.
    pub fn with_operator(mut self, account_id: AccountId, signer: Arc<dyn Signer>) -> Self {
        self.operator = Some(Operator::new(account_id, signer));
        self
    }

    /// Default attempt settings.
    pub fn with_execute_settings(mut self, settings: ExecuteSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Validate entity id checksums before sending.
    pub fn with_auto_validate_checksums(mut self, enabled: bool) -> Self {
        self.auto_validate_checksums = enabled;
        self
    }

    /// Cap on the nodes a transaction is frozen for when none are set.
    ///
    /// A cap of zero means no cap.
    pub fn with_max_nodes_per_transaction(mut self, limit: Option<usize>) -> Self {
        self.max_nodes_per_transaction = limit.filter(|&n| n > 0);
        self
    }

    /// Clock for node health and transaction ids.
    pub fn with_time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = time;
        self
    }

    /// Mirror used by subscriptions.
    pub fn with_mirror_connector(mut self, mirror: Arc<dyn MirrorConnector>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current network.
    pub fn network(&self) -> Arc<Network> {
        Arc::clone(&self.network.read())
    }

    /// Identity of the current network.
    pub fn ledger_id(&self) -> LedgerId {
        self.network.read().ledger_id().clone()
    }

    /// Operator, if configured.
    pub fn operator(&self) -> Option<&Operator> {
        self.operator.as_ref()
    }

    /// Operator account, if configured.
    pub fn operator_account_id(&self) -> Option<&AccountId> {
        self.operator.as_ref().map(|o| &o.account_id)
    }

    /// Default attempt settings.
    pub fn execute_settings(&self) -> &ExecuteSettings {
        &self.settings
    }

    /// Whether checksums are validated before sending.
    pub fn auto_validate_checksums(&self) -> bool {
        self.auto_validate_checksums
    }

    /// Cap on the nodes a transaction is frozen for.
    pub fn max_nodes_per_transaction(&self) -> Option<usize> {
        self.max_nodes_per_transaction
    }

    /// Current time from the client's clock.
    pub fn now(&self) -> Timestamp {
        self.time.now()
    }

    /// Mirror connector, if configured.
    pub fn mirror(&self) -> Option<Arc<dyn MirrorConnector>> {
        self.mirror.clone()
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Run `executable` on the current network.
    ///
    /// Uses the executable's own settings when it has them, otherwise the
    /// client's.
    pub async fn execute<E>(&self, executable: &E) -> Result<E::Output>
    where
        E: Executable + ?Sized,
    {
        let network = self.network();
        let settings = executable.settings().copied().unwrap_or(self.settings);
        execute::execute(&network, self.time.as_ref(), executable, &settings).await
    }

    /// Check that `node` answers.
    pub async fn ping(&self, node: &AccountId) -> Result<()> {
        if self.network().node(node).is_none() {
            return Err(SdkError::UnknownNode(node.clone()));
        }
        AccountBalanceQuery::new(node.clone())
            .set_node_account_ids(vec![node.clone()])
            .run(self, ResponseType::AnswerOnly)
            .await?;
        Ok(())
    }

    /// Ping every node in turn. Stops at the first failure.
    pub async fn ping_all(&self) -> Result<()> {
        for node in self.network().node_ids() {
            if let Err(e) = self.ping(&node).await {
                warn!(node = %node, error = %e, "Ping failed");
                return Err(e);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Replace the node list.
    ///
    /// Nodes whose account and address are unchanged keep their health
    /// records and channels; channels of removed nodes are closed.
    pub async fn set_network(&self, addresses: Vec<NodeAddress>) -> Result<()> {
        let current = self.network();
        let rebuilt = Arc::new(current.rebuild(addresses).await?);
        *self.network.write() = rebuilt;
        Ok(())
    }

    /// Close every channel of the current network.
    pub async fn close(&self) {
        self.network().close().await;
    }
}

#[cfg(test)]
mod tests;
