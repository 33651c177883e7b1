use super::*;
use crate::config::{ClientConfig, NodeEntry};
use crate::domain::{Status, TransportError};
use crate::test_utils::{
    scripted_address, ScriptedChannelFactory, ScriptedEnvironment, ScriptedReply, TEST_OPERATOR,
};

// =============================================================================
// TEST GROUP 1: Ping
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_ping_answering_node() {
    let env = ScriptedEnvironment::new(&[3, 4]);

    env.client.ping(&AccountId::from_num(4)).await.unwrap();

    assert_eq!(env.node(3).request_count(), 0);
    assert_eq!(env.node(4).request_count(), 1);
}

#[test]
fn test_ping_from_blocking_context() {
    let env = ScriptedEnvironment::new(&[3]);

    tokio_test::assert_ok!(tokio_test::block_on(
        env.client.ping(&AccountId::from_num(3))
    ));
    assert_eq!(env.node(3).request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_ping_unknown_node() {
    let env = ScriptedEnvironment::new(&[3]);

    assert!(matches!(
        env.client.ping(&AccountId::from_num(9)).await,
        Err(SdkError::UnknownNode(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_ping_dead_node_exhausts() {
    let env = ScriptedEnvironment::new(&[3, 4]);
    env.node(3)
        .set_fallback(ScriptedReply::Fail(TransportError::Closed));

    let err = env.client.ping(&AccountId::from_num(3)).await.unwrap_err();

    assert!(matches!(err, SdkError::AttemptsExhausted { .. }));
    // Never falls over to another node
    assert_eq!(env.node(4).request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_ping_all_visits_every_node() {
    let env = ScriptedEnvironment::new(&[3, 4, 5]);

    env.client.ping_all().await.unwrap();

    for num in [3, 4, 5] {
        assert_eq!(env.node(num).request_count(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_ping_all_stops_at_first_failure() {
    let env = ScriptedEnvironment::new(&[3, 4, 5]);
    env.node(4)
        .set_fallback(ScriptedReply::status(Status::InvalidNodeAccount));

    let err = env.client.ping_all().await.unwrap_err();

    assert!(matches!(
        err,
        SdkError::PrecheckRejection {
            status: Status::InvalidNodeAccount,
            ..
        }
    ));
    assert_eq!(env.node(5).request_count(), 0);
}

// =============================================================================
// TEST GROUP 2: Network lifecycle
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_set_network_swaps_nodes() {
    let env = ScriptedEnvironment::new(&[3, 4]);
    env.factory.add_node(6);
    env.client.ping_all().await.unwrap();
    let before = env.client.network();

    env.client
        .set_network(vec![scripted_address(3), scripted_address(6)])
        .await
        .unwrap();

    let after = env.client.network();
    assert_eq!(
        after.node_ids(),
        vec![AccountId::from_num(3), AccountId::from_num(6)]
    );
    let kept = AccountId::from_num(3);
    assert!(Arc::ptr_eq(
        &before.node(&kept).unwrap(),
        &after.node(&kept).unwrap()
    ));
    assert!(env.node(4).is_closed());
    assert!(!env.node(3).is_closed());

    env.client.ping(&AccountId::from_num(6)).await.unwrap();
    assert!(matches!(
        env.client.ping(&AccountId::from_num(4)).await,
        Err(SdkError::UnknownNode(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_set_network_rejects_empty_list() {
    let env = ScriptedEnvironment::new(&[3]);

    assert!(env.client.set_network(Vec::new()).await.is_err());
    assert_eq!(env.client.network().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_close_closes_open_channels() {
    let env = ScriptedEnvironment::new(&[3, 4]);
    env.client.ping_all().await.unwrap();

    env.client.close().await;

    assert!(env.node(3).is_closed());
    assert!(env.node(4).is_closed());
}

// =============================================================================
// TEST GROUP 3: Construction
// =============================================================================

#[test]
fn test_builders() {
    let env = ScriptedEnvironment::new(&[3]);
    let client = env
        .client
        .with_auto_validate_checksums(true)
        .with_max_nodes_per_transaction(Some(1));

    assert!(client.auto_validate_checksums());
    assert_eq!(client.max_nodes_per_transaction(), Some(1));
    assert_eq!(client.operator_account_id(), Some(&TEST_OPERATOR));
    assert_eq!(client.ledger_id(), LedgerId::local_node());
    assert_eq!(client.now(), env.time.now());
    assert!(client.mirror().is_some());
}

#[test]
fn test_from_config_with_explicit_nodes() {
    let factory = Arc::new(ScriptedChannelFactory::new());
    factory.add_node(3);
    factory.add_node(4);

    let mut config = ClientConfig::for_testing();
    config.network.preset = None;
    config.network.ledger_id = Some("01".into());
    config.network.nodes = [3u64, 4]
        .iter()
        .map(|num| NodeEntry {
            account_id: format!("0.0.{num}"),
            address: format!("node{num}.test:50211"),
            cert_hash: None,
        })
        .collect();
    config.auto_validate_checksums = true;
    config.max_nodes_per_transaction = Some(1);

    let client = Client::from_config_with(&config, factory).unwrap();

    assert_eq!(client.network().len(), 2);
    assert_eq!(client.ledger_id(), LedgerId::testnet());
    assert_eq!(*client.execute_settings(), ExecuteSettings::for_testing());
    assert!(client.auto_validate_checksums());
    assert_eq!(client.max_nodes_per_transaction(), Some(1));
    assert!(client.operator().is_none());
}

#[test]
fn test_from_config_rejects_invalid() {
    let factory = Arc::new(ScriptedChannelFactory::new());
    let mut config = ClientConfig::for_testing();
    config.execution.max_attempts = 0;

    assert!(matches!(
        Client::from_config_with(&config, factory),
        Err(SdkError::Config(_))
    ));
}

#[test]
fn test_from_config_rejects_tls_over_tcp() {
    let mut config = ClientConfig::for_testing();
    config.network.tls = true;

    assert!(matches!(
        Client::from_config(&config),
        Err(SdkError::Config(_))
    ));
}

#[test]
fn test_zero_node_cap_means_uncapped() {
    let env = ScriptedEnvironment::new(&[3]);
    let client = env.client.with_max_nodes_per_transaction(Some(0));

    assert_eq!(client.max_nodes_per_transaction(), None);
}

#[test]
fn test_for_preset() {
    let factory = Arc::new(ScriptedChannelFactory::new());
    let client = Client::for_preset(NetworkPreset::Testnet, factory).unwrap();

    assert_eq!(client.ledger_id(), LedgerId::testnet());
    assert!(client.network().mirror_address().is_some());
    assert!(client.operator().is_none());
}
