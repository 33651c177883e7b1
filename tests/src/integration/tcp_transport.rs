//! # TCP Transport Flows
//!
//! The client against real sockets: framing, signatures checked by the
//! node, failover from an unreachable node and a mirror stream that breaks
//! and resumes.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use ledger_crypto::{KeyType, PrivateKey};
    use ledger_sdk::wire::{QueryBody, Request};
    use ledger_sdk::{
        AccountAmount, AccountId, Client, ExecuteSettings, KeySigner, LedgerId, Network,
        NetworkOptions, NodeAddress, SdkError, Status, Timestamp, TcpChannelFactory,
        TcpMirrorConnector, TopicId, TopicMessage, TopicMessageQuery, Transaction,
    };
    use parking_lot::Mutex;

    use crate::integration::support::{
        dead_endpoint, healthy_node, LoopbackMirror, LoopbackNode, SessionEnd, MAX_FRAME,
    };

    const OPERATOR: AccountId = AccountId::from_num(1001);

    fn settings() -> ExecuteSettings {
        ExecuteSettings {
            request_timeout: Duration::from_secs(2),
            ..ExecuteSettings::for_testing()
        }
    }

    fn client(nodes: &[(u64, &str)], mirror: Option<String>) -> Client {
        let addresses = nodes
            .iter()
            .map(|(num, endpoint)| NodeAddress::new(AccountId::from_num(*num), endpoint))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let network = Network::from_nodes(
            addresses,
            mirror,
            LedgerId::local_node(),
            Arc::new(TcpChannelFactory::new(MAX_FRAME)),
            NetworkOptions::default(),
        )
        .unwrap();
        let signer = Arc::new(KeySigner::new(PrivateKey::generate(KeyType::Ed25519)));
        Client::new(network)
            .with_operator(OPERATOR, signer)
            .with_execute_settings(settings())
            .with_mirror_connector(Arc::new(TcpMirrorConnector::new(MAX_FRAME)))
    }

    fn transfer() -> Transaction {
        Transaction::crypto_transfer(vec![
            AccountAmount {
                account_id: OPERATOR,
                amount: -25,
            },
            AccountAmount {
                account_id: AccountId::from_num(1002),
                amount: 25,
            },
        ])
    }

    #[tokio::test]
    async fn test_transfer_and_receipt_over_tcp() {
        let node = LoopbackNode::spawn(healthy_node).await;
        let client = client(&[(3, &node.endpoint)], None);

        let response = transfer().execute(&client).await.unwrap();
        let receipt = response.get_receipt(&client).await.unwrap();

        assert_eq!(response.node_id, AccountId::from_num(3));
        assert_eq!(receipt.status, Status::Success);
        let requests = node.requests();
        assert_eq!(requests.len(), 2);
        assert!(matches!(requests[0], Request::Transaction(_)));
        assert!(matches!(
            &requests[1],
            Request::Query(query) if matches!(query.body, QueryBody::TransactionReceipt { .. })
        ));
        client.close().await;
    }

    #[tokio::test]
    async fn test_unsigned_transaction_rejected_by_node() {
        let node = LoopbackNode::spawn(healthy_node).await;
        // No operator: nothing signs the body
        let unsigned = Client::new(
            Network::from_nodes(
                vec![NodeAddress::new(AccountId::from_num(3), &node.endpoint).unwrap()],
                None,
                LedgerId::local_node(),
                Arc::new(TcpChannelFactory::new(MAX_FRAME)),
                NetworkOptions::default(),
            )
            .unwrap(),
        )
        .with_execute_settings(settings());

        let mut tx = transfer();
        tx.set_transaction_id(ledger_sdk::TransactionId::generate(
            OPERATOR,
            Timestamp::now(),
        ))
        .unwrap();
        let err = tx.execute(&unsigned).await.unwrap_err();

        assert!(matches!(
            err,
            SdkError::PrecheckRejection {
                status: Status::InvalidSignature,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_fails_over_from_unreachable_node() {
        let dead = dead_endpoint().await;
        let node = LoopbackNode::spawn(healthy_node).await;
        let client = client(&[(3, &dead), (4, &node.endpoint)], None);

        let response = transfer().execute(&client).await.unwrap();

        assert_eq!(response.node_id, AccountId::from_num(4));
        let network = client.network();
        let stats = network.node(&AccountId::from_num(3)).unwrap().snapshot();
        assert_eq!(stats.failure_count, 1);
        assert!(stats.readmit_at.is_some());
    }

    #[tokio::test]
    async fn test_ping_over_tcp() {
        let node = LoopbackNode::spawn(healthy_node).await;
        let client = client(&[(3, &node.endpoint)], None);

        client.ping_all().await.unwrap();
        assert!(client.ping(&AccountId::from_num(4)).await.is_err());
    }

    fn message(seq: u64) -> TopicMessage {
        TopicMessage {
            topic_id: TopicId::from_num(77),
            consensus_timestamp: Timestamp::new(2_000 + seq as i64, 0),
            sequence_number: seq,
            contents: vec![seq as u8; 3],
        }
    }

    #[tokio::test]
    async fn test_subscription_resumes_after_broken_stream() {
        let mirror = LoopbackMirror::spawn(vec![
            (vec![message(1), message(2)], SessionEnd::Break),
            (vec![message(3)], SessionEnd::Complete),
        ])
        .await;
        let node = LoopbackNode::spawn(healthy_node).await;
        let client = client(&[(3, &node.endpoint)], Some(mirror.endpoint.clone()));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut handle = TopicMessageQuery::new(TopicId::from_num(77))
            .set_limit(5)
            .subscribe(&client, move |m| sink.lock().push(m.sequence_number))
            .unwrap();
        handle.join(Duration::from_secs(10)).await.unwrap();

        assert_eq!(*seen.lock(), vec![1, 2, 3]);
        let queries = mirror.queries();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].start_time, None);
        assert_eq!(queries[1].start_time, Some(Timestamp::new(2_002, 1)));
        assert_eq!(queries[1].limit, 3);
    }
}
