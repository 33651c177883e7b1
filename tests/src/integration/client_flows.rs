//! # Client Flows
//!
//! Transfers, receipts, node health and checksums through the public API,
//! over scripted nodes and a manual clock.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ledger_sdk::test_utils::{ScriptedEnvironment, ScriptedReply, TEST_OPERATOR};
    use ledger_sdk::wire::ResponseBody;
    use ledger_sdk::{
        AccountAmount, AccountId, AttemptCause, EntityId, LedgerId, SdkError, Status, TimeSource,
        TopicId, Transaction, TransactionRecordQuery, TransportError,
    };

    fn transfer(amount: i64) -> Transaction {
        Transaction::crypto_transfer(vec![
            AccountAmount {
                account_id: TEST_OPERATOR,
                amount: -amount,
            },
            AccountAmount {
                account_id: AccountId::from_num(1002),
                amount,
            },
        ])
    }

    // =========================================================================
    // TEST GROUP 1: Transaction lifecycle
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_transfer_then_receipt() {
        let env = ScriptedEnvironment::new(&[3, 4, 5]);
        for num in [3, 4, 5] {
            env.node(num)
                .push_query_reply(ScriptedReply::receipt(Status::Success));
        }

        let response = transfer(10).execute(&env.client).await.unwrap();
        let receipt = response.get_receipt(&env.client).await.unwrap();

        assert_eq!(receipt.status, Status::Success);
        assert_eq!(response.transaction_id.account_id, TEST_OPERATOR);
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_with_payment() {
        let env = ScriptedEnvironment::new(&[3]);
        let response = transfer(10).execute(&env.client).await.unwrap();
        env.node(3)
            .push_query_reply(ScriptedReply::Respond(ledger_sdk::wire::Response {
                precheck: Status::Ok,
                cost: 0,
                body: ResponseBody::Record(ledger_sdk::TransactionRecord {
                    receipt: ledger_sdk::TransactionReceipt::from_status(Status::Success),
                    transaction_hash: response.transaction_hash.clone(),
                    consensus_timestamp: None,
                    memo: String::new(),
                    transaction_fee: 3,
                    children: Vec::new(),
                    duplicates: Vec::new(),
                }),
            }));

        let record = TransactionRecordQuery::new(response.transaction_id.clone())
            .set_query_payment(1)
            .execute(&env.client)
            .await
            .unwrap();

        assert_eq!(record.transaction_hash, response.transaction_hash);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_message_to_topic() {
        let env = ScriptedEnvironment::new(&[3]);

        Transaction::submit_message(TopicId::from_num(77), "ping")
            .execute(&env.client)
            .await
            .unwrap();

        assert_eq!(env.node(3).transactions().len(), 1);
    }

    // =========================================================================
    // TEST GROUP 2: Node health
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_dead_node_is_benched_then_readmitted() {
        let env = ScriptedEnvironment::new(&[3, 4]);
        env.node(3)
            .set_fallback(ScriptedReply::Fail(TransportError::Closed));
        let dead = AccountId::from_num(3);

        let response = transfer(1).execute(&env.client).await.unwrap();
        assert_eq!(response.node_id, AccountId::from_num(4));

        let network = env.client.network();
        let node = network.node(&dead).unwrap();
        assert!(!node.is_healthy(env.time.now()));

        // Benched: further work avoids it entirely
        let before = env.node(3).request_count();
        for _ in 0..3 {
            transfer(1).execute(&env.client).await.unwrap();
        }
        assert_eq!(env.node(3).request_count(), before);

        // Backoff after one failure is twice the 250ms floor
        env.time.advance(Duration::from_millis(501));
        assert!(node.is_healthy(env.time.now()));
        assert_eq!(network.healthy_nodes(env.time.now()).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failover_shows_in_metrics() {
        let env = ScriptedEnvironment::new(&[931, 932]);
        env.node(931)
            .set_fallback(ScriptedReply::Fail(TransportError::Closed));
        let handle = ledger_telemetry::register_metrics().unwrap();
        let failures = ledger_telemetry::NODE_FAILURES.with_label_values(&["0.0.931"]);
        let before = failures.get();

        transfer(1).execute(&env.client).await.unwrap();

        assert_eq!(failures.get(), before + 1.0);
        assert!(handle.encode().unwrap().contains("node=\"0.0.931\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_heals_backoff_gradually() {
        let env = ScriptedEnvironment::new(&[3]);
        let node3 = env.node(3);
        for _ in 0..3 {
            node3.push_transaction_reply(ScriptedReply::status(Status::Busy));
        }

        transfer(1).execute(&env.client).await.unwrap();

        let network = env.client.network();
        let stats = network.node(&AccountId::from_num(3)).unwrap().snapshot();
        // 250 -> 500 -> 1000 -> 2000, then halved once by the success
        assert_eq!(stats.failure_count, 3);
        assert_eq!(stats.current_backoff, Duration::from_millis(1000));
        assert_eq!(stats.use_count, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_node_busy() {
        let env = ScriptedEnvironment::new(&[3, 4]);
        for num in [3, 4] {
            env.node(num)
                .set_fallback(ScriptedReply::status(Status::Busy));
        }

        let err = transfer(1).execute(&env.client).await.unwrap_err();

        match &err {
            SdkError::AttemptsExhausted {
                attempts,
                last_cause,
                ..
            } => {
                assert_eq!(*attempts, 5);
                assert_eq!(last_cause, &Some(AttemptCause::Status(Status::Busy)));
            }
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(err.status(), Some(Status::Busy));
        assert_eq!(
            env.node(3).request_count() + env.node(4).request_count(),
            5
        );
    }

    // =========================================================================
    // TEST GROUP 3: Checksums
    // =========================================================================

    #[test]
    fn test_checksum_round_trip_through_strings() {
        let testnet = LedgerId::testnet();
        let id = EntityId::new(0, 0, 123);

        let text = id.to_string_with_checksum(&testnet);
        assert_eq!(text, "0.0.123-esxsf");

        let parsed: EntityId = text.parse().unwrap();
        assert!(parsed.validate_checksum(&testnet).is_ok());
        assert!(matches!(
            parsed.validate_checksum(&LedgerId::mainnet()),
            Err(SdkError::ChecksumMismatch { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_validation_blocks_bad_transfer() {
        let ScriptedEnvironment { client, factory, .. } = ScriptedEnvironment::new(&[3]);
        let client = client.with_auto_validate_checksums(true);
        let bad: AccountId = "0.0.1002-abcde".parse().unwrap();

        let mut tx = Transaction::crypto_transfer(vec![AccountAmount {
            account_id: bad,
            amount: 0,
        }]);
        let err = tx.execute(&client).await.unwrap_err();

        assert!(matches!(err, SdkError::ChecksumMismatch { .. }));
        assert_eq!(factory.node(3).unwrap().request_count(), 0);
    }
}
