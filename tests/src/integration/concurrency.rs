//! # Concurrent Callers
//!
//! Many tasks sharing one client: every failure must land in the node's
//! health record and every task must still get through.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ledger_sdk::test_utils::{ScriptedEnvironment, ScriptedReply, TEST_OPERATOR};
    use ledger_sdk::wire::Request;
    use ledger_sdk::{AccountAmount, AccountId, Status, Transaction};

    const TASKS: usize = 16;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_client_under_load() {
        let env = Arc::new(ScriptedEnvironment::new(&[3, 4, 5]));
        env.node(3).set_fallback(ScriptedReply::status(Status::Busy));

        let mut handles = Vec::with_capacity(TASKS);
        for i in 0..TASKS {
            let env = Arc::clone(&env);
            handles.push(tokio::spawn(async move {
                let amount = i as i64 + 1;
                let mut transfer = Transaction::crypto_transfer(vec![
                    AccountAmount {
                        account_id: TEST_OPERATOR,
                        amount: -amount,
                    },
                    AccountAmount {
                        account_id: AccountId::from_num(2000 + i as u64),
                        amount,
                    },
                ]);
                transfer.execute(&env.client).await
            }));
        }

        for handle in handles {
            let response = handle.await.unwrap().unwrap();
            assert_ne!(response.node_id, AccountId::from_num(3));
        }

        let busy_requests = env
            .node(3)
            .requests()
            .iter()
            .filter(|r| matches!(r, Request::Transaction(_)))
            .count();
        let network = env.client.network();
        let stats = network.node(&AccountId::from_num(3)).unwrap().snapshot();
        assert!(busy_requests >= 1);
        assert_eq!(stats.failure_count, busy_requests as u64);
        assert_eq!(stats.use_count, busy_requests as u64);

        let accepted = env.node(4).request_count() + env.node(5).request_count();
        assert_eq!(accepted, TASKS);
    }
}
