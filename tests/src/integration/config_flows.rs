//! # Configuration Flows
//!
//! A client built from a TOML file on disk, talking to loopback nodes.

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use ledger_crypto::{KeyType, PrivateKey};
    use ledger_sdk::{
        AccountAmount, AccountBalanceQuery, AccountId, Client, ClientConfig, LedgerId, SdkError,
        Status, Transaction,
    };
    use tempfile::TempDir;

    use crate::integration::support::{healthy_node, LoopbackNode};

    fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("client.toml");
        fs::write(&path, body).unwrap();
        path
    }

    fn node_table(nodes: &[(u64, &str)]) -> String {
        nodes
            .iter()
            .map(|(num, endpoint)| {
                format!("[[network.nodes]]\naccount_id = \"0.0.{num}\"\naddress = \"{endpoint}\"\n")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn config_text(nodes: &[(u64, &str)], key_type: &str, key_hex: &str) -> String {
        format!(
            r#"
auto_validate_checksums = true

[network]
ledger_id = "03"

{nodes}
[operator]
account_id = "0.0.1001"
private_key = "{key_hex}"
key_type = "{key_type}"

[execution]
max_attempts = 4
request_timeout_ms = 2000
min_backoff_ms = 10
max_backoff_ms = 100

[transport]
max_frame_size = 1048576
"#,
            nodes = node_table(nodes),
        )
    }

    fn transfer() -> Transaction {
        Transaction::crypto_transfer(vec![
            AccountAmount {
                account_id: AccountId::from_num(1001),
                amount: -7,
            },
            AccountAmount {
                account_id: AccountId::from_num(1002),
                amount: 7,
            },
        ])
    }

    #[tokio::test]
    async fn test_client_from_config_file() {
        let node3 = LoopbackNode::spawn(healthy_node).await;
        let node4 = LoopbackNode::spawn(healthy_node).await;
        let key = PrivateKey::generate(KeyType::Ed25519).to_hex();
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            &config_text(&[(3, &node3.endpoint), (4, &node4.endpoint)], "ed25519", &key),
        );

        let config = ClientConfig::load(&path).unwrap();
        let client = Client::from_config(&config).unwrap();

        assert_eq!(client.ledger_id(), LedgerId::local_node());
        assert_eq!(client.network().len(), 2);
        assert_eq!(client.execute_settings().max_attempts, 4);
        assert_eq!(
            client.execute_settings().request_timeout,
            Duration::from_secs(2)
        );
        assert!(client.auto_validate_checksums());

        client.ping_all().await.unwrap();
        let response = transfer().execute(&client).await.unwrap();
        let receipt = response.get_receipt(&client).await.unwrap();
        assert_eq!(receipt.status, Status::Success);

        let balance = AccountBalanceQuery::new(AccountId::from_num(1001))
            .execute(&client)
            .await
            .unwrap();
        assert_eq!(balance.balance, 100);
        client.close().await;
    }

    #[tokio::test]
    async fn test_ecdsa_operator_from_config() {
        let node = LoopbackNode::spawn(healthy_node).await;
        let key = PrivateKey::generate(KeyType::EcdsaSecp256k1).to_hex();
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, &config_text(&[(3, &node.endpoint)], "ecdsa", &key));

        let client = Client::from_config(&ClientConfig::load(&path).unwrap()).unwrap();
        let response = transfer().execute(&client).await.unwrap();

        assert_eq!(response.node_id, AccountId::from_num(3));
        assert_eq!(node.requests().len(), 1);
    }

    #[test]
    fn test_bad_operator_key_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            &config_text(&[(3, "127.0.0.1:50211")], "ed25519", "not-hex"),
        );

        let config = ClientConfig::load(&path).unwrap();
        assert!(matches!(
            Client::from_config(&config),
            Err(SdkError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "retries = 3\n");

        assert!(matches!(
            ClientConfig::load(&path),
            Err(SdkError::Config(_))
        ));
    }
}
