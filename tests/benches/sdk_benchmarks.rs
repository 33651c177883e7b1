//! # Ledger SDK Benchmarks
//!
//! Hot paths of the client: checksum generation, node selection over a
//! partly benched network, and freezing plus signing a transaction for
//! several nodes.
//!
//! ```bash
//! cargo bench --package ledger-tests --bench sdk_benchmarks
//! cargo bench --package ledger-tests --bench sdk_benchmarks -- select_node
//! ```

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ledger_crypto::{KeyType, PrivateKey};
use ledger_sdk::test_utils::{scripted_address, ScriptedChannelFactory, TEST_OPERATOR};
use ledger_sdk::{
    generate_checksum, AccountAmount, AccountId, KeySigner, LedgerId, Network, NetworkOptions,
    Timestamp, Transaction, TransactionId,
};

fn network(size: u64) -> Network {
    let factory = Arc::new(ScriptedChannelFactory::new());
    let addresses = (3..3 + size).map(scripted_address).collect();
    Network::from_nodes(
        addresses,
        None,
        LedgerId::testnet(),
        factory,
        NetworkOptions::default(),
    )
    .unwrap_or_else(|e| panic!("network: {e}"))
}

fn bench_checksum(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum");
    for ledger in [LedgerId::mainnet(), LedgerId::testnet()] {
        group.bench_with_input(
            BenchmarkId::new("generate", ledger.to_string()),
            &ledger,
            |b, ledger| b.iter(|| generate_checksum(black_box(ledger), black_box("0.0.1234567"))),
        );
    }
    group.finish();
}

fn bench_select_node(c: &mut Criterion) {
    let now = Timestamp::new(1_700_000_000, 0);
    let any: &[AccountId] = &[];
    let mut group = c.benchmark_group("select_node");

    let healthy = network(30);
    group.bench_function("all_healthy", |b| {
        b.iter(|| healthy.select_node(black_box(any), now))
    });

    let degraded = network(30);
    for node in degraded.nodes().iter().step_by(2) {
        node.record_failure(now);
    }
    group.bench_function("half_benched", |b| {
        b.iter(|| degraded.select_node(black_box(any), now))
    });

    let benched = network(30);
    for (i, node) in benched.nodes().iter().enumerate() {
        for _ in 0..=(i % 4) {
            node.record_failure(now);
        }
    }
    group.bench_function("none_healthy", |b| {
        b.iter(|| benched.select_node(black_box(any), now))
    });

    let candidates: Vec<AccountId> = (3..8).map(AccountId::from_num).collect();
    group.bench_function("pinned_candidates", |b| {
        b.iter(|| healthy.select_node(black_box(&candidates), now))
    });
    group.finish();
}

fn bench_freeze_and_sign(c: &mut Criterion) {
    let network = network(5);
    let nodes: Vec<AccountId> = (3..8).map(AccountId::from_num).collect();
    let transaction_id = TransactionId::generate(TEST_OPERATOR, Timestamp::new(1_700_000_000, 0));

    let mut group = c.benchmark_group("freeze_and_sign");
    group.measurement_time(Duration::from_secs(5));
    for key_type in [KeyType::Ed25519, KeyType::EcdsaSecp256k1] {
        let signer = KeySigner::new(PrivateKey::generate(key_type));
        group.bench_function(BenchmarkId::new("five_nodes", key_type.to_string()), |b| {
            b.iter(|| {
                let mut tx = Transaction::crypto_transfer(vec![
                    AccountAmount {
                        account_id: TEST_OPERATOR,
                        amount: -10,
                    },
                    AccountAmount {
                        account_id: AccountId::from_num(1002),
                        amount: 10,
                    },
                ]);
                tx.set_node_account_ids(nodes.clone())
                    .and_then(|tx| tx.set_transaction_id(transaction_id.clone()))
                    .and_then(|tx| tx.freeze(&network))
                    .and_then(|tx| tx.sign(&signer))
                    .unwrap_or_else(|e| panic!("freeze and sign: {e}"));
                black_box(tx)
            })
        });
    }
    group.finish();
}

criterion_group!(
    name = sdk_benches;
    config = Criterion::default().sample_size(100);
    targets = bench_checksum, bench_select_node, bench_freeze_and_sign,
);

criterion_main!(sdk_benches);
