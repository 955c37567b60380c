//! Benchmark suite for transfer commit and risk retrieval throughput
//!
//! Measured with the divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//! ```

use std::sync::Arc;

use rust_decimal::Decimal;

use payments_ledger::types::{Party, TransactionRecord, TransactionStatus, TransactionType};
use payments_ledger::{LedgerConfig, LedgerStore, RiskSimilarityIndex, TransferEngine};

fn main() {
    divan::main();
}

fn seeded_store(accounts: usize) -> Arc<LedgerStore> {
    let store = Arc::new(LedgerStore::new(LedgerConfig {
        initial_balance: Decimal::from(1_000_000),
        ..LedgerConfig::default()
    }));
    for i in 0..accounts {
        store.get_or_create_account(&format!("ACC-{i}"), "Bench Customer", None);
    }
    store
}

/// Benchmark a ping-pong transfer stream between two accounts
#[divan::bench]
fn transfers_two_accounts(bencher: divan::Bencher) {
    let store = seeded_store(2);
    let engine = TransferEngine::new(store);
    let mut n = 0u64;
    bencher.bench_local(move || {
        n += 1;
        let (from, to) = if n % 2 == 0 {
            ("ACC-0", "ACC-1")
        } else {
            ("ACC-1", "ACC-0")
        };
        engine
            .transfer(&format!("TXN-{n}"), from, to, Decimal::ONE, "bench")
            .expect("transfer failed");
    });
}

/// Benchmark transfers spread over a wide account set
#[divan::bench]
fn transfers_spread_accounts(bencher: divan::Bencher) {
    let store = seeded_store(64);
    let engine = TransferEngine::new(store);
    let mut n = 0u64;
    bencher.bench_local(move || {
        n += 1;
        let from = format!("ACC-{}", n % 64);
        let to = format!("ACC-{}", (n + 17) % 64);
        engine
            .transfer(&format!("TXN-{n}"), &from, &to, Decimal::ONE, "bench")
            .expect("transfer failed");
    });
}

/// Benchmark hybrid retrieval over a 1,000-record corpus
#[divan::bench]
fn hybrid_search_thousand_records(bencher: divan::Bencher) {
    let store = seeded_store(0);
    for i in 0..1_000 {
        let record = TransactionRecord {
            transaction_id: format!("TXN-{i}"),
            amount: Decimal::from(100 + (i % 900)),
            transaction_type: TransactionType::Wire,
            sender: Party::new("ACC-S", "Sender", "US"),
            recipient: Party::new("ACC-R", "Recipient", "GB"),
            embedding: Some(vec![(i % 7) as f32, (i % 13) as f32, 1.0]),
            risk_flags: Vec::new(),
            status: TransactionStatus::Approved,
            timestamp: chrono::Utc::now(),
        };
        store.record_decision(payments_ledger::types::DecisionRecord {
            transaction_id: record.transaction_id.clone(),
            decision: payments_ledger::types::Decision::Approve,
            confidence_score: 0.9,
            risk_score: 0.2,
            risk_factors: Vec::new(),
        });
        store.record_transaction(record);
    }
    let index = RiskSimilarityIndex::new(store);
    let candidate = TransactionRecord {
        transaction_id: "TXN-CANDIDATE".to_string(),
        amount: Decimal::from(500),
        transaction_type: TransactionType::Wire,
        sender: Party::new("ACC-S", "Sender", "US"),
        recipient: Party::new("ACC-R", "Recipient", "GB"),
        embedding: None,
        risk_flags: Vec::new(),
        status: TransactionStatus::Pending,
        timestamp: chrono::Utc::now(),
    };
    bencher.bench_local(move || {
        index
            .hybrid_search(&candidate, Some(&[3.0, 5.0, 1.0]), 10)
            .expect("search failed")
    });
}
