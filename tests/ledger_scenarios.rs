//! End-to-end ledger scenarios: transfers, holds and reconciliation

use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;

use payments_ledger::types::Operation;
use payments_ledger::{HoldManager, JournalWriter, LedgerConfig, LedgerError, LedgerStore, TransferEngine};

fn fixture(initial_balance: i64) -> (Arc<LedgerStore>, TransferEngine, HoldManager) {
    let store = Arc::new(LedgerStore::new(LedgerConfig {
        initial_balance: Decimal::from(initial_balance),
        ..LedgerConfig::default()
    }));
    store.get_or_create_account("SENDER", "Sender Customer", None);
    store.get_or_create_account("RECIPIENT", "Recipient Customer", None);
    let engine = TransferEngine::new(Arc::clone(&store));
    let holds = HoldManager::new(Arc::clone(&store));
    (store, engine, holds)
}

#[test]
fn transfer_within_balance_succeeds() {
    let (store, engine, _) = fixture(1_000);
    engine
        .transfer("TXN-1", "SENDER", "RECIPIENT", Decimal::from(400), "payment")
        .unwrap();
    let balance = store.get_account_balance("SENDER").unwrap();
    assert_eq!(balance.balance, Decimal::from(600));
    assert_eq!(balance.available_balance, Decimal::from(600));
}

#[test]
fn transfer_beyond_available_fails_and_preserves_balances() {
    let (store, engine, _) = fixture(600);
    let err = engine
        .transfer("TXN-1", "SENDER", "RECIPIENT", Decimal::from(700), "payment")
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { available, .. }
        if available == Decimal::from(600)));
    assert_eq!(
        store.get_account("SENDER").unwrap().balance,
        Decimal::from(600)
    );
    assert_eq!(
        store.get_account("RECIPIENT").unwrap().balance,
        Decimal::from(600)
    );
}

#[test]
fn hold_blocks_transfer_despite_raw_balance() {
    let (_, engine, holds) = fixture(600);
    holds
        .place_hold("SENDER", "TXN-HOLD", Decimal::from(300), "card authorization")
        .unwrap();
    let err = engine
        .transfer("TXN-1", "SENDER", "RECIPIENT", Decimal::from(500), "payment")
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { available, .. }
        if available == Decimal::from(300)));
}

#[test]
fn hold_round_trip_restores_available_exactly() {
    let (store, _, holds) = fixture(1_000);
    let hold = holds
        .place_hold("SENDER", "TXN-HOLD", Decimal::from(250), "review")
        .unwrap();
    assert_eq!(
        store.get_account_balance("SENDER").unwrap().available_balance,
        Decimal::from(750)
    );
    assert!(holds.release_hold(&hold.hold_id).unwrap());
    assert_eq!(
        store.get_account_balance("SENDER").unwrap().available_balance,
        Decimal::from(1_000)
    );
    // Second release is a no-op.
    assert!(!holds.release_hold(&hold.hold_id).unwrap());
    assert_eq!(
        store.get_account_balance("SENDER").unwrap().available_balance,
        Decimal::from(1_000)
    );
}

#[test]
fn replayed_transaction_id_never_double_applies() {
    let (store, engine, _) = fixture(1_000);
    for _ in 0..3 {
        engine
            .transfer("TXN-1", "SENDER", "RECIPIENT", Decimal::from(100), "repeat")
            .unwrap();
    }
    assert_eq!(
        store.get_account("SENDER").unwrap().balance,
        Decimal::from(900)
    );
    let journal = JournalWriter::new(store);
    assert_eq!(journal.entries_for_transaction("TXN-1").len(), 1);
}

#[test]
fn failed_attempts_are_audited_with_at_most_one_commit() {
    let (store, engine, _) = fixture(100);
    for i in 0..2 {
        engine
            .transfer(
                "TXN-1",
                "SENDER",
                "RECIPIENT",
                Decimal::from(500 + i),
                "too big",
            )
            .unwrap_err();
    }
    engine
        .transfer("TXN-1", "SENDER", "RECIPIENT", Decimal::from(50), "fits")
        .unwrap();
    let journal = JournalWriter::new(store);
    let entries = journal.entries_for_transaction("TXN-1");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries.iter().filter(|e| e.committed).count(), 1);
    assert!(journal.has_committed("TXN-1"));
}

#[test]
fn balance_reconciles_against_update_trail() {
    let (store, engine, _) = fixture(5_000);
    store.get_or_create_account("THIRD", "Third Customer", None);
    engine
        .transfer("TXN-1", "SENDER", "RECIPIENT", Decimal::from(700), "a")
        .unwrap();
    engine
        .transfer("TXN-2", "RECIPIENT", "THIRD", Decimal::from(450), "b")
        .unwrap();
    engine
        .transfer("TXN-3", "THIRD", "SENDER", Decimal::from(50), "c")
        .unwrap();

    for account in ["SENDER", "RECIPIENT", "THIRD"] {
        let mut expected = Decimal::from(5_000);
        for update in store.balance_updates_for(account) {
            match update.operation {
                Operation::Credit => expected += update.amount,
                Operation::Debit => expected -= update.amount,
            }
        }
        assert_eq!(store.get_account(account).unwrap().balance, expected);
    }
}

#[test]
fn available_balance_tracks_active_holds() {
    let (store, _, holds) = fixture(2_000);
    let first = holds
        .place_hold("SENDER", "TXN-1", Decimal::from(300), "one")
        .unwrap();
    holds
        .place_hold("SENDER", "TXN-2", Decimal::from(200), "two")
        .unwrap();
    let account = store.get_account("SENDER").unwrap();
    let held: Decimal = holds
        .active_holds("SENDER")
        .iter()
        .map(|h| h.amount)
        .sum();
    assert_eq!(account.available_balance, account.balance - held);

    holds.release_hold(&first.hold_id).unwrap();
    let account = store.get_account("SENDER").unwrap();
    let held: Decimal = holds
        .active_holds("SENDER")
        .iter()
        .map(|h| h.amount)
        .sum();
    assert_eq!(account.available_balance, account.balance - held);
}

#[test]
fn simultaneous_duplicate_submissions_commit_once() {
    let (store, _, _) = fixture(10_000);
    let rounds = 25;
    for round in 0..rounds {
        let transaction_id = format!("TXN-{round}");
        let barrier = Arc::new(std::sync::Barrier::new(2));
        let mut handles = Vec::new();
        for _ in 0..2 {
            let engine = TransferEngine::new(Arc::clone(&store));
            let barrier = Arc::clone(&barrier);
            let transaction_id = transaction_id.clone();
            handles.push(thread::spawn(move || {
                barrier.wait();
                engine.transfer(
                    &transaction_id,
                    "SENDER",
                    "RECIPIENT",
                    Decimal::from(100),
                    "duplicate submission",
                )
            }));
        }
        // Both callers see the single committed entry.
        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        let entries = store.journal_for_transaction(&transaction_id);
        assert_eq!(entries.iter().filter(|e| e.committed).count(), 1);
    }
    assert_eq!(
        store.get_account("SENDER").unwrap().balance,
        Decimal::from(10_000 - 100 * rounds)
    );
    assert_eq!(
        store.get_account("SENDER").unwrap().transaction_count,
        rounds as u64
    );
}

#[rstest]
#[case::disjoint_pairs(false)]
#[case::contending_pairs(true)]
fn concurrent_transfers_conserve_total_balance(#[case] contend: bool) {
    let store = Arc::new(LedgerStore::new(LedgerConfig::default()));
    for i in 0..8 {
        store.get_or_create_account(&format!("ACC-{i}"), "Concurrent Customer", None);
    }
    let before = store.total_balance();

    let mut handles = Vec::new();
    for worker in 0..4 {
        let engine = TransferEngine::new(Arc::clone(&store));
        handles.push(thread::spawn(move || {
            for i in 0..25 {
                let (from, to) = if contend {
                    ("ACC-0".to_string(), "ACC-1".to_string())
                } else {
                    (format!("ACC-{}", worker * 2), format!("ACC-{}", worker * 2 + 1))
                };
                // Contending workers may exhaust retries; that is fine as
                // long as no money is created or destroyed.
                let _ = engine.transfer(
                    &format!("TXN-{worker}-{i}"),
                    &from,
                    &to,
                    Decimal::from(7),
                    "concurrent",
                );
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.total_balance(), before);
}

proptest! {
    #[test]
    fn random_transfer_sequences_conserve_total_balance(
        transfers in prop::collection::vec((0usize..4, 0usize..4, 1i64..500), 1..40)
    ) {
        let store = Arc::new(LedgerStore::new(LedgerConfig::default()));
        for i in 0..4 {
            store.get_or_create_account(&format!("ACC-{i}"), "Prop Customer", None);
        }
        let engine = TransferEngine::new(Arc::clone(&store));
        let before = store.total_balance();
        for (n, (from, to, amount)) in transfers.into_iter().enumerate() {
            let _ = engine.transfer(
                &format!("TXN-{n}"),
                &format!("ACC-{from}"),
                &format!("ACC-{to}"),
                Decimal::from(amount),
                "prop",
            );
        }
        prop_assert_eq!(store.total_balance(), before);
    }
}
