//! Payments Ledger Library
//! # Overview
//!
//! This library provides an in-memory payments ledger with reservation
//! holds, an append-only audit journal, and a read-only risk-analysis
//! layer over the transaction history.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, Hold, JournalEntry, etc.)
//! - [`config`] - Injected configuration, never global
//! - [`ledger`] - Ledger core:
//!   - [`ledger::store`] - Concurrent record store and atomic units
//!   - [`ledger::transfer`] - Validated, idempotent, atomic transfers
//!   - [`ledger::holds`] - Available-balance reservations
//!   - [`ledger::journal`] - Append-only audit trail access
//! - [`risk`] - Read-only analysis:
//!   - [`risk::similarity`] - Hybrid precedent retrieval
//!   - [`risk::network`] - Multi-hop money-flow analysis
//!
//! # Transfer Semantics
//!
//! A transfer debits one account and credits another in a single atomic
//! unit, guarded by optimistic version checks and a commit-time budget.
//! The caller-supplied transaction id is an idempotency key: replaying a
//! committed transfer is a no-op. Every attempt, failed ones included,
//! leaves a journal record.
//!
//! # Balance Model
//!
//! Each account maintains:
//! - `balance`: The booked balance moved by committed transfers
//! - `available_balance`: Balance minus active hold reservations
//! - `overdraft_limit`: Extra allowance counted by transfers, not holds

// Module declarations
pub mod config;
pub mod ledger;
pub mod risk;
pub mod types;

pub use config::{LedgerConfig, RetryPolicy};
pub use ledger::{HoldManager, JournalWriter, LedgerStore, TransferEngine};
pub use risk::{NetworkAnalyzer, NetworkSummary, Precedent, RiskSimilarityIndex};
pub use types::{
    Account, BalanceSnapshot, BalanceUpdate, Hold, JournalEntry, LedgerError, TransactionRecord,
};
