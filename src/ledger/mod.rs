//! Ledger core: store, transfers, holds and the audit journal

pub mod holds;
pub mod journal;
pub mod retry;
pub mod store;
pub mod transfer;

pub use holds::HoldManager;
pub use journal::JournalWriter;
pub use retry::with_retry;
pub use store::{LedgerStore, TransferUnit};
pub use transfer::TransferEngine;
