//! Core data types for the payments ledger

pub mod account;
pub mod error;
pub mod hold;
pub mod id;
pub mod journal;
pub mod transaction;

pub use account::{Account, AccountNumber, AccountStatus, AccountType, BalanceSnapshot};
pub use error::LedgerError;
pub use hold::Hold;
pub use id::prefixed_id;
pub use journal::{BalanceUpdate, EntryStatus, JournalEntry, Operation};
pub use transaction::{
    Decision, DecisionRecord, Party, TransactionRecord, TransactionStatus, TransactionType,
};
