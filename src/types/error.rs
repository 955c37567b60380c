//! Error types for the payments ledger
//!
//! This module defines all errors that can surface from ledger and risk
//! operations. Errors fall into four classes:
//!
//! - **Fatal per call**: `AccountNotFound` - the referenced account does
//!   not exist.
//! - **Expected business outcomes**: `InsufficientFunds` - returned with
//!   the current available balance so the caller can report it.
//! - **Validation failures**: rejected before the store is touched
//!   (non-positive amounts, self-transfers, malformed identifiers).
//! - **Transient store signals**: `WriteConflict` and
//!   `CommitBudgetExceeded` are caught and retried internally; only retry
//!   exhaustion escalates to the caller as `RetryExhausted`, which is safe
//!   to resubmit under the same transaction id since no partial state
//!   exists.

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the payments ledger
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// The referenced account does not exist
    ///
    /// Fatal for the current call; accounts are never created implicitly
    /// by a transfer.
    #[error("Account {account_number} not found")]
    AccountNotFound {
        /// Account number that was looked up
        account_number: String,
    },

    /// The sender cannot cover the requested amount
    ///
    /// An expected business outcome, returned with the current available
    /// balance. Both accounts are left byte-identical to their pre-call
    /// state.
    #[error("Insufficient funds for account {account_number}: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Account that lacked funds
        account_number: String,
        /// Available balance at the time of the check
        available: Decimal,
        /// Requested amount
        requested: Decimal,
    },

    /// Store contention persisted past the internal retry budget
    ///
    /// No partial state exists; the caller may safely resubmit with the
    /// same transaction id.
    #[error("Transfer {transaction_id} exhausted {attempts} retry attempts")]
    RetryExhausted {
        /// Idempotency key of the failed transfer
        transaction_id: String,
        /// Attempts made before giving up
        attempts: u32,
    },

    /// An account read during the atomic unit changed before commit
    ///
    /// Transient; retried internally by the bounded-retry loop.
    #[error("Write conflict on account {account_number}")]
    WriteConflict {
        /// Account whose version check failed
        account_number: String,
    },

    /// The atomic unit failed to commit within its time budget
    ///
    /// Transient and never treated as success; retried internally.
    #[error("Commit budget exceeded: {elapsed_ms}ms elapsed, budget {budget_ms}ms")]
    CommitBudgetExceeded {
        /// Time spent in the unit before the commit attempt
        elapsed_ms: u64,
        /// Configured commit budget
        budget_ms: u64,
    },

    /// Transfer or hold amount was zero or negative
    ///
    /// Rejected before touching the store.
    #[error("Amount {amount} for transaction {transaction_id} must be positive")]
    NonPositiveAmount {
        /// Transaction the amount was supplied for
        transaction_id: String,
        /// The offending amount
        amount: Decimal,
    },

    /// Sender and recipient are the same account
    ///
    /// Rejected before touching the store.
    #[error("Account {account_number} cannot transfer to itself")]
    SelfTransfer {
        /// The account appearing on both sides
        account_number: String,
    },

    /// Account number is empty or whitespace
    ///
    /// Rejected before touching the store.
    #[error("Malformed account number '{account_number}'")]
    MalformedAccountNumber {
        /// The offending account number
        account_number: String,
    },

    /// Transaction id is empty or whitespace
    ///
    /// Rejected before touching the store.
    #[error("Malformed transaction id '{transaction_id}'")]
    MalformedTransactionId {
        /// The offending transaction id
        transaction_id: String,
    },

    /// Vector search was invoked with an empty embedding
    #[error("Embedding must not be empty")]
    EmptyEmbedding,

    /// A checked decimal addition would overflow
    ///
    /// The operation is rejected to keep balances intact.
    #[error("Arithmetic overflow in {operation} for account {account_number}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account involved
        account_number: String,
    },

    /// A checked decimal subtraction would underflow
    ///
    /// The operation is rejected to keep balances intact.
    #[error("Arithmetic underflow in {operation} for account {account_number}")]
    ArithmeticUnderflow {
        /// Operation that would underflow
        operation: String,
        /// Account involved
        account_number: String,
    },

    /// A journal entry with this id already exists
    ///
    /// Guards the append-only journal; entries are never overwritten.
    #[error("Journal entry {journal_id} already exists")]
    DuplicateJournalEntry {
        /// The duplicated journal id
        journal_id: String,
    },
}

impl LedgerError {
    /// Whether this error is a transient store signal safe to retry
    ///
    /// Transient errors are handled by the internal bounded-retry loop and
    /// only escalate as `RetryExhausted`.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LedgerError::WriteConflict { .. } | LedgerError::CommitBudgetExceeded { .. }
        )
    }

    /// Whether this error was raised by pre-store validation
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::NonPositiveAmount { .. }
                | LedgerError::SelfTransfer { .. }
                | LedgerError::MalformedAccountNumber { .. }
                | LedgerError::MalformedTransactionId { .. }
                | LedgerError::EmptyEmbedding
        )
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an AccountNotFound error
    pub fn account_not_found(account_number: &str) -> Self {
        LedgerError::AccountNotFound {
            account_number: account_number.to_string(),
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account_number: &str, available: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            account_number: account_number.to_string(),
            available,
            requested,
        }
    }

    /// Create a RetryExhausted error
    pub fn retry_exhausted(transaction_id: &str, attempts: u32) -> Self {
        LedgerError::RetryExhausted {
            transaction_id: transaction_id.to_string(),
            attempts,
        }
    }

    /// Create a WriteConflict error
    pub fn write_conflict(account_number: &str) -> Self {
        LedgerError::WriteConflict {
            account_number: account_number.to_string(),
        }
    }

    /// Create a NonPositiveAmount error
    pub fn non_positive_amount(transaction_id: &str, amount: Decimal) -> Self {
        LedgerError::NonPositiveAmount {
            transaction_id: transaction_id.to_string(),
            amount,
        }
    }

    /// Create a SelfTransfer error
    pub fn self_transfer(account_number: &str) -> Self {
        LedgerError::SelfTransfer {
            account_number: account_number.to_string(),
        }
    }

    /// Create a MalformedAccountNumber error
    pub fn malformed_account_number(account_number: &str) -> Self {
        LedgerError::MalformedAccountNumber {
            account_number: account_number.to_string(),
        }
    }

    /// Create a MalformedTransactionId error
    pub fn malformed_transaction_id(transaction_id: &str) -> Self {
        LedgerError::MalformedTransactionId {
            transaction_id: transaction_id.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account_number: &str) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account_number: account_number.to_string(),
        }
    }

    /// Create an ArithmeticUnderflow error
    pub fn arithmetic_underflow(operation: &str, account_number: &str) -> Self {
        LedgerError::ArithmeticUnderflow {
            operation: operation.to_string(),
            account_number: account_number.to_string(),
        }
    }

    /// Create a DuplicateJournalEntry error
    pub fn duplicate_journal_entry(journal_id: &str) -> Self {
        LedgerError::DuplicateJournalEntry {
            journal_id: journal_id.to_string(),
        }
    }
}
