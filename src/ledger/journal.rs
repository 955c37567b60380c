//! Append-only audit journal access
//!
//! The journal itself lives in the store; [`JournalWriter`] is the
//! audit-facing surface over it. A transaction id may accumulate any
//! number of failed entries but at most one committed entry, and entries
//! are never updated or removed once written.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use crate::ledger::store::LedgerStore;
use crate::types::{BalanceUpdate, JournalEntry, LedgerError};

/// Read and append audit records for transactions
#[derive(Debug, Clone)]
pub struct JournalWriter {
    store: Arc<LedgerStore>,
}

impl JournalWriter {
    /// Create a writer over the given store
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// Append a failed-attempt audit entry
    ///
    /// # Errors
    ///
    /// Returns `DuplicateJournalEntry` if the generated journal id is
    /// already taken.
    pub fn record_failed_attempt(
        &self,
        transaction_id: &str,
        debit_account: &str,
        credit_account: &str,
        amount: Decimal,
        description: &str,
    ) -> Result<JournalEntry, LedgerError> {
        let entry = JournalEntry::failed(
            transaction_id,
            debit_account,
            credit_account,
            amount,
            description,
        );
        debug!(transaction_id, journal_id = %entry.journal_id, "recording failed attempt");
        self.store.append_journal(entry.clone())?;
        Ok(entry)
    }

    /// Every entry recorded for a transaction id, oldest first
    pub fn entries_for_transaction(&self, transaction_id: &str) -> Vec<JournalEntry> {
        self.store.journal_for_transaction(transaction_id)
    }

    /// The committed entry for a transaction id, if one exists
    pub fn committed_entry(&self, transaction_id: &str) -> Option<JournalEntry> {
        self.store.committed_entry_for(transaction_id)
    }

    /// Whether a transaction id has already committed
    pub fn has_committed(&self, transaction_id: &str) -> bool {
        self.committed_entry(transaction_id).is_some()
    }

    /// Most recent balance updates for an account, newest first
    pub fn account_history(&self, account_number: &str, limit: usize) -> Vec<BalanceUpdate> {
        self.store.get_transaction_history(account_number, limit)
    }
}
