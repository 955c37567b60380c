//! Audit journal and balance-update types
//!
//! Two append-only record sets document every transfer:
//!
//! - `BalanceUpdate` - one row per leg of a transfer (a debit row for the
//!   sender, a credit row for the recipient), carrying the before/after
//!   balances of that leg.
//! - `JournalEntry` - one double-entry record per transfer attempt, frozen
//!   once written. A committed transfer produces exactly one entry with
//!   `committed = true`; failed attempts are recorded too, uncommitted, for
//!   forensic completeness.

use super::id::prefixed_id;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which side of a transfer a balance update records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Debit,
    Credit,
}

/// Journal entry lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Completed,
    Failed,
    Reversed,
}

/// One leg of a committed transfer, write-once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    /// Unique update identifier (`UPD_XXXXXXXX`)
    pub update_id: String,

    /// Account whose balance moved
    pub account_number: String,

    /// Transfer this leg belongs to
    pub transaction_id: String,

    /// Debit (sender leg) or credit (recipient leg)
    pub operation: Operation,

    /// Amount moved
    pub amount: Decimal,

    /// Settled balance before this leg applied
    pub previous_balance: Decimal,

    /// Settled balance after this leg applied
    pub new_balance: Decimal,

    /// When the leg was committed
    pub timestamp: DateTime<Utc>,

    /// Atomic unit that committed this leg (`UNIT_XXXXXXXX`)
    pub unit_id: String,
}

impl BalanceUpdate {
    /// Record one leg of a transfer
    pub fn new(
        account_number: &str,
        transaction_id: &str,
        operation: Operation,
        amount: Decimal,
        previous_balance: Decimal,
        new_balance: Decimal,
        unit_id: &str,
    ) -> Self {
        BalanceUpdate {
            update_id: prefixed_id("UPD"),
            account_number: account_number.to_string(),
            transaction_id: transaction_id.to_string(),
            operation,
            amount,
            previous_balance,
            new_balance,
            timestamp: Utc::now(),
            unit_id: unit_id.to_string(),
        }
    }
}

/// Double-entry audit record, immutable once written
///
/// `debit_amount` always equals `credit_amount`; the two account fields
/// name the sender and recipient sides. Entries are keyed by `journal_id`
/// and indexed by `transaction_id`; a transaction may accumulate several
/// failed entries but at most one committed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique journal identifier (`JRN_XXXXXXXX`, key)
    pub journal_id: String,

    /// Transfer this entry documents (idempotency key)
    pub transaction_id: String,

    /// Account debited
    pub debit_account: String,

    /// Amount debited
    pub debit_amount: Decimal,

    /// Account credited
    pub credit_account: String,

    /// Amount credited (always equals `debit_amount`)
    pub credit_amount: Decimal,

    /// Caller-supplied transfer description
    pub description: String,

    /// Outcome of the attempt this entry documents
    pub status: EntryStatus,

    /// Atomic unit that wrote this entry, if one committed it
    pub unit_id: Option<String>,

    /// Whether balances actually moved
    pub committed: bool,

    /// When the entry was written
    pub timestamp: DateTime<Utc>,
}

impl JournalEntry {
    /// Entry for a committed transfer (status completed, committed)
    pub fn committed(
        transaction_id: &str,
        debit_account: &str,
        credit_account: &str,
        amount: Decimal,
        description: &str,
        unit_id: &str,
    ) -> Self {
        JournalEntry {
            journal_id: prefixed_id("JRN"),
            transaction_id: transaction_id.to_string(),
            debit_account: debit_account.to_string(),
            debit_amount: amount,
            credit_account: credit_account.to_string(),
            credit_amount: amount,
            description: description.to_string(),
            status: EntryStatus::Completed,
            unit_id: Some(unit_id.to_string()),
            committed: true,
            timestamp: Utc::now(),
        }
    }

    /// Entry for a failed attempt (status failed, no balance change)
    pub fn failed(
        transaction_id: &str,
        debit_account: &str,
        credit_account: &str,
        amount: Decimal,
        description: &str,
    ) -> Self {
        JournalEntry {
            journal_id: prefixed_id("JRN"),
            transaction_id: transaction_id.to_string(),
            debit_account: debit_account.to_string(),
            debit_amount: amount,
            credit_account: credit_account.to_string(),
            credit_amount: amount,
            description: description.to_string(),
            status: EntryStatus::Failed,
            unit_id: None,
            committed: false,
            timestamp: Utc::now(),
        }
    }
}
