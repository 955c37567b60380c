//! Atomic transfers between accounts
//!
//! [`TransferEngine`] validates a transfer request, replays idempotently
//! when the transaction id already has a committed journal entry, and
//! otherwise runs the debit/credit pair as a single atomic unit under a
//! bounded retry loop. Failed attempts leave an audit trail in the
//! journal; committed transfers leave exactly one committed entry plus a
//! balance update per side.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::ledger::retry::with_retry;
use crate::ledger::store::LedgerStore;
use crate::types::{Account, BalanceUpdate, JournalEntry, LedgerError, Operation};

/// Executes validated, idempotent, atomic transfers against a store
#[derive(Debug, Clone)]
pub struct TransferEngine {
    store: Arc<LedgerStore>,
}

impl TransferEngine {
    /// Create an engine over the given store
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// Move `amount` from one account to another
    ///
    /// The transaction id is the idempotency key: if a committed journal
    /// entry already exists for it, the existing entry is returned and no
    /// balance moves. Otherwise the debit and credit are applied in one
    /// atomic unit; transient commit failures are retried per the
    /// configured policy.
    ///
    /// # Arguments
    ///
    /// * `transaction_id` - Caller-supplied idempotency key
    /// * `from_account` - Account to debit
    /// * `to_account` - Account to credit
    /// * `amount` - Amount to move, must be positive
    /// * `description` - Free-text description recorded in the journal
    ///
    /// # Errors
    ///
    /// Validation errors (`NonPositiveAmount`, `SelfTransfer`,
    /// `Malformed*`) are returned before the store is touched.
    /// `AccountNotFound` if either side does not exist,
    /// `InsufficientFunds` if the debit side cannot cover the amount, and
    /// `RetryExhausted` if contention outlasted the retry budget. For the
    /// last two a failed journal entry is recorded first.
    pub fn transfer(
        &self,
        transaction_id: &str,
        from_account: &str,
        to_account: &str,
        amount: Decimal,
        description: &str,
    ) -> Result<JournalEntry, LedgerError> {
        self.validate(transaction_id, from_account, to_account, amount)?;

        if let Some(existing) = self.store.committed_entry_for(transaction_id) {
            info!(transaction_id, "replaying committed transfer, no-op");
            return Ok(existing);
        }

        // Both sides must exist before any attempt is made.
        self.store.get_account(from_account)?;
        self.store.get_account(to_account)?;

        let policy = self.store.config().retry.clone();
        let result = with_retry(&policy, transaction_id, || {
            self.attempt(transaction_id, from_account, to_account, amount, description)
        });

        match result {
            Ok(entry) => {
                info!(
                    transaction_id,
                    from_account,
                    to_account,
                    amount = %amount,
                    "transfer committed"
                );
                Ok(entry)
            }
            Err(err) => {
                warn!(transaction_id, error = %err, "transfer failed");
                self.record_failure(transaction_id, from_account, to_account, amount, &err);
                Err(err)
            }
        }
    }

    fn validate(
        &self,
        transaction_id: &str,
        from_account: &str,
        to_account: &str,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if transaction_id.trim().is_empty() {
            return Err(LedgerError::malformed_transaction_id(transaction_id));
        }
        if from_account.trim().is_empty() {
            return Err(LedgerError::malformed_account_number(from_account));
        }
        if to_account.trim().is_empty() {
            return Err(LedgerError::malformed_account_number(to_account));
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::non_positive_amount(transaction_id, amount));
        }
        if from_account == to_account {
            return Err(LedgerError::self_transfer(from_account));
        }
        Ok(())
    }

    /// One staged attempt: fresh reads, funds check, debit, credit, commit
    fn attempt(
        &self,
        transaction_id: &str,
        from_account: &str,
        to_account: &str,
        amount: Decimal,
        description: &str,
    ) -> Result<JournalEntry, LedgerError> {
        // A concurrent submission of the same transaction id may have
        // committed since the caller's replay check; each attempt must
        // re-check or the retry loop would apply the transfer again.
        if let Some(existing) = self.store.committed_entry_for(transaction_id) {
            return Ok(existing);
        }

        let mut unit = self.store.begin_unit();
        let mut sender = unit.read_account(from_account)?;
        let mut recipient = unit.read_account(to_account)?;

        if sender.available_balance + sender.overdraft_limit < amount {
            return Err(LedgerError::insufficient_funds(
                from_account,
                sender.available_balance,
                amount,
            ));
        }

        let sender_previous = sender.balance;
        apply_debit(&mut sender, amount)?;
        let recipient_previous = recipient.balance;
        apply_credit(&mut recipient, amount)?;

        let unit_id = unit.unit_id().to_string();
        unit.stage_balance_update(BalanceUpdate::new(
            from_account,
            transaction_id,
            Operation::Debit,
            amount,
            sender_previous,
            sender.balance,
            &unit_id,
        ));
        unit.stage_balance_update(BalanceUpdate::new(
            to_account,
            transaction_id,
            Operation::Credit,
            amount,
            recipient_previous,
            recipient.balance,
            &unit_id,
        ));
        let entry = JournalEntry::committed(
            transaction_id,
            from_account,
            to_account,
            amount,
            description,
            &unit_id,
        );
        unit.stage_account(sender);
        unit.stage_account(recipient);
        unit.stage_journal(entry.clone());
        unit.commit()?;
        Ok(entry)
    }

    /// Append a failed audit entry for an attempt that will not commit
    ///
    /// Best effort: a duplicate journal id here is ignored since the
    /// original failure already carries the caller-facing error.
    fn record_failure(
        &self,
        transaction_id: &str,
        from_account: &str,
        to_account: &str,
        amount: Decimal,
        err: &LedgerError,
    ) {
        let entry = JournalEntry::failed(
            transaction_id,
            from_account,
            to_account,
            amount,
            &format!("transfer failed: {err}"),
        );
        let _ = self.store.append_journal(entry);
    }
}

fn apply_debit(account: &mut Account, amount: Decimal) -> Result<(), LedgerError> {
    account.balance = account
        .balance
        .checked_sub(amount)
        .ok_or_else(|| LedgerError::arithmetic_underflow("debit", &account.account_number))?;
    account.available_balance = account
        .available_balance
        .checked_sub(amount)
        .ok_or_else(|| LedgerError::arithmetic_underflow("debit", &account.account_number))?;
    account.total_withdrawals = account
        .total_withdrawals
        .checked_add(amount)
        .ok_or_else(|| LedgerError::arithmetic_overflow("debit", &account.account_number))?;
    touch(account);
    Ok(())
}

fn apply_credit(account: &mut Account, amount: Decimal) -> Result<(), LedgerError> {
    account.balance = account
        .balance
        .checked_add(amount)
        .ok_or_else(|| LedgerError::arithmetic_overflow("credit", &account.account_number))?;
    account.available_balance = account
        .available_balance
        .checked_add(amount)
        .ok_or_else(|| LedgerError::arithmetic_overflow("credit", &account.account_number))?;
    account.total_deposits = account
        .total_deposits
        .checked_add(amount)
        .ok_or_else(|| LedgerError::arithmetic_overflow("credit", &account.account_number))?;
    touch(account);
    Ok(())
}

fn touch(account: &mut Account) {
    let now = Utc::now();
    account.transaction_count += 1;
    account.last_transaction_at = Some(now);
    account.updated_at = now;
}
