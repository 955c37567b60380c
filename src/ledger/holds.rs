//! Reservation holds against account balances
//!
//! A hold earmarks part of an account's available balance without moving
//! the booked balance. Placement is strict: the available balance alone
//! must cover the hold, overdraft is not counted. Release is idempotent
//! and at-most-once; the released flag flips atomically before the
//! balance is restored, so racing releases restore the amount exactly
//! once.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::ledger::store::LedgerStore;
use crate::types::{Hold, LedgerError};

/// Places and releases reservation holds on a store
#[derive(Debug, Clone)]
pub struct HoldManager {
    store: Arc<LedgerStore>,
}

impl HoldManager {
    /// Create a manager over the given store
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// Reserve `amount` from an account's available balance
    ///
    /// The hold expires after the configured TTL. Expiry is logical:
    /// expired holds keep their reservation until explicitly released,
    /// they only become visible through [`HoldManager::expired_holds`].
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` or `Malformed*` for invalid input.
    /// - `AccountNotFound` if the account does not exist.
    /// - `InsufficientFunds` if the available balance alone cannot cover
    ///   the hold.
    pub fn place_hold(
        &self,
        account_number: &str,
        transaction_id: &str,
        amount: Decimal,
        reason: &str,
    ) -> Result<Hold, LedgerError> {
        if account_number.trim().is_empty() {
            return Err(LedgerError::malformed_account_number(account_number));
        }
        if transaction_id.trim().is_empty() {
            return Err(LedgerError::malformed_transaction_id(transaction_id));
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::non_positive_amount(transaction_id, amount));
        }

        let ttl = Duration::hours(self.store.config().hold_ttl_hours);
        let hold = Hold::new(account_number, transaction_id, amount, reason, Utc::now() + ttl);
        let hold_id = hold.hold_id.clone();

        self.store.update_account(account_number, |account| {
            if account.available_balance < amount {
                return Err(LedgerError::insufficient_funds(
                    &account.account_number,
                    account.available_balance,
                    amount,
                ));
            }
            account.available_balance = account
                .available_balance
                .checked_sub(amount)
                .ok_or_else(|| {
                    LedgerError::arithmetic_underflow("place_hold", &account.account_number)
                })?;
            account.holds.push(hold_id.clone());
            account.updated_at = Utc::now();
            Ok(())
        })?;

        self.store.insert_hold(hold.clone());
        info!(
            hold_id = %hold.hold_id,
            account_number,
            amount = %amount,
            "hold placed"
        );
        Ok(hold)
    }

    /// Release a hold and restore its amount to the available balance
    ///
    /// Returns `Ok(true)` if this call performed the release, `Ok(false)`
    /// if the hold is unknown or was already released. Safe to call
    /// concurrently with the same id: exactly one caller restores the
    /// amount.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the hold's account no longer exists.
    pub fn release_hold(&self, hold_id: &str) -> Result<bool, LedgerError> {
        let hold = match self.store.try_release_hold(hold_id) {
            Some(hold) => hold,
            None => return Ok(false),
        };

        self.store.update_account(&hold.account_number, |account| {
            account.available_balance = account
                .available_balance
                .checked_add(hold.amount)
                .ok_or_else(|| {
                    LedgerError::arithmetic_overflow("release_hold", &account.account_number)
                })?;
            account.holds.retain(|id| id != hold_id);
            account.updated_at = Utc::now();
            Ok(())
        })?;

        info!(hold_id, account_number = %hold.account_number, "hold released");
        Ok(true)
    }

    /// Active holds currently reserving balance on an account
    pub fn active_holds(&self, account_number: &str) -> Vec<Hold> {
        self.store
            .holds_for_account(account_number)
            .into_iter()
            .filter(|h| h.is_active())
            .collect()
    }

    /// Active holds whose TTL has passed as of `now`
    ///
    /// These still reserve balance; a sweeper decides whether to release
    /// them.
    pub fn expired_holds(&self, now: DateTime<Utc>) -> Vec<Hold> {
        self.store
            .all_holds()
            .into_iter()
            .filter(|h| h.is_active() && h.is_expired(now))
            .collect()
    }
}
