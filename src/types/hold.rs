//! Hold (fund reservation) types
//!
//! A hold reserves part of an account's available balance without moving
//! funds. Holds are created by the `HoldManager`, referenced (not owned) by
//! the account's active-hold set, and released at most once.

use super::id::prefixed_id;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A reservation against an account's available balance
///
/// Expiry is logical only: a hold past `expires_at` still reduces the
/// available balance until an external sweeper releases it. Reads never
/// mutate hold state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hold {
    /// Unique hold identifier (`HOLD_XXXXXXXX`, key)
    pub hold_id: String,

    /// Account the hold reserves funds on
    pub account_number: String,

    /// Transaction the reservation was made for
    pub transaction_id: String,

    /// Reserved amount
    pub amount: Decimal,

    /// Why the funds were reserved
    pub reason: String,

    /// When the hold logically expires
    pub expires_at: DateTime<Utc>,

    /// When the hold was placed
    pub created_at: DateTime<Utc>,

    /// Whether the hold has been released
    ///
    /// Flips to true exactly once; a released hold never reserves funds
    /// again.
    pub released: bool,

    /// When the hold was released, if it has been
    pub released_at: Option<DateTime<Utc>>,
}

impl Hold {
    /// Create a new active hold
    ///
    /// # Arguments
    ///
    /// * `account_number` - Account to reserve funds on
    /// * `transaction_id` - Transaction the reservation is for
    /// * `amount` - Amount to reserve
    /// * `reason` - Human-readable reservation reason
    /// * `expires_at` - Logical expiry timestamp
    pub fn new(
        account_number: &str,
        transaction_id: &str,
        amount: Decimal,
        reason: &str,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Hold {
            hold_id: prefixed_id("HOLD"),
            account_number: account_number.to_string(),
            transaction_id: transaction_id.to_string(),
            amount,
            reason: reason.to_string(),
            expires_at,
            created_at: Utc::now(),
            released: false,
            released_at: None,
        }
    }

    /// Whether this hold still reserves funds
    ///
    /// Active means not yet released. Expiry does not deactivate a hold by
    /// itself; the sweeper must release it.
    pub fn is_active(&self) -> bool {
        !self.released
    }

    /// Whether this hold is past its logical expiry at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_hold_is_active_and_unreleased() {
        let hold = Hold::new(
            "ACC-1",
            "TXN-1",
            Decimal::from(250),
            "Transaction processing",
            Utc::now() + Duration::hours(24),
        );

        assert!(hold.hold_id.starts_with("HOLD_"));
        assert!(hold.is_active());
        assert!(!hold.released);
        assert!(hold.released_at.is_none());
    }

    #[test]
    fn test_expiry_is_logical_only() {
        let hold = Hold::new(
            "ACC-1",
            "TXN-1",
            Decimal::from(100),
            "Transaction processing",
            Utc::now() - Duration::hours(1),
        );

        // Past expiry but unreleased: still reserving funds.
        assert!(hold.is_expired(Utc::now()));
        assert!(hold.is_active());
    }
}
