//! Account-related types for the payments ledger
//!
//! This module defines the Account structure and its status/type enums.
//! An account tracks two balances: the settled `balance` and the
//! `available_balance`, which is the settled balance minus all active
//! (unreleased, unexpired) holds.

use super::id::prefixed_id;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account identifier
///
/// Account numbers are opaque strings assigned by the host system
/// (e.g. "ACC-100234"). The ledger treats them as unique keys.
pub type AccountNumber = String;

/// Account product type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
    Business,
    Investment,
}

/// Account lifecycle status
///
/// Only `Active` accounts participate in transfers and holds; the other
/// states are set by out-of-scope administrative surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Suspended,
    Frozen,
    Closed,
}

/// Customer account state
///
/// All monetary fields are fixed-precision decimals; binary floats never
/// touch a balance. The invariant maintained across every operation is:
///
/// ```text
/// available_balance = balance - sum(active, unexpired hold amounts)
/// ```
///
/// `balance` itself changes only inside a transfer's atomic unit and never
/// falls below `-overdraft_limit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account number (key)
    pub account_number: AccountNumber,

    /// Account product type
    pub account_type: AccountType,

    /// Generated customer identifier (`CUST_XXXXXXXX`)
    pub customer_id: String,

    /// Customer display name
    pub customer_name: String,

    /// Settled balance
    pub balance: Decimal,

    /// Balance available for new transfers and holds
    ///
    /// Reduced by `place_hold`, restored by `release_hold`, and moved in
    /// lockstep with `balance` during transfers.
    pub available_balance: Decimal,

    /// ISO currency code (e.g. "USD")
    pub currency: String,

    /// Lifecycle status
    pub status: AccountStatus,

    /// Maximum total withdrawals per day
    pub daily_withdrawal_limit: Decimal,

    /// Maximum total transfers per day
    pub daily_transfer_limit: Decimal,

    /// How far below zero the settled balance may go
    pub overdraft_limit: Decimal,

    /// Lifetime sum of credits received
    pub total_deposits: Decimal,

    /// Lifetime sum of debits sent
    pub total_withdrawals: Decimal,

    /// Number of committed transfers touching this account
    pub transaction_count: u64,

    /// Timestamp of the most recent committed transfer
    pub last_transaction_at: Option<DateTime<Utc>>,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,

    /// Timestamp of the most recent mutation
    pub updated_at: DateTime<Utc>,

    /// Whether KYC verification has completed
    pub kyc_verified: bool,

    /// Latest account-level risk score assigned by the decision process
    pub risk_score: Decimal,

    /// Identifiers of active holds against this account
    ///
    /// References only; the hold records themselves live in the store's
    /// holds record set. Entries are removed when a hold is released.
    pub holds: Vec<String>,
}

impl Account {
    /// Open a new account with an opening balance
    ///
    /// The opening balance is credited to both `balance` and
    /// `available_balance`; all counters start at zero, the status is
    /// `Active`, and a fresh `customer_id` is generated.
    ///
    /// # Arguments
    ///
    /// * `account_number` - Unique account number
    /// * `customer_name` - Customer display name
    /// * `initial_balance` - Opening balance
    /// * `currency` - ISO currency code
    pub fn open(
        account_number: &str,
        customer_name: &str,
        initial_balance: Decimal,
        currency: &str,
    ) -> Self {
        let now = Utc::now();
        Account {
            account_number: account_number.to_string(),
            account_type: AccountType::Checking,
            customer_id: prefixed_id("CUST"),
            customer_name: customer_name.to_string(),
            balance: initial_balance,
            available_balance: initial_balance,
            currency: currency.to_string(),
            status: AccountStatus::Active,
            daily_withdrawal_limit: Decimal::from(10_000),
            daily_transfer_limit: Decimal::from(50_000),
            overdraft_limit: Decimal::ZERO,
            total_deposits: Decimal::ZERO,
            total_withdrawals: Decimal::ZERO,
            transaction_count: 0,
            last_transaction_at: None,
            created_at: now,
            updated_at: now,
            kyc_verified: false,
            risk_score: Decimal::ZERO,
            holds: Vec::new(),
        }
    }
}

/// Balance view returned by the ledger's balance query
///
/// Carries exactly the three figures a caller needs to decide whether a
/// transfer can proceed; callers must re-verify at decision time rather
/// than caching this at display time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Settled balance
    pub balance: Decimal,

    /// Balance available for new transfers and holds
    pub available_balance: Decimal,

    /// Overdraft headroom below zero
    pub overdraft_limit: Decimal,
}
