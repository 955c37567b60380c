//! Configuration for the payments ledger
//!
//! All tunables are gathered into [`LedgerConfig`] and injected where
//! needed rather than read from globals, so tests can shrink budgets and
//! thresholds without touching process state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Bounded-retry tuning for transient commit failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum attempts before a transfer gives up
    pub max_attempts: u32,
    /// Backoff before the first retry, doubled per attempt
    pub base_backoff_ms: u64,
    /// Ceiling for the doubled backoff
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 10,
            max_backoff_ms: 200,
        }
    }
}

/// Top-level ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Balance assigned to implicitly created accounts
    pub initial_balance: Decimal,
    /// Currency assigned to implicitly created accounts
    pub default_currency: String,
    /// Overdraft allowance assigned to implicitly created accounts
    pub default_overdraft_limit: Decimal,
    /// Hours before a placed hold is considered expired
    pub hold_ttl_hours: i64,
    /// Wall-clock budget for a single atomic commit
    pub commit_budget_ms: u64,
    /// Retry behavior for transient commit failures
    pub retry: RetryPolicy,
    /// Per-hop amount below which repeated chain activity counts as layering
    pub layering_amount_threshold: Decimal,
    /// Connected accounts above which a network is flagged as large
    pub large_network_size: usize,
    /// Total flow above which a network is flagged as high value
    pub high_value_network_ceiling: Decimal,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_balance: Decimal::from(10_000),
            default_currency: "USD".to_string(),
            default_overdraft_limit: Decimal::ZERO,
            hold_ttl_hours: 24,
            commit_budget_ms: 10_000,
            retry: RetryPolicy::default(),
            layering_amount_threshold: Decimal::from(1_000),
            large_network_size: 10,
            high_value_network_ceiling: Decimal::from(100_000),
        }
    }
}
