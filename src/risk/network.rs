//! Multi-hop money-flow analysis over the transaction graph
//!
//! [`NetworkAnalyzer`] expands each transaction touching a seed account
//! into a chain by following funds from recipient to recipient, bounded
//! by hop depth and a time window. Chains are checked for two laundering
//! heuristics: rapid cycling (any hop routing funds back to the seed
//! account) and potential layering (repeated small-amount hops). The
//! analyzer is purely read-only over the store.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::ledger::store::LedgerStore;
use crate::types::TransactionRecord;

/// Chain hops below the configured amount threshold that count as layering
const LAYERING_MIN_COUNT: usize = 5;

/// One expanded flow chain rooted at a seed transaction
#[derive(Debug, Clone)]
pub struct NetworkChain {
    /// Transaction the chain was expanded from
    pub seed_transaction_id: String,
    /// Transactions in the chain, seed included
    pub network_size: usize,
    /// Sum of all amounts in the chain
    pub total_amount: Decimal,
    /// Distinct accounts appearing as sender or recipient
    pub participants: BTreeSet<String>,
    /// Funds returned to the seed account within the hop bound
    pub rapid_cycling: bool,
    /// Enough small-amount hops to suggest structuring
    pub potential_layering: bool,
}

impl NetworkChain {
    /// Whether either heuristic fired for this chain
    pub fn is_flagged(&self) -> bool {
        self.rapid_cycling || self.potential_layering
    }
}

/// Threshold-derived indicators over the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskIndicators {
    /// The largest chain exceeded the configured network-size threshold
    pub large_network: bool,
    /// Total flow across chains exceeded the configured ceiling
    pub high_value_network: bool,
}

/// Aggregate across every chain expanded for an account
#[derive(Debug, Clone)]
pub struct NetworkSummary {
    /// Account the analysis was seeded from
    pub account_number: String,
    /// Chains expanded, one per seed transaction
    pub networks_found: usize,
    /// Largest chain size observed
    pub max_network_size: usize,
    /// Sum of amounts across all chains
    pub total_amount: Decimal,
    /// Chains where a heuristic fired
    pub flagged_networks: usize,
    /// Distinct accounts touched across all chains
    pub distinct_accounts: usize,
    /// Per-chain detail
    pub chains: Vec<NetworkChain>,
    /// Threshold-derived indicators
    pub indicators: RiskIndicators,
}

/// Traverses transaction flows to surface laundering-like patterns
#[derive(Debug, Clone)]
pub struct NetworkAnalyzer {
    store: Arc<LedgerStore>,
}

impl NetworkAnalyzer {
    /// Create an analyzer over the given store
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// Expand and flag the flow networks around an account
    ///
    /// Seeds on every transaction touching `account_number` in the last
    /// `window_days`, then follows funds recipient-to-recipient for up to
    /// `max_hop_depth` hops, staying inside the window.
    pub fn analyze(
        &self,
        account_number: &str,
        max_hop_depth: usize,
        window_days: i64,
    ) -> NetworkSummary {
        let cutoff = Utc::now() - Duration::days(window_days);
        let corpus: Vec<TransactionRecord> = self
            .store
            .transactions_snapshot()
            .into_iter()
            .filter(|t| t.timestamp >= cutoff)
            .collect();

        let seeds: Vec<&TransactionRecord> = corpus
            .iter()
            .filter(|t| {
                t.sender.account_number == account_number
                    || t.recipient.account_number == account_number
            })
            .collect();
        debug!(
            account_number,
            seeds = seeds.len(),
            window_days,
            "expanding flow networks"
        );

        let layering_threshold = self.store.config().layering_amount_threshold;
        let chains: Vec<NetworkChain> = seeds
            .iter()
            .map(|seed| expand_chain(account_number, seed, &corpus, max_hop_depth, layering_threshold))
            .collect();

        let mut distinct: BTreeSet<&str> = BTreeSet::new();
        for chain in &chains {
            for account in &chain.participants {
                distinct.insert(account);
            }
        }
        let max_network_size = chains.iter().map(|c| c.network_size).max().unwrap_or(0);
        let total_amount: Decimal = chains.iter().map(|c| c.total_amount).sum();
        let config = self.store.config();
        let indicators = RiskIndicators {
            large_network: max_network_size > config.large_network_size,
            high_value_network: total_amount > config.high_value_network_ceiling,
        };

        NetworkSummary {
            account_number: account_number.to_string(),
            networks_found: chains.len(),
            max_network_size,
            total_amount,
            flagged_networks: chains.iter().filter(|c| c.is_flagged()).count(),
            distinct_accounts: distinct.len(),
            indicators,
            chains,
        }
    }
}

/// Follow funds outward from one seed transaction
///
/// Breadth-first over recipients: at each hop, every in-window
/// transaction sent by a current frontier account joins the chain.
/// Transactions never repeat within a chain, so cycles terminate.
fn expand_chain(
    seed_account: &str,
    seed: &TransactionRecord,
    corpus: &[TransactionRecord],
    max_hop_depth: usize,
    layering_threshold: Decimal,
) -> NetworkChain {
    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(&seed.transaction_id);
    let mut chain: Vec<&TransactionRecord> = vec![seed];
    let mut frontier: BTreeSet<&str> = BTreeSet::new();
    frontier.insert(&seed.recipient.account_number);
    let mut rapid_cycling = false;

    for _ in 0..max_hop_depth {
        if frontier.is_empty() {
            break;
        }
        let mut next: BTreeSet<&str> = BTreeSet::new();
        for record in corpus {
            if seen.contains(record.transaction_id.as_str()) {
                continue;
            }
            if !frontier.contains(record.sender.account_number.as_str()) {
                continue;
            }
            seen.insert(&record.transaction_id);
            chain.push(record);
            if record.recipient.account_number == seed_account {
                rapid_cycling = true;
            }
            next.insert(&record.recipient.account_number);
        }
        frontier = next;
    }

    let mut participants = BTreeSet::new();
    let mut total_amount = Decimal::ZERO;
    let mut small_hops = 0usize;
    for record in &chain {
        participants.insert(record.sender.account_number.clone());
        participants.insert(record.recipient.account_number.clone());
        total_amount += record.amount;
        if record.amount < layering_threshold {
            small_hops += 1;
        }
    }

    NetworkChain {
        seed_transaction_id: seed.transaction_id.clone(),
        network_size: chain.len(),
        total_amount,
        participants,
        rapid_cycling,
        potential_layering: small_hops >= LAYERING_MIN_COUNT,
    }
}
