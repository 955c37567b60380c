//! Precedent retrieval over the historical transaction corpus
//!
//! [`RiskSimilarityIndex`] ranks stored transactions against a candidate
//! by blending two retrieval paths: an exact/range filter (same type
//! with the amount in a proximity window, or a matching country pair)
//! and a nearest-neighbor pass over semantic embeddings when one is
//! supplied.
//! The union is re-scored with fixed weights, sorted, truncated and
//! joined against recorded decisions. The index is read-only over the
//! store and never mutates it.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, warn};

use crate::ledger::store::LedgerStore;
use crate::types::{DecisionRecord, LedgerError, TransactionRecord, TransactionType};

/// Relative amount window for the exact/range filter
const AMOUNT_WINDOW: f64 = 0.20;
/// Score weights for the blended ranking
const WEIGHT_VECTOR: f64 = 0.4;
const WEIGHT_EXACT: f64 = 0.2;
const WEIGHT_AMOUNT: f64 = 0.2;
const WEIGHT_GEO: f64 = 0.1;
const WEIGHT_TYPE: f64 = 0.1;
/// Vector candidate pool multiplier for the vector-only path
const FALLBACK_POOL_FACTOR: usize = 10;

/// Which retrieval path produced a precedent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMethod {
    /// Blended exact-filter and vector scoring
    Hybrid,
    /// Vector-only fallback
    VectorOnly,
}

/// A historical transaction ranked against a candidate
///
/// Only transactions with a recorded decision become precedents; the
/// decision carries the historical outcome, confidence and risk score.
#[derive(Debug, Clone)]
pub struct Precedent {
    /// The historical transaction
    pub transaction: TransactionRecord,
    /// The decision recorded for it
    pub decision: DecisionRecord,
    /// Blended relevance score, higher is more similar
    pub score: f64,
    /// Cosine similarity of embeddings, zero when either side has none
    pub vector_similarity: f64,
    /// Retrieval path that produced this precedent
    pub method: SearchMethod,
}

/// Ranks historical transactions against a candidate transfer
#[derive(Debug, Clone)]
pub struct RiskSimilarityIndex {
    store: Arc<LedgerStore>,
}

impl RiskSimilarityIndex {
    /// Create an index over the given store
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// Retrieve the most similar decided precedents for a candidate
    ///
    /// Runs the blended path: the union of the exact/range filter and,
    /// when `embedding` is supplied, a nearest-neighbor pass. If the
    /// blended path fails and an embedding is available, falls back to
    /// vector-only retrieval.
    ///
    /// # Errors
    ///
    /// `EmptyEmbedding` if an embedding is supplied but empty and the
    /// fallback cannot run either.
    pub fn hybrid_search(
        &self,
        candidate: &TransactionRecord,
        embedding: Option<&[f32]>,
        limit: usize,
    ) -> Result<Vec<Precedent>, LedgerError> {
        match self.blended(candidate, embedding, limit) {
            Ok(precedents) => Ok(precedents),
            // The in-memory blend only fails on invalid input; the
            // fallback is for retrieval backends that can fail after
            // validation.
            Err(err) => match embedding {
                Some(vector) if !vector.is_empty() => {
                    warn!(
                        transaction_id = %candidate.transaction_id,
                        error = %err,
                        "blended retrieval failed, falling back to vector-only"
                    );
                    self.vector_search(vector, Some(candidate.transaction_type), limit)
                }
                _ => Err(err),
            },
        }
    }

    /// Vector-only retrieval over transactions carrying an embedding
    ///
    /// # Errors
    ///
    /// `EmptyEmbedding` if `embedding` is empty.
    pub fn vector_search(
        &self,
        embedding: &[f32],
        transaction_type: Option<TransactionType>,
        limit: usize,
    ) -> Result<Vec<Precedent>, LedgerError> {
        if embedding.is_empty() {
            return Err(LedgerError::EmptyEmbedding);
        }
        let decisions = self.decisions_by_transaction();
        let pool = limit.saturating_mul(FALLBACK_POOL_FACTOR);
        let mut scored: Vec<(TransactionRecord, f64)> = self
            .store
            .transactions_snapshot()
            .into_iter()
            .filter(|t| transaction_type.map_or(true, |ty| t.transaction_type == ty))
            .filter_map(|t| {
                let similarity = t
                    .embedding
                    .as_deref()
                    .map(|stored| cosine_similarity(embedding, stored))?;
                Some((t, similarity))
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(pool);

        Ok(scored
            .into_iter()
            .filter_map(|(transaction, similarity)| {
                let decision = decisions.get(&transaction.transaction_id)?.clone();
                Some(Precedent {
                    transaction,
                    decision,
                    score: similarity,
                    vector_similarity: similarity,
                    method: SearchMethod::VectorOnly,
                })
            })
            .take(limit)
            .collect())
    }

    fn blended(
        &self,
        candidate: &TransactionRecord,
        embedding: Option<&[f32]>,
        limit: usize,
    ) -> Result<Vec<Precedent>, LedgerError> {
        if let Some(vector) = embedding {
            if vector.is_empty() {
                return Err(LedgerError::EmptyEmbedding);
            }
        }
        let history = self.corpus_excluding(&candidate.transaction_id);
        let decisions = self.decisions_by_transaction();

        // Exact/range filter side. Each side contributes at most half
        // the requested limit when an embedding is in play; without one
        // the filter side carries the full limit alone.
        let mut selected: HashMap<String, TransactionRecord> = HashMap::new();
        let side_cap = if embedding.is_some() {
            (limit / 2).max(1)
        } else {
            limit
        };
        for record in history
            .iter()
            .filter(|r| filter_path_matches(candidate, r))
            .take(side_cap)
        {
            selected.insert(record.transaction_id.clone(), record.clone());
        }

        // Nearest-neighbor side, restricted to the candidate's type.
        if let Some(vector) = embedding {
            let mut by_similarity: Vec<(&TransactionRecord, f64)> = history
                .iter()
                .filter(|r| r.transaction_type == candidate.transaction_type)
                .filter_map(|r| {
                    let stored = r.embedding.as_deref()?;
                    Some((r, cosine_similarity(vector, stored)))
                })
                .collect();
            by_similarity.sort_by(|a, b| b.1.total_cmp(&a.1));
            for (record, _) in by_similarity.into_iter().take(side_cap) {
                selected
                    .entry(record.transaction_id.clone())
                    .or_insert_with(|| record.clone());
            }
        }

        debug!(
            transaction_id = %candidate.transaction_id,
            pool_size = selected.len(),
            "re-scoring blended candidate pool"
        );

        let mut precedents: Vec<Precedent> = selected
            .into_values()
            .filter_map(|record| {
                let decision = decisions.get(&record.transaction_id)?.clone();
                let vector_similarity = match (embedding, record.embedding.as_deref()) {
                    (Some(a), Some(b)) => cosine_similarity(a, b),
                    _ => 0.0,
                };
                let score = blended_score(candidate, &record, vector_similarity);
                Some(Precedent {
                    transaction: record,
                    decision,
                    score,
                    vector_similarity,
                    method: SearchMethod::Hybrid,
                })
            })
            .collect();
        precedents.sort_by(|a, b| b.score.total_cmp(&a.score));
        precedents.truncate(limit);
        Ok(precedents)
    }

    fn corpus_excluding(&self, transaction_id: &str) -> Vec<TransactionRecord> {
        self.store
            .transactions_snapshot()
            .into_iter()
            .filter(|t| t.transaction_id != transaction_id)
            .collect()
    }

    fn decisions_by_transaction(&self) -> HashMap<String, DecisionRecord> {
        self.store
            .transactions_snapshot()
            .iter()
            .filter_map(|t| {
                self.store
                    .decision_for(&t.transaction_id)
                    .map(|d| (t.transaction_id.clone(), d))
            })
            .collect()
    }
}

/// Whether a historical record passes the exact/range filter
///
/// Either leg admits a record: same type with the amount inside the
/// proximity window, or the same sender and recipient country pair.
fn filter_path_matches(candidate: &TransactionRecord, record: &TransactionRecord) -> bool {
    let type_and_amount = record.transaction_type == candidate.transaction_type
        && amount_proximity(candidate, record) >= 1.0 - AMOUNT_WINDOW;
    let country_pair = record.sender.country == candidate.sender.country
        && record.recipient.country == candidate.recipient.country;
    type_and_amount || country_pair
}

/// Fixed-weight blend of the similarity components
fn blended_score(
    candidate: &TransactionRecord,
    record: &TransactionRecord,
    vector_similarity: f64,
) -> f64 {
    let exact = if filter_path_matches(candidate, record) {
        1.0
    } else {
        0.0
    };
    let geo = if record.sender.country == candidate.sender.country
        && record.recipient.country == candidate.recipient.country
    {
        1.0
    } else {
        0.5
    };
    let type_affinity = if record.transaction_type == candidate.transaction_type {
        1.0
    } else {
        0.3
    };
    WEIGHT_VECTOR * vector_similarity
        + WEIGHT_EXACT * exact
        + WEIGHT_AMOUNT * amount_proximity(candidate, record)
        + WEIGHT_GEO * geo
        + WEIGHT_TYPE * type_affinity
}

/// `max(0, 1 - |Δamount| / candidate_amount)`, zero for a zero candidate
fn amount_proximity(candidate: &TransactionRecord, record: &TransactionRecord) -> f64 {
    let candidate_amount = candidate.amount.to_f64().unwrap_or(0.0);
    if candidate_amount == 0.0 {
        return 0.0;
    }
    let delta = (record.amount.to_f64().unwrap_or(0.0) - candidate_amount).abs();
    (1.0 - delta / candidate_amount).max(0.0)
}

/// Cosine similarity of two embeddings; zero on dimension mismatch or a
/// zero-magnitude vector
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::types::{Decision, Party};
    use rust_decimal::Decimal;

    fn record(
        transaction_id: &str,
        amount: i64,
        transaction_type: TransactionType,
        recipient_country: &str,
        embedding: Option<Vec<f32>>,
    ) -> TransactionRecord {
        TransactionRecord {
            transaction_id: transaction_id.to_string(),
            amount: Decimal::from(amount),
            transaction_type,
            sender: Party::new("ACC-1", "Sender", "US"),
            recipient: Party::new("ACC-2", "Recipient", recipient_country),
            embedding,
            risk_flags: Vec::new(),
            status: crate::types::TransactionStatus::Pending,
            timestamp: chrono::Utc::now(),
        }
    }

    fn decision(transaction_id: &str, decision: Decision) -> DecisionRecord {
        DecisionRecord {
            transaction_id: transaction_id.to_string(),
            decision,
            confidence_score: 0.9,
            risk_score: 0.8,
            risk_factors: vec!["high amount".to_string()],
        }
    }

    fn index_with(records: Vec<(TransactionRecord, Option<DecisionRecord>)>) -> RiskSimilarityIndex {
        let store = Arc::new(LedgerStore::new(LedgerConfig::default()));
        for (record, maybe_decision) in records {
            store.record_transaction(record);
            if let Some(d) = maybe_decision {
                store.record_decision(d);
            }
        }
        RiskSimilarityIndex::new(store)
    }

    #[test]
    fn test_cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_similar_rejected_precedents_outrank_unrelated() {
        let candidate = record("TXN-NEW", 99_999, TransactionType::Wire, "IR", None);
        let index = index_with(vec![
            (
                record("TXN-A", 98_000, TransactionType::Wire, "IR", None),
                Some(decision("TXN-A", Decision::Reject)),
            ),
            (
                record("TXN-B", 120, TransactionType::Card, "GB", None),
                Some(decision("TXN-B", Decision::Approve)),
            ),
        ]);
        let results = index.hybrid_search(&candidate, None, 5).unwrap();
        assert_eq!(results[0].transaction.transaction_id, "TXN-A");
        assert_eq!(results[0].decision.decision, Decision::Reject);
        assert!(results[0].score > results.last().unwrap().score || results.len() == 1);
    }

    #[test]
    fn test_undecided_transactions_are_not_precedents() {
        let candidate = record("TXN-NEW", 1_000, TransactionType::Wire, "US", None);
        let index = index_with(vec![(
            record("TXN-A", 1_000, TransactionType::Wire, "US", None),
            None,
        )]);
        assert!(index.hybrid_search(&candidate, None, 5).unwrap().is_empty());
    }

    #[test]
    fn test_candidate_is_excluded_from_its_own_results() {
        let candidate = record("TXN-A", 1_000, TransactionType::Wire, "US", None);
        let index = index_with(vec![(
            candidate.clone(),
            Some(decision("TXN-A", Decision::Approve)),
        )]);
        assert!(index.hybrid_search(&candidate, None, 5).unwrap().is_empty());
    }

    #[test]
    fn test_country_pair_alone_admits_a_precedent() {
        // Different type and a far-off amount, but the same US -> IR
        // corridor; the filter's country-pair leg must surface it
        // without any embedding.
        let candidate = record("TXN-NEW", 99_999, TransactionType::Wire, "IR", None);
        let index = index_with(vec![(
            record("TXN-A", 500, TransactionType::Card, "IR", None),
            Some(decision("TXN-A", Decision::Reject)),
        )]);
        let results = index.hybrid_search(&candidate, None, 5).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].transaction.transaction_id, "TXN-A");
        assert_eq!(results[0].decision.decision, Decision::Reject);
    }

    #[test]
    fn test_embedding_pulls_in_filter_misses() {
        let candidate = record("TXN-NEW", 1_000, TransactionType::Wire, "US", None);
        // Fails both filter legs (amount far outside the window, no
        // country-pair match) but is a near-perfect embedding match of
        // the same type.
        let near = record(
            "TXN-A",
            400,
            TransactionType::Wire,
            "KY",
            Some(vec![1.0, 0.0, 0.0]),
        );
        let index = index_with(vec![(near, Some(decision("TXN-A", Decision::Escalate)))]);
        let results = index
            .hybrid_search(&candidate, Some(&[1.0, 0.0, 0.0]), 5)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].vector_similarity > 0.99);
        assert_eq!(results[0].method, SearchMethod::Hybrid);
    }

    #[test]
    fn test_vector_search_rejects_empty_embedding() {
        let index = index_with(vec![]);
        assert_eq!(
            index.vector_search(&[], None, 5).unwrap_err(),
            LedgerError::EmptyEmbedding
        );
    }

    #[test]
    fn test_vector_search_filters_by_type_and_ranks() {
        let index = index_with(vec![
            (
                record(
                    "TXN-A",
                    100,
                    TransactionType::Wire,
                    "US",
                    Some(vec![1.0, 0.0]),
                ),
                Some(decision("TXN-A", Decision::Approve)),
            ),
            (
                record(
                    "TXN-B",
                    100,
                    TransactionType::Wire,
                    "US",
                    Some(vec![0.2, 1.0]),
                ),
                Some(decision("TXN-B", Decision::Approve)),
            ),
            (
                record(
                    "TXN-C",
                    100,
                    TransactionType::Card,
                    "US",
                    Some(vec![1.0, 0.0]),
                ),
                Some(decision("TXN-C", Decision::Approve)),
            ),
        ]);
        let results = index
            .vector_search(&[1.0, 0.0], Some(TransactionType::Wire), 5)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].transaction.transaction_id, "TXN-A");
        assert_eq!(results[0].method, SearchMethod::VectorOnly);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_results_are_truncated_to_limit() {
        let mut records = Vec::new();
        for i in 0..10 {
            let id = format!("TXN-{i}");
            records.push((
                record(&id, 1_000, TransactionType::Wire, "US", None),
                Some(decision(&id, Decision::Approve)),
            ));
        }
        let candidate = record("TXN-NEW", 1_000, TransactionType::Wire, "US", None);
        let index = index_with(records);
        let results = index.hybrid_search(&candidate, None, 3).unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_each_blend_side_is_capped_at_half_the_limit() {
        // Six filter matches and six distinct nearest-neighbor matches;
        // with a limit of four each side may contribute at most two.
        let mut records = Vec::new();
        for i in 0..6 {
            let id = format!("TXN-FILTER-{i}");
            records.push((
                record(&id, 1_000, TransactionType::Wire, "US", None),
                Some(decision(&id, Decision::Approve)),
            ));
        }
        for i in 0..6 {
            let id = format!("TXN-NEAR-{i}");
            records.push((
                record(
                    &id,
                    50_000,
                    TransactionType::Wire,
                    "KY",
                    Some(vec![1.0, i as f32 * 0.01]),
                ),
                Some(decision(&id, Decision::Reject)),
            ));
        }
        let candidate = record("TXN-NEW", 1_000, TransactionType::Wire, "US", None);
        let index = index_with(records);
        let results = index
            .hybrid_search(&candidate, Some(&[1.0, 0.0]), 4)
            .unwrap();
        assert_eq!(results.len(), 4);
        let near_count = results
            .iter()
            .filter(|p| p.transaction.transaction_id.starts_with("TXN-NEAR"))
            .count();
        assert_eq!(near_count, 2);
    }
}
