//! Risk-corpus transaction and decision types
//!
//! These records form the history the risk subsystem searches over. They
//! are ingested by the external decision process and read-only from the
//! perspective of the similarity index and network analyzer: no risk
//! operation ever mutates them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Transfer channel classification used by the exact-filter path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Wire,
    Ach,
    Card,
    P2p,
    Crypto,
}

/// Processing status of a historical transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Rejected,
    Flagged,
}

/// One side of a transaction (sender or recipient)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    /// Account number of this party
    pub account_number: String,

    /// Display name
    pub name: String,

    /// ISO 3166 country code, used by the geo-match filter
    pub country: String,
}

impl Party {
    pub fn new(account_number: &str, name: &str, country: &str) -> Self {
        Party {
            account_number: account_number.to_string(),
            name: name.to_string(),
            country: country.to_string(),
        }
    }
}

/// Historical transaction in the risk corpus
///
/// The optional `embedding` is a semantic vector supplied by an external
/// embedding model; transactions without one are only reachable through
/// the exact-filter retrieval path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique transaction identifier (key)
    pub transaction_id: String,

    /// Transfer amount
    pub amount: Decimal,

    /// Transfer channel
    pub transaction_type: TransactionType,

    /// Sending party
    pub sender: Party,

    /// Receiving party
    pub recipient: Party,

    /// Semantic embedding of the transaction narrative, if computed
    pub embedding: Option<Vec<f32>>,

    /// Risk flags attached during screening
    pub risk_flags: Vec<String>,

    /// Processing status
    pub status: TransactionStatus,

    /// When the transaction occurred
    pub timestamp: DateTime<Utc>,
}

/// Historical decision rendered on a transaction
///
/// Joined onto similarity-search results by `transaction_id` so that each
/// precedent carries the outcome it led to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Reject,
    Escalate,
}

/// Decision record for a screened transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Transaction the decision applies to (key)
    pub transaction_id: String,

    /// Final decision
    pub decision: Decision,

    /// Decision confidence in [0, 1]
    pub confidence_score: f64,

    /// Transaction-level risk score in [0, 1]
    pub risk_score: f64,

    /// Factors that drove the decision
    pub risk_factors: Vec<String>,
}
