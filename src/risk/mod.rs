//! Read-only risk analysis over committed ledger state

pub mod network;
pub mod similarity;

pub use network::{NetworkAnalyzer, NetworkChain, NetworkSummary, RiskIndicators};
pub use similarity::{Precedent, RiskSimilarityIndex, SearchMethod};
