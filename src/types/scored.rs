//! Labeled output records handed back to callers

use crate::types::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// A transaction augmented with its anomaly verdict.
///
/// `score` is the isolation score in (0, 1]; higher means more anomalous.
/// `is_outlier` is the thresholded decision against the fitted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredTransaction {
    /// The input record, unchanged
    pub transaction: Transaction,

    /// Raw anomaly score from the forest
    pub score: f64,

    /// Whether the record fell on the anomalous side of the threshold
    pub is_outlier: bool,
}

impl ScoredTransaction {
    pub fn new(transaction: Transaction, score: f64, is_outlier: bool) -> Self {
        Self {
            transaction,
            score,
            is_outlier,
        }
    }
}

/// Count the flagged records in a scored batch.
pub fn outlier_count(scored: &[ScoredTransaction]) -> usize {
    scored.iter().filter(|s| s.is_outlier).count()
}
