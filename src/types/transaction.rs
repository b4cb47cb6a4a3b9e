//! Transaction data structures for synthetic payment generation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One synthetic financial transaction.
///
/// Records are immutable once generated; the outlier label lives on
/// [`ScoredTransaction`](crate::types::scored::ScoredTransaction), never here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Instant the transaction occurred
    pub timestamp: DateTime<Utc>,

    /// Transaction amount, non-negative
    pub amount: f64,

    /// Free-form spending category ("Bills", "Holiday", ...)
    pub purpose: String,

    /// ISO 3166-1 alpha-3 country code
    pub country: String,
}

impl Transaction {
    /// Create a new transaction.
    pub fn new(
        timestamp: DateTime<Utc>,
        amount: f64,
        purpose: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            amount,
            purpose: purpose.into(),
            country: country.into(),
        }
    }
}
