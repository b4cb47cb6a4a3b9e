//! Type definitions for the anomaly pipeline

pub mod scored;
pub mod transaction;

pub use scored::ScoredTransaction;
pub use transaction::Transaction;
