//! Transaction Anomaly Pipeline Library
//!
//! Synthesizes fake financial-transaction records and flags anomalous ones
//! with an unsupervised isolation forest: records are encoded into a
//! fixed-width feature space, a forest is fitted once over a batch, and new
//! data is labeled against the frozen model until a retrain is requested.

pub mod config;
pub mod error;
pub mod features;
pub mod generator;
pub mod metrics;
pub mod models;
pub mod types;

pub use config::AppConfig;
pub use error::DetectorError;
pub use features::encoder::FittedEncoder;
pub use generator::TransactionGenerator;
pub use metrics::PipelineMetrics;
pub use models::detector::OutlierDetector;
pub use models::forest::IsolationForest;
pub use types::{scored::ScoredTransaction, transaction::Transaction};
