//! Error types for the detection core

use thiserror::Error;

/// Errors raised by the feature encoder and outlier detector.
///
/// All variants are raised synchronously to the immediate caller; a failed
/// fit never clobbers previously fitted state.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// An empty record batch was passed to fit or score.
    #[error("empty record batch: at least one transaction is required")]
    EmptyInput,

    /// Contamination must lie in (0, 0.5].
    #[error("invalid contamination {0}: expected a fraction in (0, 0.5]")]
    InvalidContamination(f64),

    /// Strict-mode scoring was requested with no fitted model present.
    #[error("no fitted model: call ensure_model or force_retrain first")]
    NotFitted,
}
