//! Outlier model manager: owns the fitted encoder and forest as one unit.

use crate::config::DetectorConfig;
use crate::error::DetectorError;
use crate::features::encoder::FittedEncoder;
use crate::models::forest::{ForestParams, IsolationForest};
use crate::types::scored::ScoredTransaction;
use crate::types::transaction::Transaction;
use tracing::{debug, info};

/// Encoder state and forest are co-versioned: they are only ever replaced
/// together, so a stale model can never be paired with fresh encoder state.
#[derive(Debug)]
struct Fitted {
    encoder: FittedEncoder,
    forest: IsolationForest,
}

/// Stateful manager around the encode-fit-score lifecycle.
///
/// Mutating operations take `&mut self`; a caller sharing a detector across
/// threads wraps it in a lock, and the borrow checker rules out concurrent
/// mutation within one.
///
/// By default a model is fitted implicitly on the first [`score`] call and
/// then reused unchanged as the dataset grows; refreshing the model on newer
/// data is an explicit caller decision via [`force_retrain`].
///
/// [`score`]: OutlierDetector::score
/// [`force_retrain`]: OutlierDetector::force_retrain
#[derive(Debug)]
pub struct OutlierDetector {
    config: DetectorConfig,
    fitted: Option<Fitted>,
    version: u64,
}

impl OutlierDetector {
    /// Create an unfitted detector.
    ///
    /// Fails with [`DetectorError::InvalidContamination`] unless the
    /// configured contamination lies in (0, 0.5].
    pub fn new(config: DetectorConfig) -> Result<Self, DetectorError> {
        if !(config.contamination > 0.0 && config.contamination <= 0.5) {
            return Err(DetectorError::InvalidContamination(config.contamination));
        }

        Ok(Self {
            config,
            fitted: None,
            version: 0,
        })
    }

    /// Fit encoder and forest against `records` unless a model is already
    /// held. Deliberately never retrains on grown data; see
    /// [`force_retrain`](OutlierDetector::force_retrain) for refreshes.
    pub fn ensure_model(&mut self, records: &[Transaction]) -> Result<(), DetectorError> {
        if self.fitted.is_some() {
            debug!(version = self.version, "Model already fitted, reusing");
            return Ok(());
        }
        self.refit(records)
    }

    /// Discard any held state and refit both encoder and forest.
    ///
    /// On failure the previously fitted state is left untouched.
    pub fn force_retrain(&mut self, records: &[Transaction]) -> Result<(), DetectorError> {
        self.refit(records)
    }

    /// Label each record against the current model, fitting one first if
    /// none is held (unless `strict` is configured, in which case scoring an
    /// unfitted detector fails with [`DetectorError::NotFitted`]).
    ///
    /// Output order matches input order.
    pub fn score(
        &mut self,
        records: &[Transaction],
    ) -> Result<Vec<ScoredTransaction>, DetectorError> {
        if records.is_empty() {
            return Err(DetectorError::EmptyInput);
        }
        if self.config.strict && self.fitted.is_none() {
            return Err(DetectorError::NotFitted);
        }

        self.ensure_model(records)?;
        let fitted = match &self.fitted {
            Some(fitted) => fitted,
            None => return Err(DetectorError::NotFitted),
        };

        let matrix = fitted.encoder.transform(records);
        let scored = records
            .iter()
            .zip(&matrix)
            .map(|(tx, row)| {
                let score = fitted.forest.score(row);
                ScoredTransaction::new(tx.clone(), score, score >= fitted.forest.threshold())
            })
            .collect();

        Ok(scored)
    }

    /// Whether a model is currently held.
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Fit generation counter: 0 before the first fit, bumped on every
    /// successful (re)fit and never by a reused model.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Feature width of the current encoder state, if fitted.
    pub fn feature_width(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.encoder.width())
    }

    // Builds the replacement state fully before swapping it in, so a failed
    // fit cannot leave a half-updated pair behind.
    fn refit(&mut self, records: &[Transaction]) -> Result<(), DetectorError> {
        let (encoder, matrix) = FittedEncoder::fit_transform(records)?;
        let params = ForestParams {
            n_estimators: self.config.n_estimators,
            max_samples: self.config.max_samples,
            seed: self.config.seed,
        };
        let forest = IsolationForest::fit(&matrix, self.config.contamination, &params)?;

        info!(
            records = records.len(),
            width = encoder.width(),
            trees = forest.n_trees(),
            threshold = forest.threshold(),
            version = self.version + 1,
            "Fitted outlier model"
        );

        self.fitted = Some(Fitted { encoder, forest });
        self.version += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn config(contamination: f64) -> DetectorConfig {
        DetectorConfig {
            contamination,
            n_estimators: 100,
            max_samples: 256,
            seed: 42,
            strict: false,
        }
    }

    fn make_records(rows: &[(f64, &str, &str)]) -> Vec<Transaction> {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        rows.iter()
            .enumerate()
            .map(|(i, &(amount, purpose, country))| {
                Transaction::new(base + Duration::hours(i as i64), amount, purpose, country)
            })
            .collect()
    }

    #[test]
    fn test_invalid_contamination_rejected() {
        for bad in [0.0, -0.2, 0.51, 2.0] {
            let err = OutlierDetector::new(config(bad)).unwrap_err();
            assert!(matches!(err, DetectorError::InvalidContamination(_)));
        }
    }

    #[test]
    fn test_score_empty_batch_fails() {
        let mut detector = OutlierDetector::new(config(0.1)).unwrap();
        let err = detector.score(&[]).unwrap_err();
        assert!(matches!(err, DetectorError::EmptyInput));
    }

    #[test]
    fn test_strict_mode_requires_explicit_fit() {
        let strict = DetectorConfig {
            strict: true,
            ..config(0.1)
        };
        let mut detector = OutlierDetector::new(strict).unwrap();
        let records = make_records(&[(10.0, "Bills", "GBR"), (12.0, "Bills", "GBR")]);

        let err = detector.score(&records).unwrap_err();
        assert!(matches!(err, DetectorError::NotFitted));

        detector.ensure_model(&records).unwrap();
        assert!(detector.score(&records).is_ok());
    }

    #[test]
    fn test_no_implicit_retrain_on_grown_dataset() {
        let mut detector = OutlierDetector::new(config(0.1)).unwrap();
        let mut records = make_records(&[
            (10.0, "Bills", "GBR"),
            (12.0, "Bills", "GBR"),
            (11.0, "Bills", "GBR"),
        ]);

        detector.score(&records).unwrap();
        assert_eq!(detector.version(), 1);

        records.extend(make_records(&[(9.0, "Misc", "USA"), (14.0, "Holiday", "FRA")]));
        detector.score(&records).unwrap();
        assert_eq!(detector.version(), 1);

        detector.force_retrain(&records).unwrap();
        assert_eq!(detector.version(), 2);
    }

    #[test]
    fn test_failed_retrain_keeps_previous_model() {
        let mut detector = OutlierDetector::new(config(0.1)).unwrap();
        let records = make_records(&[(10.0, "Bills", "GBR"), (12.0, "Bills", "GBR")]);

        detector.ensure_model(&records).unwrap();
        let err = detector.force_retrain(&[]).unwrap_err();

        assert!(matches!(err, DetectorError::EmptyInput));
        assert!(detector.is_fitted());
        assert_eq!(detector.version(), 1);
    }

    #[test]
    fn test_unknown_country_at_scoring_time() {
        let mut detector = OutlierDetector::new(config(0.1)).unwrap();
        let records = make_records(&[
            (10.0, "Bills", "GBR"),
            (12.0, "Bills", "GBR"),
            (11.0, "Bills", "GBR"),
        ]);
        detector.ensure_model(&records).unwrap();

        let unseen = make_records(&[(11.5, "Bills", "JPN")]);
        let scored = detector.score(&unseen).unwrap();
        assert_eq!(scored.len(), 1);
    }

    #[test]
    fn test_output_preserves_input_order() {
        let mut detector = OutlierDetector::new(config(0.25)).unwrap();
        let records = make_records(&[
            (10.0, "Bills", "GBR"),
            (12.0, "Bills", "GBR"),
            (9.0, "Bills", "GBR"),
            (5000.0, "Misc", "USA"),
        ]);

        let scored = detector.score(&records).unwrap();
        for (tx, s) in records.iter().zip(&scored) {
            assert_eq!(*tx, s.transaction);
        }
    }

    #[test]
    fn test_end_to_end_flags_the_large_transaction() {
        let mut detector = OutlierDetector::new(config(0.25)).unwrap();
        let records = make_records(&[
            (10.0, "Bills", "GBR"),
            (12.0, "Bills", "GBR"),
            (9.0, "Bills", "GBR"),
            (5000.0, "Misc", "USA"),
        ]);

        let scored = detector.score(&records).unwrap();
        let flagged: Vec<usize> = scored
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_outlier)
            .map(|(i, _)| i)
            .collect();

        assert_eq!(flagged, vec![3]);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let records = make_records(&[
            (10.0, "Bills", "GBR"),
            (12.0, "Holiday", "FRA"),
            (9.0, "Bills", "GBR"),
            (800.0, "Misc", "USA"),
        ]);

        let mut a = OutlierDetector::new(config(0.25)).unwrap();
        let mut b = OutlierDetector::new(config(0.25)).unwrap();

        let scored_a = a.score(&records).unwrap();
        let scored_b = b.score(&records).unwrap();

        for (x, y) in scored_a.iter().zip(&scored_b) {
            assert_eq!(x.score, y.score);
            assert_eq!(x.is_outlier, y.is_outlier);
        }
    }
}
