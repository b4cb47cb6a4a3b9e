//! Feature encoding for isolation-forest scoring.
//!
//! Transactions are mapped to a fixed-width numeric matrix: z-scored amount
//! and elapsed-seconds columns followed by one-hot indicators for purpose and
//! country over the vocabulary observed at fit time.

use crate::error::DetectorError;
use crate::types::transaction::Transaction;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Mean and scale of one numeric column, captured at fit time.
#[derive(Debug, Clone)]
struct ColumnStats {
    mean: f64,
    scale: f64,
}

impl ColumnStats {
    fn from_values(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            scale: variance.sqrt(),
        }
    }

    /// Z-score with a unit scale substituted for constant columns.
    fn apply(&self, value: f64) -> f64 {
        let scale = if self.scale == 0.0 { 1.0 } else { self.scale };
        (value - self.mean) / scale
    }
}

/// Frozen encoder state: normalization parameters plus the categorical
/// vocabularies observed at fit time.
///
/// Created once by [`FittedEncoder::fit`] and read-only afterwards. The
/// elapsed-time feature is measured against the earliest timestamp of the fit
/// batch rather than absolute epoch time, so the column's magnitude stays
/// stable no matter when generation started.
#[derive(Debug, Clone)]
pub struct FittedEncoder {
    min_timestamp: DateTime<Utc>,
    amount: ColumnStats,
    elapsed: ColumnStats,
    purposes: Vec<String>,
    countries: Vec<String>,
}

impl FittedEncoder {
    /// Fit encoder state against a batch of records.
    ///
    /// Captures the minimum timestamp, per-column mean/scale, and the sorted
    /// set of distinct purpose and country values.
    pub fn fit(records: &[Transaction]) -> Result<Self, DetectorError> {
        let min_timestamp = records
            .iter()
            .map(|tx| tx.timestamp)
            .min()
            .ok_or(DetectorError::EmptyInput)?;

        let amounts: Vec<f64> = records.iter().map(|tx| tx.amount).collect();
        let elapsed: Vec<f64> = records
            .iter()
            .map(|tx| elapsed_seconds(min_timestamp, tx.timestamp))
            .collect();

        let purposes: BTreeSet<String> = records.iter().map(|tx| tx.purpose.clone()).collect();
        let countries: BTreeSet<String> = records.iter().map(|tx| tx.country.clone()).collect();

        Ok(Self {
            min_timestamp,
            amount: ColumnStats::from_values(&amounts),
            elapsed: ColumnStats::from_values(&elapsed),
            purposes: purposes.into_iter().collect(),
            countries: countries.into_iter().collect(),
        })
    }

    /// Fit on a batch and transform the same batch.
    ///
    /// Identical to calling [`FittedEncoder::fit`] followed by
    /// [`FittedEncoder::transform`] on the same records.
    pub fn fit_transform(
        records: &[Transaction],
    ) -> Result<(Self, Vec<Vec<f64>>), DetectorError> {
        let encoder = Self::fit(records)?;
        let matrix = encoder.transform(records);
        Ok((encoder, matrix))
    }

    /// Encode records into feature vectors using the frozen state.
    ///
    /// Categorical values absent from the fit-time vocabulary encode as an
    /// all-zero indicator block for that column; they never fail.
    pub fn transform(&self, records: &[Transaction]) -> Vec<Vec<f64>> {
        records.iter().map(|tx| self.encode(tx)).collect()
    }

    fn encode(&self, tx: &Transaction) -> Vec<f64> {
        let mut features = Vec::with_capacity(self.width());

        features.push(self.amount.apply(tx.amount));
        features.push(
            self.elapsed
                .apply(elapsed_seconds(self.min_timestamp, tx.timestamp)),
        );

        one_hot(&mut features, &self.purposes, &tx.purpose);
        one_hot(&mut features, &self.countries, &tx.country);

        features
    }

    /// Feature vector width, constant for the lifetime of this state.
    pub fn width(&self) -> usize {
        2 + self.purposes.len() + self.countries.len()
    }

    /// Column labels in encoding order.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = vec!["amount".to_string(), "elapsed_secs".to_string()];
        names.extend(self.purposes.iter().map(|p| format!("purpose={p}")));
        names.extend(self.countries.iter().map(|c| format!("country={c}")));
        names
    }
}

fn elapsed_seconds(reference: DateTime<Utc>, timestamp: DateTime<Utc>) -> f64 {
    (timestamp - reference).num_milliseconds() as f64 / 1000.0
}

fn one_hot(features: &mut Vec<f64>, vocabulary: &[String], value: &str) {
    for known in vocabulary {
        features.push(if known == value { 1.0 } else { 0.0 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn make_records(amounts: &[f64]) -> Vec<Transaction> {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| {
                Transaction::new(base + Duration::hours(i as i64), amount, "Bills", "GBR")
            })
            .collect()
    }

    #[test]
    fn test_fit_empty_batch_fails() {
        let err = FittedEncoder::fit(&[]).unwrap_err();
        assert!(matches!(err, DetectorError::EmptyInput));
    }

    #[test]
    fn test_width_is_constant_across_batches() {
        let records = make_records(&[10.0, 20.0, 30.0]);
        let encoder = FittedEncoder::fit(&records).unwrap();

        let other = make_records(&[5.0, 500.0]);
        let a = encoder.transform(&records);
        let b = encoder.transform(&other);

        assert!(a.iter().all(|row| row.len() == encoder.width()));
        assert!(b.iter().all(|row| row.len() == encoder.width()));
        // amount + elapsed + one purpose + one country
        assert_eq!(encoder.width(), 4);
    }

    #[test]
    fn test_zscore_normalization() {
        let records = make_records(&[10.0, 20.0, 30.0]);
        let encoder = FittedEncoder::fit(&records).unwrap();
        let matrix = encoder.transform(&records);

        // Middle value sits on the mean.
        assert!(matrix[1][0].abs() < 1e-12);
        // Symmetric batch: edges mirror each other.
        assert!((matrix[0][0] + matrix[2][0]).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_uses_unit_scale() {
        let records = make_records(&[42.0, 42.0, 42.0]);
        let encoder = FittedEncoder::fit(&records).unwrap();
        let matrix = encoder.transform(&records);

        for row in &matrix {
            assert_eq!(row[0], 0.0);
            assert!(row.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_unknown_category_encodes_all_zero() {
        let records = make_records(&[10.0, 20.0]);
        let encoder = FittedEncoder::fit(&records).unwrap();

        let unseen = Transaction::new(
            Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap(),
            15.0,
            "Bills",
            "USA",
        );
        let row = &encoder.transform(&[unseen])[0];

        assert_eq!(row.len(), encoder.width());
        // Country block is the final vocabulary slot: all zero for "USA".
        assert_eq!(row[3], 0.0);
        // Purpose "Bills" is known and still lights up.
        assert_eq!(row[2], 1.0);
    }

    #[test]
    fn test_vocabulary_order_is_sorted() {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let records = vec![
            Transaction::new(base, 10.0, "Misc", "USA"),
            Transaction::new(base + Duration::hours(1), 12.0, "Bills", "GBR"),
        ];
        let encoder = FittedEncoder::fit(&records).unwrap();

        assert_eq!(
            encoder.feature_names(),
            vec![
                "amount",
                "elapsed_secs",
                "purpose=Bills",
                "purpose=Misc",
                "country=GBR",
                "country=USA",
            ]
        );
    }

    #[test]
    fn test_fit_transform_matches_separate_calls() {
        let records = make_records(&[1.0, 2.0, 4.0, 8.0]);

        let (encoder, combined) = FittedEncoder::fit_transform(&records).unwrap();
        let separate = FittedEncoder::fit(&records).unwrap().transform(&records);

        assert_eq!(combined, separate);
        assert_eq!(combined, encoder.transform(&records));
    }
}
