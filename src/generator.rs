//! Synthetic transaction generator.
//!
//! Uniform sampler standing in for the excluded dashboard data source:
//! amounts uniform in the configured range (two decimal places), purpose and
//! country drawn from the configured choice lists, timestamps advancing by a
//! random 1-3600 seconds per row so batches form a plausible time series.

use crate::config::GeneratorConfig;
use crate::types::transaction::Transaction;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DEFAULT_PURPOSES: [&str; 6] = [
    "Entertainment",
    "Holiday",
    "Transportation",
    "Bills",
    "Medical",
    "Misc",
];

const DEFAULT_COUNTRIES: [&str; 8] = [
    "GBR", "USA", "DEU", "FRA", "ESP", "ITA", "NLD", "CHE",
];

/// Seeded generator producing batches of synthetic transactions.
pub struct TransactionGenerator {
    rng: StdRng,
    purposes: Vec<String>,
    countries: Vec<String>,
    amount_min: f64,
    amount_max: f64,
    last_timestamp: DateTime<Utc>,
}

impl TransactionGenerator {
    /// Create a generator; empty choice lists fall back to the built-in sets.
    pub fn new(config: &GeneratorConfig, start: DateTime<Utc>) -> Self {
        let purposes = if config.purposes.is_empty() {
            DEFAULT_PURPOSES.iter().map(|s| s.to_string()).collect()
        } else {
            config.purposes.clone()
        };
        let countries = if config.countries.is_empty() {
            DEFAULT_COUNTRIES.iter().map(|s| s.to_string()).collect()
        } else {
            config.countries.clone()
        };

        Self {
            rng: StdRng::seed_from_u64(config.seed),
            purposes,
            countries,
            amount_min: config.amount_min,
            amount_max: config.amount_max,
            last_timestamp: start,
        }
    }

    /// Generate one transaction, advancing the timestamp cursor.
    pub fn next_transaction(&mut self) -> Transaction {
        self.last_timestamp = self.last_timestamp + Duration::seconds(self.rng.gen_range(1..=3600));

        let amount = self.rng.gen_range(self.amount_min..=self.amount_max);
        let amount = (amount * 100.0).round() / 100.0;

        let purpose_idx = self.rng.gen_range(0..self.purposes.len());
        let country_idx = self.rng.gen_range(0..self.countries.len());

        Transaction::new(
            self.last_timestamp,
            amount,
            self.purposes[purpose_idx].clone(),
            self.countries[country_idx].clone(),
        )
    }

    /// Generate a batch of `rows` transactions.
    pub fn generate_batch(&mut self, rows: usize) -> Vec<Transaction> {
        (0..rows).map(|_| self.next_transaction()).collect()
    }

    /// Timestamp of the most recently generated row.
    pub fn last_timestamp(&self) -> DateTime<Utc> {
        self.last_timestamp
    }
}
