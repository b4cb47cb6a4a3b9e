//! Scoring throughput and outlier-rate tracking for the pipeline binary.

use crate::types::scored::ScoredTransaction;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Counters for scoring calls made over the process lifetime.
pub struct PipelineMetrics {
    transactions_scored: AtomicU64,
    outliers_flagged: AtomicU64,
    /// Per-call scoring latencies in microseconds
    scoring_times: RwLock<Vec<u64>>,
    /// Anomaly score distribution in tenth-wide buckets
    score_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            transactions_scored: AtomicU64::new(0),
            outliers_flagged: AtomicU64::new(0),
            scoring_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record one scoring call over a batch.
    pub fn record_batch(&self, scored: &[ScoredTransaction], elapsed: Duration) {
        self.transactions_scored
            .fetch_add(scored.len() as u64, Ordering::Relaxed);

        let flagged = scored.iter().filter(|s| s.is_outlier).count() as u64;
        self.outliers_flagged.fetch_add(flagged, Ordering::Relaxed);

        if let Ok(mut times) = self.scoring_times.write() {
            times.push(elapsed.as_micros() as u64);
            if times.len() > 10_000 {
                times.drain(0..5_000);
            }
        }

        if let Ok(mut buckets) = self.score_buckets.write() {
            for s in scored {
                let bucket = ((s.score * 10.0) as usize).min(9);
                buckets[bucket] += 1;
            }
        }
    }

    pub fn transactions_scored(&self) -> u64 {
        self.transactions_scored.load(Ordering::Relaxed)
    }

    pub fn outliers_flagged(&self) -> u64 {
        self.outliers_flagged.load(Ordering::Relaxed)
    }

    /// Records scored per second since startup.
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transactions_scored() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Latency statistics across scoring calls.
    pub fn scoring_stats(&self) -> ScoringStats {
        let times = match self.scoring_times.read() {
            Ok(times) => times,
            Err(_) => return ScoringStats::default(),
        };
        if times.is_empty() {
            return ScoringStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let count = sorted.len();
        ScoringStats {
            calls: count as u64,
            mean_us: sorted.iter().sum::<u64>() / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    pub fn score_distribution(&self) -> [u64; 10] {
        self.score_buckets
            .read()
            .map(|buckets| *buckets)
            .unwrap_or([0; 10])
    }

    /// Print summary statistics.
    pub fn print_summary(&self) {
        let scored = self.transactions_scored();
        let flagged = self.outliers_flagged();
        let flag_rate = if scored > 0 {
            flagged as f64 / scored as f64 * 100.0
        } else {
            0.0
        };
        let stats = self.scoring_stats();

        info!("=== Anomaly Pipeline Summary ===");
        info!(
            scored,
            flagged,
            flag_rate = format!("{flag_rate:.1}%"),
            throughput = format!("{:.1} tx/s", self.throughput()),
            "Totals"
        );
        info!(
            calls = stats.calls,
            mean_us = stats.mean_us,
            p50_us = stats.p50_us,
            p95_us = stats.p95_us,
            max_us = stats.max_us,
            "Scoring latency"
        );

        let distribution = self.score_distribution();
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let pct = count as f64 / total as f64 * 100.0;
            let bar = "#".repeat((pct / 2.0) as usize);
            info!(
                "score {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoring-call latency statistics
#[derive(Debug, Default)]
pub struct ScoringStats {
    pub calls: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub max_us: u64,
}
