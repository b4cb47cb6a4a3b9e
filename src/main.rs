//! Transaction Anomaly Pipeline - Main Entry Point
//!
//! Generates synthetic transaction batches on an interval, scores the
//! growing dataset with the outlier detector, and logs flagged records.
//! Stands in for the dashboard caller the library was extracted from.

use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use transaction_anomaly_pipeline::{
    config::AppConfig, generator::TransactionGenerator, metrics::PipelineMetrics,
    models::detector::OutlierDetector, types::scored,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load_or_default()?;

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
        format!("transaction_anomaly_pipeline={}", config.logging.level).parse()?,
    );
    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting Transaction Anomaly Pipeline");
    info!(
        contamination = config.detector.contamination,
        n_estimators = config.detector.n_estimators,
        seed = config.detector.seed,
        retrain_every = config.pipeline.retrain_every,
        "Detector configuration"
    );

    let metrics = PipelineMetrics::new();
    let mut generator = TransactionGenerator::new(&config.generator, chrono::Utc::now());
    let mut detector = OutlierDetector::new(config.detector.clone())?;

    let mut dataset = Vec::new();
    let mut interval = tokio::time::interval(Duration::from_millis(config.pipeline.interval_ms));

    for batch_idx in 1..=config.pipeline.batches {
        interval.tick().await;

        dataset.extend(generator.generate_batch(config.generator.rows));

        // The model is fitted once on the first batch and reused as data
        // grows; refreshes happen only on this explicit schedule.
        let retrain_every = config.pipeline.retrain_every;
        if retrain_every > 0 && detector.is_fitted() && batch_idx % retrain_every == 0 {
            detector.force_retrain(&dataset)?;
            info!(
                batch = batch_idx,
                records = dataset.len(),
                model_version = detector.version(),
                "Model refreshed"
            );
        }

        let started = Instant::now();
        let scored = detector.score(&dataset)?;
        let elapsed = started.elapsed();
        metrics.record_batch(&scored, elapsed);

        let flagged = scored::outlier_count(&scored);
        info!(
            batch = batch_idx,
            total = dataset.len(),
            flagged,
            model_version = detector.version(),
            scoring_us = elapsed.as_micros() as u64,
            "Batch scored"
        );

        for s in scored.iter().filter(|s| s.is_outlier) {
            debug!(record = %serde_json::to_string(s)?, "Outlier detail");
        }
    }

    info!("Pipeline finished");
    metrics.print_summary();

    Ok(())
}
