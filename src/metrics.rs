//! Performance metrics and statistics tracking for the prediction pipeline.

use crate::types::prediction::ModelEstimates;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Number of order-of-magnitude buckets for point estimates.
const MAGNITUDE_BUCKETS: usize = 8;

/// Metrics collector for pipeline performance
pub struct PipelineMetrics {
    /// Total prediction requests processed
    pub requests_processed: AtomicU64,
    /// Total outcomes published
    pub outcomes_published: AtomicU64,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Model inference times (in microseconds)
    model_times: RwLock<HashMap<String, Vec<u64>>>,
    /// Point estimate order-of-magnitude buckets
    magnitude_buckets: RwLock<[u64; MAGNITUDE_BUCKETS]>,
    /// Start time for rate calculation
    start_time: Instant,
    /// Model agreement tracking (how close the three estimates are)
    model_agreements: RwLock<Vec<f64>>,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            requests_processed: AtomicU64::new(0),
            outcomes_published: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            model_times: RwLock::new(HashMap::new()),
            magnitude_buckets: RwLock::new([0; MAGNITUDE_BUCKETS]),
            start_time: Instant::now(),
            model_agreements: RwLock::new(Vec::with_capacity(1000)),
        }
    }

    /// Record a processed request
    pub fn record_request(&self, processing_time: Duration, point_estimate: f64) {
        self.requests_processed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        let bucket = magnitude_bucket(point_estimate);
        if let Ok(mut buckets) = self.magnitude_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a published outcome
    pub fn record_outcome(&self) {
        self.outcomes_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Record model inference time
    pub fn record_model_time(&self, model_name: &str, duration: Duration) {
        if let Ok(mut times) = self.model_times.write() {
            let model_times = times.entry(model_name.to_string()).or_insert_with(Vec::new);
            model_times.push(duration.as_micros() as u64);
            // Keep only last 1000 per model
            if model_times.len() > 1000 {
                model_times.drain(0..500);
            }
        }
    }

    /// Record model agreement (relative spread of the three estimates)
    pub fn record_model_agreement(&self, estimates: &ModelEstimates) {
        let scores = [estimates.xgboost, estimates.lightgbm, estimates.random_forest];
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        let variance =
            scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64;
        let std_dev = variance.sqrt();

        // Relative spread normalizes by magnitude so an agreement near 1
        // means the members are close regardless of estimate scale.
        let relative_spread = if mean.abs() > f64::EPSILON {
            (std_dev / mean.abs()).min(1.0)
        } else if std_dev > f64::EPSILON {
            1.0
        } else {
            0.0
        };
        let agreement = 1.0 - relative_spread;

        if let Ok(mut agreements) = self.model_agreements.write() {
            agreements.push(agreement);
            if agreements.len() > 1000 {
                agreements.drain(0..500);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = self.processing_times.read().unwrap();
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get model performance stats
    pub fn get_model_stats(&self) -> HashMap<String, ModelStats> {
        let times = self.model_times.read().unwrap();
        let mut stats = HashMap::new();

        for (model, model_times) in times.iter() {
            if model_times.is_empty() {
                continue;
            }

            let mut sorted: Vec<u64> = model_times.clone();
            sorted.sort();

            let sum: u64 = sorted.iter().sum();
            let count = sorted.len();

            stats.insert(
                model.clone(),
                ModelStats {
                    calls: count as u64,
                    mean_us: sum / count as u64,
                    p50_us: sorted[count / 2],
                    p99_us: sorted[(count as f64 * 0.99) as usize],
                },
            );
        }

        stats
    }

    /// Get average model agreement
    pub fn get_avg_agreement(&self) -> f64 {
        let agreements = self.model_agreements.read().unwrap();
        if agreements.is_empty() {
            return 0.0;
        }
        agreements.iter().sum::<f64>() / agreements.len() as f64
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get point estimate magnitude distribution
    pub fn get_magnitude_distribution(&self) -> [u64; MAGNITUDE_BUCKETS] {
        *self.magnitude_buckets.read().unwrap()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let request_count = self.requests_processed.load(Ordering::Relaxed);
        let outcome_count = self.outcomes_published.load(Ordering::Relaxed);

        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let agreement = self.get_avg_agreement();
        let magnitudes = self.get_magnitude_distribution();

        info!("==================================================================");
        info!("          CRIME PREDICTION PIPELINE - METRICS SUMMARY");
        info!("==================================================================");
        info!(
            "  Requests Processed: {:>8}  |  Throughput: {:>6.1} req/s",
            request_count, throughput
        );
        info!("  Outcomes Published: {:>8}", outcome_count);
        info!(
            "  Processing Time (us): mean={} p50={} p95={} p99={} max={}",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us, processing.max_us
        );
        info!(
            "  Model Agreement: {:>5.1}% (higher = members agree more)",
            agreement * 100.0
        );
        info!("  Point Estimate Magnitude:");
        let total: u64 = magnitudes.iter().sum();
        for (i, &count) in magnitudes.iter().enumerate() {
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            info!(
                "    {:>12}: {:>6} ({:>5.1}%)",
                magnitude_label(i),
                count,
                pct
            );
        }
        info!("==================================================================");

        let model_stats = self.get_model_stats();
        if !model_stats.is_empty() {
            info!("Model Inference Times (us):");
            for (model, stats) in &model_stats {
                info!(
                    "  {}: mean={} p50={} p99={} (calls={})",
                    model, stats.mean_us, stats.p50_us, stats.p99_us, stats.calls
                );
            }
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Bucket index for a point estimate's order of magnitude.
fn magnitude_bucket(point_estimate: f64) -> usize {
    if point_estimate < 1.0 {
        return 0;
    }
    (point_estimate.log10().floor() as usize + 1).min(MAGNITUDE_BUCKETS - 1)
}

fn magnitude_label(bucket: usize) -> String {
    match bucket {
        0 => "< 1".to_string(),
        b if b == MAGNITUDE_BUCKETS - 1 => format!(">= 1e{}", b - 1),
        b => format!("1e{}-1e{}", b - 1, b),
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Model-specific statistics
#[derive(Debug)]
pub struct ModelStats {
    pub calls: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p99_us: u64,
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: std::sync::Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = PipelineMetrics::new();

        metrics.record_request(Duration::from_micros(100), 1045.0);
        metrics.record_request(Duration::from_micros(200), 12.0);
        metrics.record_outcome();

        assert_eq!(metrics.requests_processed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.outcomes_published.load(Ordering::Relaxed), 1);

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean_us, 150);
        assert_eq!(stats.max_us, 200);
    }

    #[test]
    fn test_model_time_stats() {
        let metrics = PipelineMetrics::new();
        metrics.record_model_time("xgboost", Duration::from_micros(40));
        metrics.record_model_time("xgboost", Duration::from_micros(60));

        let stats = metrics.get_model_stats();
        assert_eq!(stats["xgboost"].calls, 2);
        assert_eq!(stats["xgboost"].mean_us, 50);
    }

    #[test]
    fn test_tight_spread_scores_higher_agreement_than_wide() {
        let metrics = PipelineMetrics::new();
        metrics.record_model_agreement(&ModelEstimates {
            xgboost: 1000.0,
            lightgbm: 1010.0,
            random_forest: 990.0,
        });
        let tight = metrics.get_avg_agreement();

        let metrics = PipelineMetrics::new();
        metrics.record_model_agreement(&ModelEstimates {
            xgboost: 1000.0,
            lightgbm: 100.0,
            random_forest: 2500.0,
        });
        let wide = metrics.get_avg_agreement();

        assert!(tight > 0.95);
        assert!(tight > wide);
    }

    #[test]
    fn test_agreement_with_all_zero_estimates() {
        let metrics = PipelineMetrics::new();
        metrics.record_model_agreement(&ModelEstimates {
            xgboost: 0.0,
            lightgbm: 0.0,
            random_forest: 0.0,
        });
        assert_eq!(metrics.get_avg_agreement(), 1.0);
    }

    #[test]
    fn test_magnitude_buckets() {
        assert_eq!(magnitude_bucket(0.0), 0);
        assert_eq!(magnitude_bucket(0.9), 0);
        assert_eq!(magnitude_bucket(5.0), 1);
        assert_eq!(magnitude_bucket(150.0), 3);
        assert_eq!(magnitude_bucket(1045.0), 4);
        assert_eq!(magnitude_bucket(1e9), 7);
    }

    #[test]
    fn test_magnitude_distribution_recording() {
        let metrics = PipelineMetrics::new();
        metrics.record_request(Duration::from_micros(1), 1045.0);
        metrics.record_request(Duration::from_micros(1), 2045.0);

        let distribution = metrics.get_magnitude_distribution();
        assert_eq!(distribution[4], 2);
    }
}
