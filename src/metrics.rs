//! Serving-side counters and latency statistics for the scoring service.

use crate::types::scoring::{Decision, ScoringResult};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept in memory
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Metrics collector for the scoring endpoint
pub struct ScoringMetrics {
    requests: AtomicU64,
    accepted: AtomicU64,
    refused: AtomicU64,
    invalid_input: AtomicU64,
    unavailable: AtomicU64,
    /// Scoring latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Probability distribution buckets of width 0.1
    score_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

/// Outcome of one scoring request, as seen by the metrics collector
pub enum RequestOutcome<'a> {
    Scored(&'a ScoringResult),
    InvalidInput,
    Unavailable,
}

impl ScoringMetrics {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            refused: AtomicU64::new(0),
            invalid_input: AtomicU64::new(0),
            unavailable: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a finished request.
    pub fn record(&self, outcome: RequestOutcome<'_>, elapsed: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);

        match outcome {
            RequestOutcome::Scored(result) => {
                match result.decision {
                    Decision::Accepted => self.accepted.fetch_add(1, Ordering::Relaxed),
                    Decision::Refused => self.refused.fetch_add(1, Ordering::Relaxed),
                };

                let bucket = ((result.probability * 10.0).max(0.0) as usize).min(9);
                if let Ok(mut buckets) = self.score_buckets.write() {
                    buckets[bucket] += 1;
                }

                if let Ok(mut times) = self.latencies.write() {
                    times.push(elapsed.as_micros() as u64);
                    // keep the most recent half once full
                    if times.len() > MAX_LATENCY_SAMPLES {
                        times.drain(0..MAX_LATENCY_SAMPLES / 2);
                    }
                }
            }
            RequestOutcome::InvalidInput => {
                self.invalid_input.fetch_add(1, Ordering::Relaxed);
            }
            RequestOutcome::Unavailable => {
                self.unavailable.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn latency_stats(&self) -> LatencyStats {
        let mut sorted = match self.latencies.read() {
            Ok(times) => times.clone(),
            Err(_) => return LatencyStats::default(),
        };
        if sorted.is_empty() {
            return LatencyStats::default();
        }
        sorted.sort_unstable();

        let count = sorted.len();
        let percentile = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sorted.iter().sum::<u64>() / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Requests per second since start.
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            refused: self.refused.load(Ordering::Relaxed),
            invalid_input: self.invalid_input.load(Ordering::Relaxed),
            unavailable: self.unavailable.load(Ordering::Relaxed),
            throughput_rps: self.throughput(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            latency: self.latency_stats(),
            score_distribution: self.score_buckets.read().map(|b| *b).unwrap_or_default(),
        }
    }

    /// Log a summary of everything recorded so far.
    pub fn print_summary(&self) {
        let s = self.snapshot();
        let refusal_rate = if s.accepted + s.refused > 0 {
            s.refused as f64 / (s.accepted + s.refused) as f64 * 100.0
        } else {
            0.0
        };

        info!(
            requests = s.requests,
            accepted = s.accepted,
            refused = s.refused,
            refusal_rate = format!("{:.1}%", refusal_rate),
            invalid_input = s.invalid_input,
            unavailable = s.unavailable,
            throughput = format!("{:.1} req/s", s.throughput_rps),
            "Scoring summary"
        );
        info!(
            mean_us = s.latency.mean_us,
            p50_us = s.latency.p50_us,
            p95_us = s.latency.p95_us,
            p99_us = s.latency.p99_us,
            max_us = s.latency.max_us,
            "Scoring latency"
        );

        let total: u64 = s.score_distribution.iter().sum();
        for (i, &count) in s.score_distribution.iter().enumerate() {
            let pct = if total > 0 { count as f64 / total as f64 * 100.0 } else { 0.0 };
            let bar = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "  {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
    }
}

impl Default for ScoringMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency statistics in microseconds
#[derive(Debug, Default, Clone, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Point-in-time view served by `GET /metrics`
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub accepted: u64,
    pub refused: u64,
    pub invalid_input: u64,
    pub unavailable: u64,
    pub throughput_rps: f64,
    pub uptime_secs: u64,
    pub latency: LatencyStats,
    pub score_distribution: [u64; 10],
}

/// Periodically logs a metrics summary
pub struct MetricsReporter {
    metrics: Arc<ScoringMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ScoringMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs: interval_secs.max(1),
        }
    }

    /// Run forever; spawn it on the runtime.
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // the first tick completes immediately
        interval.tick().await;
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
    fn test_outcomes_are_counted() {
        let metrics = ScoringMetrics::new();

        let accepted = ScoringResult::new(0.2, 0.5);
        let refused = ScoringResult::new(0.95, 0.5);
        metrics.record(RequestOutcome::Scored(&accepted), Duration::from_micros(100));
        metrics.record(RequestOutcome::Scored(&refused), Duration::from_micros(300));
        metrics.record(RequestOutcome::InvalidInput, Duration::from_micros(10));
        metrics.record(RequestOutcome::Unavailable, Duration::from_micros(1));

        let s = metrics.snapshot();
        assert_eq!(s.requests, 4);
        assert_eq!(s.accepted, 1);
        assert_eq!(s.refused, 1);
        assert_eq!(s.invalid_input, 1);
        assert_eq!(s.unavailable, 1);
        assert_eq!(s.score_distribution[2], 1);
        assert_eq!(s.score_distribution[9], 1);
        assert_eq!(s.latency.count, 2);
        assert_eq!(s.latency.max_us, 300);
    }

    #[test]
    fn test_probability_one_lands_in_last_bucket() {
        let metrics = ScoringMetrics::new();
        let certain = ScoringResult::new(1.0, 0.5);
        metrics.record(RequestOutcome::Scored(&certain), Duration::from_micros(5));
        assert_eq!(metrics.snapshot().score_distribution[9], 1);
    }

    #[test]
    fn test_empty_latency_stats() {
        let metrics = ScoringMetrics::new();
        assert_eq!(metrics.latency_stats().count, 0);
    }
}
