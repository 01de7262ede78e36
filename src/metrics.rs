//! Network fetch statistics
//!
//! Only requests that reach the provider are recorded; cache hits are not.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples to keep for latency percentiles
const MAX_SAMPLES: usize = 100;

/// Snapshot of fetch statistics for one provider
#[derive(Debug, Clone, Serialize)]
pub struct FetchMetrics {
    pub provider_name: String,
    pub latency_p50_ms: f64,
    pub latency_p99_ms: f64,
    /// Share of successful requests over the lifetime (0.0 to 1.0)
    pub success_rate: f64,
    pub total_requests: u64,
    pub failed_requests: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct MetricsState {
    /// Latencies of recent successful requests, oldest first
    latencies_ms: VecDeque<f64>,
    total: u64,
    failed: u64,
    last_success: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Collects request outcomes for a provider
pub struct MetricsCollector {
    provider_name: String,
    state: RwLock<MetricsState>,
}

impl MetricsCollector {
    pub fn new(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            state: RwLock::new(MetricsState {
                latencies_ms: VecDeque::with_capacity(MAX_SAMPLES),
                ..Default::default()
            }),
        }
    }

    pub async fn record_success(&self, duration: Duration) {
        let mut state = self.state.write().await;
        state.total += 1;
        state.last_success = Some(Utc::now());
        if state.latencies_ms.len() >= MAX_SAMPLES {
            state.latencies_ms.pop_front();
        }
        state.latencies_ms.push_back(duration.as_secs_f64() * 1000.0);
    }

    pub async fn record_failure(&self, error: &str) {
        let mut state = self.state.write().await;
        state.total += 1;
        state.failed += 1;
        state.last_error = Some(error.to_string());
    }

    pub async fn get_metrics(&self) -> FetchMetrics {
        let state = self.state.read().await;

        let mut latencies: Vec<f64> = state.latencies_ms.iter().copied().collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let success_rate = if state.total > 0 {
            (state.total - state.failed) as f64 / state.total as f64
        } else {
            1.0
        };

        FetchMetrics {
            provider_name: self.provider_name.clone(),
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate,
            total_requests: state.total,
            failed_requests: state.failed,
            last_success: state.last_success,
            last_error: state.last_error.clone(),
        }
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_collector() {
        let collector = MetricsCollector::new("test");

        collector.record_success(Duration::from_millis(100)).await;
        collector.record_success(Duration::from_millis(200)).await;
        collector.record_failure("HTTP 500").await;

        let metrics = collector.get_metrics().await;

        assert_eq!(metrics.provider_name, "test");
        assert_eq!(metrics.total_requests, 3);
        assert_eq!(metrics.failed_requests, 1);
        assert!(metrics.success_rate > 0.6 && metrics.success_rate < 0.7);
        assert!(metrics.last_success.is_some());
        assert_eq!(metrics.last_error.as_deref(), Some("HTTP 500"));
    }

    #[tokio::test]
    async fn test_empty_metrics() {
        let metrics = MetricsCollector::new("idle").get_metrics().await;
        assert_eq!(metrics.total_requests, 0);
        assert_eq!(metrics.success_rate, 1.0);
        assert_eq!(metrics.latency_p50_ms, 0.0);
    }

    #[test]
    fn test_percentile() {
        let values: Vec<f64> = (1..=11).map(f64::from).collect();
        assert_eq!(percentile(&values, 50.0), 6.0);
        assert_eq!(percentile(&values, 99.0), 11.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }
}
