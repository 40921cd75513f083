//! Request counters and Prometheus text rendering

use aqi_core::AqiError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How a `/predict` call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    UnsupportedCity,
    InvalidInput,
    PredictionFailed,
    /// Artifacts were never loaded
    Unavailable,
}

impl From<&AqiError> for Outcome {
    fn from(err: &AqiError) -> Self {
        match err {
            AqiError::UnsupportedCity { .. } => Outcome::UnsupportedCity,
            AqiError::InvalidInput { .. } => Outcome::InvalidInput,
            AqiError::PredictionFailed(_) => Outcome::PredictionFailed,
            AqiError::Initialization(_) => Outcome::Unavailable,
        }
    }
}

/// Lock-free prediction counters, cheap to clone into handlers
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    total_requests: Arc<AtomicU64>,
    successful_requests: Arc<AtomicU64>,
    unsupported_city: Arc<AtomicU64>,
    invalid_input: Arc<AtomicU64>,
    prediction_failed: Arc<AtomicU64>,
    unavailable: Arc<AtomicU64>,
    request_duration_us: Arc<AtomicU64>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: Outcome, elapsed: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            Outcome::Success => &self.successful_requests,
            Outcome::UnsupportedCity => &self.unsupported_city,
            Outcome::InvalidInput => &self.invalid_input,
            Outcome::PredictionFailed => &self.prediction_failed,
            Outcome::Unavailable => &self.unavailable,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.request_duration_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let duration_us = self.request_duration_us.load(Ordering::Relaxed);

        let avg_duration_ms = if total_requests > 0 {
            duration_us as f64 / total_requests as f64 / 1000.0
        } else {
            0.0
        };

        MetricsSnapshot {
            total_requests,
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            unsupported_city: self.unsupported_city.load(Ordering::Relaxed),
            invalid_input: self.invalid_input.load(Ordering::Relaxed),
            prediction_failed: self.prediction_failed.load(Ordering::Relaxed),
            unavailable: self.unavailable.load(Ordering::Relaxed),
            avg_duration_ms,
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub unsupported_city: u64,
    pub invalid_input: u64,
    pub prediction_failed: u64,
    pub unavailable: u64,
    pub avg_duration_ms: f64,
}

impl MetricsSnapshot {
    /// Render in the Prometheus text exposition format
    pub fn render_prometheus(&self, uptime: Duration, artifacts_loaded: bool) -> String {
        let mut out = String::new();

        out.push_str("# HELP aqi_predict_requests_total Prediction requests received\n");
        out.push_str("# TYPE aqi_predict_requests_total counter\n");
        out.push_str(&format!(
            "aqi_predict_requests_total {}\n",
            self.total_requests
        ));

        out.push_str("# HELP aqi_predict_outcomes_total Prediction requests by outcome\n");
        out.push_str("# TYPE aqi_predict_outcomes_total counter\n");
        for (outcome, value) in [
            ("success", self.successful_requests),
            ("unsupported_city", self.unsupported_city),
            ("invalid_input", self.invalid_input),
            ("prediction_failed", self.prediction_failed),
            ("unavailable", self.unavailable),
        ] {
            out.push_str(&format!(
                "aqi_predict_outcomes_total{{outcome=\"{outcome}\"}} {value}\n"
            ));
        }

        out.push_str("# HELP aqi_predict_duration_avg_ms Mean prediction handling time\n");
        out.push_str("# TYPE aqi_predict_duration_avg_ms gauge\n");
        out.push_str(&format!(
            "aqi_predict_duration_avg_ms {:.3}\n",
            self.avg_duration_ms
        ));

        out.push_str("# HELP aqi_artifacts_loaded Whether schema and model are loaded\n");
        out.push_str("# TYPE aqi_artifacts_loaded gauge\n");
        out.push_str(&format!(
            "aqi_artifacts_loaded {}\n",
            u8::from(artifacts_loaded)
        ));

        out.push_str("# HELP aqi_uptime_seconds Process uptime\n");
        out.push_str("# TYPE aqi_uptime_seconds gauge\n");
        out.push_str(&format!("aqi_uptime_seconds {}\n", uptime.as_secs()));

        out
    }
}

/// Times one request and records its outcome
pub struct RequestTimer<'a> {
    metrics: &'a MetricsCollector,
    started: Instant,
}

impl<'a> RequestTimer<'a> {
    pub fn start(metrics: &'a MetricsCollector) -> Self {
        Self {
            metrics,
            started: Instant::now(),
        }
    }

    pub fn finish(self, outcome: Outcome) {
        self.metrics.record(outcome, self.started.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_outcome() {
        let metrics = MetricsCollector::new();
        metrics.record(Outcome::Success, Duration::from_millis(2));
        metrics.record(Outcome::Success, Duration::from_millis(4));
        metrics.record(Outcome::UnsupportedCity, Duration::ZERO);
        metrics.record(Outcome::Unavailable, Duration::ZERO);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 4);
        assert_eq!(snapshot.successful_requests, 2);
        assert_eq!(snapshot.unsupported_city, 1);
        assert_eq!(snapshot.unavailable, 1);
        assert_eq!(snapshot.invalid_input, 0);
        assert!((snapshot.avg_duration_ms - 1.5).abs() < 1e-9);
    }

    #[test]
    fn clones_share_counters() {
        let metrics = MetricsCollector::new();
        let handle = metrics.clone();
        RequestTimer::start(&handle).finish(Outcome::PredictionFailed);
        assert_eq!(metrics.snapshot().prediction_failed, 1);
    }

    #[test]
    fn outcome_follows_error_kind() {
        let err = AqiError::InvalidInput {
            field: "day",
            reason: "x".to_string(),
        };
        assert_eq!(Outcome::from(&err), Outcome::InvalidInput);
        let err = AqiError::Initialization("x".to_string());
        assert_eq!(Outcome::from(&err), Outcome::Unavailable);
    }

    #[test]
    fn prometheus_text_lists_all_series() {
        let metrics = MetricsCollector::new();
        metrics.record(Outcome::Success, Duration::from_millis(1));
        let text = metrics
            .snapshot()
            .render_prometheus(Duration::from_secs(42), true);

        assert!(text.contains("aqi_predict_requests_total 1\n"));
        assert!(text.contains("aqi_predict_outcomes_total{outcome=\"success\"} 1\n"));
        assert!(text.contains("aqi_predict_outcomes_total{outcome=\"unavailable\"} 0\n"));
        assert!(text.contains("aqi_artifacts_loaded 1\n"));
        assert!(text.contains("aqi_uptime_seconds 42\n"));
    }
}
