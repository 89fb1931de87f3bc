//! Observability infrastructure for the ROI service
//!
//! Prometheus metrics for prediction latency, served predictions and
//! model availability.

use prometheus::{
    register_gauge_vec, register_histogram_vec, register_int_counter_vec, GaugeVec, HistogramVec,
    IntCounterVec,
};
use std::sync::OnceLock;

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<RoiMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct RoiMetricsInner {
    prediction_latency_seconds: HistogramVec,
    predictions_total: IntCounterVec,
    model_loaded: GaugeVec,
}

impl RoiMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram_vec!(
                "roi_api_prediction_latency_seconds",
                "Time spent producing one estimate, per target",
                &["target"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "roi_api_predictions_total",
                "Estimates served, by target and source (model or fallback)",
                &["target", "source"]
            )
            .expect("Failed to register predictions_total"),

            model_loaded: register_gauge_vec!(
                "roi_api_model_loaded",
                "Whether a usable model is loaded for each target",
                &["target"]
            )
            .expect("Failed to register model_loaded"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct RoiMetrics {
    // This is just a marker - we use the global instance
    _private: (),
}

impl Default for RoiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RoiMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(RoiMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &RoiMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record how long one estimate took
    pub fn observe_prediction_latency(&self, target: &str, duration_secs: f64) {
        self.inner()
            .prediction_latency_seconds
            .with_label_values(&[target])
            .observe(duration_secs);
    }

    /// Count one served estimate
    pub fn inc_predictions(&self, target: &str, source: &str) {
        self.inner()
            .predictions_total
            .with_label_values(&[target, source])
            .inc();
    }

    /// Record whether a target's model is loaded
    pub fn set_model_loaded(&self, target: &str, loaded: bool) {
        self.inner()
            .model_loaded
            .with_label_values(&[target])
            .set(if loaded { 1.0 } else { 0.0 });
    }
}
