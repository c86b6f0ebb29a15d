//! Metric names and recording helpers

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;
use urlguard_classifiers::{ModelHandle, ModelLoader};
use urlguard_core::{PredictionResult, Result};

pub const REQUESTS_TOTAL: &str = "urlguard_requests_total";
pub const DECISIONS_TOTAL: &str = "urlguard_decisions_total";
pub const PREDICTION_LATENCY_US: &str = "urlguard_prediction_latency_us";
pub const ERRORS_TOTAL: &str = "urlguard_errors_total";
pub const MODEL_LOADS_TOTAL: &str = "urlguard_model_loads_total";
pub const MODEL_LOAD_LATENCY_MS: &str = "urlguard_model_load_latency_ms";

/// Install the global Prometheus recorder and return its render handle
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    describe();
    info!("Metrics exporter initialized");
    Ok(handle)
}

fn describe() {
    metrics::describe_counter!(REQUESTS_TOTAL, "Total number of predictions by strategy");
    metrics::describe_counter!(
        DECISIONS_TOTAL,
        "Total number of decisions by outcome and source"
    );
    metrics::describe_histogram!(
        PREDICTION_LATENCY_US,
        metrics::Unit::Microseconds,
        "Prediction latency in microseconds by strategy"
    );
    metrics::describe_counter!(ERRORS_TOTAL, "Total number of errors by kind");
    metrics::describe_counter!(MODEL_LOADS_TOTAL, "Total number of model artifact loads");
    metrics::describe_histogram!(
        MODEL_LOAD_LATENCY_MS,
        metrics::Unit::Milliseconds,
        "Model artifact load latency in milliseconds"
    );
}

pub fn record_request(strategy: &'static str) {
    metrics::counter!(REQUESTS_TOTAL, "strategy" => strategy).increment(1);
}

pub fn record_prediction(strategy: &'static str, result: &PredictionResult, elapsed: Duration) {
    metrics::counter!(
        DECISIONS_TOTAL,
        "decision" => result.decision.as_str(),
        "source" => result.source.as_str()
    )
    .increment(1);
    metrics::histogram!(PREDICTION_LATENCY_US, "strategy" => strategy)
        .record(elapsed.as_micros() as f64);
}

pub fn record_error(kind: &'static str) {
    metrics::counter!(ERRORS_TOTAL, "kind" => kind).increment(1);
}

/// Wraps a loader to count and time artifact reads
pub struct MeteredLoader<L> {
    inner: L,
}

impl<L> MeteredLoader<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }
}

impl<L: ModelLoader> ModelLoader for MeteredLoader<L> {
    fn load(&self, path: &Path) -> Result<ModelHandle> {
        let start = Instant::now();
        let result = self.inner.load(path);

        if result.is_ok() {
            metrics::counter!(MODEL_LOADS_TOTAL).increment(1);
            metrics::histogram!(MODEL_LOAD_LATENCY_MS)
                .record(start.elapsed().as_secs_f64() * 1000.0);
        }
        result
    }
}
