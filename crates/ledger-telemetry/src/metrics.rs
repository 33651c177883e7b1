//! Prometheus metrics for the execution engine.
//!
//! All metrics follow the naming convention: `ledger_sdk_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Attempts sent to a node, by operation
    pub static ref ATTEMPTS: CounterVec = CounterVec::new(
        Opts::new("ledger_sdk_attempts_total", "Attempts sent to consensus nodes"),
        &["operation"]
    ).expect("metric creation failed");

    /// Retries, by operation and reason (transport, busy, not_yet_available, ...)
    pub static ref RETRIES: CounterVec = CounterVec::new(
        Opts::new("ledger_sdk_retries_total", "Attempts that ended in a retry"),
        &["operation", "reason"]
    ).expect("metric creation failed");

    /// Failures charged to a node's health record
    pub static ref NODE_FAILURES: CounterVec = CounterVec::new(
        Opts::new("ledger_sdk_node_failures_total", "Failures recorded against a node"),
        &["node"]
    ).expect("metric creation failed");

    /// Deterministic rejections surfaced to callers, by status
    pub static ref REJECTIONS: CounterVec = CounterVec::new(
        Opts::new("ledger_sdk_rejections_total", "Deterministic rejections surfaced to callers"),
        &["status"]
    ).expect("metric creation failed");

    /// Calls that consumed their whole attempt budget
    pub static ref ATTEMPTS_EXHAUSTED: CounterVec = CounterVec::new(
        Opts::new("ledger_sdk_attempts_exhausted_total", "Calls that ran out of attempts"),
        &["operation"]
    ).expect("metric creation failed");

    /// Per-attempt request latency
    pub static ref REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "ledger_sdk_request_duration_seconds",
            "Time from send to response for a single attempt"
        ).buckets(exponential_buckets(0.001, 2.0, 15).expect("valid buckets")),
        &["operation"]
    ).expect("metric creation failed");
}

fn collectors() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(ATTEMPTS.clone()),
        Box::new(RETRIES.clone()),
        Box::new(NODE_FAILURES.clone()),
        Box::new(REJECTIONS.clone()),
        Box::new(ATTEMPTS_EXHAUSTED.clone()),
        Box::new(REQUEST_DURATION.clone()),
    ]
}

/// Register the SDK metrics with an application's own registry.
///
/// Idempotent: metrics already present in `registry` are left alone, so
/// several clients in one process can each call it.
pub fn register_into(registry: &Registry) -> Result<(), TelemetryError> {
    for collector in collectors() {
        match registry.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Register the SDK metrics with [`REGISTRY`].
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    register_into(&REGISTRY)?;
    Ok(MetricsHandle {
        registry: REGISTRY.clone(),
    })
}

/// Registry holding the SDK metrics.
pub struct MetricsHandle {
    registry: Registry,
}

impl MetricsHandle {
    /// Prometheus text exposition of the registry.
    pub fn encode(&self) -> Result<String, TelemetryError> {
        encode_registry(&self.registry)
    }
}

/// Prometheus text exposition of [`REGISTRY`].
pub fn encode_metrics() -> Result<String, TelemetryError> {
    encode_registry(&REGISTRY)
}

fn encode_registry(registry: &Registry) -> Result<String, TelemetryError> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
