//! # Ledger Telemetry
//!
//! Observability for applications embedding the ledger SDK.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` setup (pretty or JSON) driven by env config
//! - **Metrics**: Prometheus counters for attempts, retries, node failures and rejections
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let _guard = init_telemetry(&config).expect("Failed to init telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LEDGER_SERVICE_NAME` | `ledger-sdk` | Service name on every log line |
//! | `LEDGER_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `LEDGER_JSON_LOGS` | `false` | Emit JSON instead of pretty logs |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_into, register_metrics, MetricsHandle, ATTEMPTS,
    ATTEMPTS_EXHAUSTED, NODE_FAILURES, REJECTIONS, REQUEST_DURATION, RETRIES,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The tracing subscriber could not be installed
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    /// Prometheus registration or encoding failed
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Configuration was rejected
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics together.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    init_tracing(config)?;

    Ok(TelemetryGuard {
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for recording a metric with a value.
#[macro_export]
macro_rules! metric_observe {
    ($metric:expr, $value:expr) => {
        $metric.observe($value)
    };
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).observe($value)
    };
}
