//! Telemetry configuration from environment variables.

use std::env;

use crate::TelemetryError;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name reported when tracing is initialized
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full `EnvFilter` directive
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to print file and line numbers
    pub with_source_location: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "ledger-sdk".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_source_location: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LEDGER_SERVICE_NAME`: Service name (default: ledger-sdk)
    /// - `LEDGER_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `LEDGER_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `LEDGER_LOG_SOURCE`: Include file/line (default: false)
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("LEDGER_SERVICE_NAME")
                .unwrap_or_else(|_| "ledger-sdk".to_string()),

            log_level: env::var("LEDGER_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("LEDGER_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),

            with_source_location: env::var("LEDGER_LOG_SOURCE")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }

    /// Reject configurations the subscriber cannot use.
    pub fn validate(&self) -> Result<(), TelemetryError> {
        if self.service_name.trim().is_empty() {
            return Err(TelemetryError::Config(
                "service name must not be empty".to_string(),
            ));
        }
        if self.log_level.trim().is_empty() {
            return Err(TelemetryError::Config(
                "log level must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
