//! Logging and metrics installation for Hermes services.
//!
//! The dispatcher emits `tracing` events and `metrics` updates whether or
//! not anything listens. [`init_telemetry`] installs the listeners: a
//! `tracing-subscriber` registry and a Prometheus recorder whose output is
//! available from [`render_metrics`].
//!
//! ```rust,ignore
//! use hermes_telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::new("posts-api"))?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use self::error::TelemetryError;
pub use self::logging::{init_logging, LogConfig};
pub use self::metrics::{init_metrics, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Everything [`init_telemetry`] installs.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    /// Service name, logged once at startup.
    pub service_name: String,

    /// Log subscriber settings.
    pub logging: LogConfig,

    /// Prometheus recorder settings.
    pub metrics: MetricsConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::new("hermes-service")
    }
}

impl TelemetryConfig {
    /// Default logging and metrics for `service_name`.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            logging: LogConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Installs the log subscriber, then the metrics recorder.
///
/// # Errors
///
/// Returns the first [`TelemetryError`] either installer reports. Logging
/// stays installed if metrics then fail.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;

    tracing::info!(
        service = %config.service_name,
        metrics = config.metrics.enabled,
        "telemetry initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        let config = TelemetryConfig::new("posts-api");
        assert_eq!(config.service_name, "posts-api");
        assert_eq!(config.logging, LogConfig::default());
        assert_eq!(config.metrics, MetricsConfig::default());
    }

    #[test]
    fn test_default_service_name() {
        assert_eq!(TelemetryConfig::default().service_name, "hermes-service");
    }

    #[test]
    fn test_disabled_everything_is_noop() {
        let config = TelemetryConfig {
            logging: LogConfig {
                enabled: false,
                ..LogConfig::default()
            },
            metrics: MetricsConfig {
                enabled: false,
                ..MetricsConfig::default()
            },
            ..TelemetryConfig::new("quiet")
        };
        assert!(init_telemetry(&config).is_ok());
    }
}
