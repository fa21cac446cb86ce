//! The root configuration type.

use std::net::SocketAddr;

use hermes_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, DispatchSection, LogFormat, LoggingSection, MetricsSection, ServerSection};

/// Complete Hermes service configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use hermes_config::HermesConfig;
///
/// let config = HermesConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(!config.dispatch.response_validation);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HermesConfig {
    /// Service name recorded by telemetry.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Dispatcher settings.
    #[serde(default)]
    pub dispatch: DispatchSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for HermesConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            server: ServerSection::default(),
            dispatch: DispatchSection::default(),
            logging: LoggingSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

fn default_service_name() -> String {
    "hermes-service".to_string()
}

impl HermesConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> HermesConfigBuilder {
        HermesConfigBuilder::default()
    }

    /// Checks values serde cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an unparsable bind address,
    /// a zero connection or body limit, or empty histogram buckets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.max_connections == 0 {
            return Err(ConfigError::invalid(
                "server.max_connections",
                "must be greater than zero",
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        if self.metrics.enabled && self.metrics.histogram_buckets.is_empty() {
            return Err(ConfigError::invalid(
                "metrics.histogram_buckets",
                "must not be empty when metrics are enabled",
            ));
        }

        Ok(())
    }

    /// Local development preset: pretty debug logs, response validation on.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;

        config.dispatch.response_validation = true;
        config.dispatch.log_initialization = true;

        config
    }

    /// Production preset: JSON logs at `info`.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;

        config
    }

    /// Telemetry settings for [`hermes_telemetry::init_telemetry`].
    #[must_use]
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            service_name: self.service_name.clone(),
            logging: self.logging.to_log_config(),
            metrics: self.metrics.to_metrics_config(),
        }
    }
}

/// Builder for [`HermesConfig`].
#[derive(Debug, Default)]
pub struct HermesConfigBuilder {
    config: HermesConfig,
}

impl HermesConfigBuilder {
    /// Set the service name.
    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.config.service_name = name.into();
        self
    }

    /// Set the server section.
    #[must_use]
    pub fn server(mut self, server: ServerSection) -> Self {
        self.config.server = server;
        self
    }

    /// Set the dispatch section.
    #[must_use]
    pub fn dispatch(mut self, dispatch: DispatchSection) -> Self {
        self.config.dispatch = dispatch;
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingSection) -> Self {
        self.config.logging = logging;
        self
    }

    /// Set the metrics section.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricsSection) -> Self {
        self.config.metrics = metrics;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> HermesConfig {
        self.config
    }
}
