//! Configuration section types.
//!
//! Every section rejects unknown keys and falls back to defaults for keys it
//! does not see.

use std::time::Duration;

use hermes_core::{DispatchOptions, UndeclaredStatusPolicy};
use hermes_telemetry::{LogConfig, MetricsConfig};
use serde::{Deserialize, Serialize};

// ============================================================================
// Server
// ============================================================================

/// HTTP server section.
///
/// # Example
///
/// ```
/// use hermes_config::ServerSection;
///
/// let server = ServerSection::default();
/// assert_eq!(server.http_addr, "0.0.0.0:8080");
/// assert_eq!(server.max_body_bytes, 2 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Maximum number of concurrent connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Time allowed to receive a request body, in milliseconds.
    #[serde(default = "default_body_timeout")]
    pub body_timeout_ms: u64,

    /// Largest accepted request body in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Whether HTTP/1.1 keep-alive is enabled.
    #[serde(default = "default_true")]
    pub keep_alive: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            max_connections: default_max_connections(),
            body_timeout_ms: default_body_timeout(),
            max_body_bytes: default_max_body_bytes(),
            keep_alive: true,
        }
    }
}

impl ServerSection {
    /// Graceful shutdown timeout.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Request body timeout.
    #[must_use]
    pub const fn body_timeout(&self) -> Duration {
        Duration::from_millis(self.body_timeout_ms)
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_max_connections() -> usize {
    10_000
}

fn default_body_timeout() -> u64 {
    30_000
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

// ============================================================================
// Dispatch
// ============================================================================

/// The serialisable subset of [`DispatchOptions`].
///
/// Error handlers and hooks are code, so they can only be set
/// programmatically on the options returned by [`to_options`](Self::to_options).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct DispatchSection {
    /// Validate and strip responses.
    #[serde(default)]
    pub response_validation: bool,

    /// Policy for statuses an endpoint does not declare.
    #[serde(default)]
    pub undeclared_status: UndeclaredStatusPolicy,

    /// Parse query values as JSON where possible.
    #[serde(default)]
    pub json_query: bool,

    /// Log every bound route at `info`.
    #[serde(default)]
    pub log_initialization: bool,

    /// Reuse a well-formed incoming `x-request-id`.
    #[serde(default)]
    pub trust_request_id: bool,
}

impl DispatchSection {
    /// Builds dispatch options from this section.
    #[must_use]
    pub fn to_options(&self) -> DispatchOptions {
        DispatchOptions::new()
            .response_validation(self.response_validation)
            .undeclared_status(self.undeclared_status)
            .json_query(self.json_query)
            .log_initialization(self.log_initialization)
            .trust_request_id(self.trust_request_id)
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable output.
    Pretty,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (e.g. "info", "hermes_dispatch=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI colour codes.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

impl LoggingSection {
    /// Converts to the telemetry crate's [`LogConfig`].
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            ansi: self.ansi_enabled,
            file_line_info: self.include_location,
            ..LogConfig::default()
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// Metrics
// ============================================================================

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Enable metrics collection.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Histogram buckets for request duration, in seconds.
    #[serde(default = "default_histogram_buckets")]
    pub histogram_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            histogram_buckets: default_histogram_buckets(),
        }
    }
}

impl MetricsSection {
    /// Converts to the telemetry crate's [`MetricsConfig`].
    #[must_use]
    pub fn to_metrics_config(&self) -> MetricsConfig {
        MetricsConfig {
            enabled: self.enabled,
            duration_buckets: self.histogram_buckets.clone(),
        }
    }
}

fn default_histogram_buckets() -> Vec<f64> {
    MetricsConfig::default().duration_buckets
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_section_to_options() {
        let section = DispatchSection {
            response_validation: true,
            undeclared_status: UndeclaredStatusPolicy::Reject,
            json_query: true,
            log_initialization: false,
            trust_request_id: true,
        };

        let options = section.to_options();
        assert!(options.response_validation);
        assert_eq!(options.undeclared_status, UndeclaredStatusPolicy::Reject);
        assert!(options.json_query);
        assert!(!options.log_initialization);
        assert!(options.trust_request_id);
        assert!(options.error_handler.is_none());
        assert!(options.hooks.is_empty());
    }

    #[test]
    fn test_dispatch_section_matches_option_defaults() {
        let options = DispatchSection::default().to_options();
        let defaults = DispatchOptions::default();
        assert_eq!(options.response_validation, defaults.response_validation);
        assert_eq!(options.undeclared_status, defaults.undeclared_status);
        assert_eq!(options.json_query, defaults.json_query);
        assert_eq!(options.trust_request_id, defaults.trust_request_id);
    }

    #[test]
    fn test_undeclared_status_from_toml() {
        let section: DispatchSection = toml::from_str("undeclared_status = \"reject\"").unwrap();
        assert_eq!(section.undeclared_status, UndeclaredStatusPolicy::Reject);
    }

    #[test]
    fn test_logging_section_to_log_config() {
        let section = LoggingSection {
            level: "hermes_dispatch=debug,info".to_string(),
            format: LogFormat::Pretty,
            ansi_enabled: true,
            ..LoggingSection::default()
        };

        let config = section.to_log_config();
        assert_eq!(config.level, "hermes_dispatch=debug,info");
        assert!(!config.json_format);
        assert!(config.ansi);
        assert!(config.include_target);
    }

    #[test]
    fn test_metrics_section_defaults_match_telemetry() {
        assert_eq!(
            MetricsSection::default().to_metrics_config(),
            MetricsConfig::default()
        );
    }

    #[test]
    fn test_server_section_durations() {
        let server = ServerSection {
            shutdown_timeout_secs: 5,
            body_timeout_ms: 250,
            ..ServerSection::default()
        };
        assert_eq!(server.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(server.body_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: Result<ServerSection, _> = toml::from_str("http_adr = \"0.0.0.0:1\"");
        assert!(result.is_err());
    }
}
