//! Log subscriber installation.
//!
//! One `fmt` layer, JSON or human-readable, filtered by an [`EnvFilter`]
//! directive such as `"hermes_dispatch=debug,info"`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Install a subscriber at all.
    pub enabled: bool,

    /// `EnvFilter` directive.
    pub level: String,

    /// One JSON object per event instead of aligned text.
    pub json_format: bool,

    /// Colour text output.
    pub ansi: bool,

    /// Source file and line on every event.
    pub file_line_info: bool,

    /// Module path on every event.
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            ansi: false,
            file_line_info: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Coloured text at `debug` with source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            ansi: true,
            file_line_info: true,
            ..Self::default()
        }
    }

    /// Parses [`LogConfig::level`].
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::InvalidFilter`] if the directive is invalid.
    pub fn filter(&self) -> TelemetryResult<EnvFilter> {
        EnvFilter::try_new(&self.level).map_err(|e| TelemetryError::InvalidFilter {
            directive: self.level.clone(),
            reason: e.to_string(),
        })
    }

    fn format_layer(&self) -> BoxedLayer {
        let layer = tracing_subscriber::fmt::layer()
            .with_file(self.file_line_info)
            .with_line_number(self.file_line_info)
            .with_target(self.include_target);

        if self.json_format {
            layer.json().boxed()
        } else {
            layer.with_ansi(self.ansi).boxed()
        }
    }
}

/// Installs the global log subscriber.
///
/// Does nothing when logging is disabled.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for a bad directive and
/// [`TelemetryError::SubscriberInstalled`] if another subscriber owns the
/// process.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = config.filter()?;
    tracing_subscriber::registry()
        .with(config.format_layer().with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInstalled(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert!(config.json_format);
        assert!(!config.ansi);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert!(!config.json_format);
        assert!(config.ansi);
        assert!(config.file_line_info);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_filter_directives() {
        let mut config = LogConfig::default();
        assert!(config.filter().is_ok());

        config.level = "hermes_dispatch=debug,warn".to_string();
        assert!(config.filter().is_ok());

        config.level = "hermes=notalevel".to_string();
        let err = config.filter().unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidFilter { ref directive, .. } if directive == "hermes=notalevel"));
    }

    #[test]
    fn test_disabled_logging_installs_nothing() {
        let config = LogConfig {
            enabled: false,
            level: "not a directive at all ===".to_string(),
            ..Default::default()
        };
        assert!(init_logging(&config).is_ok());
    }
}
