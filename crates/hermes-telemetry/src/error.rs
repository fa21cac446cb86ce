//! Telemetry error types.

use thiserror::Error;

/// Errors raised while installing logging or metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log filter directive could not be parsed.
    #[error("invalid log filter '{directive}': {reason}")]
    InvalidFilter {
        /// The rejected directive.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// A global `tracing` subscriber is already installed.
    #[error("log subscriber already installed: {0}")]
    SubscriberInstalled(String),

    /// The duration histogram buckets were rejected.
    #[error("invalid histogram buckets: {0}")]
    InvalidBuckets(String),

    /// A global metrics recorder is already installed.
    #[error("metrics recorder could not be installed: {0}")]
    RecorderInstall(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::InvalidFilter {
            directive: "hermes=loud".to_string(),
            reason: "unknown level".to_string(),
        };
        assert_eq!(err.to_string(), "invalid log filter 'hermes=loud': unknown level");

        let err = TelemetryError::InvalidBuckets("empty".to_string());
        assert_eq!(err.to_string(), "invalid histogram buckets: empty");
    }
}
