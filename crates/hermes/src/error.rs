//! Facade error type.

use thiserror::Error;

/// Any failure while assembling or running an application.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] hermes_config::ConfigError),

    /// The contract and handler trees could not be bound.
    #[error(transparent)]
    Binding(#[from] hermes_core::ConfigurationError),

    /// Logging or metrics could not be installed.
    #[error(transparent)]
    Telemetry(#[from] hermes_telemetry::TelemetryError),

    /// The server failed to start or stopped with an error.
    #[error(transparent)]
    Server(#[from] hermes_server::ServerError),
}

/// Result alias for [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
