//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Why configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required file does not exist.
    #[error("configuration file {path} does not exist")]
    Missing {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// A file exists but could not be read.
    #[error("cannot read {path}")]
    Read {
        /// The file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Neither TOML nor JSON.
    #[error("unsupported configuration format '{0}', expected toml or json")]
    UnsupportedFormat(String),

    /// TOML syntax error, type mismatch or unknown key.
    #[error("TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON syntax error, type mismatch or unknown key.
    #[error("JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A value parsed but is not usable.
    #[error("{field}: {reason}")]
    Invalid {
        /// Dotted field path, e.g. `server.http_addr`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An override variable names an unknown key or carries a bad value.
    #[error("environment variable {var}: {reason}")]
    Env {
        /// Full variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn missing(path: impl Into<PathBuf>) -> Self {
        Self::Missing { path: path.into() }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
