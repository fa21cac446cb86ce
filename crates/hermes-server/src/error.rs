//! Server error types.

use thiserror::Error;

/// Errors that stop the server from running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The bind address could not be parsed.
    #[error("invalid address '{addr}': {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address.
        addr: std::net::SocketAddr,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A contract route is answered by a built-in endpoint instead.
    #[error("route GET {path} is shadowed by the built-in endpoint; disable or move it in the server config")]
    ShadowedRoute {
        /// The conflicting path.
        path: String,
    },

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
