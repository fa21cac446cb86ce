//! Route table errors.

use http::Method;
use thiserror::Error;

/// Errors raised while inserting a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The same method and path shape was inserted twice.
    #[error("duplicate route: {method} {path}")]
    Duplicate {
        /// Method of the conflicting route.
        method: Method,
        /// Path template of the conflicting route.
        path: String,
    },

    /// The path template could not be parsed.
    #[error("malformed path '{path}': {reason}")]
    Malformed {
        /// The offending template.
        path: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl RouteError {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
