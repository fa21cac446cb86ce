//! Error types for Hermes.
//!
//! Errors fall into three groups:
//!
//! - [`ConfigurationError`]: the contract and handler trees cannot be bound.
//!   Raised once, at registration.
//! - [`RequestValidationError`] and [`ResponseValidationError`]: one request
//!   or one response broke the contract.
//! - [`DispatchError`]: every per-request failure, classified by
//!   [`ErrorCategory`] for status codes and error envelopes.

use std::fmt;

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::hooks::{HookError, Phase};
use crate::request::RequestId;
use crate::schema::Issue;
use crate::tree::Mismatch;

/// Input location validated against a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Path parameters.
    Params,
    /// Query parameters.
    Query,
    /// Request headers.
    Headers,
    /// Request body.
    Body,
}

impl Location {
    /// Returns all locations in validation order.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Params, Self::Query, Self::Headers, Self::Body]
    }

    /// Returns the short name used in logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Params => "params",
            Self::Query => "query",
            Self::Headers => "headers",
            Self::Body => "body",
        }
    }

    /// Returns the key used for this location in the default 400 body.
    #[must_use]
    pub const fn error_key(self) -> &'static str {
        match self {
            Self::Params => "pathParameterErrors",
            Self::Query => "queryParameterErrors",
            Self::Headers => "headerErrors",
            Self::Body => "bodyErrors",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Configuration errors
// ============================================================================

/// The contract and handler trees could not be bound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A declared endpoint has no handler.
    #[error("no handler for declared endpoint '{path}'")]
    MissingHandler {
        /// Dotted key path of the endpoint.
        path: String,
    },

    /// A handler has no declared endpoint.
    #[error("handler '{path}' has no declared endpoint")]
    UnexpectedHandler {
        /// Dotted key path of the handler.
        path: String,
    },

    /// A contract group faces a handler leaf, or the reverse.
    #[error("'{path}' is a {expected} in the contract but a {found} in the handler tree")]
    ShapeMismatch {
        /// Dotted key path of the node.
        path: String,
        /// Node kind in the contract.
        expected: &'static str,
        /// Node kind in the handler tree.
        found: &'static str,
    },

    /// The composed path is not a valid template.
    #[error("malformed route '{route}': {reason}")]
    MalformedPath {
        /// The composed path.
        route: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The composed path binds the same parameter twice.
    #[error("route '{route}' binds parameter '{param}' more than once")]
    DuplicateParam {
        /// The composed path.
        route: String,
        /// The repeated parameter name.
        param: String,
    },

    /// Two endpoints share a method and path.
    #[error("route {method} {route} is declared more than once")]
    DuplicateRoute {
        /// HTTP method.
        method: Method,
        /// The composed path.
        route: String,
    },
}

impl ConfigurationError {
    /// Creates a [`ConfigurationError::MalformedPath`].
    #[must_use]
    pub fn malformed(route: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPath {
            route: route.into(),
            reason: reason.into(),
        }
    }
}

impl From<Mismatch> for ConfigurationError {
    fn from(mismatch: Mismatch) -> Self {
        match mismatch {
            Mismatch::MissingRight { key_path } => Self::MissingHandler { path: key_path },
            Mismatch::MissingLeft { key_path } => Self::UnexpectedHandler { path: key_path },
            Mismatch::Kind {
                key_path,
                left,
                right,
            } => Self::ShapeMismatch {
                path: key_path,
                expected: left,
                found: right,
            },
        }
    }
}

// ============================================================================
// Validation errors
// ============================================================================

/// One or more request locations failed validation.
///
/// Only failing locations carry issues; every stored list is non-empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestValidationError {
    issues: [Option<Vec<Issue>>; 4],
}

impl RequestValidationError {
    /// Creates an error with no failing locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the issues of `location`. An empty list clears the location.
    pub fn set(&mut self, location: Location, issues: Vec<Issue>) {
        self.issues[location.index()] = if issues.is_empty() { None } else { Some(issues) };
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, location: Location, issues: Vec<Issue>) -> Self {
        self.set(location, issues);
        self
    }

    /// Returns the issues of `location`, if it failed.
    #[must_use]
    pub fn issues(&self, location: Location) -> Option<&[Issue]> {
        self.issues[location.index()].as_deref()
    }

    /// Returns the failing locations in validation order.
    #[must_use]
    pub fn failing_locations(&self) -> Vec<Location> {
        Location::all()
            .into_iter()
            .filter(|l| self.issues[l.index()].is_some())
            .collect()
    }

    /// Returns true if no location failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.iter().all(Option::is_none)
    }

    /// Returns the total number of issues.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.issues.iter().flatten().map(Vec::len).sum()
    }

    /// Builds the default 400 body.
    ///
    /// Every location key is present, holding `null` or `{"issues": [...]}`.
    #[must_use]
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        for location in Location::all() {
            let value = self.issues(location).map_or(Value::Null, |issues| {
                let mut entry = Map::new();
                entry.insert("issues".to_string(), serde_json::to_value(issues).unwrap_or_default());
                Value::Object(entry)
            });
            body.insert(location.error_key().to_string(), value);
        }
        Value::Object(body)
    }
}

impl fmt::Display for RequestValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let locations: Vec<&str> = self
            .failing_locations()
            .into_iter()
            .map(Location::as_str)
            .collect();
        write!(
            f,
            "request validation failed ({} issues in {})",
            self.issue_count(),
            locations.join(", ")
        )
    }
}

impl std::error::Error for RequestValidationError {}

/// A handler's response broke its declared contract.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("response {status} for {method} {route} failed validation ({} issues)", .issues.len())]
pub struct ResponseValidationError {
    /// HTTP method of the route.
    pub method: Method,
    /// Path template of the route.
    pub route: String,
    /// Status code the handler returned.
    pub status: StatusCode,
    /// Issues found in the body.
    pub issues: Vec<Issue>,
}

// ============================================================================
// Dispatch errors
// ============================================================================

/// Categories of per-request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The request broke the contract.
    Validation,
    /// No route matched the path.
    NotFound,
    /// The path matched but the method is not bound.
    MethodNotAllowed,
    /// Server-side failure.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the machine-readable code used in error envelopes.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

/// A per-request failure.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request failed validation.
    #[error(transparent)]
    RequestInvalid(#[from] RequestValidationError),

    /// The response failed validation.
    #[error(transparent)]
    ResponseInvalid(#[from] ResponseValidationError),

    /// A hook failed.
    #[error("{phase} hook failed: {source}")]
    Hook {
        /// Phase the hook ran in.
        phase: Phase,
        /// The hook's error.
        #[source]
        source: HookError,
    },

    /// The handler failed unexpectedly.
    #[error("handler failed: {0}")]
    Handler(#[source] anyhow::Error),

    /// No route matched.
    #[error("no route for {method} {path}")]
    NotFound {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
    },

    /// The path matched but not the method.
    #[error("method {method} not allowed for {path}")]
    MethodNotAllowed {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
        /// Methods bound at the path.
        allowed: Vec<Method>,
    },
}

impl DispatchError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::RequestInvalid(_) => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::MethodNotAllowed { .. } => ErrorCategory::MethodNotAllowed,
            Self::ResponseInvalid(_) | Self::Hook { .. } | Self::Handler(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        self.category().code()
    }

    /// Returns the message safe to show clients.
    ///
    /// Server-side failures never expose their cause.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::RequestInvalid(_) => "Request validation failed".to_string(),
            Self::NotFound { method, path } => format!("Route {method} {path} not found"),
            Self::MethodNotAllowed { method, path, .. } => {
                format!("Method {method} not allowed for {path}")
            }
            Self::ResponseInvalid(_) | Self::Hook { .. } | Self::Handler(_) => {
                "Internal Server Error".to_string()
            }
        }
    }

    /// Converts this error to a serializable envelope.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<RequestId>) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.public_message(),
            },
            request_id: request_id.map(|id| id.to_string()),
        }
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::IssueCode;
    use serde_json::json;

    fn ping_issue() -> Issue {
        Issue::required(vec!["ping".into()], "string")
    }

    #[test]
    fn test_mismatch_conversion() {
        let error: ConfigurationError = Mismatch::MissingRight {
            key_path: "posts.get".into(),
        }
        .into();
        assert_eq!(
            error,
            ConfigurationError::MissingHandler {
                path: "posts.get".into()
            }
        );
        assert_eq!(error.to_string(), "no handler for declared endpoint 'posts.get'");

        let error: ConfigurationError = Mismatch::Kind {
            key_path: "posts".into(),
            left: "group",
            right: "leaf",
        }
        .into();
        assert!(matches!(error, ConfigurationError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_request_validation_body_lists_every_location() {
        let error = RequestValidationError::new().with(Location::Body, vec![ping_issue()]);

        assert_eq!(
            error.to_body(),
            json!({
                "pathParameterErrors": null,
                "queryParameterErrors": null,
                "headerErrors": null,
                "bodyErrors": {
                    "issues": [{
                        "code": "invalid_type",
                        "expected": "string",
                        "received": "undefined",
                        "path": ["ping"],
                        "message": "Required"
                    }]
                }
            })
        );
    }

    #[test]
    fn test_empty_issue_list_clears_location() {
        let mut error = RequestValidationError::new();
        error.set(Location::Query, vec![ping_issue()]);
        error.set(Location::Query, Vec::new());
        assert!(error.is_empty());
        assert!(error.issues(Location::Query).is_none());
    }

    #[test]
    fn test_failing_locations_in_order() {
        let error = RequestValidationError::new()
            .with(Location::Body, vec![ping_issue()])
            .with(
                Location::Params,
                vec![Issue::new(IssueCode::TooSmall, vec![], "too small"), ping_issue()],
            );

        assert_eq!(error.failing_locations(), vec![Location::Params, Location::Body]);
        assert_eq!(error.issue_count(), 3);
        assert_eq!(
            error.to_string(),
            "request validation failed (3 issues in params, body)"
        );
    }

    #[test]
    fn test_dispatch_error_categories() {
        let invalid = DispatchError::from(RequestValidationError::new());
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let handler = DispatchError::Handler(anyhow::anyhow!("db down"));
        assert_eq!(handler.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(handler.error_code(), "INTERNAL_ERROR");

        let not_allowed = DispatchError::MethodNotAllowed {
            method: Method::DELETE,
            path: "/ping".into(),
            allowed: vec![Method::POST],
        };
        assert_eq!(not_allowed.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_internal_envelope_hides_cause() {
        let error = DispatchError::ResponseInvalid(ResponseValidationError {
            method: Method::GET,
            route: "/users/:id".into(),
            status: StatusCode::OK,
            issues: vec![ping_issue()],
        });

        let envelope = serde_json::to_value(error.to_envelope(None)).unwrap();
        assert_eq!(
            envelope,
            json!({"error": {"code": "INTERNAL_ERROR", "message": "Internal Server Error"}})
        );
    }

    #[test]
    fn test_envelope_carries_request_id() {
        let id = RequestId::new();
        let error = DispatchError::NotFound {
            method: Method::GET,
            path: "/nope".into(),
        };
        let envelope = error.to_envelope(Some(id));
        assert_eq!(envelope.error.code, "NOT_FOUND");
        assert_eq!(envelope.request_id, Some(id.to_string()));
    }
}
