//! Per-request state seen by hooks and handlers.
//!
//! A [`Request`] starts as a raw snapshot (method, URI, headers, body bytes)
//! and is progressively filled in by the dispatcher: path parameters after
//! routing, converted JSON inputs before validation, and parsed values after
//! validation succeeds.

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for one request easy to
/// correlate and sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A request flowing through the dispatch pipeline.
///
/// The JSON fields (`params`, `query`, `headers`, `body`) hold raw converted
/// values until validation runs; afterwards every location that has a schema
/// holds the parsed value instead. Hooks in earlier phases may rewrite any
/// field, including `raw_body`, before conversion happens.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Request URI as received.
    pub uri: Uri,
    /// Absolute path template of the matched route, empty until routed.
    pub route: String,
    /// Raw request headers.
    pub raw_headers: HeaderMap,
    /// Raw request body.
    pub raw_body: Bytes,
    /// Path parameters as a JSON object.
    pub params: Value,
    /// Query parameters as a JSON object.
    pub query: Value,
    /// Headers as a JSON object keyed by lower-case name.
    pub headers: Value,
    /// Request body as JSON.
    pub body: Value,
    /// Identifier assigned on arrival.
    pub request_id: RequestId,
    /// Free-form per-request data shared between hooks and the handler.
    pub extensions: Extensions,
}

impl Request {
    /// Creates a request from its raw parts.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            raw_headers: headers,
            raw_body: body,
            ..Self::default()
        }
    }

    /// Returns the request path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns a path parameter rendered as a string.
    ///
    /// Works for both raw (string) and coerced (number, boolean) values.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<String> {
        match self.params.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Returns a raw header value if it is valid visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.raw_headers.get(name)?.to_str().ok()
    }

    /// Deserializes the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not match `T`.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }

    /// Deserializes the path parameters into `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters do not match `T`.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.params)
    }

    /// Deserializes the query parameters into `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query does not match `T`.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.query)
    }
}
