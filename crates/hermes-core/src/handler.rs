//! Handler types and the handler tree.
//!
//! A handler is any `Fn(Request) -> Future<Output = HandlerResult>`. Each leaf
//! of a [`HandlerNode`] is a [`HandlerEntry`]: the handler plus the hooks
//! scoped to that route.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::hooks::Hooks;
use crate::request::Request;
use crate::tree::Tree;

/// Boxed future used across the dispatch pipeline.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result returned by handlers.
pub type HandlerResult = Result<HandlerResponse, HandlerError>;

/// A handler tree mirroring a contract tree.
pub type HandlerNode = Tree<HandlerEntry>;

/// An asynchronous request handler.
pub trait Handler: Send + Sync + 'static {
    /// Handles a validated request.
    fn call(&self, request: Request) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, request: Request) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(request))
    }
}

/// Body returned by a handler, before response resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// A structured value.
    Json(Value),
    /// A text payload.
    Text(String),
    /// Raw bytes.
    Bytes(Bytes),
    /// No body.
    Empty,
}

impl ResponseBody {
    /// Returns the body as a JSON value for schema validation.
    ///
    /// Text becomes a JSON string; bytes become a string when valid UTF-8.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Json(value) => value.clone(),
            Self::Text(text) => Value::String(text.clone()),
            Self::Bytes(bytes) => std::str::from_utf8(bytes)
                .map_or(Value::Null, |s| Value::String(s.to_string())),
            Self::Empty => Value::Null,
        }
    }

    /// Returns true for [`ResponseBody::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// The status and body a handler produced.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    /// Status code to send.
    pub status: StatusCode,
    /// Body to resolve against the contract.
    pub body: ResponseBody,
}

impl HandlerResponse {
    /// Creates a response with a JSON body.
    ///
    /// Values that fail to serialize become `null`.
    #[must_use]
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Self {
        let value = serde_json::to_value(body).unwrap_or_else(|error| {
            tracing::error!(error = %error, "handler body failed to serialize");
            Value::Null
        });
        Self {
            status,
            body: ResponseBody::Json(value),
        }
    }

    /// Creates a `200 OK` response with a JSON body.
    #[must_use]
    pub fn ok<T: Serialize>(body: &T) -> Self {
        Self::json(StatusCode::OK, body)
    }

    /// Creates a response with a text body.
    #[must_use]
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: ResponseBody::Text(body.into()),
        }
    }

    /// Creates a response with a raw body.
    #[must_use]
    pub fn bytes(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: ResponseBody::Bytes(body.into()),
        }
    }

    /// Creates a response with no body.
    #[must_use]
    pub const fn empty(status: StatusCode) -> Self {
        Self {
            status,
            body: ResponseBody::Empty,
        }
    }
}

/// Errors a handler may return.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A declared error response, resolved against the contract like any
    /// other response.
    #[error("handler returned status {}", .0.status)]
    Response(HandlerResponse),

    /// An unexpected failure, reported as a generic server error.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<HandlerResponse> for HandlerError {
    fn from(response: HandlerResponse) -> Self {
        Self::Response(response)
    }
}

/// A handler together with its route-scoped hooks.
#[derive(Clone)]
pub struct HandlerEntry {
    handler: Arc<dyn Handler>,
    hooks: Hooks,
}

impl HandlerEntry {
    /// Wraps a handler with no route hooks.
    #[must_use]
    pub fn new(handler: impl Handler) -> Self {
        Self {
            handler: Arc::new(handler),
            hooks: Hooks::new(),
        }
    }

    /// Attaches route-scoped hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Returns the handler.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Returns the route-scoped hooks.
    #[must_use]
    pub const fn hooks(&self) -> &Hooks {
        &self.hooks
    }
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

/// Shorthand for [`HandlerEntry::new`].
#[must_use]
pub fn handler(h: impl Handler) -> HandlerEntry {
    HandlerEntry::new(h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn echo(request: Request) -> HandlerResult {
        Ok(HandlerResponse::ok(&request.body))
    }

    #[tokio::test]
    async fn test_async_fn_is_handler() {
        let entry = handler(echo);
        let mut request = Request::default();
        request.body = json!({"ping": "pong"});

        let response = entry.handler().call(request).await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, ResponseBody::Json(json!({"ping": "pong"})));
    }

    #[tokio::test]
    async fn test_closure_handler_with_error() {
        let entry = handler(|_request: Request| async {
            let missing = HandlerResponse::json(StatusCode::NOT_FOUND, &json!({"message": "missing"}));
            Err::<HandlerResponse, _>(HandlerError::from(missing))
        });

        let error = entry.handler().call(Request::default()).await.unwrap_err();
        match error {
            HandlerError::Response(response) => assert_eq!(response.status, StatusCode::NOT_FOUND),
            HandlerError::Internal(_) => panic!("expected a typed response"),
        }
    }

    #[test]
    fn test_internal_error_from_anyhow() {
        let error: HandlerError = anyhow::anyhow!("database unavailable").into();
        assert_eq!(error.to_string(), "database unavailable");
    }

    #[test]
    fn test_response_body_to_value() {
        assert_eq!(ResponseBody::Text("hi".into()).to_value(), json!("hi"));
        assert_eq!(
            ResponseBody::Bytes(Bytes::from_static(b"raw")).to_value(),
            json!("raw")
        );
        assert_eq!(
            ResponseBody::Bytes(Bytes::from_static(&[0xff, 0xfe])).to_value(),
            Value::Null
        );
        assert!(ResponseBody::Empty.is_empty());
    }

    #[test]
    fn test_entry_debug_hides_handler() {
        let entry = handler(echo);
        let debug = format!("{entry:?}");
        assert!(debug.starts_with("HandlerEntry"));
    }
}
