//! Outgoing reply under construction.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;
use serde::Serialize;

/// Content type used for structured bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type used for plain text bodies.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// The reply a request will receive.
///
/// A reply is "sent" once a body has been committed with one of the `send*`
/// methods. A hook that sends the reply short-circuits the rest of the
/// pipeline.
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    sent: bool,
}

impl Default for Reply {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            sent: false,
        }
    }
}

impl Reply {
    /// Creates an unsent `200 OK` reply.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Sets a header, replacing any previous value.
    pub fn header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the `content-type` header. Invalid values are ignored with a warning.
    pub fn set_content_type(&mut self, content_type: &str) -> &mut Self {
        match HeaderValue::from_str(content_type) {
            Ok(value) => {
                self.headers.insert(CONTENT_TYPE, value);
            }
            Err(_) => tracing::warn!(content_type, "ignoring invalid content type"),
        }
        self
    }

    /// Commits `body` as the reply body, keeping existing headers.
    pub fn send(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
        self.sent = true;
    }

    /// Serializes `value` as JSON and commits it.
    ///
    /// Serialization failures produce a `500` with an empty body.
    pub fn send_json<T: Serialize + ?Sized>(&mut self, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
                self.send(bytes);
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to serialize reply body");
                self.status = StatusCode::INTERNAL_SERVER_ERROR;
                self.headers.remove(CONTENT_TYPE);
                self.send(Bytes::new());
            }
        }
    }

    /// Commits `text` as a plain text body.
    pub fn send_text(&mut self, text: impl Into<String>) {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT_TYPE));
        self.send(text.into());
    }

    /// Returns true once a body has been committed.
    #[must_use]
    pub const fn is_sent(&self) -> bool {
        self.sent
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the headers for modification.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the committed body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replaces the body without changing the sent flag.
    ///
    /// Used by `onSend` hooks to rewrite an already committed payload.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Converts the reply into an HTTP response.
    #[must_use]
    pub fn into_response(self) -> http::Response<Full<Bytes>> {
        let mut response = http::Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_reply_is_unsent_ok() {
        let reply = Reply::new();
        assert_eq!(reply.status_code(), StatusCode::OK);
        assert!(!reply.is_sent());
        assert!(reply.body().is_empty());
    }

    #[test]
    fn test_send_json_sets_content_type() {
        let mut reply = Reply::new();
        reply.set_status(StatusCode::CREATED).send_json(&json!({"id": 1}));

        assert!(reply.is_sent());
        assert_eq!(reply.status_code(), StatusCode::CREATED);
        assert_eq!(reply.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
        assert_eq!(reply.body().as_ref(), br#"{"id":1}"#);
    }

    #[test]
    fn test_send_text() {
        let mut reply = Reply::new();
        reply.send_text("pong");
        assert_eq!(reply.headers()[CONTENT_TYPE], TEXT_CONTENT_TYPE);
        assert_eq!(reply.body().as_ref(), b"pong");
    }

    #[test]
    fn test_invalid_content_type_is_ignored() {
        let mut reply = Reply::new();
        reply.set_content_type("text/plain\n");
        assert!(reply.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_set_body_keeps_sent_flag() {
        let mut reply = Reply::new();
        reply.set_body("draft");
        assert!(!reply.is_sent());

        reply.send("final");
        reply.set_body("rewritten");
        assert!(reply.is_sent());
        assert_eq!(reply.body().as_ref(), b"rewritten");
    }

    #[test]
    fn test_into_response() {
        let mut reply = Reply::new();
        reply
            .set_status(StatusCode::ACCEPTED)
            .header(
                HeaderName::from_static("x-request-id"),
                HeaderValue::from_static("abc"),
            )
            .send_text("ok");

        let response = reply.into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["x-request-id"], "abc");
    }
}
