//! Response resolution.
//!
//! Turns a handler's `(status, body)` into the reply, following the
//! endpoint's response spec for that status:
//!
//! | Spec | Response validation off | Response validation on |
//! |---|---|---|
//! | none declared | default encoding, warning | same, or rejected under [`UndeclaredStatusPolicy::Reject`] |
//! | no body | empty body | empty body; a non-empty body is rejected |
//! | explicit content type | raw body with that content type | validated, then raw |
//! | structured | default encoding, as returned | parsed, unknown fields stripped, JSON |

use bytes::Bytes;
use hermes_core::{
    DispatchOptions, Endpoint, HandlerResponse, Issue, IssueCode, Reply, ResponseBody,
    ResponseSpec, ResponseValidationError, UndeclaredStatusPolicy,
};
use hermes_telemetry::metrics::record_response_validation_failure;
use http::header::CONTENT_TYPE;
use http::StatusCode;
use serde_json::Value;

const OCTET_STREAM: &str = "application/octet-stream";

/// Writes `response` into `reply` according to `endpoint`'s contract.
///
/// `route` is the absolute path template, used in errors and diagnostics.
///
/// # Errors
///
/// Returns a [`ResponseValidationError`] when response validation is enabled
/// and the body breaks its schema, or when the status is undeclared and the
/// policy is [`UndeclaredStatusPolicy::Reject`]. The reply is left unsent.
pub fn resolve_response(
    endpoint: &Endpoint,
    route: &str,
    response: HandlerResponse,
    options: &DispatchOptions,
    reply: &mut Reply,
) -> Result<(), ResponseValidationError> {
    let HandlerResponse { status, body } = response;

    let Some(spec) = endpoint.response_for(status) else {
        if options.undeclared_status == UndeclaredStatusPolicy::Reject {
            return Err(reject(
                endpoint,
                route,
                status,
                vec![Issue::new(
                    IssueCode::Custom,
                    Vec::new(),
                    format!("No response declared for status {}", status.as_u16()),
                )],
            ));
        }
        tracing::warn!(
            method = %endpoint.method(),
            route,
            status = status.as_u16(),
            "no response declared for status, sending body unvalidated"
        );
        reply.set_status(status);
        send_default(reply, body);
        return Ok(());
    };

    if spec.is_empty() {
        if options.response_validation && !body.is_empty() {
            return Err(reject(
                endpoint,
                route,
                status,
                vec![Issue::new(
                    IssueCode::Custom,
                    Vec::new(),
                    format!("Response for status {} must not have a body", status.as_u16()),
                )],
            ));
        }
        reply.set_status(status);
        reply.headers_mut().remove(CONTENT_TYPE);
        reply.send(Bytes::new());
        return Ok(());
    }

    let checked = if options.response_validation {
        Some(check(endpoint, route, status, spec, &body)?)
    } else {
        None
    };

    reply.set_status(status);
    match (spec.content_type(), checked) {
        (Some(content_type), _) => {
            reply.set_content_type(content_type);
            reply.send(raw_bytes(body));
        }
        (None, Some(Some(projected))) if !body.is_empty() => reply.send_json(&projected),
        (None, _) => send_default(reply, body),
    }
    Ok(())
}

/// Validates `body` against `spec`, returning the projected value when the
/// spec has a schema.
fn check(
    endpoint: &Endpoint,
    route: &str,
    status: StatusCode,
    spec: &ResponseSpec,
    body: &ResponseBody,
) -> Result<Option<Value>, ResponseValidationError> {
    let Some(schema) = spec.schema() else {
        return Ok(None);
    };
    schema
        .parse(&body.to_value())
        .map(Some)
        .map_err(|issues| reject(endpoint, route, status, issues))
}

fn reject(
    endpoint: &Endpoint,
    route: &str,
    status: StatusCode,
    issues: Vec<Issue>,
) -> ResponseValidationError {
    tracing::error!(
        method = %endpoint.method(),
        route,
        status = status.as_u16(),
        issues = issues.len(),
        "response failed validation"
    );
    record_response_validation_failure(route, status.as_u16());
    ResponseValidationError {
        method: endpoint.method().clone(),
        route: route.to_string(),
        status,
        issues,
    }
}

/// Sends a body with its natural encoding.
fn send_default(reply: &mut Reply, body: ResponseBody) {
    match body {
        ResponseBody::Json(value) => reply.send_json(&value),
        ResponseBody::Text(text) => reply.send_text(text),
        ResponseBody::Bytes(bytes) => {
            reply.set_content_type(OCTET_STREAM);
            reply.send(bytes);
        }
        ResponseBody::Empty => reply.send(Bytes::new()),
    }
}

/// Returns the body bytes without re-encoding.
///
/// A JSON string is emitted as its contents; any other JSON value is
/// serialized.
fn raw_bytes(body: ResponseBody) -> Bytes {
    match body {
        ResponseBody::Json(Value::String(text)) | ResponseBody::Text(text) => Bytes::from(text),
        ResponseBody::Json(value) => Bytes::from(serde_json::to_vec(&value).unwrap_or_default()),
        ResponseBody::Bytes(bytes) => bytes,
        ResponseBody::Empty => Bytes::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{Shape, JSON_CONTENT_TYPE, TEXT_CONTENT_TYPE};
    use serde_json::json;

    fn endpoint() -> Endpoint {
        Endpoint::get("/thing")
            .response(StatusCode::OK, ResponseSpec::new(Shape::object([("foo", Shape::string())])))
            .response(
                StatusCode::ACCEPTED,
                ResponseSpec::with_content_type(Shape::string(), "text/plain"),
            )
            .response(StatusCode::NO_CONTENT, ResponseSpec::no_body())
            .build()
    }

    fn validating() -> DispatchOptions {
        DispatchOptions::new().response_validation(true)
    }

    fn content_type(reply: &Reply) -> Option<&str> {
        reply.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    fn json_body(reply: &Reply) -> Value {
        serde_json::from_slice(reply.body()).unwrap()
    }

    // ========================================================================
    // Structured responses
    // ========================================================================

    #[test]
    fn test_structured_stripped_when_validating() {
        let mut reply = Reply::new();
        let response = HandlerResponse::ok(&json!({"foo": "a", "bar": "b"}));
        resolve_response(&endpoint(), "/thing", response, &validating(), &mut reply).unwrap();

        assert!(reply.is_sent());
        assert_eq!(json_body(&reply), json!({"foo": "a"}));
        assert_eq!(content_type(&reply), Some(JSON_CONTENT_TYPE));
    }

    #[test]
    fn test_structured_untouched_without_validation() {
        let mut reply = Reply::new();
        let response = HandlerResponse::ok(&json!({"foo": "a", "bar": "b"}));
        resolve_response(&endpoint(), "/thing", response, &DispatchOptions::new(), &mut reply)
            .unwrap();

        assert_eq!(json_body(&reply), json!({"foo": "a", "bar": "b"}));
    }

    #[test]
    fn test_structured_invalid_is_rejected() {
        let mut reply = Reply::new();
        let response = HandlerResponse::ok(&json!({"foo": 1}));
        let error =
            resolve_response(&endpoint(), "/thing", response, &validating(), &mut reply).unwrap_err();

        assert_eq!(error.status, StatusCode::OK);
        assert_eq!(error.route, "/thing");
        assert_eq!(error.issues[0].code, IssueCode::InvalidType);
        assert!(!reply.is_sent());
    }

    // ========================================================================
    // Explicit content type
    // ========================================================================

    #[test]
    fn test_text_passes_through_verbatim() {
        for options in [DispatchOptions::new(), validating()] {
            let mut reply = Reply::new();
            let response = HandlerResponse::json(StatusCode::ACCEPTED, &"hello <b>world</b>");
            resolve_response(&endpoint(), "/thing", response, &options, &mut reply).unwrap();

            assert_eq!(reply.status_code(), StatusCode::ACCEPTED);
            assert_eq!(reply.body().as_ref(), b"hello <b>world</b>");
            assert_eq!(content_type(&reply), Some("text/plain"));
        }
    }

    #[test]
    fn test_text_checked_against_schema() {
        let mut reply = Reply::new();
        let response = HandlerResponse::json(StatusCode::ACCEPTED, &json!({"not": "a string"}));
        assert!(
            resolve_response(&endpoint(), "/thing", response, &validating(), &mut reply).is_err()
        );
    }

    // ========================================================================
    // No body / undeclared
    // ========================================================================

    #[test]
    fn test_no_body() {
        let mut reply = Reply::new();
        resolve_response(
            &endpoint(),
            "/thing",
            HandlerResponse::empty(StatusCode::NO_CONTENT),
            &validating(),
            &mut reply,
        )
        .unwrap();

        assert_eq!(reply.status_code(), StatusCode::NO_CONTENT);
        assert!(reply.body().is_empty());
        assert_eq!(content_type(&reply), None);

        let response = HandlerResponse::text(StatusCode::NO_CONTENT, "oops");
        assert!(resolve_response(&endpoint(), "/thing", response, &validating(), &mut Reply::new())
            .is_err());
    }

    #[test]
    fn test_empty_body_against_optional_schema() {
        let endpoint = Endpoint::get("/maybe")
            .response(
                StatusCode::OK,
                ResponseSpec::new(Shape::object([("foo", Shape::string())]).optional()),
            )
            .build();

        let mut reply = Reply::new();
        resolve_response(
            &endpoint,
            "/maybe",
            HandlerResponse::empty(StatusCode::OK),
            &validating(),
            &mut reply,
        )
        .unwrap();

        assert_eq!(reply.status_code(), StatusCode::OK);
        assert!(reply.body().is_empty());
    }

    #[test]
    fn test_undeclared_status_warns_by_default() {
        let mut reply = Reply::new();
        let response = HandlerResponse::text(StatusCode::IM_A_TEAPOT, "short and stout");
        resolve_response(&endpoint(), "/thing", response, &validating(), &mut reply).unwrap();

        assert_eq!(reply.status_code(), StatusCode::IM_A_TEAPOT);
        assert_eq!(reply.body().as_ref(), b"short and stout");
        assert_eq!(content_type(&reply), Some(TEXT_CONTENT_TYPE));
    }

    #[test]
    fn test_undeclared_status_rejected_by_policy() {
        let options = DispatchOptions::new().undeclared_status(UndeclaredStatusPolicy::Reject);
        let response = HandlerResponse::ok(&json!({}));
        let bare = Endpoint::get("/bare").build();

        let error = resolve_response(&bare, "/bare", response, &options, &mut Reply::new())
            .unwrap_err();
        assert_eq!(error.issues[0].code, IssueCode::Custom);
    }

    #[test]
    fn test_bytes_default_encoding() {
        let mut reply = Reply::new();
        let bare = Endpoint::get("/bare").build();
        let response = HandlerResponse::bytes(StatusCode::OK, Bytes::from_static(b"\x00\x01"));
        resolve_response(&bare, "/bare", response, &DispatchOptions::new(), &mut reply).unwrap();

        assert_eq!(content_type(&reply), Some(OCTET_STREAM));
        assert_eq!(reply.body().as_ref(), b"\x00\x01");
    }
}
