//! The error path.
//!
//! Every per-request failure ends here. Request validation failures get the
//! configured [`RequestValidationErrorHandler`](hermes_core::RequestValidationErrorHandler)
//! or the default 400 body; everything else gets the configured
//! [`ErrorHandler`](hermes_core::ErrorHandler) or the default envelope. A
//! custom handler that leaves the reply unsent falls back to the default.

use hermes_core::{
    DispatchError, DispatchOptions, ErrorCategory, Location, Reply, Request,
    RequestValidationError,
};
use hermes_telemetry::metrics::record_request_validation_failure;
use http::header::ALLOW;
use http::HeaderValue;

/// Writes the reply for `error`.
pub fn reply_error(
    error: &DispatchError,
    request: &Request,
    options: &DispatchOptions,
    reply: &mut Reply,
) {
    if let DispatchError::RequestInvalid(invalid) = error {
        reply_request_invalid(invalid, request, options, reply);
        return;
    }

    match error.category() {
        ErrorCategory::Internal => tracing::error!(
            request_id = %request.request_id,
            method = %request.method,
            path = request.path(),
            error = %error,
            "request failed"
        ),
        _ => tracing::debug!(
            request_id = %request.request_id,
            method = %request.method,
            path = request.path(),
            error = %error,
            "request rejected"
        ),
    }

    if let Some(handler) = &options.error_handler {
        handler(error, request, reply);
        if reply.is_sent() {
            return;
        }
    }

    if let DispatchError::MethodNotAllowed { allowed, .. } = error {
        let methods: Vec<&str> = allowed.iter().map(http::Method::as_str).collect();
        if let Ok(value) = HeaderValue::from_str(&methods.join(", ")) {
            reply.header(ALLOW, value);
        }
    }

    reply
        .set_status(error.status_code())
        .send_json(&error.to_envelope(Some(request.request_id)));
}

/// Writes the reply for a request that failed validation.
pub fn reply_request_invalid(
    error: &RequestValidationError,
    request: &Request,
    options: &DispatchOptions,
    reply: &mut Reply,
) {
    let failing = error.failing_locations();
    for location in &failing {
        record_request_validation_failure(location.as_str());
    }
    tracing::debug!(
        request_id = %request.request_id,
        method = %request.method,
        route = %request.route,
        locations = ?failing.iter().map(|l| l.as_str()).collect::<Vec<_>>(),
        issues = error.issue_count(),
        "request failed validation"
    );

    if let Some(handler) = &options.request_validation_error_handler {
        handler(error, request, reply);
        if reply.is_sent() {
            return;
        }
    }

    reply
        .set_status(ErrorCategory::Validation.default_status_code())
        .send_json(&error.to_body());
}

/// Number of issues reported for `location`, zero when it passed.
#[must_use]
pub fn issue_count(error: &RequestValidationError, location: Location) -> usize {
    error.issues(location).map_or(0, <[_]>::len)
}
