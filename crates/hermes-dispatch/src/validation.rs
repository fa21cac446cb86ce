//! Request validation engine.
//!
//! Validates the four input locations of a request independently and
//! aggregates every failure into one [`RequestValidationError`]. A failure in
//! one location never prevents the others from being checked.

use hermes_core::{Endpoint, Issue, Location, Request, RequestValidationError, SchemaRef};
use serde_json::Value;

/// Outcome of validating one input location.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// The parsed value, or the raw value when no schema was declared.
    Valid(Value),
    /// Every issue the schema reported, in order.
    Invalid(Vec<Issue>),
}

impl ValidationOutcome {
    /// Returns true for [`ValidationOutcome::Valid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Validates `raw` against an optional schema.
///
/// A missing schema means no constraint: the raw value passes through.
#[must_use]
pub fn validate_location(schema: Option<&SchemaRef>, raw: &Value) -> ValidationOutcome {
    match schema {
        None => ValidationOutcome::Valid(raw.clone()),
        Some(schema) => match schema.parse(raw) {
            Ok(parsed) => ValidationOutcome::Valid(parsed),
            Err(issues) => ValidationOutcome::Invalid(issues),
        },
    }
}

/// Parsed values for every input location.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    /// Path parameters.
    pub params: Value,
    /// Query parameters.
    pub query: Value,
    /// Headers.
    pub headers: Value,
    /// Body.
    pub body: Value,
}

impl ValidatedRequest {
    /// Replaces the request's converted values with the parsed ones.
    pub fn apply(self, request: &mut Request) {
        request.params = self.params;
        request.query = self.query;
        request.headers = self.headers;
        request.body = self.body;
    }
}

fn validate_decoded(issue: Option<&Issue>, schema: Option<&SchemaRef>, raw: &Value) -> ValidationOutcome {
    match issue {
        Some(issue) => ValidationOutcome::Invalid(vec![issue.clone()]),
        None => validate_location(schema, raw),
    }
}

/// Failures from converting raw inputs, reported ahead of any schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeIssues {
    /// Undecodable query string.
    pub query: Option<Issue>,
    /// Malformed JSON body.
    pub body: Option<Issue>,
}

/// Validates every input location of `request` against `endpoint`.
///
/// A decode issue is reported for its location whether or not that location
/// declares a schema.
///
/// # Errors
///
/// Returns a [`RequestValidationError`] listing every failing location.
pub fn validate_request(
    endpoint: &Endpoint,
    request: &Request,
    decode: &DecodeIssues,
) -> Result<ValidatedRequest, RequestValidationError> {
    let params = validate_location(endpoint.path_params_schema(), &request.params);
    let query = validate_decoded(decode.query.as_ref(), endpoint.query_schema(), &request.query);
    let headers = validate_location(endpoint.headers_schema(), &request.headers);
    let body = validate_decoded(decode.body.as_ref(), endpoint.body_schema(), &request.body);

    let mut error = RequestValidationError::new();
    let mut take = |location: Location, outcome: ValidationOutcome| match outcome {
        ValidationOutcome::Valid(value) => Some(value),
        ValidationOutcome::Invalid(issues) => {
            error.set(location, issues);
            None
        }
    };

    let params = take(Location::Params, params);
    let query = take(Location::Query, query);
    let headers = take(Location::Headers, headers);
    let body = take(Location::Body, body);

    match (params, query, headers, body) {
        (Some(params), Some(query), Some(headers), Some(body)) => Ok(ValidatedRequest {
            params,
            query,
            headers,
            body,
        }),
        _ => Err(error),
    }
}
