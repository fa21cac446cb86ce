//! Conversion of raw request inputs into JSON values.
//!
//! Every location is converted before validation so that schemas and hooks
//! see one uniform representation.

use bytes::Bytes;
use hermes_core::{Issue, IssueCode};
use hermes_router::Params;
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};

/// Converts extracted path parameters into an object of strings.
#[must_use]
pub fn params_value(params: &Params) -> Value {
    Value::Object(
        params
            .iter()
            .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
            .collect(),
    )
}

/// Converts a raw query string into an object.
///
/// Repeated keys become arrays in order of appearance. `+` decodes to a
/// space. With `json_query`, each value is parsed as JSON when possible and
/// kept as a string otherwise.
///
/// # Errors
///
/// Returns an `invalid_query` issue when a key or value does not decode to
/// UTF-8.
pub fn query_value(query: Option<&str>, json_query: bool) -> Result<Value, Issue> {
    let mut object = Map::new();
    let pairs = query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty());

    for pair in pairs {
        let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key)?;
        let raw = decode_component(raw)?;
        let value = if json_query {
            serde_json::from_str(&raw).unwrap_or(Value::String(raw))
        } else {
            Value::String(raw)
        };

        match object.get_mut(&key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                object.insert(key, value);
            }
        }
    }
    Ok(Value::Object(object))
}

fn decode_component(component: &str) -> Result<String, Issue> {
    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| {
            Issue::new(
                IssueCode::InvalidQuery,
                Vec::new(),
                format!("Invalid query string: '{component}' is not valid UTF-8"),
            )
        })
}

/// Converts headers into an object keyed by lower-case name.
///
/// Multiple values for one name are joined with `", "`. Non-UTF-8 bytes are
/// replaced.
#[must_use]
pub fn headers_value(headers: &HeaderMap) -> Value {
    let mut object = Map::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        object.insert(name.as_str().to_string(), Value::String(joined));
    }
    Value::Object(object)
}

/// Converts a raw body according to its content type.
///
/// | Content type | Result |
/// |---|---|
/// | any, empty body | `null` |
/// | `application/json`, `*+json` | parsed JSON |
/// | `text/*`, `application/x-www-form-urlencoded` | string |
/// | absent | parsed JSON if valid, else string |
/// | anything else | lossy UTF-8 string |
///
/// # Errors
///
/// Returns an `invalid_json` issue when a JSON body does not parse.
pub fn body_value(headers: &HeaderMap, body: &Bytes) -> Result<Value, Issue> {
    if body.is_empty() {
        return Ok(Value::Null);
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        });

    match content_type.as_deref() {
        Some(ct) if is_json(ct) => serde_json::from_slice(body).map_err(|error| {
            Issue::new(
                IssueCode::InvalidJson,
                Vec::new(),
                format!("Invalid JSON: {error}"),
            )
        }),
        None => Ok(serde_json::from_slice(body).unwrap_or_else(|_| lossy_string(body))),
        Some(_) => Ok(lossy_string(body)),
    }
}

fn is_json(content_type: &str) -> bool {
    content_type == "application/json" || content_type.ends_with("+json")
}

fn lossy_string(body: &Bytes) -> Value {
    Value::String(String::from_utf8_lossy(body).into_owned())
}
