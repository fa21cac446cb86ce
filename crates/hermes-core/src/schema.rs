//! Schema collaborator interface.
//!
//! A [`Schema`] turns a raw JSON value into a parsed value or into the full,
//! ordered list of [`Issue`]s describing why it could not. The dispatcher only
//! ever talks to schemas through this trait, so any validation library can be
//! plugged in by implementing it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A parse-and-validate function over JSON values.
///
/// Implementations must be pure: parsing the same input twice yields the same
/// outcome. Object schemas are expected to project their output, dropping
/// keys they do not declare.
pub trait Schema: Send + Sync + fmt::Debug {
    /// Parses `value`, returning the coerced and projected value or every issue found.
    fn parse(&self, value: &Value) -> Result<Value, Vec<Issue>>;
}

/// Shared handle to a schema.
pub type SchemaRef = Arc<dyn Schema>;

/// Machine-readable issue codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// Value has the wrong type, or is missing.
    InvalidType,
    /// Value differs from the expected literal.
    InvalidLiteral,
    /// Value is below a lower bound.
    TooSmall,
    /// Value is above an upper bound.
    TooBig,
    /// String does not match its pattern.
    InvalidString,
    /// Object carries keys a strict schema does not declare.
    UnrecognizedKeys,
    /// Body could not be decoded as JSON.
    InvalidJson,
    /// Query string could not be decoded.
    InvalidQuery,
    /// Any other failure reported by a custom schema.
    Custom,
}

/// One step of the path from the validated value's root to an issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathItem {
    /// Object key.
    Key(String),
    /// Array index.
    Index(usize),
}

impl From<&str> for PathItem {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for PathItem {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A single validation failure.
///
/// Serializes as
/// `{"code":"invalid_type","expected":"string","received":"undefined","path":["ping"],"message":"Required"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Machine-readable code.
    pub code: IssueCode,
    /// Expected type or value, when meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Received type or value, when meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
    /// Location of the failure within the validated value.
    pub path: Vec<PathItem>,
    /// Human-readable message.
    pub message: String,
}

impl Issue {
    /// Creates an issue with no expected/received description.
    #[must_use]
    pub fn new(code: IssueCode, path: Vec<PathItem>, message: impl Into<String>) -> Self {
        Self {
            code,
            expected: None,
            received: None,
            path,
            message: message.into(),
        }
    }

    /// A value of the wrong type.
    #[must_use]
    pub fn invalid_type(path: Vec<PathItem>, expected: &str, received: &str) -> Self {
        let message = if received == "undefined" {
            "Required".to_string()
        } else {
            format!("Expected {expected}, received {received}")
        };
        Self {
            code: IssueCode::InvalidType,
            expected: Some(expected.to_string()),
            received: Some(received.to_string()),
            path,
            message,
        }
    }

    /// A missing required value.
    #[must_use]
    pub fn required(path: Vec<PathItem>, expected: &str) -> Self {
        Self::invalid_type(path, expected, "undefined")
    }

    /// Returns the path rendered as `a.b.0`.
    #[must_use]
    pub fn dotted_path(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Returns the type name used in `received` descriptions.
#[must_use]
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A schema backed by a closure.
///
/// Lets callers plug an external validator in without a new type.
///
/// # Example
///
/// ```
/// use hermes_core::schema::{schema_fn, Issue, IssueCode, Schema};
/// use serde_json::json;
///
/// let even = schema_fn("even", |v| match v.as_i64() {
///     Some(n) if n % 2 == 0 => Ok(v.clone()),
///     _ => Err(vec![Issue::new(IssueCode::Custom, vec![], "Expected an even number")]),
/// });
///
/// assert!(even.parse(&json!(4)).is_ok());
/// assert!(even.parse(&json!(3)).is_err());
/// ```
pub fn schema_fn<F>(name: &'static str, parse: F) -> SchemaRef
where
    F: Fn(&Value) -> Result<Value, Vec<Issue>> + Send + Sync + 'static,
{
    Arc::new(FnSchema { name, parse })
}

struct FnSchema<F> {
    name: &'static str,
    parse: F,
}

impl<F> fmt::Debug for FnSchema<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSchema").field("name", &self.name).finish()
    }
}

impl<F> Schema for FnSchema<F>
where
    F: Fn(&Value) -> Result<Value, Vec<Issue>> + Send + Sync,
{
    fn parse(&self, value: &Value) -> Result<Value, Vec<Issue>> {
        (self.parse)(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_issue_shape() {
        let issue = Issue::required(vec!["ping".into()], "string");
        assert_eq!(
            serde_json::to_value(&issue).unwrap(),
            json!({
                "code": "invalid_type",
                "expected": "string",
                "received": "undefined",
                "path": ["ping"],
                "message": "Required"
            })
        );
    }

    #[test]
    fn test_invalid_type_message() {
        let issue = Issue::invalid_type(vec!["tags".into(), 2.into()], "string", "number");
        assert_eq!(issue.message, "Expected string, received number");
        assert_eq!(issue.dotted_path(), "tags.2");
    }

    #[test]
    fn test_issue_without_expectation_omits_fields() {
        let issue = Issue::new(IssueCode::TooSmall, vec![], "too short");
        let value = serde_json::to_value(&issue).unwrap();
        assert!(value.get("expected").is_none());
        assert!(value.get("received").is_none());
        assert_eq!(value["code"], "too_small");
    }

    #[test]
    fn test_type_name() {
        assert_eq!(type_name(&json!(null)), "null");
        assert_eq!(type_name(&json!([1])), "array");
        assert_eq!(type_name(&json!({"a": 1})), "object");
        assert_eq!(type_name(&json!(1.5)), "number");
    }

    #[test]
    fn test_schema_fn_debug_names_schema() {
        let schema = schema_fn("anything", |v| Ok(v.clone()));
        assert!(format!("{schema:?}").contains("anything"));
    }
}
