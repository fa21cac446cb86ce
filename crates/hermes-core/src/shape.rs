//! Built-in schema implementation.
//!
//! [`Shape`] covers the JSON types contracts usually need: strings, numbers,
//! integers, booleans, literals, arrays and objects, with optional and nullable
//! modifiers, bounds, string patterns and string coercion for inputs that
//! arrive as text (path parameters, query values, headers).
//!
//! Parsing is exhaustive: every issue in the value is collected, not just the
//! first. Object output is projected onto the declared fields.
//!
//! # Example
//!
//! ```
//! use hermes_core::shape::Shape;
//! use hermes_core::schema::Schema;
//! use serde_json::json;
//!
//! let schema = Shape::object([
//!     ("title", Shape::string().min_length(1)),
//!     ("views", Shape::integer().optional()),
//! ]);
//!
//! let parsed = schema.parse(&json!({"title": "hi", "extra": true})).unwrap();
//! assert_eq!(parsed, json!({"title": "hi"}));
//!
//! let issues = schema.parse(&json!({})).unwrap_err();
//! assert_eq!(issues[0].message, "Required");
//! ```

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};

use crate::schema::{type_name, Issue, IssueCode, PathItem, Schema};

/// How an object treats keys it does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Drop them from the output.
    #[default]
    Strip,
    /// Report them as an issue.
    Strict,
    /// Keep them untouched.
    Passthrough,
}

/// The type-specific part of a [`Shape`].
#[derive(Debug, Clone)]
pub enum Kind {
    /// String type.
    String {
        /// Minimum length in characters.
        min_length: Option<usize>,
        /// Maximum length in characters.
        max_length: Option<usize>,
        /// Pattern the whole string must match.
        pattern: Option<Regex>,
    },
    /// Any JSON number.
    Number {
        /// Inclusive lower bound.
        minimum: Option<f64>,
        /// Inclusive upper bound.
        maximum: Option<f64>,
    },
    /// A number with no fractional part.
    Integer {
        /// Inclusive lower bound.
        minimum: Option<i64>,
        /// Inclusive upper bound.
        maximum: Option<i64>,
    },
    /// Boolean type.
    Boolean,
    /// Exactly this value.
    Literal(Value),
    /// Array of homogeneous items.
    Array {
        /// Item schema.
        items: Box<Shape>,
        /// Minimum number of items.
        min_items: Option<usize>,
        /// Maximum number of items.
        max_items: Option<usize>,
    },
    /// Object with declared fields.
    Object {
        /// Field schemas in declaration order.
        fields: IndexMap<String, Shape>,
        /// Handling of undeclared keys.
        unknown_keys: UnknownKeys,
    },
    /// Accepts anything, including a missing value.
    Any,
    /// Only `null`.
    Null,
}

/// A composable schema.
///
/// Fields are required unless marked [`optional`](Shape::optional).
#[derive(Debug, Clone)]
pub struct Shape {
    kind: Kind,
    optional: bool,
    nullable: bool,
    coerce: bool,
    default: Option<Value>,
}

impl Shape {
    fn of(kind: Kind) -> Self {
        Self {
            kind,
            optional: false,
            nullable: false,
            coerce: false,
            default: None,
        }
    }

    /// Creates a string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::of(Kind::String {
            min_length: None,
            max_length: None,
            pattern: None,
        })
    }

    /// Creates a number schema.
    #[must_use]
    pub fn number() -> Self {
        Self::of(Kind::Number {
            minimum: None,
            maximum: None,
        })
    }

    /// Creates an integer schema.
    #[must_use]
    pub fn integer() -> Self {
        Self::of(Kind::Integer {
            minimum: None,
            maximum: None,
        })
    }

    /// Creates a boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::of(Kind::Boolean)
    }

    /// Creates a schema accepting exactly `value`.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::of(Kind::Literal(value.into()))
    }

    /// Creates an array schema.
    #[must_use]
    pub fn array(items: Shape) -> Self {
        Self::of(Kind::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        })
    }

    /// Creates an object schema from `(name, schema)` pairs.
    #[must_use]
    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Shape)>,
    {
        Self::of(Kind::Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            unknown_keys: UnknownKeys::Strip,
        })
    }

    /// Creates a schema that accepts any value.
    #[must_use]
    pub fn any() -> Self {
        Self::of(Kind::Any)
    }

    /// Creates a schema that accepts only `null`.
    #[must_use]
    pub fn null() -> Self {
        Self::of(Kind::Null)
    }

    /// Allows the value to be absent.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Allows the value to be `null`.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Accepts string input for number, integer and boolean schemas.
    #[must_use]
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    /// Uses `value` when the input is absent.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the minimum string length.
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        if let Kind::String { min_length, .. } = &mut self.kind {
            *min_length = Some(len);
        }
        self
    }

    /// Sets the maximum string length.
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        if let Kind::String { max_length, .. } = &mut self.kind {
            *max_length = Some(len);
        }
        self
    }

    /// Requires strings to match `regex`.
    #[must_use]
    pub fn pattern(mut self, regex: Regex) -> Self {
        if let Kind::String { pattern, .. } = &mut self.kind {
            *pattern = Some(regex);
        }
        self
    }

    /// Sets the inclusive lower bound for numbers and integers.
    #[must_use]
    pub fn min(mut self, bound: i64) -> Self {
        match &mut self.kind {
            Kind::Integer { minimum, .. } => *minimum = Some(bound),
            Kind::Number { minimum, .. } => *minimum = Some(bound as f64),
            _ => {}
        }
        self
    }

    /// Sets the inclusive upper bound for numbers and integers.
    #[must_use]
    pub fn max(mut self, bound: i64) -> Self {
        match &mut self.kind {
            Kind::Integer { maximum, .. } => *maximum = Some(bound),
            Kind::Number { maximum, .. } => *maximum = Some(bound as f64),
            _ => {}
        }
        self
    }

    /// Sets the minimum number of array items.
    #[must_use]
    pub fn min_items(mut self, n: usize) -> Self {
        if let Kind::Array { min_items, .. } = &mut self.kind {
            *min_items = Some(n);
        }
        self
    }

    /// Sets the maximum number of array items.
    #[must_use]
    pub fn max_items(mut self, n: usize) -> Self {
        if let Kind::Array { max_items, .. } = &mut self.kind {
            *max_items = Some(n);
        }
        self
    }

    /// Rejects undeclared object keys.
    #[must_use]
    pub fn strict(self) -> Self {
        self.unknown_keys(UnknownKeys::Strict)
    }

    /// Keeps undeclared object keys in the output.
    #[must_use]
    pub fn passthrough(self) -> Self {
        self.unknown_keys(UnknownKeys::Passthrough)
    }

    fn unknown_keys(mut self, policy: UnknownKeys) -> Self {
        if let Kind::Object { unknown_keys, .. } = &mut self.kind {
            *unknown_keys = policy;
        }
        self
    }

    /// Returns the type-specific definition.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Returns true if the value may be absent.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional || self.default.is_some() || matches!(self.kind, Kind::Any)
    }

    /// Name used in `expected` descriptions.
    #[must_use]
    pub fn expected_name(&self) -> String {
        match &self.kind {
            Kind::String { .. } => "string".to_string(),
            Kind::Number { .. } => "number".to_string(),
            Kind::Integer { .. } => "integer".to_string(),
            Kind::Boolean => "boolean".to_string(),
            Kind::Literal(v) => v.to_string(),
            Kind::Array { .. } => "array".to_string(),
            Kind::Object { .. } => "object".to_string(),
            Kind::Any => "any".to_string(),
            Kind::Null => "null".to_string(),
        }
    }

    /// Parses a possibly absent value at `path`.
    ///
    /// Returns `None` when the value is absent and allowed to be, or when it
    /// failed; failures are appended to `issues`.
    fn parse_at(
        &self,
        value: Option<&Value>,
        path: &mut Vec<PathItem>,
        issues: &mut Vec<Issue>,
    ) -> Option<Value> {
        let Some(value) = value else {
            if let Some(default) = &self.default {
                return Some(default.clone());
            }
            if !self.is_optional() {
                issues.push(Issue::required(path.clone(), &self.expected_name()));
            }
            return None;
        };

        if value.is_null() && self.nullable {
            return Some(Value::Null);
        }

        match &self.kind {
            Kind::Any => Some(value.clone()),
            Kind::Null => {
                if value.is_null() {
                    Some(Value::Null)
                } else {
                    self.wrong_type(value, path, issues)
                }
            }
            Kind::String {
                min_length,
                max_length,
                pattern,
            } => {
                let Some(s) = value.as_str() else {
                    return self.wrong_type(value, path, issues);
                };
                let before = issues.len();
                let len = s.chars().count();
                if let Some(min) = min_length.filter(|min| len < *min) {
                    issues.push(Issue::new(
                        IssueCode::TooSmall,
                        path.clone(),
                        format!("String must contain at least {min} character(s)"),
                    ));
                }
                if let Some(max) = max_length.filter(|max| len > *max) {
                    issues.push(Issue::new(
                        IssueCode::TooBig,
                        path.clone(),
                        format!("String must contain at most {max} character(s)"),
                    ));
                }
                if let Some(re) = pattern.as_ref().filter(|re| !re.is_match(s)) {
                    let mut issue = Issue::new(IssueCode::InvalidString, path.clone(), "Invalid");
                    issue.expected = Some(re.as_str().to_string());
                    issues.push(issue);
                }
                (issues.len() == before).then(|| value.clone())
            }
            Kind::Number { minimum, maximum } => {
                let number = match (value, self.coerce) {
                    (Value::Number(n), _) => n.as_f64(),
                    (Value::String(s), true) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
                    _ => None,
                };
                let Some(number) = number else {
                    return self.wrong_type(value, path, issues);
                };
                let before = issues.len();
                check_bounds(number, *minimum, *maximum, path, issues);
                if issues.len() != before {
                    return None;
                }
                match value {
                    Value::Number(_) => Some(value.clone()),
                    _ => Some(Value::from(number)),
                }
            }
            Kind::Integer { minimum, maximum } => {
                let integer = match (value, self.coerce) {
                    (Value::Number(n), _) => as_integer(n),
                    (Value::String(s), true) => s.trim().parse::<i64>().ok(),
                    _ => None,
                };
                let Some(integer) = integer else {
                    if let Value::Number(_) = value {
                        issues.push(Issue::invalid_type(path.clone(), "integer", "float"));
                        return None;
                    }
                    return self.wrong_type(value, path, issues);
                };
                let before = issues.len();
                check_bounds(
                    integer as f64,
                    minimum.map(|m| m as f64),
                    maximum.map(|m| m as f64),
                    path,
                    issues,
                );
                (issues.len() == before).then(|| Value::from(integer))
            }
            Kind::Boolean => {
                let parsed = match (value, self.coerce) {
                    (Value::Bool(b), _) => Some(*b),
                    (Value::String(s), true) => match s.as_str() {
                        "true" | "1" => Some(true),
                        "false" | "0" => Some(false),
                        _ => None,
                    },
                    _ => None,
                };
                match parsed {
                    Some(b) => Some(Value::Bool(b)),
                    None => self.wrong_type(value, path, issues),
                }
            }
            Kind::Literal(expected) => {
                if value == expected {
                    Some(value.clone())
                } else {
                    let mut issue = Issue::new(
                        IssueCode::InvalidLiteral,
                        path.clone(),
                        format!("Invalid literal value, expected {expected}"),
                    );
                    issue.expected = Some(expected.to_string());
                    issue.received = Some(value.to_string());
                    issues.push(issue);
                    None
                }
            }
            Kind::Array {
                items,
                min_items,
                max_items,
            } => {
                let Some(array) = value.as_array() else {
                    return self.wrong_type(value, path, issues);
                };
                let before = issues.len();
                if let Some(min) = min_items.filter(|min| array.len() < *min) {
                    issues.push(Issue::new(
                        IssueCode::TooSmall,
                        path.clone(),
                        format!("Array must contain at least {min} element(s)"),
                    ));
                }
                if let Some(max) = max_items.filter(|max| array.len() > *max) {
                    issues.push(Issue::new(
                        IssueCode::TooBig,
                        path.clone(),
                        format!("Array must contain at most {max} element(s)"),
                    ));
                }
                let mut out = Vec::with_capacity(array.len());
                for (index, item) in array.iter().enumerate() {
                    path.push(PathItem::Index(index));
                    // absent array items are never "missing", so an item parse of None means failure
                    out.push(items.parse_at(Some(item), path, issues).unwrap_or(Value::Null));
                    path.pop();
                }
                (issues.len() == before).then_some(Value::Array(out))
            }
            Kind::Object {
                fields,
                unknown_keys,
            } => {
                let Some(object) = value.as_object() else {
                    return self.wrong_type(value, path, issues);
                };
                let before = issues.len();
                let mut out = Map::new();
                for (name, field) in fields {
                    path.push(PathItem::Key(name.clone()));
                    if let Some(parsed) = field.parse_at(object.get(name), path, issues) {
                        out.insert(name.clone(), parsed);
                    }
                    path.pop();
                }

                let unknown: Vec<&String> =
                    object.keys().filter(|k| !fields.contains_key(*k)).collect();
                match unknown_keys {
                    UnknownKeys::Strip => {}
                    UnknownKeys::Passthrough => {
                        for key in &unknown {
                            out.insert((*key).clone(), object[key.as_str()].clone());
                        }
                    }
                    UnknownKeys::Strict if !unknown.is_empty() => {
                        let listed: Vec<String> = unknown.iter().map(|k| format!("'{k}'")).collect();
                        issues.push(Issue::new(
                            IssueCode::UnrecognizedKeys,
                            path.clone(),
                            format!("Unrecognized key(s) in object: {}", listed.join(", ")),
                        ));
                    }
                    UnknownKeys::Strict => {}
                }

                (issues.len() == before).then_some(Value::Object(out))
            }
        }
    }

    fn wrong_type(
        &self,
        value: &Value,
        path: &[PathItem],
        issues: &mut Vec<Issue>,
    ) -> Option<Value> {
        issues.push(Issue::invalid_type(
            path.to_vec(),
            &self.expected_name(),
            type_name(value),
        ));
        None
    }
}

#[allow(clippy::cast_possible_truncation)]
fn as_integer(n: &serde_json::Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    // i64::MAX as f64 rounds up, so the upper comparison is exclusive
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn check_bounds(
    value: f64,
    minimum: Option<f64>,
    maximum: Option<f64>,
    path: &[PathItem],
    issues: &mut Vec<Issue>,
) {
    if let Some(min) = minimum.filter(|min| value < *min) {
        issues.push(Issue::new(
            IssueCode::TooSmall,
            path.to_vec(),
            format!("Number must be greater than or equal to {min}"),
        ));
    }
    if let Some(max) = maximum.filter(|max| value > *max) {
        issues.push(Issue::new(
            IssueCode::TooBig,
            path.to_vec(),
            format!("Number must be less than or equal to {max}"),
        ));
    }
}

impl Schema for Shape {
    fn parse(&self, value: &Value) -> Result<Value, Vec<Issue>> {
        let mut issues = Vec::new();
        let mut path = Vec::new();
        // A missing top-level input arrives as null.
        let present = !(value.is_null() && self.is_optional() && !self.nullable);
        let parsed = self.parse_at(present.then_some(value), &mut path, &mut issues);
        if issues.is_empty() {
            Ok(parsed.unwrap_or(Value::Null))
        } else {
            Err(issues)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    // ========================================================================
    // Scalars
    // ========================================================================

    #[test]
    fn test_string_bounds() {
        let schema = Shape::string().min_length(2).max_length(4);
        assert!(schema.parse(&json!("abc")).is_ok());

        let issues = schema.parse(&json!("a")).unwrap_err();
        assert_eq!(issues[0].code, IssueCode::TooSmall);

        let issues = schema.parse(&json!("abcde")).unwrap_err();
        assert_eq!(issues[0].code, IssueCode::TooBig);
    }

    #[test]
    fn test_string_pattern() {
        let schema = Shape::string().pattern(Regex::new("^[a-z]+$").unwrap());
        assert!(schema.parse(&json!("abc")).is_ok());
        assert_eq!(
            schema.parse(&json!("ABC")).unwrap_err()[0].code,
            IssueCode::InvalidString
        );
    }

    #[test]
    fn test_wrong_type_reports_received() {
        let issues = Shape::string().parse(&json!(42)).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::InvalidType);
        assert_eq!(issues[0].expected.as_deref(), Some("string"));
        assert_eq!(issues[0].received.as_deref(), Some("number"));
        assert_eq!(issues[0].message, "Expected string, received number");
    }

    #[test]
    fn test_integer_rejects_float() {
        let issues = Shape::integer().parse(&json!(1.5)).unwrap_err();
        assert_eq!(issues[0].received.as_deref(), Some("float"));
        assert_eq!(Shape::integer().parse(&json!(2.0)).unwrap(), json!(2));
    }

    #[test]
    fn test_number_bounds() {
        let schema = Shape::number().min(0).max(10);
        assert!(schema.parse(&json!(5.5)).is_ok());
        assert_eq!(schema.parse(&json!(-1)).unwrap_err()[0].code, IssueCode::TooSmall);
        assert_eq!(schema.parse(&json!(11)).unwrap_err()[0].code, IssueCode::TooBig);
    }

    #[test]
    fn test_coercion_from_strings() {
        assert_eq!(Shape::integer().coerce().parse(&json!("10")).unwrap(), json!(10));
        assert_eq!(Shape::number().coerce().parse(&json!("2.5")).unwrap(), json!(2.5));
        assert_eq!(Shape::boolean().coerce().parse(&json!("false")).unwrap(), json!(false));
        assert!(Shape::integer().coerce().parse(&json!("ten")).is_err());
        assert!(Shape::integer().parse(&json!("10")).is_err());
    }

    #[test]
    fn test_literal() {
        let schema = Shape::literal("asc");
        assert!(schema.parse(&json!("asc")).is_ok());
        assert_eq!(
            schema.parse(&json!("desc")).unwrap_err()[0].code,
            IssueCode::InvalidLiteral
        );
    }

    #[test]
    fn test_nullable_and_null() {
        assert_eq!(Shape::string().nullable().parse(&Value::Null).unwrap(), Value::Null);
        assert!(Shape::string().parse(&Value::Null).is_err());
        assert!(Shape::null().parse(&Value::Null).is_ok());
        assert!(Shape::null().parse(&json!(0)).is_err());
    }

    // ========================================================================
    // Objects and arrays
    // ========================================================================

    #[test]
    fn test_object_missing_field_is_required_issue() {
        let schema = Shape::object([("ping", Shape::string())]);
        let issues = schema.parse(&json!({})).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, vec![PathItem::Key("ping".into())]);
        assert_eq!(issues[0].code, IssueCode::InvalidType);
        assert_eq!(issues[0].received.as_deref(), Some("undefined"));
    }

    #[test]
    fn test_object_collects_every_issue() {
        let schema = Shape::object([
            ("a", Shape::string()),
            ("b", Shape::integer()),
            ("c", Shape::array(Shape::boolean())),
        ]);
        let issues = schema
            .parse(&json!({"b": "x", "c": [true, 1, "no"]}))
            .unwrap_err();

        let paths: Vec<String> = issues.iter().map(Issue::dotted_path).collect();
        assert_eq!(paths, vec!["a", "b", "c.1", "c.2"]);
    }

    #[test]
    fn test_object_strips_unknown_keys() {
        let schema = Shape::object([("foo", Shape::string())]);
        let parsed = schema.parse(&json!({"foo": "x", "bar": 1})).unwrap();
        assert_eq!(parsed, json!({"foo": "x"}));
    }

    #[test]
    fn test_object_passthrough_and_strict() {
        let value = json!({"foo": "x", "bar": 1});

        let loose = Shape::object([("foo", Shape::string())]).passthrough();
        assert_eq!(loose.parse(&value).unwrap(), value);

        let strict = Shape::object([("foo", Shape::string())]).strict();
        let issues = strict.parse(&value).unwrap_err();
        assert_eq!(issues[0].code, IssueCode::UnrecognizedKeys);
        assert_eq!(issues[0].message, "Unrecognized key(s) in object: 'bar'");
    }

    #[test]
    fn test_optional_and_default_fields() {
        let schema = Shape::object([
            ("limit", Shape::integer().default_value(20)),
            ("cursor", Shape::string().optional()),
        ]);
        assert_eq!(schema.parse(&json!({})).unwrap(), json!({"limit": 20}));
    }

    #[test]
    fn test_top_level_null_is_absent_when_optional() {
        let body = Shape::object([("a", Shape::string())]).optional();
        assert_eq!(body.parse(&Value::Null).unwrap(), Value::Null);

        let defaulted = Shape::object([("a", Shape::string())]).default_value(json!({"a": "x"}));
        assert_eq!(defaulted.parse(&Value::Null).unwrap(), json!({"a": "x"}));

        let nullable = Shape::string().nullable().default_value("x").optional();
        assert_eq!(nullable.parse(&Value::Null).unwrap(), Value::Null);

        let required = Shape::object([("a", Shape::string())]);
        assert_eq!(
            required.parse(&Value::Null).unwrap_err()[0].code,
            IssueCode::InvalidType
        );
    }

    #[test]
    fn test_nested_paths() {
        let schema = Shape::object([(
            "author",
            Shape::object([("name", Shape::string())]),
        )]);
        let issues = schema.parse(&json!({"author": {"name": 3}})).unwrap_err();
        assert_eq!(
            issues[0].path,
            vec![PathItem::Key("author".into()), PathItem::Key("name".into())]
        );
    }

    #[test]
    fn test_array_bounds() {
        let schema = Shape::array(Shape::integer()).min_items(1).max_items(2);
        assert!(schema.parse(&json!([1])).is_ok());
        assert_eq!(schema.parse(&json!([])).unwrap_err()[0].code, IssueCode::TooSmall);
        assert_eq!(schema.parse(&json!([1, 2, 3])).unwrap_err()[0].code, IssueCode::TooBig);
    }

    #[test]
    fn test_any_accepts_everything() {
        let schema = Shape::object([("meta", Shape::any())]);
        assert_eq!(schema.parse(&json!({})).unwrap(), json!({}));
        assert_eq!(
            schema.parse(&json!({"meta": [1, {"x": null}]})).unwrap(),
            json!({"meta": [1, {"x": null}]})
        );
    }

    // ========================================================================
    // Properties
    // ========================================================================

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(Value::from),
            "[a-z]{0,6}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-d]", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_parse_is_idempotent(value in arb_json()) {
            let schema = Shape::object([
                ("a", Shape::string()),
                ("b", Shape::integer().optional()),
                ("c", Shape::array(Shape::any()).optional()),
            ]);
            prop_assert_eq!(schema.parse(&value), schema.parse(&value));
        }

        #[test]
        fn prop_parsed_output_reparses_to_itself(value in arb_json()) {
            let schema = Shape::object([
                ("a", Shape::string().optional()),
                ("d", Shape::any()),
            ]);
            if let Ok(parsed) = schema.parse(&value) {
                prop_assert_eq!(schema.parse(&parsed), Ok(parsed.clone()));
            }
        }
    }
}
