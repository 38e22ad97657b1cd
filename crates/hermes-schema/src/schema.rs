//! Schema definitions and the value-checking entry point.

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{SchemaError, SchemaIssue};

/// Options controlling how a value is checked against a schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions {
    /// When set, object keys not named by the schema are preserved in the
    /// checked output instead of being stripped. Unknown keys are never a
    /// failure either way.
    pub pass_through_extra_keys: bool,
}

impl CheckOptions {
    /// Returns options with `pass_through_extra_keys` enabled.
    #[must_use]
    pub fn passthrough() -> Self {
        Self {
            pass_through_extra_keys: true,
        }
    }
}

/// A declarative description of an expected JSON value.
///
/// Schemas are built with the associated constructors and fluent refinements:
///
/// ```
/// use hermes_schema::Schema;
///
/// let schema = Schema::object([
///     ("title", Schema::string().min_length(1)),
///     ("published", Schema::boolean().optional()),
///     ("tags", Schema::array(Schema::string()).optional()),
/// ]);
/// ```
///
/// A schema is immutable once constructed; refinements consume and return the
/// schema by value.
#[derive(Debug, Clone)]
pub enum Schema {
    /// A UTF-8 string, with optional length bounds and pattern.
    String {
        /// Minimum length in characters.
        min_length: Option<usize>,
        /// Maximum length in characters.
        max_length: Option<usize>,
        /// Pattern the whole string must match.
        pattern: Option<Regex>,
    },
    /// A 64-bit integer, with optional bounds.
    Integer {
        /// Inclusive lower bound.
        minimum: Option<i64>,
        /// Inclusive upper bound.
        maximum: Option<i64>,
        /// When set, string values are parsed before the integer check.
        coerce: bool,
    },
    /// A floating-point number, with optional bounds.
    Number {
        /// Inclusive lower bound.
        minimum: Option<f64>,
        /// Inclusive upper bound.
        maximum: Option<f64>,
        /// When set, string values are parsed before the number check.
        coerce: bool,
    },
    /// A boolean.
    Boolean {
        /// When set, the strings `"true"` and `"false"` are accepted.
        coerce: bool,
    },
    /// Exactly one JSON value.
    Literal(Value),
    /// A homogeneous array.
    Array {
        /// Schema every element must satisfy.
        items: Box<Schema>,
        /// Minimum number of elements.
        min_items: Option<usize>,
        /// Maximum number of elements.
        max_items: Option<usize>,
    },
    /// An object with named properties. Properties are required unless their
    /// schema is wrapped in [`Schema::Optional`].
    Object {
        /// Property name to schema, in declaration order.
        properties: IndexMap<String, Schema>,
    },
    /// Accepts the wrapped schema, `null`, or an absent property.
    Optional(Box<Schema>),
    /// Accepts any value.
    Any,
    /// Accepts only `null`.
    Null,
}

impl Schema {
    /// Creates a string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::String {
            min_length: None,
            max_length: None,
            pattern: None,
        }
    }

    /// Creates an integer schema.
    #[must_use]
    pub fn integer() -> Self {
        Self::Integer {
            minimum: None,
            maximum: None,
            coerce: false,
        }
    }

    /// Creates a number schema.
    #[must_use]
    pub fn number() -> Self {
        Self::Number {
            minimum: None,
            maximum: None,
            coerce: false,
        }
    }

    /// Creates a boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::Boolean { coerce: false }
    }

    /// Creates a schema matching exactly `value`.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Creates an array schema.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    /// Creates an object schema from `(name, schema)` pairs.
    #[must_use]
    pub fn object<'a>(properties: impl IntoIterator<Item = (&'a str, Schema)>) -> Self {
        Self::Object {
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.to_string(), schema))
                .collect(),
        }
    }

    /// Creates a schema accepting any value.
    #[must_use]
    pub fn any() -> Self {
        Self::Any
    }

    /// Creates a schema accepting only `null`.
    #[must_use]
    pub fn null() -> Self {
        Self::Null
    }

    /// Wraps this schema so `null` and absent properties are accepted.
    #[must_use]
    pub fn optional(self) -> Self {
        match self {
            already @ Self::Optional(_) => already,
            other => Self::Optional(Box::new(other)),
        }
    }

    /// Enables string coercion for integer, number and boolean schemas.
    ///
    /// Has no effect on other schema kinds. Path parameters and query values
    /// arrive as strings, so contracts typically declare numeric fields in
    /// those positions with coercion enabled.
    #[must_use]
    pub fn coerce(self) -> Self {
        match self {
            Self::Integer {
                minimum, maximum, ..
            } => Self::Integer {
                minimum,
                maximum,
                coerce: true,
            },
            Self::Number {
                minimum, maximum, ..
            } => Self::Number {
                minimum,
                maximum,
                coerce: true,
            },
            Self::Boolean { .. } => Self::Boolean { coerce: true },
            other => other,
        }
    }

    /// Sets the minimum length for string schemas.
    #[must_use]
    pub fn min_length(self, len: usize) -> Self {
        match self {
            Self::String {
                max_length,
                pattern,
                ..
            } => Self::String {
                min_length: Some(len),
                max_length,
                pattern,
            },
            other => other,
        }
    }

    /// Sets the maximum length for string schemas.
    #[must_use]
    pub fn max_length(self, len: usize) -> Self {
        match self {
            Self::String {
                min_length,
                pattern,
                ..
            } => Self::String {
                min_length,
                max_length: Some(len),
                pattern,
            },
            other => other,
        }
    }

    /// Sets the pattern for string schemas.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is not a valid regular expression. Schemas are
    /// constructed at startup, before any request is served, so an invalid
    /// pattern surfaces as a construction failure.
    #[must_use]
    pub fn pattern(self, pattern: &str) -> Self {
        match self {
            Self::String {
                min_length,
                max_length,
                ..
            } => Self::String {
                min_length,
                max_length,
                pattern: Some(Regex::new(pattern).expect("invalid schema pattern")),
            },
            other => other,
        }
    }

    /// Sets the inclusive lower bound for integer schemas.
    #[must_use]
    pub fn minimum(self, min: i64) -> Self {
        match self {
            Self::Integer {
                maximum, coerce, ..
            } => Self::Integer {
                minimum: Some(min),
                maximum,
                coerce,
            },
            other => other,
        }
    }

    /// Sets the inclusive upper bound for integer schemas.
    #[must_use]
    pub fn maximum(self, max: i64) -> Self {
        match self {
            Self::Integer {
                minimum, coerce, ..
            } => Self::Integer {
                minimum,
                maximum: Some(max),
                coerce,
            },
            other => other,
        }
    }

    /// Sets the minimum element count for array schemas.
    #[must_use]
    pub fn min_items(self, min: usize) -> Self {
        match self {
            Self::Array {
                items, max_items, ..
            } => Self::Array {
                items,
                min_items: Some(min),
                max_items,
            },
            other => other,
        }
    }

    /// Sets the maximum element count for array schemas.
    #[must_use]
    pub fn max_items(self, max: usize) -> Self {
        match self {
            Self::Array {
                items, min_items, ..
            } => Self::Array {
                items,
                min_items,
                max_items: Some(max),
            },
            other => other,
        }
    }

    /// Returns `true` if this schema accepts an absent value.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_) | Self::Any)
    }
}

/// Checks `value` against `schema`.
///
/// An absent schema (`None`) always succeeds with the original value. On
/// success the returned value reflects any coercion and, for objects, the
/// extra-key policy from `opts`. On failure every failing path is reported.
pub fn check(
    schema: Option<&Schema>,
    value: &Value,
    opts: &CheckOptions,
) -> Result<Value, SchemaError> {
    let Some(schema) = schema else {
        return Ok(value.clone());
    };

    let mut issues = Vec::new();
    let checked = check_value(schema, value, "$", opts, &mut issues);

    if issues.is_empty() {
        Ok(checked)
    } else {
        Err(SchemaError::new(issues))
    }
}

fn check_value(
    schema: &Schema,
    value: &Value,
    path: &str,
    opts: &CheckOptions,
    issues: &mut Vec<SchemaIssue>,
) -> Value {
    match schema {
        Schema::Optional(inner) => {
            if value.is_null() {
                Value::Null
            } else {
                check_value(inner, value, path, opts, issues)
            }
        }
        Schema::Any => value.clone(),
        Schema::Null => {
            if !value.is_null() {
                issues.push(SchemaIssue::new(path, "expected null"));
            }
            Value::Null
        }
        Schema::Literal(expected) => {
            if value != expected {
                issues.push(SchemaIssue::new(path, format!("expected literal {expected}")));
            }
            value.clone()
        }
        Schema::String {
            min_length,
            max_length,
            pattern,
        } => check_string(value, path, *min_length, *max_length, pattern.as_ref(), issues),
        Schema::Integer {
            minimum,
            maximum,
            coerce,
        } => check_integer(value, path, *minimum, *maximum, *coerce, issues),
        Schema::Number {
            minimum,
            maximum,
            coerce,
        } => check_number(value, path, *minimum, *maximum, *coerce, issues),
        Schema::Boolean { coerce } => check_boolean(value, path, *coerce, issues),
        Schema::Array {
            items,
            min_items,
            max_items,
        } => check_array(value, path, items, *min_items, *max_items, opts, issues),
        Schema::Object { properties } => check_object(value, path, properties, opts, issues),
    }
}

fn check_string(
    value: &Value,
    path: &str,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<&Regex>,
    issues: &mut Vec<SchemaIssue>,
) -> Value {
    let Some(s) = value.as_str() else {
        issues.push(SchemaIssue::new(path, "expected string"));
        return value.clone();
    };

    let chars = s.chars().count();
    if let Some(min) = min_length {
        if chars < min {
            issues.push(SchemaIssue::new(
                path,
                format!("expected at least {min} character(s)"),
            ));
        }
    }
    if let Some(max) = max_length {
        if chars > max {
            issues.push(SchemaIssue::new(
                path,
                format!("expected at most {max} character(s)"),
            ));
        }
    }
    if let Some(re) = pattern {
        if !re.is_match(s) {
            issues.push(SchemaIssue::new(
                path,
                format!("expected string matching /{}/", re.as_str()),
            ));
        }
    }

    value.clone()
}

fn check_integer(
    value: &Value,
    path: &str,
    minimum: Option<i64>,
    maximum: Option<i64>,
    coerce: bool,
    issues: &mut Vec<SchemaIssue>,
) -> Value {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) if coerce => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    let Some(n) = parsed else {
        issues.push(SchemaIssue::new(path, "expected integer"));
        return value.clone();
    };

    if let Some(min) = minimum {
        if n < min {
            issues.push(SchemaIssue::new(path, format!("expected at least {min}")));
        }
    }
    if let Some(max) = maximum {
        if n > max {
            issues.push(SchemaIssue::new(path, format!("expected at most {max}")));
        }
    }

    Value::from(n)
}

fn check_number(
    value: &Value,
    path: &str,
    minimum: Option<f64>,
    maximum: Option<f64>,
    coerce: bool,
    issues: &mut Vec<SchemaIssue>,
) -> Value {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if coerce => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    let Some(n) = parsed else {
        issues.push(SchemaIssue::new(path, "expected number"));
        return value.clone();
    };

    if let Some(min) = minimum {
        if n < min {
            issues.push(SchemaIssue::new(path, format!("expected at least {min}")));
        }
    }
    if let Some(max) = maximum {
        if n > max {
            issues.push(SchemaIssue::new(path, format!("expected at most {max}")));
        }
    }

    serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
}

fn check_boolean(value: &Value, path: &str, coerce: bool, issues: &mut Vec<SchemaIssue>) -> Value {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if coerce => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    };

    let Some(b) = parsed else {
        issues.push(SchemaIssue::new(path, "expected boolean"));
        return value.clone();
    };

    Value::Bool(b)
}

fn check_array(
    value: &Value,
    path: &str,
    items: &Schema,
    min_items: Option<usize>,
    max_items: Option<usize>,
    opts: &CheckOptions,
    issues: &mut Vec<SchemaIssue>,
) -> Value {
    let Some(elements) = value.as_array() else {
        issues.push(SchemaIssue::new(path, "expected array"));
        return value.clone();
    };

    if let Some(min) = min_items {
        if elements.len() < min {
            issues.push(SchemaIssue::new(
                path,
                format!("expected at least {min} item(s)"),
            ));
        }
    }
    if let Some(max) = max_items {
        if elements.len() > max {
            issues.push(SchemaIssue::new(
                path,
                format!("expected at most {max} item(s)"),
            ));
        }
    }

    let checked = elements
        .iter()
        .enumerate()
        .map(|(i, element)| check_value(items, element, &format!("{path}[{i}]"), opts, issues))
        .collect();

    Value::Array(checked)
}

fn check_object(
    value: &Value,
    path: &str,
    properties: &IndexMap<String, Schema>,
    opts: &CheckOptions,
    issues: &mut Vec<SchemaIssue>,
) -> Value {
    let Some(object) = value.as_object() else {
        issues.push(SchemaIssue::new(path, "expected object"));
        return value.clone();
    };

    let mut checked = Map::new();

    for (name, property) in properties {
        let property_path = format!("{path}.{name}");
        match object.get(name) {
            Some(present) => {
                let value = check_value(property, present, &property_path, opts, issues);
                checked.insert(name.clone(), value);
            }
            None => {
                if !property.is_optional() {
                    issues.push(SchemaIssue::new(property_path, "required"));
                }
            }
        }
    }

    if opts.pass_through_extra_keys {
        for (name, extra) in object {
            if !properties.contains_key(name) {
                checked.insert(name.clone(), extra.clone());
            }
        }
    }

    Value::Object(checked)
}
