//! Polymorphic field values used by filtering, ordering and serialization

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::OnceLock;
use uuid::Uuid;

/// A polymorphic field value that can hold any attribute an entity exposes
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// JSON rendering used by the serializer and by store-side ordering.
    ///
    /// Timestamps render as fixed-precision RFC 3339 so their string forms
    /// order the same way the underlying instants do.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Integer(i) => Value::Number((*i).into()),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Uuid(u) => Value::String(u.to_string()),
            FieldValue::DateTime(t) => {
                Value::String(t.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
            FieldValue::Null => Value::Null,
        }
    }

    /// Equality against the raw text of a query-string filter.
    ///
    /// The raw text is coerced to the type of the stored value; text that
    /// does not parse matches nothing rather than erroring.
    pub fn equals_text(&self, raw: &str) -> bool {
        match self {
            FieldValue::String(s) => s == raw,
            FieldValue::Integer(i) => raw.parse::<i64>().is_ok_and(|v| v == *i),
            FieldValue::Boolean(b) => parse_bool(raw).is_some_and(|v| v == *b),
            FieldValue::Uuid(u) => raw.parse::<Uuid>().is_ok_and(|v| v == *u),
            FieldValue::DateTime(t) => raw.parse::<DateTime<Utc>>().is_ok_and(|v| v == *t),
            FieldValue::Null => raw.is_empty(),
        }
    }
}

/// Total order over JSON scalars: null < booleans < numbers < strings.
///
/// Arrays and objects never occur in field positions and sort last. Both
/// sides of a comparison come from [`FieldValue::to_json`], so same-field
/// comparisons always see the same scalar type.
pub fn json_compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(xi), Some(yi)) => xi.cmp(&yi),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Loose email shape check for profile updates and feedback reply addresses
pub fn valid_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
    });
    regex.is_match(email)
}
