//! Host-side values and value comparison helpers.
//!
//! Stored attributes are always [`Bson`]. Application code reads and writes [`Value`],
//! which additionally carries the host time type so that casters can tell a
//! `chrono` timestamp apart from the store's native one.

use bson::{Bson, DateTime as BsonDateTime, Document, oid::ObjectId};
use chrono::{DateTime, Utc};

/// A value as seen by application code on either side of a caster.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Host time value.
    DateTime(DateTime<Utc>),
    /// Any value already expressed in the store's document model.
    Bson(Bson),
}

impl Value {
    /// Returns the inner BSON value, if this is not a host time value.
    pub fn as_bson(&self) -> Option<&Bson> {
        match self {
            Value::Bson(bson) => Some(bson),
            Value::DateTime(_) => None,
        }
    }

    /// Returns the host time value, if any.
    pub fn as_date_time(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(dt),
            Value::Bson(_) => None,
        }
    }

    /// Returns the string slice if this value is a BSON string.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bson().and_then(Bson::as_str)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Bson(Bson::Null))
    }

    /// Converts this value into its plain stored form without any caster.
    ///
    /// Host time values become native timestamps at millisecond precision.
    pub fn into_bson(self) -> Bson {
        match self {
            Value::DateTime(dt) => Bson::DateTime(BsonDateTime::from_millis(dt.timestamp_millis())),
            Value::Bson(bson) => bson,
        }
    }

    /// Short type name used in error messages.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::DateTime(_) => "host datetime",
            Value::Bson(bson) => bson_kind(bson),
        }
    }
}

pub(crate) fn bson_kind(bson: &Bson) -> &'static str {
    match bson {
        Bson::Null => "null",
        Bson::Boolean(_) => "boolean",
        Bson::Int32(_) => "int32",
        Bson::Int64(_) => "int64",
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "document",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "date",
        _ => "bson",
    }
}

impl From<Bson> for Value {
    fn from(value: Bson) -> Self {
        Value::Bson(value)
    }
}

impl From<&Bson> for Value {
    fn from(value: &Bson) -> Self {
        Value::Bson(value.clone())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

impl From<BsonDateTime> for Value {
    fn from(value: BsonDateTime) -> Self {
        Value::Bson(Bson::DateTime(value))
    }
}

impl From<ObjectId> for Value {
    fn from(value: ObjectId) -> Self {
        Value::Bson(Bson::ObjectId(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Bson(Bson::String(value.to_string()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Bson(Bson::String(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bson(Bson::Boolean(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Bson(Bson::Int32(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Bson(Bson::Int64(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Bson(Bson::Double(value))
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Bson(Bson::Document(value))
    }
}

impl From<Vec<Bson>> for Value {
    fn from(value: Vec<Bson>) -> Self {
        Value::Bson(Bson::Array(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Bson(Bson::Null))
    }
}

/// Returns the canonical string form of a numeric-like value.
///
/// Integers and doubles are numeric-like, as are strings that spell a decimal number.
/// Anything else yields `None`.
pub fn numeric_string(value: &Bson) -> Option<String> {
    match value {
        Bson::Int32(v) => Some(v.to_string()),
        Bson::Int64(v) => Some(v.to_string()),
        Bson::Double(v) if v.is_finite() => Some(v.to_string()),
        Bson::String(s) if is_numeric_str(s) => Some(s.clone()),
        _ => None,
    }
}

fn is_numeric_str(s: &str) -> bool {
    let trimmed = s.trim_start();

    !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        && trimmed.chars().any(|c| c.is_ascii_digit())
        && trimmed.parse::<f64>().is_ok()
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

/// Value equality used for array membership.
///
/// Numbers compare across integer and double widths, the way the store matches
/// array elements. Arrays compare element-wise under the same rule. Everything else
/// uses plain BSON equality.
pub fn same_value(left: &Bson, right: &Bson) -> bool {
    match (left, right) {
        (Bson::Array(a), Bson::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_value(x, y))
        }
        _ => match (as_number(left), as_number(right)) {
            (Some(a), Some(b)) => a == b,
            _ => left == right,
        },
    }
}
