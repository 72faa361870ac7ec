use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as Json;

use crate::error::{CoercionError, CoercionResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_TIME_FORMAT_T: &str = "%Y-%m-%dT%H:%M:%S";

// The service reports "no date" as an all-zero date rather than null.
const NULL_DATE: &str = "0000-00-00";

/// The closed set of column data types the service declares per column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Int64,
    Float64,
    String,
    Date,
    DateTime,
    Boolean,
}

impl TypeTag {
    /// Parses a column type string from the service's table metadata.
    /// Returns `None` for an unrecognized tag.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(TypeTag::String),
            "int32" | "int64" => Some(TypeTag::Int64),
            "double" | "float64" => Some(TypeTag::Float64),
            "date" => Some(TypeTag::Date),
            "datetime" => Some(TypeTag::DateTime),
            "boolean" | "bool" => Some(TypeTag::Boolean),
            _ => None,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Int64 => "int64",
            TypeTag::Float64 => "float64",
            TypeTag::String => "string",
            TypeTag::Date => "date",
            TypeTag::DateTime => "datetime",
            TypeTag::Boolean => "boolean",
        };
        write!(f, "{name}")
    }
}

/// A typed cell value.
///
/// `Null` is explicit absence, distinct from an empty string or zero.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Bool(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Re-serializes the cell in the service's wire representation.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Int(v) => Json::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Str(v) => Json::String(v.clone()),
            Value::Date(v) => Json::String(v.format(DATE_FORMAT).to_string()),
            Value::DateTime(v) => Json::String(v.format(DATE_TIME_FORMAT).to_string()),
            Value::Bool(v) => Json::Bool(*v),
        }
    }

    /// Orders two values of the same variant; `None` when the variants differ
    /// or either side is null.
    pub(crate) fn compare_same(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Coerces one raw JSON scalar to the typed value declared for its column.
///
/// Null input yields `Value::Null` for every type tag and never fails.
/// Numeric columns accept stringified numbers (the service stringifies
/// numbers in some endpoints); string columns never auto-convert.
pub fn coerce(raw: &Json, tag: TypeTag) -> CoercionResult<Value> {
    if raw.is_null() {
        return Ok(Value::Null);
    }
    match tag {
        TypeTag::String => match raw {
            Json::String(s) => Ok(Value::Str(s.clone())),
            other => Err(CoercionError::NotText(other.to_string())),
        },
        TypeTag::Int64 => match raw {
            Json::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .ok_or_else(|| CoercionError::NotNumeric(n.to_string())),
            Json::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| CoercionError::NotNumeric(s.clone())),
            other => Err(CoercionError::NotNumeric(other.to_string())),
        },
        TypeTag::Float64 => match raw {
            Json::Number(n) => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| CoercionError::NotNumeric(n.to_string())),
            Json::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| CoercionError::NotNumeric(s.clone())),
            other => Err(CoercionError::NotNumeric(other.to_string())),
        },
        TypeTag::Date => match raw {
            Json::String(s) if s == NULL_DATE => Ok(Value::Null),
            Json::String(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| CoercionError::BadFormat(s.clone())),
            other => Err(CoercionError::BadFormat(other.to_string())),
        },
        TypeTag::DateTime => match raw {
            Json::String(s) => NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT_T))
                .map(Value::DateTime)
                .map_err(|_| CoercionError::BadFormat(s.clone())),
            other => Err(CoercionError::BadFormat(other.to_string())),
        },
        TypeTag::Boolean => match raw {
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::String(s) => match s.as_str() {
                "1" | "true" => Ok(Value::Bool(true)),
                "0" | "false" => Ok(Value::Bool(false)),
                _ => Err(CoercionError::NotBoolean(s.clone())),
            },
            Json::Number(n) => match n.as_i64() {
                Some(1) => Ok(Value::Bool(true)),
                Some(0) => Ok(Value::Bool(false)),
                _ => Err(CoercionError::NotBoolean(n.to_string())),
            },
            other => Err(CoercionError::NotBoolean(other.to_string())),
        },
    }
}
