//! Typed literal values and the declared value types of entity properties.

use crate::error::{CompileError, CompileResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use time::macros::format_description;
use time::{Date, Month, PrimitiveDateTime, Time};

/// Declared value type of a property, as carried by view and entity metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueType {
    Boolean,
    Int32,
    Int64,
    Double,
    DateTime,
    String,
}

impl ValueType {
    /// Resolve a type tag. Unknown tags fall back to `String`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Boolean" => ValueType::Boolean,
            "Int32" => ValueType::Int32,
            "Int64" => ValueType::Int64,
            "Single" | "Decimal" | "Double" => ValueType::Double,
            "DateTime" => ValueType::DateTime,
            _ => ValueType::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Boolean => "Boolean",
            ValueType::Int32 => "Int32",
            ValueType::Int64 => "Int64",
            ValueType::Double => "Double",
            ValueType::DateTime => "DateTime",
            ValueType::String => "String",
        }
    }

    /// Parse a raw literal into a value of this type.
    pub fn parse_literal(&self, literal: &str) -> CompileResult<Value> {
        let fail = |reason: String| CompileError::LiteralParse {
            value: literal.to_string(),
            value_type: *self,
            reason,
        };

        match self {
            ValueType::Int32 => literal
                .parse::<i32>()
                .map(Value::Int32)
                .map_err(|e| fail(e.to_string())),
            ValueType::Int64 => literal
                .parse::<i64>()
                .map(Value::Int64)
                .map_err(|e| fail(e.to_string())),
            ValueType::Double => match literal.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(Value::Double(v)),
                Ok(_) => Err(fail("expected a finite number".to_string())),
                Err(e) => Err(fail(e.to_string())),
            },
            ValueType::Boolean => match literal.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Boolean(true)),
                "false" | "0" => Ok(Value::Boolean(false)),
                _ => Err(fail("expected true or false".to_string())),
            },
            ValueType::DateTime => parse_datetime(literal).map(Value::DateTime).map_err(fail),
            ValueType::String => Ok(Value::String(literal.to_string())),
        }
    }
}

impl From<String> for ValueType {
    fn from(name: String) -> Self {
        ValueType::from_name(&name)
    }
}

impl From<ValueType> for String {
    fn from(value_type: ValueType) -> Self {
        value_type.as_str().to_string()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal values that appear in predicates and compiled parameters
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    DateTime(PrimitiveDateTime),
    String(String),
}

impl Value {
    /// Get the value type of this value
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(ValueType::Boolean),
            Value::Int32(_) => Some(ValueType::Int32),
            Value::Int64(_) => Some(ValueType::Int64),
            Value::Double(_) => Some(ValueType::Double),
            Value::DateTime(_) => Some(ValueType::DateTime),
            Value::String(_) => Some(ValueType::String),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer view of the value, widening `Int32`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Floating point view of the value, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(v) => Some(f64::from(*v)),
            Value::Int64(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Compare two non-NULL values of compatible types.
    ///
    /// Integers compare with each other and with doubles; everything else
    /// only compares with its own kind. Returns `None` for incompatible kinds.
    pub fn partial_compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Double(_), _) | (_, Value::Double(_)) => {
                Some(self.as_f64()?.total_cmp(&other.as_f64()?))
            }
            _ => Some(self.as_i64()?.cmp(&other.as_i64()?)),
        }
    }

    /// Render the value as an inline SQL literal.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::DateTime(_) | Value::String(_) => {
                format!("'{}'", self.to_string().replace('\'', "''"))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::DateTime(dt) => {
                let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
                match dt.format(&format) {
                    Ok(text) => f.write_str(&text),
                    Err(_) => write!(f, "{:?}", dt),
                }
            }
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<PrimitiveDateTime> for Value {
    fn from(v: PrimitiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

/// Parse a free-form date/time literal.
fn parse_datetime(literal: &str) -> Result<PrimitiveDateTime, String> {
    let with_space = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let with_t = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let date_only = format_description!("[year]-[month]-[day]");

    if let Ok(dt) = PrimitiveDateTime::parse(literal, &with_space) {
        return Ok(dt);
    }
    if let Ok(dt) = PrimitiveDateTime::parse(literal, &with_t) {
        return Ok(dt);
    }
    Date::parse(literal, &date_only)
        .map(|date| date.midnight())
        .map_err(|e| e.to_string())
}

/// Parse an exact run of `width` ASCII digits.
pub(crate) fn parse_digits(text: &str, width: usize) -> Option<u32> {
    if text.len() != width || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Midnight on the given calendar day.
pub(crate) fn calendar_start(year: i32, month: u32, day: u32) -> Option<PrimitiveDateTime> {
    let month = Month::try_from(u8::try_from(month).ok()?).ok()?;
    let day = u8::try_from(day).ok()?;
    let date = Date::from_calendar_date(year, month, day).ok()?;
    Some(PrimitiveDateTime::new(date, Time::MIDNIGHT))
}
