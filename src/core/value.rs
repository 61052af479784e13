// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Runtime values
//!
//! [`Value`] is what a literal slot parses into, what the expression VM
//! pushes on its stack, and what a [`super::Column`] hands back on `get`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::error::{Error, Result};
use super::types::DataType;

/// Timestamp formats supported for parsing
/// Order matters - more specific formats first
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z", // RFC3339 with fractional seconds
    "%Y-%m-%dT%H:%M:%S%:z",    // RFC3339
    "%Y-%m-%dT%H:%M:%SZ",      // RFC3339 UTC
    "%Y-%m-%dT%H:%M:%S",       // ISO without timezone
    "%Y-%m-%d %H:%M:%S%.f",    // SQL-style with fractional seconds
    "%Y-%m-%d %H:%M:%S",       // SQL-style
    "%Y/%m/%d %H:%M:%S",       // Alternative with slashes
];

/// A runtime value
///
/// Text and composite values are reference counted so that broadcasting a
/// constant result over a large batch only bumps counters.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// SQL NULL
    #[default]
    Null,
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 text
    Text(Arc<str>),
    /// Boolean
    Boolean(bool),
    /// UTC timestamp
    Timestamp(DateTime<Utc>),
    /// Array value
    Array(Arc<[Value]>),
    /// Tuple value
    Tuple(Arc<[Value]>),
}

impl Value {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create an integer value
    pub fn integer(value: i64) -> Self {
        Value::Integer(value)
    }

    /// Create a float value
    pub fn float(value: f64) -> Self {
        Value::Float(value)
    }

    /// Create a text value
    pub fn text(value: impl AsRef<str>) -> Self {
        Value::Text(Arc::from(value.as_ref()))
    }

    /// Create a boolean value
    pub fn boolean(value: bool) -> Self {
        Value::Boolean(value)
    }

    /// Create a timestamp value
    pub fn timestamp(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }

    /// Create an array value
    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(Arc::from(values))
    }

    /// Create a tuple value
    pub fn tuple(values: Vec<Value>) -> Self {
        Value::Tuple(Arc::from(values))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns true if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the value's kind, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::Text(_) => "TEXT",
            Value::Boolean(_) => "BOOLEAN",
            Value::Timestamp(_) => "TIMESTAMP",
            Value::Array(_) => "ARRAY",
            Value::Tuple(_) => "TUPLE",
        }
    }

    /// Returns the value as i64 if it is an integer
    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as f64 if it is numeric
    pub fn as_float64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as bool if it is a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the text content if this is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the timestamp if this is a timestamp value
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Returns the elements of an array or tuple value
    pub fn as_elements(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Type a literal value would be given on its own
    ///
    /// Array elements meet at their common supertype and become nullable if
    /// any element is NULL; an empty array has element type `Null`. Returns
    /// `None` for arrays whose elements have no common type.
    pub fn infer_type(&self) -> Option<DataType> {
        match self {
            Value::Null => Some(DataType::Null),
            Value::Integer(_) => Some(DataType::Integer),
            Value::Float(_) => Some(DataType::Float),
            Value::Text(_) => Some(DataType::Text),
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Timestamp(_) => Some(DataType::Timestamp),
            Value::Array(items) => {
                let mut element: Option<DataType> = None;
                for item in items.iter() {
                    let item_type = item.infer_type()?;
                    element = Some(match element {
                        None => item_type,
                        Some(prev) => DataType::common_supertype(&prev, &item_type)?,
                    });
                }
                Some(DataType::array(element.unwrap_or_default()))
            }
            Value::Tuple(items) => items
                .iter()
                .map(Value::infer_type)
                .collect::<Option<Vec<_>>>()
                .map(DataType::Tuple),
        }
    }

    // =========================================================================
    // Type checks and conversion
    // =========================================================================

    /// Returns true if this value is a member of `data_type` without conversion
    pub fn conforms_to(&self, data_type: &DataType) -> bool {
        match (self, data_type) {
            (Value::Null, t) => t.is_nullable(),
            (v, DataType::Nullable(inner)) => v.conforms_to(inner),
            (Value::Integer(_), DataType::Integer)
            | (Value::Float(_), DataType::Float)
            | (Value::Text(_), DataType::Text)
            | (Value::Boolean(_), DataType::Boolean)
            | (Value::Timestamp(_), DataType::Timestamp) => true,
            (Value::Array(items), DataType::Array(element)) => {
                items.iter().all(|v| v.conforms_to(element))
            }
            (Value::Tuple(items), DataType::Tuple(types)) => {
                items.len() == types.len() && items.iter().zip(types).all(|(v, t)| v.conforms_to(t))
            }
            _ => false,
        }
    }

    /// Strict conversion into `target`
    ///
    /// Unlike a lenient coercion this never turns a failed conversion into
    /// NULL: unparseable text, out-of-range floats and NULL into a
    /// non-nullable type are all errors.
    pub fn cast_to(&self, target: &DataType) -> Result<Value> {
        if self.conforms_to(target) {
            return Ok(self.clone());
        }
        let fail = || Error::type_conversion(self.to_literal(), target.to_string());
        match (self, target) {
            (Value::Null, _) => Err(fail()),
            (v, DataType::Nullable(inner)) => v.cast_to(inner),
            (_, DataType::Null) => Err(fail()),
            (v, DataType::Integer) => match v {
                Value::Float(f) => {
                    if f.is_finite() && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                        Ok(Value::Integer(f.trunc() as i64))
                    } else {
                        Err(fail())
                    }
                }
                Value::Text(s) => s.trim().parse::<i64>().map(Value::Integer).map_err(|_| fail()),
                Value::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
                Value::Timestamp(t) => Ok(Value::Integer(t.timestamp())),
                _ => Err(fail()),
            },
            (v, DataType::Float) => match v {
                Value::Integer(i) => Ok(Value::Float(*i as f64)),
                Value::Text(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| fail()),
                Value::Boolean(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
                _ => Err(fail()),
            },
            (v, DataType::Text) => Ok(Value::text(v.to_string())),
            (v, DataType::Boolean) => match v {
                Value::Integer(i) => Ok(Value::Boolean(*i != 0)),
                Value::Float(f) => Ok(Value::Boolean(*f != 0.0)),
                Value::Text(s) => match s.trim().to_lowercase().as_str() {
                    "true" | "t" | "yes" | "y" | "1" => Ok(Value::Boolean(true)),
                    "false" | "f" | "no" | "n" | "0" => Ok(Value::Boolean(false)),
                    _ => Err(fail()),
                },
                _ => Err(fail()),
            },
            (v, DataType::Timestamp) => match v {
                Value::Text(s) => parse_timestamp(s)
                    .map(Value::Timestamp)
                    .map_err(|_| fail()),
                Value::Integer(secs) => Utc
                    .timestamp_opt(*secs, 0)
                    .single()
                    .map(Value::Timestamp)
                    .ok_or_else(fail),
                _ => Err(fail()),
            },
            (Value::Array(items), DataType::Array(element)) => items
                .iter()
                .map(|v| v.cast_to(element))
                .collect::<Result<Vec<_>>>()
                .map(Value::array),
            (Value::Tuple(items), DataType::Tuple(types)) if items.len() == types.len() => items
                .iter()
                .zip(types)
                .map(|(v, t)| v.cast_to(t))
                .collect::<Result<Vec<_>>>()
                .map(Value::tuple),
            _ => Err(fail()),
        }
    }

    /// Compare two non-NULL values
    ///
    /// Returns `Ok(None)` when either side is NULL.
    pub fn compare(&self, other: &Value) -> Result<Option<Ordering>> {
        let ordering = match (self, other) {
            (Value::Null, _) | (_, Value::Null) => return Ok(None),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (a, b) if a.as_float64().is_some() && b.as_float64().is_some() => {
                compare_floats(a.as_float64().unwrap_or(0.0), b.as_float64().unwrap_or(0.0))
            }
            (Value::Array(a), Value::Array(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.compare(y)? {
                        None => return Ok(None),
                        Some(Ordering::Equal) => continue,
                        Some(ord) => return Ok(Some(ord)),
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => {
                return Err(Error::Type(format!(
                    "cannot compare {} with {}",
                    self.type_name(),
                    other.type_name()
                )))
            }
        };
        Ok(Some(ordering))
    }

    /// Render the value the way it would be written as a SQL literal
    pub fn to_literal(&self) -> String {
        match self {
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Timestamp(t) => format!("'{}'", t.format("%Y-%m-%d %H:%M:%S")),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", format_float(*v)),
            Value::Text(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Array(items) => write_elements(f, "[", items, "]"),
            Value::Tuple(items) => write_elements(f, "(", items, ")"),
        }
    }
}

fn write_elements(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item.to_literal())?;
    }
    write!(f, "{}", close)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                // NaN equals NaN so that columns compare sanely in tests and caches
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (Value::Integer(i), Value::Float(f)) | (Value::Float(f), Value::Integer(i)) => {
                *f == (*i as f64)
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Integer(5) == Float(5.0), so both hash as f64 bits
        match self {
            Value::Null => 0u8.hash(state),
            Value::Integer(v) => {
                1u8.hash(state);
                (*v as f64).to_bits().hash(state);
            }
            Value::Float(v) => {
                1u8.hash(state);
                v.to_bits().hash(state);
            }
            Value::Text(s) => {
                2u8.hash(state);
                s.hash(state);
            }
            Value::Boolean(b) => {
                3u8.hash(state);
                b.hash(state);
            }
            Value::Timestamp(t) => {
                4u8.hash(state);
                t.timestamp_nanos_opt().hash(state);
            }
            Value::Array(items) => {
                5u8.hash(state);
                items.hash(state);
            }
            Value::Tuple(items) => {
                6u8.hash(state);
                items.hash(state);
            }
        }
    }
}

// =========================================================================
// From implementations
// =========================================================================

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::text(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(Arc::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

// =========================================================================
// Helper functions
// =========================================================================

/// Parse a timestamp string with multiple format support
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Ok(dt.with_timezone(&Utc));
        }
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(datetime) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&datetime));
        }
    }

    Err(Error::parse(format!("invalid timestamp format: {}", s)))
}

/// Format a float value consistently
pub fn format_float(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        format!("{:?}", v)
    }
}

/// Compare two floats with NaN sorted last
fn compare_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
