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

//! Core type definitions
//!
//! [`DataType`] describes the type of a literal slot, of an accumulation
//! column and of a compiled program's result.

use std::fmt;
use std::str::FromStr;

use super::error::Error;

/// Data types understood by templates and the expression VM
///
/// Unlike a storage schema, literal slots need composite types: an array
/// literal `[1, 2]` is `Array(Integer)` and a `NULL` element turns it into
/// `Array(Nullable(Integer))`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    /// The type of a bare `NULL` literal; holds nothing but NULL
    #[default]
    Null,

    /// 64-bit signed integer
    Integer,

    /// 64-bit floating point number
    Float,

    /// UTF-8 text string
    Text,

    /// Boolean true/false
    Boolean,

    /// Timestamp (stored as UTC)
    Timestamp,

    /// Either NULL or a value of the inner type
    Nullable(Box<DataType>),

    /// Homogeneous array
    Array(Box<DataType>),

    /// Fixed-arity tuple
    Tuple(Vec<DataType>),
}

impl DataType {
    /// Wrap a type into `Nullable`, leaving `Null` and already nullable types alone
    pub fn nullable(inner: DataType) -> DataType {
        match inner {
            DataType::Null | DataType::Nullable(_) => inner,
            other => DataType::Nullable(Box::new(other)),
        }
    }

    /// Build an array type
    pub fn array(element: DataType) -> DataType {
        DataType::Array(Box::new(element))
    }

    /// Returns true if NULL is a valid value of this type
    pub fn is_nullable(&self) -> bool {
        matches!(self, DataType::Null | DataType::Nullable(_))
    }

    /// Strips one `Nullable` wrapper
    pub fn non_nullable(&self) -> &DataType {
        match self {
            DataType::Nullable(inner) => inner,
            other => other,
        }
    }

    /// Returns true if this type is numeric (INTEGER or FLOAT), ignoring nullability
    pub fn is_numeric(&self) -> bool {
        matches!(self.non_nullable(), DataType::Integer | DataType::Float)
    }

    /// Returns the common supertype of two types, if there is one
    ///
    /// Used for array element unification and for arithmetic result types:
    /// `Integer` and `Float` meet at `Float`, `Null` meets anything at its
    /// nullable form.
    pub fn common_supertype(a: &DataType, b: &DataType) -> Option<DataType> {
        if a == b {
            return Some(a.clone());
        }
        match (a, b) {
            (DataType::Null, other) | (other, DataType::Null) => {
                Some(DataType::nullable(other.clone()))
            }
            (DataType::Nullable(x), y) | (y, DataType::Nullable(x)) => {
                DataType::common_supertype(x, y.non_nullable()).map(DataType::nullable)
            }
            (DataType::Integer, DataType::Float) | (DataType::Float, DataType::Integer) => {
                Some(DataType::Float)
            }
            (DataType::Array(x), DataType::Array(y)) => {
                DataType::common_supertype(x, y).map(DataType::array)
            }
            (DataType::Tuple(xs), DataType::Tuple(ys)) if xs.len() == ys.len() => xs
                .iter()
                .zip(ys)
                .map(|(x, y)| DataType::common_supertype(x, y))
                .collect::<Option<Vec<_>>>()
                .map(DataType::Tuple),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Null => write!(f, "NULL"),
            DataType::Integer => write!(f, "INTEGER"),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Text => write!(f, "TEXT"),
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::Timestamp => write!(f, "TIMESTAMP"),
            DataType::Nullable(inner) => write!(f, "NULLABLE({})", inner),
            DataType::Array(inner) => write!(f, "ARRAY({})", inner),
            DataType::Tuple(items) => {
                write!(f, "TUPLE(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl FromStr for DataType {
    type Err = Error;

    /// Parses type names such as `INTEGER`, `Nullable(Float)`,
    /// `Array(Nullable(Text))` or `Tuple(Integer, Text)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(open) = trimmed.find('(') {
            if !trimmed.ends_with(')') {
                return Err(Error::InvalidColumnType(s.to_string()));
            }
            let head = trimmed[..open].trim().to_uppercase();
            let body = &trimmed[open + 1..trimmed.len() - 1];
            return match head.as_str() {
                "NULLABLE" => Ok(DataType::nullable(body.parse()?)),
                "ARRAY" => Ok(DataType::array(body.parse()?)),
                "TUPLE" => split_type_list(body)
                    .into_iter()
                    .map(str::parse)
                    .collect::<Result<Vec<_>, _>>()
                    .map(DataType::Tuple),
                // VARCHAR(255), DECIMAL(10, 2)
                _ => parse_simple_type(&head).ok_or_else(|| Error::InvalidColumnType(s.to_string())),
            };
        }
        parse_simple_type(&trimmed.to_uppercase())
            .ok_or_else(|| Error::InvalidColumnType(s.to_string()))
    }
}

fn parse_simple_type(name: &str) -> Option<DataType> {
    match name {
        "NULL" | "NOTHING" => Some(DataType::Null),
        "INTEGER" | "INT" | "BIGINT" | "SMALLINT" | "TINYINT" | "INT64" => Some(DataType::Integer),
        "FLOAT" | "DOUBLE" | "REAL" | "DECIMAL" | "NUMERIC" | "FLOAT64" => Some(DataType::Float),
        "TEXT" | "VARCHAR" | "CHAR" | "STRING" => Some(DataType::Text),
        "BOOLEAN" | "BOOL" => Some(DataType::Boolean),
        "TIMESTAMP" | "DATETIME" | "DATE" => Some(DataType::Timestamp),
        _ => None,
    }
}

/// Splits a comma separated type list at depth zero
fn split_type_list(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in body.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if !body[start..].trim().is_empty() {
        parts.push(&body[start..]);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datatype_display() {
        assert_eq!(DataType::Integer.to_string(), "INTEGER");
        assert_eq!(
            DataType::nullable(DataType::Text).to_string(),
            "NULLABLE(TEXT)"
        );
        assert_eq!(
            DataType::Tuple(vec![DataType::Integer, DataType::array(DataType::Float)]).to_string(),
            "TUPLE(INTEGER, ARRAY(FLOAT))"
        );
    }

    #[test]
    fn test_datatype_from_str() {
        assert_eq!("int".parse::<DataType>().unwrap(), DataType::Integer);
        assert_eq!("VARCHAR(20)".parse::<DataType>().unwrap(), DataType::Text);
        assert_eq!(
            "Nullable(Float)".parse::<DataType>().unwrap(),
            DataType::nullable(DataType::Float)
        );
        assert_eq!(
            "Array(Nullable(Integer))".parse::<DataType>().unwrap(),
            DataType::array(DataType::nullable(DataType::Integer))
        );
        assert_eq!(
            "Tuple(Integer, Array(Text))".parse::<DataType>().unwrap(),
            DataType::Tuple(vec![DataType::Integer, DataType::array(DataType::Text)])
        );
        assert!("BLOB".parse::<DataType>().is_err());
        assert!("Array(Integer".parse::<DataType>().is_err());
    }

    #[test]
    fn test_nullable_wrapping() {
        assert_eq!(DataType::nullable(DataType::Null), DataType::Null);
        let n = DataType::nullable(DataType::Integer);
        assert_eq!(DataType::nullable(n.clone()), n);
        assert!(n.is_nullable());
        assert!(!DataType::Integer.is_nullable());
        assert_eq!(n.non_nullable(), &DataType::Integer);
        assert!(n.is_numeric());
    }

    #[test]
    fn test_common_supertype() {
        use DataType::*;
        assert_eq!(DataType::common_supertype(&Integer, &Float), Some(Float));
        assert_eq!(
            DataType::common_supertype(&Null, &Integer),
            Some(DataType::nullable(Integer))
        );
        assert_eq!(
            DataType::common_supertype(&DataType::nullable(Integer), &Float),
            Some(DataType::nullable(Float))
        );
        assert_eq!(DataType::common_supertype(&Text, &Integer), None);
        assert_eq!(
            DataType::common_supertype(&DataType::array(Integer), &DataType::array(Null)),
            Some(DataType::array(DataType::nullable(Integer)))
        );
    }
}
