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

//! Typed, appendable columns
//!
//! Literal slots accumulate one value per parsed row into a [`Column`]; a
//! compiled program reads them back through a [`Block`] and writes its
//! result into another column of the template's result type.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::error::{Error, Result};
use super::types::DataType;
use super::value::Value;

/// Physical storage of a column
#[derive(Debug, Clone)]
enum ColumnData {
    /// Column of the NULL type: only a length
    Null(usize),
    Integer(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<Arc<str>>),
    Boolean(Vec<bool>),
    Timestamp(Vec<DateTime<Utc>>),
    /// Null map plus a non-nullable inner column holding a default at NULL rows
    Nullable {
        nulls: Vec<bool>,
        inner: Box<ColumnData>,
    },
    /// Arrays and tuples, validated against the column type on push
    Composite(Vec<Value>),
}

impl ColumnData {
    fn for_type(data_type: &DataType) -> Self {
        match data_type {
            DataType::Null => ColumnData::Null(0),
            DataType::Integer => ColumnData::Integer(Vec::new()),
            DataType::Float => ColumnData::Float(Vec::new()),
            DataType::Text => ColumnData::Text(Vec::new()),
            DataType::Boolean => ColumnData::Boolean(Vec::new()),
            DataType::Timestamp => ColumnData::Timestamp(Vec::new()),
            DataType::Nullable(inner) => ColumnData::Nullable {
                nulls: Vec::new(),
                inner: Box::new(ColumnData::for_type(inner)),
            },
            DataType::Array(_) | DataType::Tuple(_) => ColumnData::Composite(Vec::new()),
        }
    }

    fn len(&self) -> usize {
        match self {
            ColumnData::Null(n) => *n,
            ColumnData::Integer(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Boolean(v) => v.len(),
            ColumnData::Timestamp(v) => v.len(),
            ColumnData::Nullable { nulls, .. } => nulls.len(),
            ColumnData::Composite(v) => v.len(),
        }
    }

    fn truncate(&mut self, len: usize) {
        match self {
            ColumnData::Null(n) => *n = (*n).min(len),
            ColumnData::Integer(v) => v.truncate(len),
            ColumnData::Float(v) => v.truncate(len),
            ColumnData::Text(v) => v.truncate(len),
            ColumnData::Boolean(v) => v.truncate(len),
            ColumnData::Timestamp(v) => v.truncate(len),
            ColumnData::Nullable { nulls, inner } => {
                nulls.truncate(len);
                inner.truncate(len);
            }
            ColumnData::Composite(v) => v.truncate(len),
        }
    }

    /// Appends a value that has already been checked against the column type
    fn push_unchecked(&mut self, value: Value) {
        match (self, value) {
            (ColumnData::Null(n), _) => *n += 1,
            (ColumnData::Nullable { nulls, inner }, v) => {
                if v.is_null() {
                    nulls.push(true);
                    inner.push_default();
                } else {
                    nulls.push(false);
                    inner.push_unchecked(v);
                }
            }
            (ColumnData::Integer(vec), Value::Integer(v)) => vec.push(v),
            (ColumnData::Float(vec), Value::Float(v)) => vec.push(v),
            (ColumnData::Text(vec), Value::Text(v)) => vec.push(v),
            (ColumnData::Boolean(vec), Value::Boolean(v)) => vec.push(v),
            (ColumnData::Timestamp(vec), Value::Timestamp(v)) => vec.push(v),
            (ColumnData::Composite(vec), v) => vec.push(v),
            // Unreachable once conforms_to has passed
            (data, _) => data.push_default(),
        }
    }

    fn push_default(&mut self) {
        match self {
            ColumnData::Null(n) => *n += 1,
            ColumnData::Integer(v) => v.push(0),
            ColumnData::Float(v) => v.push(0.0),
            ColumnData::Text(v) => v.push(Arc::from("")),
            ColumnData::Boolean(v) => v.push(false),
            ColumnData::Timestamp(v) => v.push(DateTime::<Utc>::UNIX_EPOCH),
            ColumnData::Nullable { nulls, inner } => {
                nulls.push(true);
                inner.push_default();
            }
            ColumnData::Composite(v) => v.push(Value::Null),
        }
    }

    fn get(&self, row: usize) -> Option<Value> {
        match self {
            ColumnData::Null(n) => (row < *n).then_some(Value::Null),
            ColumnData::Integer(v) => v.get(row).map(|x| Value::Integer(*x)),
            ColumnData::Float(v) => v.get(row).map(|x| Value::Float(*x)),
            ColumnData::Text(v) => v.get(row).map(|x| Value::Text(x.clone())),
            ColumnData::Boolean(v) => v.get(row).map(|x| Value::Boolean(*x)),
            ColumnData::Timestamp(v) => v.get(row).map(|x| Value::Timestamp(*x)),
            ColumnData::Nullable { nulls, inner } => match nulls.get(row) {
                Some(true) => Some(Value::Null),
                Some(false) => inner.get(row),
                None => None,
            },
            ColumnData::Composite(v) => v.get(row).cloned(),
        }
    }
}

/// A typed, growable sequence of values
///
/// Every pushed value must conform to the column's [`DataType`]; a NULL
/// pushed into a non-nullable column is rejected.
#[derive(Debug, Clone)]
pub struct Column {
    data_type: DataType,
    data: ColumnData,
}

impl Column {
    /// Create an empty column of the given type
    pub fn new(data_type: DataType) -> Self {
        let data = ColumnData::for_type(&data_type);
        Self { data_type, data }
    }

    /// Create a column holding `rows` copies of `value`
    pub fn repeat(data_type: DataType, value: &Value, rows: usize) -> Result<Self> {
        let mut column = Column::new(data_type);
        column.reserve(rows);
        for _ in 0..rows {
            column.push(value.clone())?;
        }
        Ok(column)
    }

    /// Create a column from values, checking each one
    pub fn from_values(data_type: DataType, values: impl IntoIterator<Item = Value>) -> Result<Self> {
        let mut column = Column::new(data_type);
        for value in values {
            column.push(value)?;
        }
        Ok(column)
    }

    /// An empty column of the same type
    pub fn clone_empty(&self) -> Self {
        Column::new(self.data_type.clone())
    }

    /// Column type
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the column holds no values
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserve capacity for additional values
    pub fn reserve(&mut self, additional: usize) {
        match &mut self.data {
            ColumnData::Integer(v) => v.reserve(additional),
            ColumnData::Float(v) => v.reserve(additional),
            ColumnData::Text(v) => v.reserve(additional),
            ColumnData::Boolean(v) => v.reserve(additional),
            ColumnData::Timestamp(v) => v.reserve(additional),
            ColumnData::Nullable { nulls, .. } => nulls.reserve(additional),
            ColumnData::Composite(v) => v.reserve(additional),
            ColumnData::Null(_) => {}
        }
    }

    /// Append a value, rejecting values of the wrong type
    pub fn push(&mut self, value: Value) -> Result<()> {
        if !value.conforms_to(&self.data_type) {
            return Err(Error::type_mismatch(&self.data_type, value.type_name()));
        }
        self.data.push_unchecked(value);
        Ok(())
    }

    /// Shorten the column to `len` values; no-op if already shorter
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Value at `row`
    pub fn get(&self, row: usize) -> Option<Value> {
        self.data.get(row)
    }

    /// Iterate over all values
    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).filter_map(move |row| self.get(row))
    }

    /// Collect all values into a vector
    pub fn to_values(&self) -> Vec<Value> {
        self.iter().collect()
    }

    /// Append all values of another column of the same type
    pub fn extend_from(&mut self, other: &Column) -> Result<()> {
        if other.data_type != self.data_type {
            return Err(Error::type_mismatch(&self.data_type, &other.data_type));
        }
        self.reserve(other.len());
        for value in other.iter() {
            self.data.push_unchecked(value);
        }
        Ok(())
    }
}

/// A set of equal-height columns
///
/// The row count is explicit so that a block with no columns can still have
/// a height, which is what a template without literal slots evaluates over.
#[derive(Debug, Clone, Default)]
pub struct Block {
    columns: Vec<Column>,
    rows: usize,
}

impl Block {
    /// Create a block, checking that every column has `rows` values
    pub fn new(columns: Vec<Column>, rows: usize) -> Result<Self> {
        for column in &columns {
            if column.len() != rows {
                return Err(Error::ColumnLengthMismatch {
                    expected: rows,
                    got: column.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Create a block from columns, taking the height from the first column
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map_or(0, Column::len);
        Block::new(columns, rows)
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Columns of the block
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column at `index`
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Consume the block and return its columns
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    /// Values of row `row`, one per column
    pub fn row(&self, row: usize) -> Vec<Value> {
        self.columns
            .iter()
            .map(|column| column.get(row).unwrap_or_default())
            .collect()
    }
}
