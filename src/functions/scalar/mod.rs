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

//! Scalar Functions
//!
//! ## String Functions
//! - [`UpperFunction`] - UPPER(string)
//! - [`LowerFunction`] - LOWER(string)
//! - [`LengthFunction`] - LENGTH(string)
//! - [`ConcatFunction`] - CONCAT(value, ...)
//!
//! ## Math Functions
//! - [`AbsFunction`] - ABS(number)
//! - [`RoundFunction`] - ROUND(number, decimals)
//!
//! ## Utility Functions
//! - [`CoalesceFunction`] - COALESCE(value, ...)
//!
//! ## Date/Time Functions
//! - [`NowFunction`] - NOW()

mod datetime;
mod math;
mod string;
mod utility;

pub use datetime::NowFunction;
pub use math::{AbsFunction, RoundFunction};
pub use string::{ConcatFunction, LengthFunction, LowerFunction, UpperFunction};
pub use utility::CoalesceFunction;

use crate::core::Value;
use crate::core::value::format_float;

/// Macro to validate argument count for scalar functions.
///
/// # Usage
/// ```ignore
/// // Exact count
/// validate_arg_count!(args, "UPPER", 1);
///
/// // Range (min, max inclusive)
/// validate_arg_count!(args, "ROUND", 1, 2);
/// ```
macro_rules! validate_arg_count {
    // Exact count
    ($args:expr, $name:expr, $exact:expr) => {
        if $args.len() != $exact {
            return Err($crate::core::Error::invalid_argument(format!(
                "{} requires exactly {} argument{}, got {}",
                $name,
                $exact,
                if $exact == 1 { "" } else { "s" },
                $args.len()
            )));
        }
    };
    // Range (min to max inclusive)
    ($args:expr, $name:expr, $min:expr, $max:expr) => {
        if $args.len() < $min || $args.len() > $max {
            return Err($crate::core::Error::invalid_argument(format!(
                "{} requires {} to {} arguments, got {}",
                $name,
                $min,
                $max,
                $args.len()
            )));
        }
    };
}
pub(crate) use validate_arg_count;

/// Convert a Value to its string form for string functions
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Text(s) => s.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Timestamp(t) => t.to_rfc3339(),
        Value::Array(_) | Value::Tuple(_) => value.to_string(),
    }
}

/// Try to convert a Value to f64
pub fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Text(s) => s.parse().ok(),
        _ => None,
    }
}

/// Try to convert a Value to i64
pub fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
        _ => None,
    }
}
