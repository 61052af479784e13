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

//! Math scalar functions

use crate::core::{DataType, Error, Result, Value};
use crate::functions::{
    propagate_nullable, FunctionDataType, FunctionInfo, FunctionSignature, ScalarFunction,
};

use super::{validate_arg_count, value_to_f64, value_to_i64};

// ============================================================================
// ABS
// ============================================================================

/// ABS function - returns the absolute value of a number
#[derive(Default)]
pub struct AbsFunction;

impl ScalarFunction for AbsFunction {
    fn name(&self) -> &str {
        "ABS"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "ABS",
            "Returns the absolute value of a number",
            FunctionSignature::new(
                FunctionDataType::Numeric,
                vec![FunctionDataType::Numeric],
                1,
                1,
            ),
        )
    }

    fn return_type(&self, args: &[DataType]) -> Result<DataType> {
        self.info().signature.validate_args(self.name(), args)?;
        let inner = match args[0].non_nullable() {
            DataType::Integer => DataType::Integer,
            _ => DataType::Float,
        };
        Ok(propagate_nullable(args, inner))
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        validate_arg_count!(args, "ABS", 1);

        match &args[0] {
            Value::Null => Ok(Value::Null),
            Value::Integer(i) => i
                .checked_abs()
                .map(Value::Integer)
                .ok_or(Error::IntegerOverflow("ABS")),
            Value::Float(f) => Ok(Value::Float(f.abs())),
            other => Err(Error::invalid_argument(format!(
                "ABS argument must be a number, got {}",
                other.type_name()
            ))),
        }
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(AbsFunction)
    }
}

// ============================================================================
// ROUND
// ============================================================================

/// ROUND function - rounds a number to a number of decimal places
#[derive(Default)]
pub struct RoundFunction;

impl ScalarFunction for RoundFunction {
    fn name(&self) -> &str {
        "ROUND"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "ROUND",
            "Rounds a number to a specified number of decimal places",
            FunctionSignature::new(
                FunctionDataType::Float,
                vec![FunctionDataType::Numeric, FunctionDataType::Integer],
                1,
                2,
            ),
        )
    }

    fn return_type(&self, args: &[DataType]) -> Result<DataType> {
        self.info().signature.validate_args(self.name(), args)?;
        Ok(propagate_nullable(&args[..1], DataType::Float))
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        validate_arg_count!(args, "ROUND", 1, 2);

        if args[0].is_null() {
            return Ok(Value::Null);
        }

        let num = value_to_f64(&args[0])
            .ok_or_else(|| Error::invalid_argument("ROUND first argument must be a number"))?;

        // Default to 0 decimal places if not specified
        let places = if args.len() == 2 && !args[1].is_null() {
            value_to_i64(&args[1])
                .ok_or_else(|| Error::invalid_argument("ROUND decimal places must be an integer"))?
                .clamp(-308, 308) as i32
        } else {
            0
        };

        let shift = 10_f64.powi(places);
        Ok(Value::Float((num * shift).round() / shift))
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(RoundFunction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abs_positive() {
        let f = AbsFunction;
        assert_eq!(
            f.evaluate(&[Value::Integer(42)]).unwrap(),
            Value::Integer(42)
        );
        assert_eq!(f.evaluate(&[Value::Float(3.5)]).unwrap(), Value::Float(3.5));
    }

    #[test]
    fn test_abs_negative() {
        let f = AbsFunction;
        assert_eq!(
            f.evaluate(&[Value::Integer(-42)]).unwrap(),
            Value::Integer(42)
        );
        assert_eq!(
            f.evaluate(&[Value::Float(-3.5)]).unwrap(),
            Value::Float(3.5)
        );
    }

    #[test]
    fn test_abs_null() {
        assert!(AbsFunction.evaluate(&[Value::Null]).unwrap().is_null());
    }

    #[test]
    fn test_abs_overflow() {
        assert_eq!(
            AbsFunction.evaluate(&[Value::Integer(i64::MIN)]),
            Err(Error::IntegerOverflow("ABS"))
        );
    }

    #[test]
    fn test_abs_rejects_text() {
        assert!(AbsFunction.return_type(&[DataType::Text]).is_err());
        assert!(AbsFunction.evaluate(&[Value::text("x")]).is_err());
    }

    #[test]
    fn test_round() {
        let f = RoundFunction;
        assert_eq!(f.evaluate(&[Value::Float(2.5)]).unwrap(), Value::Float(3.0));
        assert_eq!(
            f.evaluate(&[Value::Float(3.14159), Value::Integer(2)])
                .unwrap(),
            Value::Float(3.14)
        );
        assert_eq!(f.evaluate(&[Value::Integer(7)]).unwrap(), Value::Float(7.0));
    }

    #[test]
    fn test_round_return_type() {
        assert_eq!(
            RoundFunction
                .return_type(&[DataType::Integer, DataType::Integer])
                .unwrap(),
            DataType::Float
        );
        assert_eq!(
            RoundFunction
                .return_type(&[DataType::nullable(DataType::Float)])
                .unwrap(),
            DataType::nullable(DataType::Float)
        );
    }
}
