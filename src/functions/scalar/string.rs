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

//! String scalar functions

use crate::core::{DataType, Result, Value};
use crate::functions::{
    propagate_nullable, FunctionDataType, FunctionInfo, FunctionSignature, ScalarFunction,
};

use super::{validate_arg_count, value_to_string};

// ============================================================================
// UPPER
// ============================================================================

/// UPPER function - converts a string to uppercase
#[derive(Default)]
pub struct UpperFunction;

impl ScalarFunction for UpperFunction {
    fn name(&self) -> &str {
        "UPPER"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "UPPER",
            "Converts a string to uppercase",
            FunctionSignature::new(FunctionDataType::String, vec![FunctionDataType::Any], 1, 1),
        )
    }

    fn return_type(&self, args: &[DataType]) -> Result<DataType> {
        self.info().signature.validate_args(self.name(), args)?;
        Ok(propagate_nullable(args, DataType::Text))
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        validate_arg_count!(args, "UPPER", 1);

        if args[0].is_null() {
            return Ok(Value::Null);
        }

        let s = value_to_string(&args[0]);
        Ok(Value::text(s.to_uppercase()))
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(UpperFunction)
    }
}

// ============================================================================
// LOWER
// ============================================================================

/// LOWER function - converts a string to lowercase
#[derive(Default)]
pub struct LowerFunction;

impl ScalarFunction for LowerFunction {
    fn name(&self) -> &str {
        "LOWER"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "LOWER",
            "Converts a string to lowercase",
            FunctionSignature::new(FunctionDataType::String, vec![FunctionDataType::Any], 1, 1),
        )
    }

    fn return_type(&self, args: &[DataType]) -> Result<DataType> {
        self.info().signature.validate_args(self.name(), args)?;
        Ok(propagate_nullable(args, DataType::Text))
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        validate_arg_count!(args, "LOWER", 1);

        if args[0].is_null() {
            return Ok(Value::Null);
        }

        let s = value_to_string(&args[0]);
        Ok(Value::text(s.to_lowercase()))
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(LowerFunction)
    }
}

// ============================================================================
// LENGTH
// ============================================================================

/// LENGTH function - number of characters in a string
#[derive(Default)]
pub struct LengthFunction;

impl ScalarFunction for LengthFunction {
    fn name(&self) -> &str {
        "LENGTH"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "LENGTH",
            "Returns the number of characters in a string",
            FunctionSignature::new(FunctionDataType::Integer, vec![FunctionDataType::Any], 1, 1),
        )
    }

    fn return_type(&self, args: &[DataType]) -> Result<DataType> {
        self.info().signature.validate_args(self.name(), args)?;
        Ok(propagate_nullable(args, DataType::Integer))
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        validate_arg_count!(args, "LENGTH", 1);

        match &args[0] {
            Value::Null => Ok(Value::Null),
            Value::Array(items) => Ok(Value::Integer(items.len() as i64)),
            other => Ok(Value::Integer(
                value_to_string(other).chars().count() as i64
            )),
        }
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(LengthFunction)
    }
}

// ============================================================================
// CONCAT
// ============================================================================

/// CONCAT function - concatenates its arguments, skipping NULLs
#[derive(Default)]
pub struct ConcatFunction;

impl ScalarFunction for ConcatFunction {
    fn name(&self) -> &str {
        "CONCAT"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "CONCAT",
            "Concatenates strings, treating NULL as an empty string",
            FunctionSignature::variadic(FunctionDataType::String, FunctionDataType::Any),
        )
    }

    fn return_type(&self, args: &[DataType]) -> Result<DataType> {
        self.info().signature.validate_args(self.name(), args)?;
        Ok(DataType::Text)
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        if args.is_empty() {
            return Err(crate::core::Error::invalid_argument(
                "CONCAT requires at least 1 argument",
            ));
        }

        let mut result = String::new();
        for arg in args {
            if !arg.is_null() {
                result.push_str(&value_to_string(arg));
            }
        }
        Ok(Value::text(result))
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(ConcatFunction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upper_lower() {
        assert_eq!(
            UpperFunction.evaluate(&[Value::text("hello")]).unwrap(),
            Value::text("HELLO")
        );
        assert_eq!(
            LowerFunction.evaluate(&[Value::text("HeLLo")]).unwrap(),
            Value::text("hello")
        );
        assert!(UpperFunction.evaluate(&[Value::Null]).unwrap().is_null());
    }

    #[test]
    fn test_upper_arg_count() {
        assert!(UpperFunction.evaluate(&[]).is_err());
        assert!(UpperFunction
            .evaluate(&[Value::text("a"), Value::text("b")])
            .is_err());
    }

    #[test]
    fn test_length_counts_chars() {
        assert_eq!(
            LengthFunction.evaluate(&[Value::text("héllo")]).unwrap(),
            Value::Integer(5)
        );
        assert_eq!(
            LengthFunction
                .evaluate(&[Value::array(vec![Value::Integer(1), Value::Integer(2)])])
                .unwrap(),
            Value::Integer(2)
        );
    }

    #[test]
    fn test_concat_skips_null() {
        let result = ConcatFunction
            .evaluate(&[Value::text("a"), Value::Null, Value::Integer(1)])
            .unwrap();
        assert_eq!(result, Value::text("a1"));
    }

    #[test]
    fn test_return_types() {
        assert_eq!(
            UpperFunction.return_type(&[DataType::Text]).unwrap(),
            DataType::Text
        );
        assert_eq!(
            LengthFunction
                .return_type(&[DataType::nullable(DataType::Text)])
                .unwrap(),
            DataType::nullable(DataType::Integer)
        );
        assert_eq!(
            ConcatFunction
                .return_type(&[DataType::Null, DataType::Integer])
                .unwrap(),
            DataType::Text
        );
        assert!(UpperFunction.return_type(&[]).is_err());
    }
}
