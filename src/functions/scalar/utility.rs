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

//! Utility scalar functions

use crate::core::{DataType, Error, Result, Value};
use crate::functions::{FunctionDataType, FunctionInfo, FunctionSignature, ScalarFunction};

// ============================================================================
// COALESCE
// ============================================================================

/// COALESCE function - returns the first non-null argument
#[derive(Default)]
pub struct CoalesceFunction;

impl ScalarFunction for CoalesceFunction {
    fn name(&self) -> &str {
        "COALESCE"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "COALESCE",
            "Returns the first non-null value in a list",
            FunctionSignature::variadic(FunctionDataType::Any, FunctionDataType::Any),
        )
    }

    /// The common supertype of all arguments. Nullable only when every
    /// argument may be NULL.
    fn return_type(&self, args: &[DataType]) -> Result<DataType> {
        self.info().signature.validate_args(self.name(), args)?;

        let mut result = args[0].non_nullable().clone();
        for arg in &args[1..] {
            result = DataType::common_supertype(&result, arg.non_nullable()).ok_or_else(|| {
                Error::type_mismatch(&result, arg)
            })?;
        }
        let result = result.non_nullable().clone();
        if args.iter().all(DataType::is_nullable) {
            Ok(DataType::nullable(result))
        } else {
            Ok(result)
        }
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        if args.is_empty() {
            return Err(Error::invalid_argument(
                "COALESCE requires at least 1 argument",
            ));
        }

        Ok(args
            .iter()
            .find(|arg| !arg.is_null())
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(CoalesceFunction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coalesce() {
        let f = CoalesceFunction;
        assert_eq!(
            f.evaluate(&[Value::Null, Value::Integer(2), Value::Integer(3)])
                .unwrap(),
            Value::Integer(2)
        );
        assert!(f.evaluate(&[Value::Null, Value::Null]).unwrap().is_null());
        assert!(f.evaluate(&[]).is_err());
    }

    #[test]
    fn test_coalesce_return_type() {
        let f = CoalesceFunction;
        assert_eq!(
            f.return_type(&[DataType::nullable(DataType::Integer), DataType::Integer])
                .unwrap(),
            DataType::Integer
        );
        assert_eq!(
            f.return_type(&[DataType::Null, DataType::nullable(DataType::Float)])
                .unwrap(),
            DataType::nullable(DataType::Float)
        );
        assert_eq!(
            f.return_type(&[DataType::Integer, DataType::Float]).unwrap(),
            DataType::Float
        );
        assert!(f.return_type(&[DataType::Integer, DataType::Text]).is_err());
    }
}
