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

//! Scalar Function System
//!
//! Functions that may appear inside a VALUES expression (for example
//! `lower('ABC')` or `now()`). Each function reports the type it returns for
//! a given list of argument types so that expressions can be typed once at
//! template construction, then evaluated row by row.
//!
//! - [`ScalarFunction`] - Trait implemented by every built-in
//! - [`FunctionRegistry`] - Case-insensitive lookup of built-ins

pub mod registry;
pub mod scalar;

use crate::core::{DataType, Error, Result, Value};

/// Data type for function signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionDataType {
    /// Any type
    Any,
    /// Integer type
    Integer,
    /// Float type
    Float,
    /// Integer or float
    Numeric,
    /// String type
    String,
    /// Boolean type
    Boolean,
    /// Timestamp type
    Timestamp,
}

impl FunctionDataType {
    /// Check whether a column type is acceptable for this signature slot.
    /// NULL is accepted everywhere; nullability is propagated by the caller.
    pub fn accepts(&self, data_type: &DataType) -> bool {
        let data_type = data_type.non_nullable();
        if matches!(data_type, DataType::Null) {
            return true;
        }
        match self {
            FunctionDataType::Any => true,
            FunctionDataType::Integer => matches!(data_type, DataType::Integer),
            FunctionDataType::Float | FunctionDataType::Numeric => data_type.is_numeric(),
            FunctionDataType::String => matches!(data_type, DataType::Text),
            FunctionDataType::Boolean => matches!(data_type, DataType::Boolean),
            FunctionDataType::Timestamp => matches!(data_type, DataType::Timestamp),
        }
    }
}

/// Function signature information
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    /// Return type
    pub return_type: FunctionDataType,
    /// Argument types
    pub argument_types: Vec<FunctionDataType>,
    /// Minimum number of arguments
    pub min_args: usize,
    /// Maximum number of arguments
    pub max_args: usize,
    /// Whether the function is variadic
    pub is_variadic: bool,
}

impl FunctionSignature {
    /// Create a new function signature
    pub fn new(
        return_type: FunctionDataType,
        argument_types: Vec<FunctionDataType>,
        min_args: usize,
        max_args: usize,
    ) -> Self {
        Self {
            return_type,
            argument_types,
            min_args,
            max_args,
            is_variadic: false,
        }
    }

    /// Create a variadic function signature
    pub fn variadic(return_type: FunctionDataType, arg_type: FunctionDataType) -> Self {
        Self {
            return_type,
            argument_types: vec![arg_type],
            min_args: 1,
            max_args: usize::MAX,
            is_variadic: true,
        }
    }

    /// Validate argument count
    pub fn validate_arg_count(&self, count: usize) -> Result<()> {
        if count < self.min_args {
            return Err(Error::invalid_argument(format!(
                "expected at least {} arguments, got {}",
                self.min_args, count
            )));
        }
        if count > self.max_args {
            return Err(Error::invalid_argument(format!(
                "expected at most {} arguments, got {}",
                self.max_args, count
            )));
        }
        Ok(())
    }

    /// Validate argument count and argument types
    pub fn validate_args(&self, name: &str, args: &[DataType]) -> Result<()> {
        self.validate_arg_count(args.len())
            .map_err(|e| Error::invalid_argument(format!("{}: {}", name, e)))?;
        for (i, arg) in args.iter().enumerate() {
            let expected = if self.is_variadic {
                self.argument_types.first()
            } else {
                self.argument_types.get(i)
            };
            if let Some(expected) = expected {
                if !expected.accepts(arg) {
                    return Err(Error::type_mismatch(
                        format!("{:?} for argument {} of {}", expected, i + 1, name),
                        arg,
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Function information
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    /// Function name
    pub name: String,
    /// Description
    pub description: String,
    /// Signature
    pub signature: FunctionSignature,
}

impl FunctionInfo {
    /// Create a new function info
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        signature: FunctionSignature,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            signature,
        }
    }

    /// Get the function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get the signature
    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }
}

/// Trait for scalar functions
pub trait ScalarFunction: Send + Sync {
    /// Get the function name
    fn name(&self) -> &str;

    /// Get function information
    fn info(&self) -> FunctionInfo;

    /// Result type for the given argument types.
    ///
    /// Errors when the arguments cannot be accepted.
    fn return_type(&self, args: &[DataType]) -> Result<DataType>;

    /// Evaluate the function with the given arguments
    fn evaluate(&self, args: &[Value]) -> Result<Value>;

    /// Whether two calls with equal arguments always produce equal results
    fn is_deterministic(&self) -> bool {
        true
    }

    /// Clone the function into a new instance
    fn clone_box(&self) -> Box<dyn ScalarFunction>;
}

/// Wraps `inner` in `Nullable` when any argument type is nullable or NULL.
pub(crate) fn propagate_nullable(args: &[DataType], inner: DataType) -> DataType {
    if args
        .iter()
        .any(|a| a.is_nullable() || matches!(a, DataType::Null))
    {
        DataType::nullable(inner)
    } else {
        inner
    }
}

pub use registry::{global_registry, FunctionRegistry};
pub use scalar::{
    AbsFunction, CoalesceFunction, ConcatFunction, LengthFunction, LowerFunction, NowFunction,
    RoundFunction, UpperFunction,
};
