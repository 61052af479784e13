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

//! Date/time scalar functions

use chrono::Utc;

use crate::core::{DataType, Result, Value};
use crate::functions::{FunctionDataType, FunctionInfo, FunctionSignature, ScalarFunction};

use super::validate_arg_count;

// ============================================================================
// NOW
// ============================================================================

/// NOW function - current UTC timestamp
#[derive(Default)]
pub struct NowFunction;

impl ScalarFunction for NowFunction {
    fn name(&self) -> &str {
        "NOW"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "NOW",
            "Returns the current date and time",
            FunctionSignature::new(FunctionDataType::Timestamp, vec![], 0, 0),
        )
    }

    fn return_type(&self, args: &[DataType]) -> Result<DataType> {
        self.info().signature.validate_args(self.name(), args)?;
        Ok(DataType::Timestamp)
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value> {
        validate_arg_count!(args, "NOW", 0);
        Ok(Value::Timestamp(Utc::now()))
    }

    fn is_deterministic(&self) -> bool {
        false
    }

    fn clone_box(&self) -> Box<dyn ScalarFunction> {
        Box::new(NowFunction)
    }
}
