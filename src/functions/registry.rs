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

//! Function Registry
//!
//! This module provides the function registry for looking up scalar
//! functions by name. Lookups are case-insensitive.

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::scalar::{
    AbsFunction, CoalesceFunction, ConcatFunction, LengthFunction, LowerFunction, NowFunction,
    RoundFunction, UpperFunction,
};
use super::{FunctionInfo, ScalarFunction};

/// Global function registry instance
static GLOBAL_REGISTRY: OnceLock<Arc<FunctionRegistry>> = OnceLock::new();

/// Get the global function registry
#[inline]
pub fn global_registry() -> &'static Arc<FunctionRegistry> {
    GLOBAL_REGISTRY.get_or_init(|| Arc::new(FunctionRegistry::new()))
}

/// Type alias for scalar function factory
type ScalarFnFactory = Arc<dyn Fn() -> Box<dyn ScalarFunction> + Send + Sync>;

/// Function registry for scalar functions
pub struct FunctionRegistry {
    /// Scalar functions
    scalar_functions: RwLock<FxHashMap<String, ScalarFnFactory>>,
    /// Function info cache
    function_info: RwLock<FxHashMap<String, FunctionInfo>>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("scalar_functions", &self.list_scalars())
            .finish()
    }
}

impl FunctionRegistry {
    /// Create a new function registry with all built-in functions registered
    pub fn new() -> Self {
        let registry = Self::empty();

        // String functions
        registry.register_scalar::<UpperFunction>();
        registry.register_scalar::<LowerFunction>();
        registry.register_scalar::<LengthFunction>();
        registry.register_scalar::<ConcatFunction>();

        // Math functions
        registry.register_scalar::<AbsFunction>();
        registry.register_scalar::<RoundFunction>();

        // Utility functions
        registry.register_scalar::<CoalesceFunction>();

        // Date/time functions
        registry.register_scalar::<NowFunction>();

        registry
    }

    /// Create a registry with no functions registered
    pub fn empty() -> Self {
        Self {
            scalar_functions: RwLock::new(FxHashMap::default()),
            function_info: RwLock::new(FxHashMap::default()),
        }
    }

    /// Register a scalar function
    pub fn register_scalar<F: ScalarFunction + Default + 'static>(&self) {
        let instance = F::default();
        let name = instance.name().to_uppercase();
        let info = instance.info();

        self.scalar_functions
            .write()
            .insert(name.clone(), Arc::new(|| Box::new(F::default())));
        self.function_info.write().insert(name, info);
    }

    /// Get a new instance of a scalar function by name
    pub fn get_scalar(&self, name: &str) -> Option<Box<dyn ScalarFunction>> {
        let funcs = self.scalar_functions.read();
        if let Some(f) = funcs.get(name) {
            return Some(f());
        }
        let upper = name.to_uppercase();
        funcs.get(&upper).map(|f| f())
    }

    /// Check if a function name is a scalar function
    pub fn is_scalar(&self, name: &str) -> bool {
        let funcs = self.scalar_functions.read();
        funcs.contains_key(name) || funcs.contains_key(&name.to_uppercase())
    }

    /// Get function info by name
    pub fn get_info(&self, name: &str) -> Option<FunctionInfo> {
        self.function_info.read().get(&name.to_uppercase()).cloned()
    }

    /// List all scalar function names
    pub fn list_scalars(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scalar_functions.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, Value};

    #[test]
    fn test_registry_creation() {
        let registry = FunctionRegistry::new();
        assert!(registry.is_scalar("UPPER"));
        assert!(registry.is_scalar("now"));
        assert!(!registry.is_scalar("SUM"));
        assert_eq!(registry.list_scalars().len(), 8);
    }

    #[test]
    fn test_get_scalar_case_insensitive() {
        let registry = FunctionRegistry::new();
        let f = registry.get_scalar("lower").unwrap();
        assert_eq!(f.name(), "LOWER");
        assert_eq!(
            f.evaluate(&[Value::text("ABC")]).unwrap(),
            Value::text("abc")
        );
        assert_eq!(f.return_type(&[DataType::Text]).unwrap(), DataType::Text);
    }

    #[test]
    fn test_get_info() {
        let registry = FunctionRegistry::new();
        let info = registry.get_info("coalesce").unwrap();
        assert_eq!(info.name(), "COALESCE");
        assert!(info.signature().is_variadic);
        assert!(registry.get_info("missing").is_none());
    }

    #[test]
    fn test_empty_registry() {
        let registry = FunctionRegistry::empty();
        assert!(registry.get_scalar("UPPER").is_none());
        registry.register_scalar::<UpperFunction>();
        assert!(registry.get_scalar("upper").is_some());
    }

    #[test]
    fn test_global_registry_is_shared() {
        let a = global_registry();
        let b = global_registry();
        assert!(Arc::ptr_eq(a, b));
    }
}
