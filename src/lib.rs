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

//! # literal-template - batched evaluation of VALUES expressions
//!
//! Bulk inserts often carry thousands of rows written the same way with
//! different constants. Instead of parsing and evaluating every row as a
//! full expression, this crate deduces a *template* from one row: its
//! literals become typed slots, the rest of its tokens become a skeleton.
//! Later rows are matched against the skeleton, their literals are read
//! directly into columns, and the compiled expression runs once per batch.
//!
//! ## Quick Start
//!
//! ```rust
//! use literal_template::{DataType, Value, ValuesReader};
//!
//! let reader = ValuesReader::new(vec![DataType::Integer, DataType::Text]);
//! let block = reader
//!     .read("(1, lower('A')), (2, lower('B')), (3, lower('C'))")
//!     .unwrap();
//!
//! assert_eq!(block.rows(), 3);
//! assert_eq!(block.row(1), vec![Value::Integer(2), Value::text("b")]);
//! ```
//!
//! ## Modules
//!
//! - [`core`] - Core types ([`DataType`], [`Value`], [`Column`], [`Block`], [`Error`])
//! - [`parser`] - Expression lexer and parser
//! - [`functions`] - Scalar functions usable inside expressions
//! - [`executor`] - Expression compiler, VM and the [`ValuesReader`]
//! - [`template`] - Template deduction, matching and caching
//! - [`config`] - Format and template options

pub mod config;
pub mod core;
pub mod executor;
pub mod functions;
pub mod parser;
pub mod template;

// Re-export main types for convenience
pub use core::{Block, Column, DataType, Error, Result, Value};

// Re-export config types
pub use config::{FormatOptions, TemplateConfig, DEFAULT_CACHE_SIZE};

// Re-export function types
pub use functions::{
    FunctionDataType, FunctionInfo, FunctionRegistry, FunctionSignature, ScalarFunction,
};

// Re-export executor types
pub use executor::{
    CompileContext, CompileError, ExecuteContext, ExprCompiler, ExprProgram, ExprVM, ReadStats,
    ValuesReader,
};

// Re-export template types
pub use template::{
    CacheStats, DeductionContext, ExpressionTemplate, LiteralSlot, ParseStrategy, TemplateCache,
    TemplateStructure,
};
