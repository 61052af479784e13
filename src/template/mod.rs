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

//! Expression templates
//!
//! Rows of a VALUES list are often written the same way with different
//! constants: `(1, lower('A'))`, `(2, lower('B'))`. A template is deduced
//! from the first such expression by cutting its literals out. Later rows
//! are matched token by token against the remaining skeleton, their
//! literals are read straight into typed columns, and the compiled
//! expression is evaluated once per batch instead of once per row.
//!
//! # Example
//!
//! ```
//! use literal_template::core::{DataType, Value};
//! use literal_template::parser::{parse_with_tokens, TextCursor};
//! use literal_template::template::{DeductionContext, ExpressionTemplate, TemplateCache};
//! use literal_template::FormatOptions;
//!
//! let cache = TemplateCache::default();
//! let (expr, span) = parse_with_tokens("1 + 2").unwrap();
//! let (structure, found) = cache
//!     .get_or_build(&DataType::Integer, &span, &expr, &DeductionContext::default(), "")
//!     .unwrap();
//! assert!(!found);
//!
//! let mut batch = ExpressionTemplate::new(structure);
//! let options = FormatOptions::default();
//! for row in ["1 + 2", "3 + 4"] {
//!     assert!(batch.parse_row(&mut TextCursor::new(row), &options));
//! }
//! let column = batch.evaluate_all().unwrap();
//! assert_eq!(column.to_values(), vec![Value::Integer(3), Value::Integer(7)]);
//! ```

pub mod cache;
pub mod instance;
pub mod literal;
pub mod structure;

pub use cache::{CacheStats, TemplateCache};
pub use instance::ExpressionTemplate;
pub use literal::{LiteralSlot, ParseStrategy};
pub use structure::{DeductionContext, SkeletonToken, TemplateStructure};
