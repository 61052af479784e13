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

//! Error types for literal templates
//!
//! This module defines the error type shared by the parser, the expression
//! compiler, the VM and the template machinery. A row that simply does not
//! match a template is not an error; see [`crate::template::ExpressionTemplate::parse_row`].

use thiserror::Error;

use crate::executor::expression::CompileError;
use crate::parser::ParseError;

/// Result type alias for template operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Parse errors
    // =========================================================================
    /// Parse error
    #[error("parse error: {0}")]
    Parse(String),

    /// Input ended while an expression or row was still open
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    // =========================================================================
    // Compile errors
    // =========================================================================
    /// The expression could not be compiled into a program
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    // =========================================================================
    // Type errors
    // =========================================================================
    /// Type error
    #[error("type error: {0}")]
    Type(String),

    /// A value did not conform to the column it was appended to
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    /// Type conversion error
    #[error("type conversion error: cannot convert {from} to {to}")]
    TypeConversion { from: String, to: String },

    /// Invalid column type name
    #[error("invalid column type '{0}'")]
    InvalidColumnType(String),

    // =========================================================================
    // Evaluation errors
    // =========================================================================
    /// Integer overflow during arithmetic
    #[error("integer overflow in {0}")]
    IntegerOverflow(&'static str),

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Invalid argument for function
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Expression evaluation failed with message
    #[error("expression evaluation failed: {message}")]
    ExpressionEvaluation { message: String },

    // =========================================================================
    // Template errors
    // =========================================================================
    /// The example expression cannot be turned into a template
    #[error("cannot build template for '{expression}': {reason}")]
    TemplateConstruction { expression: String, reason: String },

    /// Row count of a block does not match its columns
    #[error("column length mismatch: expected {expected}, got {got}")]
    ColumnLengthMismatch { expected: usize, got: usize },

    /// A row had a different number of values than the target columns
    #[error("row {row} has {got} values, expected {expected}")]
    RowArity {
        row: usize,
        expected: usize,
        got: usize,
    },

    // =========================================================================
    // Configuration errors
    // =========================================================================
    /// Invalid configuration value
    #[error("invalid configuration for '{key}': {value}")]
    InvalidConfig { key: String, value: String },

    /// Internal error for unexpected conditions
    #[error("{message}")]
    Internal { message: String },
}

impl Error {
    /// Create a new Parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse(message.into())
    }

    /// Create a new TypeMismatch error
    pub fn type_mismatch(expected: impl ToString, got: impl ToString) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    /// Create a new TypeConversion error
    pub fn type_conversion(from: impl Into<String>, to: impl Into<String>) -> Self {
        Error::TypeConversion {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a new ExpressionEvaluation error
    pub fn expression_evaluation(message: impl Into<String>) -> Self {
        Error::ExpressionEvaluation {
            message: message.into(),
        }
    }

    /// Create a new InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Create a new TemplateConstruction error
    pub fn template(expression: impl ToString, reason: impl Into<String>) -> Self {
        Error::TemplateConstruction {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidConfig error
    pub fn invalid_config(key: impl Into<String>, value: impl Into<String>) -> Self {
        Error::InvalidConfig {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error was raised while running a compiled program
    pub fn is_evaluation_error(&self) -> bool {
        matches!(
            self,
            Error::IntegerOverflow(_)
                | Error::DivisionByZero
                | Error::InvalidArgument(_)
                | Error::ExpressionEvaluation { .. }
                | Error::TypeConversion { .. }
                | Error::TypeMismatch { .. }
        )
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err.to_string())
    }
}
