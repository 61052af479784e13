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

//! Token types for the expression lexer
//!
//! Tokens carry their byte span in the source text. Template deduction uses
//! the span to copy the exact source spelling of every non-literal token
//! into the template skeleton.

use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::LazyLock;

/// Position represents a position in the input source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset, starting at 0
    pub offset: usize,
    /// Line number, starting at 1
    pub line: usize,
    /// Column number, starting at 1
    pub column: usize,
}

impl Position {
    /// Create a new position
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// TokenType represents the type of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// Error token
    Error,
    /// End of input
    Eof,
    /// Identifier (function name, type name, column name)
    Identifier,
    /// Keyword (AND, NULL, CAST, ...)
    Keyword,
    /// String literal ('hello')
    String,
    /// Integer number (123)
    Integer,
    /// Floating point number (123.45)
    Float,
    /// Operator (=, <, >, +, -, ...)
    Operator,
    /// Punctuator (comma, parentheses, brackets)
    Punctuator,
}

impl TokenType {
    /// Tokens made of word characters need a boundary check when matched
    /// against raw text: `AS` must not match the start of `ASC`.
    pub fn is_word(&self) -> bool {
        matches!(
            self,
            TokenType::Identifier | TokenType::Keyword | TokenType::Integer | TokenType::Float
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Error => write!(f, "ERROR"),
            TokenType::Eof => write!(f, "EOF"),
            TokenType::Identifier => write!(f, "IDENTIFIER"),
            TokenType::Keyword => write!(f, "KEYWORD"),
            TokenType::String => write!(f, "STRING"),
            TokenType::Integer => write!(f, "INTEGER"),
            TokenType::Float => write!(f, "FLOAT"),
            TokenType::Operator => write!(f, "OPERATOR"),
            TokenType::Punctuator => write!(f, "PUNCTUATOR"),
        }
    }
}

/// Token represents a lexical token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The type of the token
    pub token_type: TokenType,
    /// Normalized text: keywords are uppercased, strings keep their quotes
    pub literal: String,
    /// Start of the token in the source
    pub position: Position,
    /// Byte offset one past the end of the token
    pub end: usize,
    /// Error message (if token_type is Error)
    pub error: Option<String>,
}

impl Token {
    /// Create a new token
    pub fn new(
        token_type: TokenType,
        literal: impl Into<String>,
        position: Position,
        end: usize,
    ) -> Self {
        Self {
            token_type,
            literal: literal.into(),
            position,
            end,
            error: None,
        }
    }

    /// Create an error token
    pub fn error(
        message: impl Into<String>,
        literal: impl Into<String>,
        position: Position,
        end: usize,
    ) -> Self {
        Self {
            token_type: TokenType::Error,
            literal: literal.into(),
            position,
            end,
            error: Some(message.into()),
        }
    }

    /// Create an EOF token
    pub fn eof(position: Position) -> Self {
        Self {
            token_type: TokenType::Eof,
            literal: String::new(),
            position,
            end: position.offset,
            error: None,
        }
    }

    /// Byte offset of the first character
    pub fn start(&self) -> usize {
        self.position.offset
    }

    /// The exact source spelling of this token
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.position.offset..self.end).unwrap_or("")
    }

    /// Check if this is an EOF token
    pub fn is_eof(&self) -> bool {
        self.token_type == TokenType::Eof
    }

    /// Check if this is an error token
    pub fn is_error(&self) -> bool {
        self.token_type == TokenType::Error
    }

    /// Check if this is a keyword with the given value (case-insensitive)
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.token_type == TokenType::Keyword && self.literal.eq_ignore_ascii_case(keyword)
    }

    /// Check if this is an operator with the given value
    pub fn is_operator(&self, op: &str) -> bool {
        self.token_type == TokenType::Operator && self.literal == op
    }

    /// Check if this is a punctuator with the given value
    pub fn is_punctuator(&self, punct: &str) -> bool {
        self.token_type == TokenType::Punctuator && self.literal == punct
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token_type {
            TokenType::Error => write!(
                f,
                "{}: {} at {}",
                self.token_type,
                self.error.as_deref().unwrap_or("unknown error"),
                self.position
            ),
            TokenType::Keyword => write!(
                f,
                "{}: {} at {}",
                self.token_type, self.literal, self.position
            ),
            _ => write!(
                f,
                "{}: '{}' at {}",
                self.token_type, self.literal, self.position
            ),
        }
    }
}

/// Keywords (case-insensitive)
pub static KEYWORDS: &[&str] = &[
    "AND", "OR", "NOT", "NULL", "TRUE", "FALSE", "AS", "CAST", "IS", "LIKE", "ESCAPE",
];

static KEYWORD_SET: LazyLock<FxHashSet<&'static str>> =
    LazyLock::new(|| KEYWORDS.iter().copied().collect());

/// Check if a string is a keyword (case-insensitive)
#[inline]
pub fn is_keyword(s: &str) -> bool {
    if KEYWORD_SET.contains(s) {
        return true;
    }
    KEYWORD_SET.contains(s.to_ascii_uppercase().as_str())
}

/// Operators, longest first so the lexer can do maximal munch
pub static OPERATORS: &[&str] = &[
    "<=", ">=", "<>", "!=", "||", "=", "<", ">", "+", "-", "*", "/", "%",
];

/// Check if a string is an operator
#[inline]
pub fn is_operator(s: &str) -> bool {
    OPERATORS.contains(&s)
}

/// Punctuators
pub static PUNCTUATORS: &[char] = &[',', '(', ')', '[', ']'];

/// Check if a character is a punctuator
pub fn is_punctuator(c: char) -> bool {
    PUNCTUATORS.contains(&c)
}

/// Characters that can start an operator
pub fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '=' | '<' | '>' | '!' | '+' | '-' | '*' | '/' | '%' | '|'
    )
}

/// Characters that continue an identifier or a number
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
