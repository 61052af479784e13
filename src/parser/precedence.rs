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

//! Operator precedence levels for the Pratt parser

/// Precedence levels (higher number = higher precedence)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum Precedence {
    /// Lowest precedence
    #[default]
    Lowest = 1,
    /// OR
    Or = 2,
    /// AND
    And = 3,
    /// NOT
    Not = 4,
    /// =, <>, !=, IS, LIKE
    Equals = 5,
    /// <, >, <=, >=
    LessGreater = 6,
    /// +, -, ||
    Sum = 7,
    /// *, /, %
    Product = 8,
    /// Prefix -, +
    Prefix = 9,
    /// Function calls
    Call = 10,
}

impl Precedence {
    /// Get precedence for an operator string
    pub fn for_operator(op: &str) -> Precedence {
        match op.to_ascii_uppercase().as_str() {
            "OR" => Precedence::Or,
            "AND" => Precedence::And,
            "NOT" => Precedence::Not,
            "=" | "<>" | "!=" | "IS" | "LIKE" => Precedence::Equals,
            "<" | ">" | "<=" | ">=" => Precedence::LessGreater,
            "+" | "-" | "||" => Precedence::Sum,
            "*" | "/" | "%" => Precedence::Product,
            "(" => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }
}
