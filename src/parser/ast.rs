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

//! Abstract Syntax Tree (AST) types for constant expressions
//!
//! Literal nodes remember their byte span in the source text. Template
//! deduction uses the spans to tell literal tokens from skeleton tokens and
//! to pick a parse strategy from the literal's spelling.

use std::fmt;

use super::token::{Position, Token};
use crate::core::{DataType, Value};

/// Byte range of a node in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// First byte
    pub start: usize,
    /// One past the last byte
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns true if `[start, end)` lies inside this span
    pub fn contains(&self, start: usize, end: usize) -> bool {
        start >= self.start && end <= self.end
    }

    /// The source text covered by this span
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// Expression enum representing all expression types
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Identifier (column name)
    Identifier(Identifier),
    /// Integer literal, possibly with a folded sign
    IntegerLiteral(IntegerLiteral),
    /// Float literal, possibly with a folded sign
    FloatLiteral(FloatLiteral),
    /// String literal
    StringLiteral(StringLiteral),
    /// Boolean literal (TRUE/FALSE)
    BooleanLiteral(BooleanLiteral),
    /// NULL literal
    NullLiteral(NullLiteral),
    /// Array whose elements are all literals: `[1, 2, NULL]`
    ArrayLiteral(CompositeLiteral),
    /// Tuple whose elements are all literals: `(1, 'a')`
    TupleLiteral(CompositeLiteral),
    /// Array constructor with non-literal elements: `[x, now()]`
    Array(ListExpression),
    /// Tuple constructor with non-literal elements: `(x, 1 + 2)`
    Tuple(ListExpression),
    /// Reference to a literal slot of a template
    Placeholder(Placeholder),
    /// Prefix expression (-x, NOT x)
    Prefix(PrefixExpression),
    /// Infix expression (a + b, a = b)
    Infix(InfixExpression),
    /// LIKE / NOT LIKE
    Like(LikeExpression),
    /// IS NULL / IS NOT NULL
    IsNull(IsNullExpression),
    /// CAST(expr AS type)
    Cast(CastExpression),
    /// Function call
    FunctionCall(FunctionCall),
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(e) => write!(f, "{}", e),
            Expression::IntegerLiteral(e) => write!(f, "{}", e),
            Expression::FloatLiteral(e) => write!(f, "{}", e),
            Expression::StringLiteral(e) => write!(f, "{}", e),
            Expression::BooleanLiteral(e) => write!(f, "{}", e),
            Expression::NullLiteral(e) => write!(f, "{}", e),
            Expression::ArrayLiteral(e) => write!(f, "{}", e.value),
            Expression::TupleLiteral(e) => write!(f, "{}", e.value),
            Expression::Array(e) => {
                write!(f, "[")?;
                e.fmt_elements(f)?;
                write!(f, "]")
            }
            Expression::Tuple(e) => {
                write!(f, "(")?;
                e.fmt_elements(f)?;
                write!(f, ")")
            }
            Expression::Placeholder(e) => write!(f, "{}", e),
            Expression::Prefix(e) => write!(f, "{}", e),
            Expression::Infix(e) => write!(f, "{}", e),
            Expression::Like(e) => write!(f, "{}", e),
            Expression::IsNull(e) => write!(f, "{}", e),
            Expression::Cast(e) => write!(f, "{}", e),
            Expression::FunctionCall(e) => write!(f, "{}", e),
        }
    }
}

impl Expression {
    /// Get the position of this expression
    pub fn position(&self) -> Position {
        match self {
            Expression::Identifier(e) => e.token.position,
            Expression::IntegerLiteral(e) => e.token.position,
            Expression::FloatLiteral(e) => e.token.position,
            Expression::StringLiteral(e) => e.token.position,
            Expression::BooleanLiteral(e) => e.token.position,
            Expression::NullLiteral(e) => e.token.position,
            Expression::ArrayLiteral(e) | Expression::TupleLiteral(e) => e.token.position,
            Expression::Array(e) | Expression::Tuple(e) => e.token.position,
            Expression::Placeholder(e) => e.token.position,
            Expression::Prefix(e) => e.token.position,
            Expression::Infix(e) => e.token.position,
            Expression::Like(e) => e.token.position,
            Expression::IsNull(e) => e.token.position,
            Expression::Cast(e) => e.token.position,
            Expression::FunctionCall(e) => e.token.position,
        }
    }

    /// Byte span of a literal node, `None` for anything else
    pub fn literal_span(&self) -> Option<Span> {
        match self {
            Expression::IntegerLiteral(e) => Some(e.span),
            Expression::FloatLiteral(e) => Some(e.span),
            Expression::StringLiteral(e) => Some(e.span),
            Expression::BooleanLiteral(e) => Some(e.span),
            Expression::NullLiteral(e) => Some(e.span),
            Expression::ArrayLiteral(e) | Expression::TupleLiteral(e) => Some(e.span),
            _ => None,
        }
    }

    /// Returns true for literal nodes, including all-literal arrays and tuples
    pub fn is_literal(&self) -> bool {
        self.literal_span().is_some()
    }

    /// The constant value of a literal node
    pub fn literal_value(&self) -> Option<Value> {
        match self {
            Expression::IntegerLiteral(e) => Some(Value::Integer(e.value)),
            Expression::FloatLiteral(e) => Some(Value::Float(e.value)),
            Expression::StringLiteral(e) => Some(Value::text(&e.value)),
            Expression::BooleanLiteral(e) => Some(Value::Boolean(e.value)),
            Expression::NullLiteral(_) => Some(Value::Null),
            Expression::ArrayLiteral(e) | Expression::TupleLiteral(e) => Some(e.value.clone()),
            _ => None,
        }
    }
}

/// Identifier (column name)
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub token: Token,
    pub value: String,
}

impl Identifier {
    /// Create a new identifier
    pub fn new(token: Token, value: String) -> Self {
        Self { token, value }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Integer literal
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerLiteral {
    pub token: Token,
    pub value: i64,
    pub span: Span,
}

impl fmt::Display for IntegerLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Float literal
#[derive(Debug, Clone, PartialEq)]
pub struct FloatLiteral {
    pub token: Token,
    pub value: f64,
    pub span: Span,
}

impl fmt::Display for FloatLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Float(self.value))
    }
}

/// String literal
#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub token: Token,
    /// Unescaped content
    pub value: String,
    pub span: Span,
}

impl fmt::Display for StringLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.value.replace('\'', "''"))
    }
}

/// Boolean literal
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanLiteral {
    pub token: Token,
    pub value: bool,
    pub span: Span,
}

impl fmt::Display for BooleanLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.value { "TRUE" } else { "FALSE" })
    }
}

/// NULL literal
#[derive(Debug, Clone, PartialEq)]
pub struct NullLiteral {
    pub token: Token,
    pub span: Span,
}

impl fmt::Display for NullLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NULL")
    }
}

/// Array or tuple made only of literals
///
/// The elements are folded into one [`Value`] at parse time; the whole
/// composite becomes a single template slot.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeLiteral {
    pub token: Token,
    pub value: Value,
    pub span: Span,
}

/// Array or tuple constructor with at least one non-literal element
#[derive(Debug, Clone, PartialEq)]
pub struct ListExpression {
    pub token: Token,
    pub elements: Vec<Expression>,
}

impl ListExpression {
    fn fmt_elements(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", element)?;
        }
        Ok(())
    }
}

/// A typed reference to a template's literal slot
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    /// Token of the literal this placeholder replaced
    pub token: Token,
    pub name: String,
    pub data_type: DataType,
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Infix operator type, resolved once at parse time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfixOperator {
    // Comparison operators
    Equal,        // =
    NotEqual,     // <> or !=
    LessThan,     // <
    LessEqual,    // <=
    GreaterThan,  // >
    GreaterEqual, // >=

    // Logical operators
    And,
    Or,

    // Arithmetic operators
    Add,      // +
    Subtract, // -
    Multiply, // *
    Divide,   // /
    Modulo,   // %

    // String operators
    Concat, // ||

    Other,
}

impl InfixOperator {
    /// Parse operator string to enum
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "=" => InfixOperator::Equal,
            "<>" | "!=" => InfixOperator::NotEqual,
            "<" => InfixOperator::LessThan,
            "<=" => InfixOperator::LessEqual,
            ">" => InfixOperator::GreaterThan,
            ">=" => InfixOperator::GreaterEqual,
            "AND" => InfixOperator::And,
            "OR" => InfixOperator::Or,
            "+" => InfixOperator::Add,
            "-" => InfixOperator::Subtract,
            "*" => InfixOperator::Multiply,
            "/" => InfixOperator::Divide,
            "%" => InfixOperator::Modulo,
            "||" => InfixOperator::Concat,
            _ => InfixOperator::Other,
        }
    }

    /// Returns true for arithmetic operators
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            InfixOperator::Add
                | InfixOperator::Subtract
                | InfixOperator::Multiply
                | InfixOperator::Divide
                | InfixOperator::Modulo
        )
    }

    /// Returns true for comparison operators
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            InfixOperator::Equal
                | InfixOperator::NotEqual
                | InfixOperator::LessThan
                | InfixOperator::LessEqual
                | InfixOperator::GreaterThan
                | InfixOperator::GreaterEqual
        )
    }
}

/// Prefix operator type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixOperator {
    Negate, // -
    Not,    // NOT
    Plus,   // + (unary plus, no-op)
    Other,
}

impl PrefixOperator {
    /// Parse operator string to enum
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "-" => PrefixOperator::Negate,
            "NOT" => PrefixOperator::Not,
            "+" => PrefixOperator::Plus,
            _ => PrefixOperator::Other,
        }
    }
}

/// Prefix expression (-x, NOT x)
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixExpression {
    pub token: Token,
    pub operator: String,
    pub op_type: PrefixOperator,
    pub right: Box<Expression>,
}

impl PrefixExpression {
    /// Create a new prefix expression with auto-computed op_type
    #[inline]
    pub fn new(token: Token, operator: String, right: Box<Expression>) -> Self {
        let op_type = PrefixOperator::from_str(&operator);
        Self {
            token,
            operator,
            op_type,
            right,
        }
    }
}

impl fmt::Display for PrefixExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operator == "-" || self.operator == "+" {
            write!(f, "({}{})", self.operator, self.right)
        } else {
            write!(f, "({} {})", self.operator, self.right)
        }
    }
}

/// Infix expression (a + b, a = b)
#[derive(Debug, Clone, PartialEq)]
pub struct InfixExpression {
    pub token: Token,
    pub left: Box<Expression>,
    pub operator: String,
    pub op_type: InfixOperator,
    pub right: Box<Expression>,
}

impl InfixExpression {
    /// Create a new infix expression with auto-computed op_type
    #[inline]
    pub fn new(
        token: Token,
        left: Box<Expression>,
        operator: String,
        right: Box<Expression>,
    ) -> Self {
        let op_type = InfixOperator::from_str(&operator);
        Self {
            token,
            left,
            operator,
            op_type,
            right,
        }
    }
}

impl fmt::Display for InfixExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.left, self.operator, self.right)
    }
}

/// LIKE expression
#[derive(Debug, Clone, PartialEq)]
pub struct LikeExpression {
    pub token: Token,
    pub left: Box<Expression>,
    pub pattern: Box<Expression>,
    pub negated: bool,
}

impl fmt::Display for LikeExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operator = if self.negated { "NOT LIKE" } else { "LIKE" };
        write!(f, "({} {} {})", self.left, operator, self.pattern)
    }
}

/// IS [NOT] NULL expression
#[derive(Debug, Clone, PartialEq)]
pub struct IsNullExpression {
    pub token: Token,
    pub expr: Box<Expression>,
    pub negated: bool,
}

impl fmt::Display for IsNullExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "({} IS NOT NULL)", self.expr)
        } else {
            write!(f, "({} IS NULL)", self.expr)
        }
    }
}

/// CAST expression
#[derive(Debug, Clone, PartialEq)]
pub struct CastExpression {
    pub token: Token,
    pub expr: Box<Expression>,
    /// Type name as written
    pub type_name: String,
    pub target: DataType,
}

impl CastExpression {
    /// Build a cast that does not come from source text
    pub fn synthesized(expr: Expression, target: DataType) -> Self {
        Self {
            token: Token::eof(expr.position()),
            type_name: target.to_string(),
            expr: Box::new(expr),
            target,
        }
    }
}

impl fmt::Display for CastExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CAST({} AS {})", self.expr, self.type_name)
    }
}

/// Function call
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub token: Token,
    /// Uppercased function name
    pub function: String,
    pub arguments: Vec<Expression>,
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function)?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::token::TokenType;

    fn tok(literal: &str, offset: usize) -> Token {
        Token::new(
            TokenType::Integer,
            literal,
            Position::new(offset, 1, offset + 1),
            offset + literal.len(),
        )
    }

    #[test]
    fn test_span() {
        let span = Span::new(4, 7);
        assert!(span.contains(4, 7));
        assert!(span.contains(5, 6));
        assert!(!span.contains(3, 5));
        assert_eq!(span.text("a + -12 + b"), "-12");
    }

    #[test]
    fn test_literal_helpers() {
        let lit = Expression::IntegerLiteral(IntegerLiteral {
            token: tok("1", 0),
            value: 1,
            span: Span::new(0, 1),
        });
        assert!(lit.is_literal());
        assert_eq!(lit.literal_value(), Some(Value::integer(1)));

        let ident = Expression::Identifier(Identifier::new(tok("x", 4), "x".to_string()));
        assert!(!ident.is_literal());
        assert_eq!(ident.literal_value(), None);
    }

    #[test]
    fn test_display() {
        let left = Expression::IntegerLiteral(IntegerLiteral {
            token: tok("1", 0),
            value: 1,
            span: Span::new(0, 1),
        });
        let right = Expression::StringLiteral(StringLiteral {
            token: tok("'it''s'", 4),
            value: "it's".to_string(),
            span: Span::new(4, 11),
        });
        let infix = Expression::Infix(InfixExpression::new(
            tok("||", 2),
            Box::new(left),
            "||".to_string(),
            Box::new(right),
        ));
        assert_eq!(infix.to_string(), "(1 || 'it''s')");

        let cast = Expression::Cast(CastExpression::synthesized(infix, DataType::Text));
        assert_eq!(cast.to_string(), "CAST((1 || 'it''s') AS TEXT)");
    }

    #[test]
    fn test_operator_parsing() {
        assert_eq!(InfixOperator::from_str("<>"), InfixOperator::NotEqual);
        assert_eq!(InfixOperator::from_str("and"), InfixOperator::And);
        assert!(InfixOperator::Modulo.is_arithmetic());
        assert!(InfixOperator::GreaterEqual.is_comparison());
        assert_eq!(PrefixOperator::from_str("not"), PrefixOperator::Not);
    }
}
