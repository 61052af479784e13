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

//! Expression parser
//!
//! A compact parser for the constant expressions found in `VALUES` rows:
//!
//! - [`Lexer`] - Tokenizer producing byte-spanned [`Token`]s
//! - [`Parser`] - Pratt parser that builds the [`Expression`] tree
//! - [`TextCursor`] - Readable, restorable cursor used by template row matching
//! - [`TokenSpan`] - An expression's source text together with its tokens
//!
//! # Example
//!
//! ```
//! use literal_template::parser::parse_expression;
//!
//! let expr = parse_expression("1 + -2").unwrap();
//! assert_eq!(expr.to_string(), "(1 + -2)");
//! ```

pub mod ast;
pub mod cursor;
pub mod error;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;
pub mod precedence;
pub mod token;

// Expression parsing is implemented as an impl block on Parser
mod expressions;

pub use ast::{
    BooleanLiteral, CastExpression, CompositeLiteral, Expression, FloatLiteral, FunctionCall,
    Identifier, InfixExpression, InfixOperator, IntegerLiteral, IsNullExpression, LikeExpression,
    ListExpression, NullLiteral, Placeholder, PrefixExpression, PrefixOperator, Span,
    StringLiteral,
};
pub use cursor::TextCursor;
pub use error::ParseError;
pub use lexer::{read_quoted, tokenize, tokenize_with_escapes, Lexer};
pub use parser::Parser;
pub use precedence::Precedence;
pub use token::{Position, Token, TokenType};

/// Parse a complete expression
pub fn parse_expression(input: &str) -> Result<Expression, ParseError> {
    Parser::new(input).parse_single_expression()
}

/// Parse one expression starting at byte `offset` of `source`
///
/// Stops before a top-level `,` or `)` and returns the expression together
/// with the byte offset just past it. Literal spans are offsets into the
/// whole of `source`.
pub fn parse_expression_at(
    source: &str,
    offset: usize,
    backslash_escapes: bool,
) -> Result<(Expression, usize), ParseError> {
    Parser::new_at(source, offset, backslash_escapes).parse_delimited_expression()
}

/// The source text of one expression and its tokens
///
/// Template deduction walks the tokens to build the skeleton, slicing each
/// token's exact spelling out of `source`.
#[derive(Debug, Clone)]
pub struct TokenSpan<'a> {
    source: &'a str,
    tokens: Vec<Token>,
}

impl<'a> TokenSpan<'a> {
    /// Tokenize `source`
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: tokenize(source),
        }
    }

    /// Build a span from tokens produced elsewhere over the same `source`
    pub fn from_tokens(source: &'a str, tokens: Vec<Token>) -> Self {
        Self { source, tokens }
    }

    /// The expression text
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// The tokens, in source order
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Source spelling of token `index`
    pub fn text(&self, index: usize) -> &'a str {
        self.tokens
            .get(index)
            .map_or("", |token| token.text(self.source))
    }
}

/// Parse `source` and tokenize it in one go
pub fn parse_with_tokens(source: &str) -> Result<(Expression, TokenSpan<'_>), ParseError> {
    let expr = parse_expression(source)?;
    Ok((expr, TokenSpan::new(source)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_span() {
        let span = TokenSpan::new("f( 1 ,'a')");
        let texts: Vec<&str> = (0..span.tokens().len()).map(|i| span.text(i)).collect();
        assert_eq!(texts, vec!["f", "(", "1", ",", "'a'", ")"]);
        assert_eq!(span.text(99), "");
    }

    #[test]
    fn test_parse_expression_at() {
        let source = "(1, lower('A')), (2";
        let (expr, end) = parse_expression_at(source, 4, true).unwrap();
        assert_eq!(expr.to_string(), "LOWER('A')");
        assert_eq!(&source[end..end + 1], ")");

        let (expr, end) = parse_expression_at(source, 1, true).unwrap();
        assert_eq!(expr.to_string(), "1");
        assert_eq!(end, 2);
    }

    #[test]
    fn test_parse_with_tokens() {
        let (expr, span) = parse_with_tokens("now()").unwrap();
        assert_eq!(expr.to_string(), "NOW()");
        assert_eq!(span.tokens().len(), 3);
        assert!(parse_with_tokens("now(").is_err());
    }
}
