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

//! Expression parser: the Parser struct and token plumbing

use super::ast::Expression;
use super::error::ParseError;
use super::lexer::Lexer;
use super::precedence::Precedence;
use super::token::{Token, TokenType};

/// Expression parser using the Pratt parsing algorithm
pub struct Parser<'a> {
    /// The lexer providing tokens
    lexer: Lexer<'a>,
    /// Current token being examined
    pub(crate) cur_token: Token,
    /// Next token (peek)
    pub(crate) peek_token: Token,
    /// Whether backslashes escape characters in string literals
    pub(crate) backslash_escapes: bool,
    /// Collected errors
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given input
    pub fn new(input: &'a str) -> Self {
        Self::new_at(input, 0, true)
    }

    /// Create a parser that starts at byte `offset` of `input`
    pub fn new_at(input: &'a str, offset: usize, backslash_escapes: bool) -> Self {
        let mut lexer = Lexer::new_at(input, offset).with_backslash_escapes(backslash_escapes);
        let cur_token = lexer.next_token();
        let peek_token = lexer.next_token();

        let mut parser = Parser {
            lexer,
            cur_token,
            peek_token,
            backslash_escapes,
            errors: Vec::new(),
        };
        if parser.cur_token.is_error() {
            let message = parser.cur_token.error.clone().unwrap_or_default();
            parser.add_error(message);
        }
        parser
    }

    /// Source text being parsed
    pub fn source(&self) -> &'a str {
        self.lexer.input()
    }

    /// Parse exactly one expression spanning the whole input
    pub fn parse_single_expression(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_expression(Precedence::Lowest);
        if let Some(expr) = expr {
            if !self.peek_token_is(TokenType::Eof) {
                let token = self.peek_token.clone();
                self.add_error_at(format!("unexpected token '{}'", token.literal), &token);
            } else if self.errors.is_empty() {
                return Ok(expr);
            }
        }
        Err(self.first_error())
    }

    /// Parse one expression and return it with the byte offset just past it
    ///
    /// Parsing stops before a top-level `,` or `)`, which is what a row of
    /// a `VALUES` list needs.
    pub fn parse_delimited_expression(&mut self) -> Result<(Expression, usize), ParseError> {
        let expr = self.parse_expression(Precedence::Lowest);
        if let Some(expr) = expr {
            if !(self.peek_token_is(TokenType::Eof)
                || self.peek_token_is_punctuator(",")
                || self.peek_token_is_punctuator(")"))
            {
                let token = self.peek_token.clone();
                self.add_error_at(format!("unexpected token '{}'", token.literal), &token);
            } else if self.errors.is_empty() {
                return Ok((expr, self.cur_token.end));
            }
        }
        Err(self.first_error())
    }

    fn first_error(&mut self) -> ParseError {
        if self.errors.is_empty() {
            return ParseError::with_context(
                "failed to parse expression",
                self.cur_token.position,
                self.source(),
            );
        }
        let mut err = self.errors.swap_remove(0);
        err.context = self.source().to_string();
        err
    }

    /// Advance to the next token
    pub(crate) fn next_token(&mut self) {
        self.cur_token = std::mem::replace(&mut self.peek_token, self.lexer.next_token());
        if self.cur_token.is_error() {
            let token = self.cur_token.clone();
            let message = token
                .error
                .clone()
                .unwrap_or_else(|| "invalid token".to_string());
            self.add_error_at(message, &token);
        }
    }

    /// Check if the current token is of the given type
    pub(crate) fn cur_token_is(&self, t: TokenType) -> bool {
        self.cur_token.token_type == t
    }

    /// Check if the peek token is of the given type
    pub(crate) fn peek_token_is(&self, t: TokenType) -> bool {
        self.peek_token.token_type == t
    }

    /// Check if the current token is a specific keyword
    pub(crate) fn cur_token_is_keyword(&self, keyword: &str) -> bool {
        self.cur_token.is_keyword(keyword)
    }

    /// Check if the peek token is a specific keyword
    pub(crate) fn peek_token_is_keyword(&self, keyword: &str) -> bool {
        self.peek_token.is_keyword(keyword)
    }

    /// Check if the current token is a specific punctuator
    pub(crate) fn cur_token_is_punctuator(&self, punc: &str) -> bool {
        self.cur_token.is_punctuator(punc)
    }

    /// Check if the peek token is a specific punctuator
    pub(crate) fn peek_token_is_punctuator(&self, punc: &str) -> bool {
        self.peek_token.is_punctuator(punc)
    }

    /// Expect the peek token to be a specific punctuator and advance
    pub(crate) fn expect_punctuator(&mut self, punc: &str) -> bool {
        if self.peek_token_is_punctuator(punc) {
            self.next_token();
            true
        } else {
            let token = self.peek_token.clone();
            self.add_error_at(
                format!("expected '{}', got '{}'", punc, token.literal),
                &token,
            );
            false
        }
    }

    /// Expect the peek token to be a specific keyword and advance
    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_token_is_keyword(keyword) {
            self.next_token();
            true
        } else {
            let token = self.peek_token.clone();
            self.add_error_at(
                format!("expected keyword {}, got '{}'", keyword, token.literal),
                &token,
            );
            false
        }
    }

    /// Get the precedence of the peek token
    pub(crate) fn peek_precedence(&self) -> Precedence {
        Self::token_precedence(&self.peek_token)
    }

    /// Get the precedence of the current token
    pub(crate) fn cur_precedence(&self) -> Precedence {
        Self::token_precedence(&self.cur_token)
    }

    fn token_precedence(token: &Token) -> Precedence {
        match token.token_type {
            // NOT in infix position only ever starts NOT LIKE
            TokenType::Keyword if token.is_keyword("NOT") => Precedence::Equals,
            TokenType::Operator | TokenType::Keyword => Precedence::for_operator(&token.literal),
            TokenType::Punctuator if token.literal == "(" => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }

    /// Add an error at the current token
    pub(crate) fn add_error(&mut self, msg: String) {
        self.errors.push(ParseError::new(msg, self.cur_token.position));
    }

    fn add_error_at(&mut self, msg: String, token: &Token) {
        self.errors.push(ParseError::new(msg, token.position));
    }

    /// Get collected errors
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }
}
