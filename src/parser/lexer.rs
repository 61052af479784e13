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

//! Expression lexer (tokenizer)
//!
//! The lexer works on byte offsets so that token spans can be sliced
//! straight out of the source text.

use super::token::{
    is_keyword, is_operator, is_operator_char, is_punctuator, is_word_char, Position, Token,
    TokenType,
};

/// Lexer over a borrowed input string
pub struct Lexer<'a> {
    /// Input string
    input: &'a str,
    /// Byte offset of the current char
    position: usize,
    /// Byte offset of the next char
    read_position: usize,
    /// Current character under examination
    ch: char,
    /// Current position tracking
    pos: Position,
    /// Whether a backslash escapes the following character inside strings
    backslash_escapes: bool,
    /// Last error encountered
    last_error: Option<String>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input
    pub fn new(input: &'a str) -> Self {
        Self::new_at(input, 0)
    }

    /// Create a lexer that starts reading at byte `offset`
    pub fn new_at(input: &'a str, offset: usize) -> Self {
        let mut lexer = Self {
            input,
            position: offset,
            read_position: offset,
            ch: '\0',
            pos: Position::new(offset, 1, 1),
            backslash_escapes: true,
            last_error: None,
        };
        lexer.read_char();
        lexer
    }

    /// Control backslash escapes inside string literals
    pub fn with_backslash_escapes(mut self, enabled: bool) -> Self {
        self.backslash_escapes = enabled;
        self
    }

    /// The input this lexer reads from
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Byte offset of the current character
    pub fn offset(&self) -> usize {
        self.position
    }

    /// Read the next character
    fn read_char(&mut self) {
        if self.ch == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else if self.ch != '\0' {
            self.pos.column += 1;
        }

        match self
            .input
            .get(self.read_position..)
            .and_then(|rest| rest.chars().next())
        {
            Some(c) => {
                self.ch = c;
                self.position = self.read_position;
                self.read_position += c.len_utf8();
            }
            None => {
                self.ch = '\0';
                self.position = self.input.len();
                self.read_position = self.input.len();
            }
        }

        self.pos.offset = self.position;
    }

    /// Peek at the next character without advancing
    fn peek_char(&self) -> char {
        self.input
            .get(self.read_position..)
            .and_then(|rest| rest.chars().next())
            .unwrap_or('\0')
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let pos = self.pos;

        match self.ch {
            '\0' => Token::eof(pos),

            '\'' => match self.read_string_literal() {
                Ok(()) => self.token_from(TokenType::String, pos),
                Err(message) => {
                    while self.ch != '\0' {
                        self.read_char();
                    }
                    let literal = self.input[pos.offset..self.position].to_string();
                    self.last_error = Some(message.clone());
                    Token::error(message, literal, pos, self.position)
                }
            },

            c if c.is_ascii_digit() => {
                let is_float = self.read_number();
                if is_float {
                    self.token_from(TokenType::Float, pos)
                } else {
                    self.token_from(TokenType::Integer, pos)
                }
            }

            // .5 is a float
            '.' if self.peek_char().is_ascii_digit() => {
                self.read_number();
                self.token_from(TokenType::Float, pos)
            }

            c if is_punctuator(c) => {
                self.read_char();
                Token::new(TokenType::Punctuator, c.to_string(), pos, self.position)
            }

            c if is_operator_char(c) => {
                let literal = self.read_operator();
                if is_operator(&literal) {
                    Token::new(TokenType::Operator, literal, pos, self.position)
                } else {
                    Token::error(
                        format!("unknown operator: {}", literal),
                        literal,
                        pos,
                        self.position,
                    )
                }
            }

            c if c.is_alphabetic() || c == '_' => {
                self.read_identifier();
                let text = &self.input[pos.offset..self.position];
                if is_keyword(text) {
                    Token::new(TokenType::Keyword, text.to_uppercase(), pos, self.position)
                } else {
                    Token::new(TokenType::Identifier, text, pos, self.position)
                }
            }

            c => {
                self.read_char();
                Token::error(
                    format!("unrecognized character: {:?}", c),
                    c.to_string(),
                    pos,
                    self.position,
                )
            }
        }
    }

    fn token_from(&self, token_type: TokenType, pos: Position) -> Token {
        Token::new(
            token_type,
            &self.input[pos.offset..self.position],
            pos,
            self.position,
        )
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while self.ch.is_whitespace() {
            self.read_char();
        }
    }

    /// Read an identifier
    fn read_identifier(&mut self) {
        self.read_char();
        while is_word_char(self.ch) {
            self.read_char();
        }
    }

    /// Read a number; returns true if it has a fraction or an exponent
    fn read_number(&mut self) -> bool {
        let mut is_float = false;

        while self.ch.is_ascii_digit() {
            self.read_char();
        }

        if self.ch == '.' && self.peek_char().is_ascii_digit() {
            is_float = true;
            self.read_char();
            while self.ch.is_ascii_digit() {
                self.read_char();
            }
        }

        if self.ch == 'e' || self.ch == 'E' {
            let next = self.peek_char();
            if next.is_ascii_digit() || next == '+' || next == '-' {
                is_float = true;
                self.read_char();
                if self.ch == '+' || self.ch == '-' {
                    self.read_char();
                }
                if !self.ch.is_ascii_digit() {
                    self.last_error =
                        Some("invalid number format: exponent has no digits".to_string());
                }
                while self.ch.is_ascii_digit() {
                    self.read_char();
                }
            }
        }

        is_float
    }

    /// Read a single-quoted string literal, leaving the raw text in the span
    fn read_string_literal(&mut self) -> Result<(), String> {
        let rest = &self.input[self.position..];
        let (_, consumed) = read_quoted(rest, '\'', self.backslash_escapes)
            .ok_or_else(|| "unterminated string literal".to_string())?;
        let end = self.position + consumed;
        while self.position < end && self.ch != '\0' {
            self.read_char();
        }
        Ok(())
    }

    /// Read an operator using maximal munch
    fn read_operator(&mut self) -> String {
        let mut result = String::new();
        let first_char = self.ch;
        result.push(first_char);
        self.read_char();

        if self.ch != '\0' {
            let two_chars: String = [first_char, self.ch].iter().collect();
            if is_operator(&two_chars) {
                result.push(self.ch);
                self.read_char();
            }
        }

        result
    }

    /// Get the last error encountered
    pub fn get_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Peek at the next token without advancing
    pub fn peek_token(&mut self) -> Token {
        let saved_position = self.position;
        let saved_read_position = self.read_position;
        let saved_ch = self.ch;
        let saved_pos = self.pos;

        let token = self.next_token();

        self.position = saved_position;
        self.read_position = saved_read_position;
        self.ch = saved_ch;
        self.pos = saved_pos;

        token
    }
}

/// Tokenize a whole expression, stopping before EOF
pub fn tokenize(input: &str) -> Vec<Token> {
    tokenize_with_escapes(input, true)
}

/// Tokenize with explicit handling of backslashes inside strings
pub fn tokenize_with_escapes(input: &str, backslash_escapes: bool) -> Vec<Token> {
    let mut lexer = Lexer::new(input).with_backslash_escapes(backslash_escapes);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        if token.is_eof() {
            break;
        }
        tokens.push(token);
    }
    tokens
}

/// Read a quoted string at the start of `text`
///
/// `text` must start with `quote`. Returns the unescaped content and the
/// number of bytes consumed including both quotes, or `None` if the string
/// is not terminated. A doubled quote stands for one quote; with
/// `backslash_escapes` a backslash escapes the next character.
pub fn read_quoted(text: &str, quote: char, backslash_escapes: bool) -> Option<(String, usize)> {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if c == quote => {}
        _ => return None,
    }

    let mut result = String::new();
    while let Some((i, c)) = chars.next() {
        if c == quote {
            // '' is an escaped quote
            if text[i + c.len_utf8()..].starts_with(quote) {
                result.push(quote);
                chars.next();
                continue;
            }
            return Some((result, i + c.len_utf8()));
        }
        if c == '\\' && backslash_escapes {
            let (_, escaped) = chars.next()?;
            result.push(match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '0' => '\0',
                other => other,
            });
            continue;
        }
        result.push(c);
    }
    None
}
