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

//! A readable cursor over raw row text
//!
//! Template row matching consumes text piece by piece and must be able to
//! put the cursor back where it started when a row does not match.

use super::token::is_word_char;

/// Cursor over a borrowed string, advancing by bytes on char boundaries
#[derive(Debug, Clone)]
pub struct TextCursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TextCursor<'a> {
    /// Create a cursor at the start of `input`
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Create a cursor at byte `pos` of `input`
    pub fn at(input: &'a str, pos: usize) -> Self {
        Self {
            input,
            pos: pos.min(input.len()),
        }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move back to a position previously returned by [`position`](Self::position)
    pub fn restore(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    /// The whole input
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Unconsumed text
    pub fn rest(&self) -> &'a str {
        self.input.get(self.pos..).unwrap_or("")
    }

    /// Returns true when all input has been consumed
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Next character without consuming it
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consume `n` bytes; `n` must land on a char boundary
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Consume one character if it equals `expected`
    pub fn eat_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance(expected.len_utf8());
            true
        } else {
            false
        }
    }

    /// Skip whitespace
    pub fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    /// Consume `text` if the input continues with it
    ///
    /// With `word` set the match must also end on a word boundary, so that
    /// `AS` does not match the start of `ASC`. With `ignore_case` ASCII case
    /// differences are accepted.
    pub fn eat_str(&mut self, text: &str, word: bool, ignore_case: bool) -> bool {
        let rest = self.rest();
        let Some(candidate) = rest.get(..text.len()) else {
            return false;
        };
        let matches = if ignore_case {
            candidate.eq_ignore_ascii_case(text)
        } else {
            candidate == text
        };
        if !matches {
            return false;
        }
        if word && rest[text.len()..].chars().next().is_some_and(is_word_char) {
            return false;
        }
        self.advance(text.len());
        true
    }

    /// Consume the longest prefix whose chars satisfy `pred`
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(rest.len(), |(i, _)| i);
        self.advance(len);
        &rest[..len]
    }

    /// Returns true if the next char continues a word
    pub fn at_word_char(&self) -> bool {
        self.peek().is_some_and(is_word_char)
    }
}
