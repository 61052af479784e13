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

//! Expression template instance
//!
//! Accumulates the literal values of a batch of rows that share one
//! template and evaluates the whole batch at once.

use std::sync::Arc;

use super::structure::{DeductionContext, TemplateStructure};
use crate::config::FormatOptions;
use crate::core::{Column, DataType, Result};
use crate::executor::expression::{ExecuteContext, ExprVM};
use crate::parser::ast::Expression;
use crate::parser::{TextCursor, TokenSpan, TokenType};

/// A batch of rows parsed against one template
///
/// Owned by a single reader; `parse_row` either appends one value to every
/// slot column or leaves the instance untouched.
#[derive(Debug)]
pub struct ExpressionTemplate {
    structure: Arc<TemplateStructure>,
    columns: Vec<Column>,
    rows_count: usize,
}

impl ExpressionTemplate {
    /// Start an empty batch for an existing structure
    pub fn new(structure: Arc<TemplateStructure>) -> Self {
        let columns = structure.literal_columns();
        Self {
            structure,
            columns,
            rows_count: 0,
        }
    }

    /// Deduce a structure for `expr` and start an empty batch, bypassing
    /// any cache
    pub fn deduce(
        result_type: &DataType,
        span: &TokenSpan<'_>,
        expr: &Expression,
        ctx: &DeductionContext,
    ) -> Result<Self> {
        let structure = TemplateStructure::deduce(result_type, span, expr, ctx, "")?;
        Ok(Self::new(Arc::new(structure)))
    }

    /// Parse one row at the cursor
    ///
    /// On success the cursor is left after the row and true is returned.
    /// On mismatch the cursor and the batch are restored and false is
    /// returned.
    pub fn parse_row(&mut self, cursor: &mut TextCursor<'_>, options: &FormatOptions) -> bool {
        self.parse_field(cursor, options, &[])
    }

    /// Parse one row that must be followed by one of `delimiters`
    ///
    /// A template deduced from `1` matches the start of `1 + 1`; checking
    /// what follows the row rejects such partial matches. The delimiter is
    /// not consumed. An empty `delimiters` accepts anything.
    pub fn parse_field(
        &mut self,
        cursor: &mut TextCursor<'_>,
        options: &FormatOptions,
        delimiters: &[char],
    ) -> bool {
        let start = cursor.position();
        if self.try_parse_row(cursor, options) && at_delimiter(cursor, delimiters) {
            self.rows_count += 1;
            return true;
        }
        for column in &mut self.columns {
            column.truncate(self.rows_count);
        }
        cursor.restore(start);
        false
    }

    fn try_parse_row(&mut self, cursor: &mut TextCursor<'_>, options: &FormatOptions) -> bool {
        let structure = &self.structure;
        let slots = structure.literal_slots();
        let token_after_literal = structure.token_after_literal();
        let mut next_literal = 0;

        for (index, token) in structure.tokens().iter().enumerate() {
            while next_literal < slots.len() && token_after_literal[next_literal] == index {
                if !read_slot(&mut self.columns, structure, next_literal, cursor, options) {
                    return false;
                }
                next_literal += 1;
            }

            cursor.skip_whitespace();
            let word = token.token_type.is_word();
            let ignore_case = options.case_insensitive_keywords
                && matches!(token.token_type, TokenType::Keyword | TokenType::Identifier);
            if !cursor.eat_str(&token.text, word, ignore_case) {
                return false;
            }
        }

        while next_literal < slots.len() {
            if !read_slot(&mut self.columns, structure, next_literal, cursor, options) {
                return false;
            }
            next_literal += 1;
        }
        true
    }

    /// Rows accumulated so far
    pub fn rows_count(&self) -> usize {
        self.rows_count
    }

    /// Accumulated slot values, one column per literal
    pub fn literal_columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn structure(&self) -> &Arc<TemplateStructure> {
        &self.structure
    }

    /// Evaluate the template over every accumulated row
    ///
    /// Returns one value per row, in row order, of the template's result
    /// type. Calling it again re-runs the program on the same rows.
    pub fn evaluate_all(&self) -> Result<Column> {
        let program = self.structure.program();
        let result_type = self.structure.result_type().clone();
        if self.rows_count == 0 {
            return Ok(Column::new(result_type));
        }

        // Without slots nothing varies between rows; `now()` is taken once
        let mut vm = ExprVM::new();
        if program.is_constant() || self.columns.is_empty() {
            let value = vm.execute(program, &ExecuteContext::empty())?;
            return Column::repeat(result_type, &value, self.rows_count);
        }

        let mut result = Column::new(result_type);
        result.reserve(self.rows_count);
        for row in 0..self.rows_count {
            let ctx = ExecuteContext::for_columns(&self.columns, row);
            result.push(vm.execute(program, &ctx)?)?;
        }
        tracing::trace!(
            rows = self.rows_count,
            template = self.structure.result_name(),
            "evaluated template batch"
        );
        Ok(result)
    }
}

fn at_delimiter(cursor: &mut TextCursor<'_>, delimiters: &[char]) -> bool {
    if delimiters.is_empty() {
        return true;
    }
    cursor.skip_whitespace();
    cursor.peek().is_some_and(|c| delimiters.contains(&c))
}

fn read_slot(
    columns: &mut [Column],
    structure: &TemplateStructure,
    index: usize,
    cursor: &mut TextCursor<'_>,
    options: &FormatOptions,
) -> bool {
    let Some(value) = structure.literal_slots()[index].parse(cursor, options) else {
        return false;
    };
    columns[index].push(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Error, Value};
    use crate::parser::parse_with_tokens;

    fn template(sql: &str, ty: DataType) -> ExpressionTemplate {
        let (expr, span) = parse_with_tokens(sql).unwrap();
        ExpressionTemplate::deduce(&ty, &span, &expr, &DeductionContext::default()).unwrap()
    }

    fn feed(t: &mut ExpressionTemplate, row: &str) -> bool {
        let mut cursor = TextCursor::new(row);
        let ok = t.parse_row(&mut cursor, &FormatOptions::default());
        if ok {
            assert!(cursor.rest().trim().is_empty(), "row {row:?} not fully consumed");
        } else {
            assert_eq!(cursor.position(), 0);
        }
        ok
    }

    #[test]
    fn test_evaluate_sum() {
        let mut t = template("1 + 2", DataType::Integer);
        assert!(feed(&mut t, "1 + 2"));
        assert!(feed(&mut t, "3+4"));
        assert_eq!(t.rows_count(), 2);
        let column = t.evaluate_all().unwrap();
        assert_eq!(column.to_values(), vec![Value::Integer(3), Value::Integer(7)]);

        // Evaluation does not consume the batch
        assert_eq!(t.evaluate_all().unwrap().len(), 2);
    }

    #[test]
    fn test_mismatch_leaves_batch_unchanged() {
        let mut t = template("lower('A') || 'b'", DataType::Text);
        assert!(feed(&mut t, "lower('X') || 'y'"));
        // Second literal has the wrong syntax
        assert!(!feed(&mut t, "lower('X') || 5"));
        // Skeleton differs
        assert!(!feed(&mut t, "upper('X') || 'y'"));
        assert_eq!(t.rows_count(), 1);
        assert_eq!(
            t.evaluate_all().unwrap().to_values(),
            vec![Value::text("xy")]
        );
    }

    #[test]
    fn test_keyword_boundaries() {
        let mut t = template("CAST(1 AS FLOAT)", DataType::Float);
        assert!(feed(&mut t, "CAST( 2 AS FLOAT )"));
        assert!(!feed(&mut t, "CAST(2 ASFLOAT)"));
        assert!(!feed(&mut t, "cast(2 AS FLOAT)"));

        let mut cursor = TextCursor::new("cast(3 as float)");
        let options = FormatOptions::default().with_case_insensitive_keywords(true);
        assert!(t.parse_row(&mut cursor, &options));
        assert_eq!(
            t.evaluate_all().unwrap().to_values(),
            vec![Value::Float(2.0), Value::Float(3.0)]
        );
    }

    #[test]
    fn test_cast_to_target_type() {
        let mut t = template("2 * 3", DataType::Float);
        assert!(feed(&mut t, "2 * 3"));
        assert_eq!(t.evaluate_all().unwrap().to_values(), vec![Value::Float(6.0)]);
    }

    #[test]
    fn test_nullable_target() {
        let mut t = template("5", DataType::nullable(DataType::Integer));
        assert!(feed(&mut t, "5"));
        assert!(feed(&mut t, "NULL"));
        assert!(!feed(&mut t, "'5'"));
        assert_eq!(
            t.evaluate_all().unwrap().to_values(),
            vec![Value::Integer(5), Value::Null]
        );
    }

    #[test]
    fn test_no_literal_template() {
        let mut t = template("now()", DataType::Timestamp);
        assert!(feed(&mut t, "now()"));
        assert!(feed(&mut t, " now ( ) "));
        assert!(!feed(&mut t, "now(1)"));
        assert_eq!(t.rows_count(), 2);
        let values = t.evaluate_all().unwrap().to_values();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], values[1]);
    }

    #[test]
    fn test_nested_function_calls() {
        let mut t = template("upper('a') || upper('b')", DataType::Text);
        assert!(feed(&mut t, "upper('x') || upper('y')"));
        assert!(feed(&mut t, "upper('p') || upper('q')"));
        assert_eq!(
            t.evaluate_all().unwrap().to_values(),
            vec![Value::text("XY"), Value::text("PQ")]
        );
    }

    #[test]
    fn test_empty_batch() {
        let t = template("1 + 2", DataType::Integer);
        let column = t.evaluate_all().unwrap();
        assert!(column.is_empty());
        assert_eq!(column.data_type(), &DataType::Integer);
    }

    #[test]
    fn test_evaluation_error_surfaces() {
        let mut t = template("10 / 2", DataType::Integer);
        assert!(feed(&mut t, "10 / 2"));
        assert!(feed(&mut t, "1 / 0"));
        assert!(matches!(t.evaluate_all(), Err(Error::DivisionByZero)));

        let mut t = template("9223372036854775807 + 1", DataType::Integer);
        assert!(feed(&mut t, "9223372036854775807 + 1"));
        assert!(matches!(t.evaluate_all(), Err(Error::IntegerOverflow(_))));
    }

    #[test]
    fn test_parse_field_checks_delimiter() {
        let mut t = template("1", DataType::Integer);
        let options = FormatOptions::default();

        let mut cursor = TextCursor::new("1 + 1)");
        assert!(!t.parse_field(&mut cursor, &options, &[',', ')']));
        assert_eq!(cursor.position(), 0);
        assert_eq!(t.rows_count(), 0);

        let mut cursor = TextCursor::new("7 ), (8)");
        assert!(t.parse_field(&mut cursor, &options, &[',', ')']));
        assert_eq!(cursor.peek(), Some(')'));
        assert_eq!(t.rows_count(), 1);
    }

    #[test]
    fn test_signed_literals() {
        let mut t = template("-1 + 2", DataType::Integer);
        assert!(feed(&mut t, "-1 + 2"));
        assert!(feed(&mut t, "5 + 2"));
        assert!(!feed(&mut t, "5 + -2"));
        assert_eq!(
            t.evaluate_all().unwrap().to_values(),
            vec![Value::Integer(1), Value::Integer(7)]
        );
    }
}
