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

//! VALUES list reader
//!
//! Reads the body of a `VALUES` clause, `(e1, e2), (e3, e4), ...`, into a
//! typed block. Each column keeps an expression template deduced from the
//! last row it could not match; rows that fit the template only have their
//! literals parsed and are evaluated in batches. A row that does not fit is
//! parsed and evaluated on its own, and becomes the example for a new
//! template.

use std::sync::Arc;

use rayon::prelude::*;

use crate::config::{FormatOptions, TemplateConfig};
use crate::core::{Block, Column, DataType, Error, Result, Value};
use crate::executor::expression::{CompileContext, ExecuteContext, ExprCompiler, ExprVM};
use crate::parser::ast::{CastExpression, Expression};
use crate::parser::{parse_expression_at, tokenize_with_escapes, TextCursor, TokenSpan};
use crate::template::{DeductionContext, ExpressionTemplate, TemplateCache};

/// Minimum number of pending template rows before batches are evaluated on
/// the rayon pool
pub const DEFAULT_PARALLEL_FLUSH_THRESHOLD: usize = 4_096;

/// Per-column parsing state
#[derive(Debug, Default)]
struct ColumnState {
    template: Option<ExpressionTemplate>,
    /// Deduction failed for this column; every row takes the general path
    deduction_disabled: bool,
    rows_from_template: usize,
    rows_from_fallback: usize,
}

/// Counters from the last [`ValuesReader::read`] call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub rows: usize,
    /// Fields matched by a template
    pub template_fields: usize,
    /// Fields parsed and evaluated on their own
    pub fallback_fields: usize,
}

/// Reader for `VALUES` row lists of a fixed column layout
#[derive(Debug, Clone)]
pub struct ValuesReader {
    column_types: Vec<DataType>,
    cache: Arc<TemplateCache>,
    deduction: DeductionContext,
    format: FormatOptions,
    config: TemplateConfig,
    salt: String,
}

impl ValuesReader {
    /// Create a reader producing columns of `column_types`
    pub fn new(column_types: Vec<DataType>) -> Self {
        Self::with_config(column_types, TemplateConfig::default())
    }

    /// Create a reader with its own cache sized by `config`
    pub fn with_config(column_types: Vec<DataType>, config: TemplateConfig) -> Self {
        Self {
            column_types,
            cache: Arc::new(TemplateCache::new(config.cache_size)),
            deduction: DeductionContext::default()
                .with_accurate_types(config.accurate_types_of_literals),
            format: FormatOptions::default(),
            config,
            salt: String::new(),
        }
    }

    /// Share a template cache with other readers
    pub fn with_cache(mut self, cache: Arc<TemplateCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_format(mut self, format: FormatOptions) -> Self {
        self.format = format;
        self
    }

    /// Use a custom function registry for deduction and evaluation
    pub fn with_deduction_context(mut self, deduction: DeductionContext) -> Self {
        self.deduction =
            deduction.with_accurate_types(self.config.accurate_types_of_literals);
        self
    }

    /// Keep this reader's templates apart from templates of other callers
    /// sharing the same cache
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = salt.into();
        self
    }

    pub fn column_types(&self) -> &[DataType] {
        &self.column_types
    }

    pub fn cache(&self) -> &Arc<TemplateCache> {
        &self.cache
    }

    /// Read every row of `input` into a block
    pub fn read(&self, input: &str) -> Result<Block> {
        self.read_with_stats(input).map(|(block, _)| block)
    }

    /// Read every row of `input`, also returning how each field was parsed
    pub fn read_with_stats(&self, input: &str) -> Result<(Block, ReadStats)> {
        let width = self.column_types.len();
        if width == 0 {
            return Err(Error::invalid_argument("VALUES reader needs at least one column"));
        }

        let mut output: Vec<Column> = self
            .column_types
            .iter()
            .map(|t| Column::new(t.clone()))
            .collect();
        let mut states: Vec<ColumnState> = (0..width).map(|_| ColumnState::default()).collect();
        let mut cursor = TextCursor::new(input);
        let mut rows = 0;

        loop {
            cursor.skip_whitespace();
            if cursor.is_eof() {
                break;
            }
            if rows > 0 {
                if !cursor.eat_char(',') {
                    return Err(self.unexpected(&cursor, "',' between rows"));
                }
                cursor.skip_whitespace();
            }
            if !cursor.eat_char('(') {
                return Err(self.unexpected(&cursor, "'('"));
            }

            for column in 0..width {
                if column > 0 {
                    cursor.skip_whitespace();
                    if !cursor.eat_char(',') {
                        return Err(self.arity_error(&mut cursor, rows, column));
                    }
                }
                self.read_field(&mut cursor, column, &mut states[column], &mut output[column])?;
            }

            cursor.skip_whitespace();
            if !cursor.eat_char(')') {
                return Err(self.arity_error(&mut cursor, rows, width));
            }
            rows += 1;
        }

        flush_all(&mut states, &mut output)?;

        let stats = ReadStats {
            rows,
            template_fields: states.iter().map(|s| s.rows_from_template).sum(),
            fallback_fields: states.iter().map(|s| s.rows_from_fallback).sum(),
        };
        tracing::debug!(
            rows,
            template_fields = stats.template_fields,
            fallback_fields = stats.fallback_fields,
            "read VALUES list"
        );
        Ok((Block::new(output, rows)?, stats))
    }

    fn read_field(
        &self,
        cursor: &mut TextCursor<'_>,
        column: usize,
        state: &mut ColumnState,
        output: &mut Column,
    ) -> Result<()> {
        if let Some(template) = state.template.as_mut() {
            if template.parse_field(cursor, &self.format, &[',', ')']) {
                state.rows_from_template += 1;
                return Ok(());
            }
        }

        tracing::debug!(
            column,
            offset = cursor.position(),
            "falling back to the general expression parser"
        );

        // General path: the pending batch goes first to keep row order
        if let Some(template) = state.template.take() {
            output.extend_from(&template.evaluate_all()?)?;
        }

        cursor.skip_whitespace();
        let start = cursor.position();
        let (expr, end) =
            parse_expression_at(cursor.input(), start, self.format.backslash_escapes)?;
        cursor.restore(end);
        state.rows_from_fallback += 1;

        let data_type = &self.column_types[column];
        output.push(self.evaluate_single(&expr, data_type)?)?;

        if self.config.deduce_templates && !state.deduction_disabled {
            let text = cursor.input().get(start..end).unwrap_or("");
            match self.deduce(text, data_type) {
                Ok(template) => state.template = Some(template),
                Err(err) => {
                    tracing::debug!(column, error = %err, "template deduction failed");
                    state.deduction_disabled = true;
                }
            }
        }
        Ok(())
    }

    /// Evaluate one expression without a template
    fn evaluate_single(&self, expr: &Expression, data_type: &DataType) -> Result<Value> {
        let compile_ctx = CompileContext::new(&[], self.deduction.functions());
        let compiler = ExprCompiler::new(&compile_ctx);
        let mut program = compiler.compile(expr)?;
        if program.result_type() != data_type {
            let cast = Expression::Cast(CastExpression::synthesized(expr.clone(), data_type.clone()));
            program = compiler.compile(&cast)?;
        }
        ExprVM::new().execute(&program, &ExecuteContext::empty())
    }

    fn deduce(&self, text: &str, data_type: &DataType) -> Result<ExpressionTemplate> {
        let escapes = self.format.backslash_escapes;
        let (expr, end) = parse_expression_at(text, 0, escapes)?;
        if end != text.len() {
            return Err(Error::template(text, "expression does not span the field"));
        }
        let span = TokenSpan::from_tokens(text, tokenize_with_escapes(text, escapes));
        let (structure, found) =
            self.cache
                .get_or_build(data_type, &span, &expr, &self.deduction, &self.salt)?;
        tracing::trace!(template = structure.result_name(), found, "using template");
        Ok(ExpressionTemplate::new(structure))
    }

    fn unexpected(&self, cursor: &TextCursor<'_>, expected: &str) -> Error {
        if cursor.is_eof() {
            return Error::UnexpectedEof {
                offset: cursor.position(),
            };
        }
        Error::parse(format!(
            "expected {} at offset {}, found '{}'",
            expected,
            cursor.position(),
            cursor.peek().unwrap_or_default()
        ))
    }

    /// Build the error for a row that ended early or has extra fields
    fn arity_error(&self, cursor: &mut TextCursor<'_>, row: usize, parsed: usize) -> Error {
        let expected = self.column_types.len();
        match cursor.peek() {
            Some(')') if parsed < expected => Error::RowArity {
                row,
                expected,
                got: parsed,
            },
            Some(',') if parsed == expected => {
                let mut got = parsed;
                while cursor.eat_char(',') {
                    match parse_expression_at(
                        cursor.input(),
                        cursor.position(),
                        self.format.backslash_escapes,
                    ) {
                        Ok((_, end)) => {
                            cursor.restore(end);
                            cursor.skip_whitespace();
                            got += 1;
                        }
                        Err(err) => return err.into(),
                    }
                }
                Error::RowArity { row, expected, got }
            }
            _ => self.unexpected(cursor, if parsed < expected { "','" } else { "')'" }),
        }
    }
}

/// Move every pending template batch into its output column
fn flush_all(states: &mut [ColumnState], output: &mut [Column]) -> Result<()> {
    let pending: usize = states
        .iter()
        .filter_map(|s| s.template.as_ref())
        .map(|t| t.rows_count())
        .sum();

    let flush = |(state, column): (&mut ColumnState, &mut Column)| -> Result<()> {
        if let Some(template) = state.template.take() {
            column.extend_from(&template.evaluate_all()?)?;
        }
        Ok(())
    };

    if pending >= DEFAULT_PARALLEL_FLUSH_THRESHOLD && states.len() > 1 {
        states.par_iter_mut().zip(output.par_iter_mut()).try_for_each(flush)
    } else {
        states.iter_mut().zip(output.iter_mut()).try_for_each(flush)
    }
}
