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

//! Template structure
//!
//! The immutable, shareable part of a template: the token skeleton with
//! literal positions cut out, one slot per literal, and the compiled
//! program that computes the result from the slot columns.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;

use super::literal::{placeholder_name, replace_literals, LiteralSlot};
use crate::core::{Column, DataType, Error, Result};
use crate::executor::expression::{CompileContext, ExprCompiler, Program};
use crate::functions::{global_registry, FunctionRegistry};
use crate::parser::ast::{CastExpression, Expression};
use crate::parser::{TokenSpan, TokenType};

/// A non-literal token of the skeleton, as spelled in the example
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SkeletonToken {
    pub text: String,
    pub token_type: TokenType,
}

/// What template deduction may consult
#[derive(Debug, Clone)]
pub struct DeductionContext {
    functions: Arc<FunctionRegistry>,
    accurate_types_of_literals: bool,
}

impl DeductionContext {
    pub fn new(functions: Arc<FunctionRegistry>) -> Self {
        Self {
            functions,
            accurate_types_of_literals: false,
        }
    }

    /// Let a literal forming the whole expression take the target type
    pub fn with_accurate_types(mut self, enabled: bool) -> Self {
        self.accurate_types_of_literals = enabled;
        self
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn accurate_types_of_literals(&self) -> bool {
        self.accurate_types_of_literals
    }
}

impl Default for DeductionContext {
    fn default() -> Self {
        Self::new(Arc::clone(global_registry()))
    }
}

/// Everything about a template that can be derived without compiling it
#[derive(Debug, Clone)]
pub(crate) struct TemplateShape {
    pub(crate) tokens: Vec<SkeletonToken>,
    pub(crate) token_after_literal: Vec<usize>,
    pub(crate) slots: Vec<LiteralSlot>,
    pub(crate) rewritten: Expression,
}

impl TemplateShape {
    /// Find the literals of `expr` and cut them out of its tokens
    pub(crate) fn analyze(
        result_type: &DataType,
        span: &TokenSpan<'_>,
        expr: &Expression,
        ctx: &DeductionContext,
    ) -> Result<Self> {
        let source = span.source();
        let (rewritten, literals) =
            replace_literals(expr, source, result_type, ctx.accurate_types_of_literals())?;

        let mut tokens = Vec::with_capacity(span.tokens().len());
        let mut token_starts = Vec::with_capacity(span.tokens().len());
        let mut covered = vec![false; literals.len()];

        for token in span.tokens() {
            if token.is_error() {
                return Err(Error::template(
                    source,
                    format!("unrecognized token at {}", token.position),
                ));
            }
            let start = token.start();
            let literal = literals
                .iter()
                .position(|l| l.span.contains(start, token.end));
            match literal {
                Some(i) => covered[i] = true,
                None => {
                    tokens.push(SkeletonToken {
                        text: token.text(source).to_string(),
                        token_type: token.token_type,
                    });
                    token_starts.push(start);
                }
            }
        }

        if covered.iter().any(|c| !c) {
            return Err(Error::template(
                source,
                "literal does not line up with the expression tokens",
            ));
        }
        if tokens.is_empty() && literals.is_empty() {
            return Err(Error::template(source, "empty expression"));
        }

        let token_after_literal = literals
            .iter()
            .map(|l| token_starts.partition_point(|&s| s < l.span.start))
            .collect();

        Ok(Self {
            tokens,
            token_after_literal,
            slots: literals.into_iter().map(|l| l.slot).collect(),
            rewritten,
        })
    }

    /// Hash of everything that makes two templates interchangeable
    pub(crate) fn structural_hash(&self, result_type: &DataType, salt: &str) -> u64 {
        let mut hasher = FxHasher::default();
        self.tokens.hash(&mut hasher);
        self.token_after_literal.hash(&mut hasher);
        self.slots.hash(&mut hasher);
        result_type.hash(&mut hasher);
        salt.hash(&mut hasher);
        hasher.finish()
    }
}

/// Deduced template of an expression
///
/// Shared between [`ExpressionTemplate`](super::ExpressionTemplate)
/// instances through the cache; never mutated after construction.
#[derive(Debug)]
pub struct TemplateStructure {
    result_name: String,
    tokens: Vec<SkeletonToken>,
    token_after_literal: Vec<usize>,
    literal_slots: Vec<LiteralSlot>,
    program: Program,
    result_type: DataType,
    salt: String,
    structural_hash: u64,
}

impl TemplateStructure {
    /// Deduce the template of `expr`, whose tokens are `span`
    ///
    /// The template evaluates to `result_type`; a cast is appended when the
    /// expression naturally has another type.
    pub fn deduce(
        result_type: &DataType,
        span: &TokenSpan<'_>,
        expr: &Expression,
        ctx: &DeductionContext,
        salt: &str,
    ) -> Result<Self> {
        let shape = TemplateShape::analyze(result_type, span, expr, ctx)?;
        let hash = shape.structural_hash(result_type, salt);
        Self::from_shape(shape, result_type, ctx, salt, hash)
    }

    pub(crate) fn from_shape(
        shape: TemplateShape,
        result_type: &DataType,
        ctx: &DeductionContext,
        salt: &str,
        structural_hash: u64,
    ) -> Result<Self> {
        let columns: Vec<(String, DataType)> = shape
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (placeholder_name(i), slot.expected_type.clone()))
            .collect();
        let compile_ctx = CompileContext::new(&columns, ctx.functions());
        let compiler = ExprCompiler::new(&compile_ctx);

        let mut expr = shape.rewritten;
        let mut program = compiler
            .compile(&expr)
            .map_err(|e| Error::template(&expr, e.to_string()))?;
        if program.result_type() != result_type {
            expr = Expression::Cast(CastExpression::synthesized(expr, result_type.clone()));
            program = compiler
                .compile(&expr)
                .map_err(|e| Error::template(&expr, e.to_string()))?;
        }

        tracing::debug!(
            hash = structural_hash,
            slots = shape.slots.len(),
            tokens = shape.tokens.len(),
            "built expression template"
        );

        Ok(Self {
            result_name: expr.to_string(),
            tokens: shape.tokens,
            token_after_literal: shape.token_after_literal,
            literal_slots: shape.slots,
            program,
            result_type: result_type.clone(),
            salt: salt.to_string(),
            structural_hash,
        })
    }

    /// Returns true if `shape` deduces to this very template
    pub(crate) fn matches(&self, shape: &TemplateShape, result_type: &DataType, salt: &str) -> bool {
        self.result_type == *result_type
            && self.salt == salt
            && self.tokens == shape.tokens
            && self.token_after_literal == shape.token_after_literal
            && self.literal_slots == shape.slots
    }

    pub(crate) fn matches_structure(&self, other: &TemplateStructure) -> bool {
        self.result_type == other.result_type
            && self.salt == other.salt
            && self.tokens == other.tokens
            && self.token_after_literal == other.token_after_literal
            && self.literal_slots == other.literal_slots
    }

    /// Text of the rewritten expression, placeholders in place of literals
    pub fn result_name(&self) -> &str {
        &self.result_name
    }

    pub fn tokens(&self) -> &[SkeletonToken] {
        &self.tokens
    }

    /// For literal `i`, the number of skeleton tokens preceding it
    pub fn token_after_literal(&self) -> &[usize] {
        &self.token_after_literal
    }

    pub fn literal_slots(&self) -> &[LiteralSlot] {
        &self.literal_slots
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn result_type(&self) -> &DataType {
        &self.result_type
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn structural_hash(&self) -> u64 {
        self.structural_hash
    }

    /// Empty columns for a batch of slot values
    pub fn literal_columns(&self) -> Vec<Column> {
        self.literal_slots
            .iter()
            .map(|slot| Column::new(slot.expected_type.clone()))
            .collect()
    }
}
