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

// Expression Compiler
//
// Transforms AST Expressions into typed Programs.
//
// Design principles:
// 1. Resolve everything at compile time (column indices, functions, cast targets)
// 2. Flatten recursion into linear instruction sequences
// 3. Handle short-circuit evaluation with jumps
// 4. Infer the static result type of every sub-expression

use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use super::ops::Op;
use super::program::{Program, ProgramBuilder};
use crate::core::{DataType, Value};
use crate::functions::{global_registry, FunctionRegistry};
use crate::parser::ast::*;

/// Compilation error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Column not found
    #[error("column not found: {0}")]
    ColumnNotFound(String),
    /// Function not found
    #[error("function not found: {0}")]
    FunctionNotFound(String),
    /// Invalid expression
    #[error("invalid expression: {0}")]
    InvalidExpression(String),
    /// Unsupported expression type
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),
    /// Type error
    #[error("type error: {0}")]
    TypeError(String),
}

/// Compilation context
///
/// Maps column names (case-insensitive) to their index and type in the
/// block the program will run against, and carries the function registry.
pub struct CompileContext<'a> {
    /// Column name -> (index, type)
    columns: FxHashMap<String, (u16, DataType)>,

    /// Function registry
    functions: &'a FunctionRegistry,
}

impl<'a> CompileContext<'a> {
    /// Create a new compilation context
    pub fn new(columns: &[(String, DataType)], functions: &'a FunctionRegistry) -> Self {
        let mut col_map = FxHashMap::default();
        for (i, (name, data_type)) in columns.iter().enumerate() {
            col_map
                .entry(name.to_lowercase())
                .or_insert((i as u16, data_type.clone()));
        }
        Self {
            columns: col_map,
            functions,
        }
    }

    /// Create context using global function registry
    pub fn with_global_registry(columns: &[(String, DataType)]) -> CompileContext<'static> {
        CompileContext::new(columns, global_registry())
    }

    /// Resolve a column name to its index and type
    fn resolve_column(&self, name: &str) -> Option<&(u16, DataType)> {
        self.columns
            .get(name)
            .or_else(|| self.columns.get(&name.to_lowercase()))
    }

    /// The function registry used for calls
    pub fn functions(&self) -> &'a FunctionRegistry {
        self.functions
    }
}

/// Expression compiler
pub struct ExprCompiler<'a> {
    ctx: &'a CompileContext<'a>,
}

impl<'a> ExprCompiler<'a> {
    pub fn new(ctx: &'a CompileContext<'a>) -> Self {
        Self { ctx }
    }

    /// Compile an expression into a Program
    pub fn compile(&self, expr: &Expression) -> Result<Program, CompileError> {
        let mut builder = ProgramBuilder::new();
        let result_type = self.compile_expr(expr, &mut builder)?;
        builder.emit(Op::Return);
        Ok(builder.build(result_type))
    }

    /// Static type of an expression without keeping the emitted code
    pub fn infer_type(&self, expr: &Expression) -> Result<DataType, CompileError> {
        let mut scratch = ProgramBuilder::new();
        self.compile_expr(expr, &mut scratch)
    }

    /// Compile an expression, emitting ops to the builder.
    /// Returns the static type of the value it leaves on the stack.
    fn compile_expr(
        &self,
        expr: &Expression,
        builder: &mut ProgramBuilder,
    ) -> Result<DataType, CompileError> {
        match expr {
            // === LITERALS ===
            Expression::IntegerLiteral(lit) => {
                builder.emit(Op::LoadConst(Value::Integer(lit.value)));
                Ok(DataType::Integer)
            }

            Expression::FloatLiteral(lit) => {
                builder.emit(Op::LoadConst(Value::Float(lit.value)));
                Ok(DataType::Float)
            }

            Expression::StringLiteral(lit) => {
                builder.emit(Op::LoadConst(Value::text(&lit.value)));
                Ok(DataType::Text)
            }

            Expression::BooleanLiteral(lit) => {
                builder.emit(Op::LoadConst(Value::Boolean(lit.value)));
                Ok(DataType::Boolean)
            }

            Expression::NullLiteral(_) => {
                builder.emit(Op::LoadConst(Value::Null));
                Ok(DataType::Null)
            }

            Expression::ArrayLiteral(lit) | Expression::TupleLiteral(lit) => {
                let data_type = lit.value.infer_type().ok_or_else(|| {
                    CompileError::TypeError(format!(
                        "no common type for elements of {}",
                        lit.value.to_literal()
                    ))
                })?;
                let value = lit
                    .value
                    .cast_to(&data_type)
                    .map_err(|e| CompileError::TypeError(e.to_string()))?;
                builder.emit(Op::LoadConst(value));
                Ok(data_type)
            }

            // === COLUMNS ===
            Expression::Identifier(id) => self.compile_column(&id.value, builder),
            Expression::Placeholder(p) => self.compile_column(&p.name, builder),

            // === COMPOSITES ===
            Expression::Array(list) => self.compile_array(list, builder),

            Expression::Tuple(list) => {
                let count = Self::element_count(list)?;
                let mut types = Vec::with_capacity(list.elements.len());
                for element in &list.elements {
                    types.push(self.compile_expr(element, builder)?);
                }
                builder.emit(Op::MakeTuple(count));
                Ok(DataType::Tuple(types))
            }

            // === OPERATORS ===
            Expression::Prefix(prefix) => self.compile_prefix(prefix, builder),
            Expression::Infix(infix) => self.compile_infix(infix, builder),
            Expression::Like(like) => self.compile_like(like, builder),

            Expression::IsNull(is_null) => {
                self.compile_expr(&is_null.expr, builder)?;
                builder.emit(if is_null.negated {
                    Op::IsNotNull
                } else {
                    Op::IsNull
                });
                Ok(DataType::Boolean)
            }

            Expression::Cast(cast) => {
                self.compile_expr(&cast.expr, builder)?;
                builder.emit(Op::Cast(cast.target.clone()));
                Ok(cast.target.clone())
            }

            Expression::FunctionCall(func) => self.compile_function(func, builder),
        }
    }

    fn compile_column(
        &self,
        name: &str,
        builder: &mut ProgramBuilder,
    ) -> Result<DataType, CompileError> {
        let (idx, data_type) = self
            .ctx
            .resolve_column(name)
            .ok_or_else(|| CompileError::ColumnNotFound(name.to_string()))?;
        builder.emit(Op::LoadColumn(*idx));
        Ok(data_type.clone())
    }

    fn element_count(list: &ListExpression) -> Result<u16, CompileError> {
        u16::try_from(list.elements.len()).map_err(|_| {
            CompileError::InvalidExpression(format!(
                "too many elements: {}",
                list.elements.len()
            ))
        })
    }

    /// Elements meet at their common supertype; each element whose own type
    /// differs is cast to it before the array is built.
    fn compile_array(
        &self,
        list: &ListExpression,
        builder: &mut ProgramBuilder,
    ) -> Result<DataType, CompileError> {
        let count = Self::element_count(list)?;

        let mut element_types = Vec::with_capacity(list.elements.len());
        let mut element_type: Option<DataType> = None;
        for element in &list.elements {
            let t = self.infer_type(element)?;
            element_type = Some(match element_type {
                None => t.clone(),
                Some(prev) => DataType::common_supertype(&prev, &t).ok_or_else(|| {
                    CompileError::TypeError(format!(
                        "array elements of types {} and {} have no common type",
                        prev, t
                    ))
                })?,
            });
            element_types.push(t);
        }
        let element_type = element_type.unwrap_or_default();

        for (element, t) in list.elements.iter().zip(&element_types) {
            self.compile_expr(element, builder)?;
            if *t != element_type {
                builder.emit(Op::Cast(element_type.clone()));
            }
        }
        builder.emit(Op::MakeArray(count));
        Ok(DataType::array(element_type))
    }

    fn compile_prefix(
        &self,
        prefix: &PrefixExpression,
        builder: &mut ProgramBuilder,
    ) -> Result<DataType, CompileError> {
        let operand = self.compile_expr(&prefix.right, builder)?;
        match prefix.op_type {
            PrefixOperator::Negate | PrefixOperator::Plus => {
                if !operand.is_numeric() && operand != DataType::Null {
                    return Err(CompileError::TypeError(format!(
                        "cannot apply unary {} to {}",
                        prefix.operator, operand
                    )));
                }
                if prefix.op_type == PrefixOperator::Negate {
                    builder.emit(Op::Neg);
                }
                Ok(operand)
            }
            PrefixOperator::Not => {
                Self::expect_boolean(&operand, "NOT")?;
                builder.emit(Op::Not);
                Ok(Self::with_nullability(&[&operand], DataType::Boolean))
            }
            PrefixOperator::Other => Err(CompileError::UnsupportedExpression(format!(
                "prefix operator {}",
                prefix.operator
            ))),
        }
    }

    fn compile_infix(
        &self,
        infix: &InfixExpression,
        builder: &mut ProgramBuilder,
    ) -> Result<DataType, CompileError> {
        match infix.op_type {
            // Short-circuit AND / OR
            InfixOperator::And | InfixOperator::Or => {
                let is_and = infix.op_type == InfixOperator::And;
                let left = self.compile_expr(&infix.left, builder)?;

                let jump_pos = builder.position();
                builder.emit(if is_and { Op::And(0) } else { Op::Or(0) });

                let right = self.compile_expr(&infix.right, builder)?;
                builder.emit(if is_and {
                    Op::AndFinalize
                } else {
                    Op::OrFinalize
                });

                let end_pos = builder.position();
                builder.patch_jump(jump_pos as usize, end_pos);

                Self::expect_boolean(&left, &infix.operator)?;
                Self::expect_boolean(&right, &infix.operator)?;
                Ok(Self::with_nullability(&[&left, &right], DataType::Boolean))
            }

            op if op.is_comparison() => {
                let left = self.compile_expr(&infix.left, builder)?;
                let right = self.compile_expr(&infix.right, builder)?;
                if DataType::common_supertype(left.non_nullable(), right.non_nullable()).is_none()
                {
                    return Err(CompileError::TypeError(format!(
                        "cannot compare {} with {}",
                        left, right
                    )));
                }
                builder.emit(match op {
                    InfixOperator::Equal => Op::Eq,
                    InfixOperator::NotEqual => Op::Ne,
                    InfixOperator::LessThan => Op::Lt,
                    InfixOperator::LessEqual => Op::Le,
                    InfixOperator::GreaterThan => Op::Gt,
                    _ => Op::Ge,
                });
                Ok(Self::with_nullability(&[&left, &right], DataType::Boolean))
            }

            op if op.is_arithmetic() => {
                let left = self.compile_expr(&infix.left, builder)?;
                let right = self.compile_expr(&infix.right, builder)?;
                let result = Self::arithmetic_type(&left, &right, &infix.operator)?;
                builder.emit(match op {
                    InfixOperator::Add => Op::Add,
                    InfixOperator::Subtract => Op::Sub,
                    InfixOperator::Multiply => Op::Mul,
                    InfixOperator::Divide => Op::Div,
                    _ => Op::Mod,
                });
                Ok(result)
            }

            InfixOperator::Concat => {
                let left = self.compile_expr(&infix.left, builder)?;
                let right = self.compile_expr(&infix.right, builder)?;
                builder.emit(Op::Concat);
                Ok(Self::with_nullability(&[&left, &right], DataType::Text))
            }

            _ => Err(CompileError::UnsupportedExpression(format!(
                "infix operator {}",
                infix.operator
            ))),
        }
    }

    fn compile_like(
        &self,
        like: &LikeExpression,
        builder: &mut ProgramBuilder,
    ) -> Result<DataType, CompileError> {
        let left = self.compile_expr(&like.left, builder)?;
        let pattern = self.compile_expr(&like.pattern, builder)?;
        for t in [&left, &pattern] {
            if !matches!(t.non_nullable(), DataType::Text | DataType::Null) {
                return Err(CompileError::TypeError(format!(
                    "LIKE requires text operands, got {}",
                    t
                )));
            }
        }
        builder.emit(Op::Like {
            negated: like.negated,
        });
        Ok(Self::with_nullability(&[&left, &pattern], DataType::Boolean))
    }

    fn compile_function(
        &self,
        func: &FunctionCall,
        builder: &mut ProgramBuilder,
    ) -> Result<DataType, CompileError> {
        let scalar_func = self
            .ctx
            .functions
            .get_scalar(&func.function)
            .ok_or_else(|| CompileError::FunctionNotFound(func.function.to_uppercase()))?;

        let arg_count = u8::try_from(func.arguments.len()).map_err(|_| {
            CompileError::InvalidExpression(format!(
                "too many arguments to {}",
                func.function
            ))
        })?;

        let mut arg_types = Vec::with_capacity(func.arguments.len());
        for arg in &func.arguments {
            arg_types.push(self.compile_expr(arg, builder)?);
        }

        let result = scalar_func
            .return_type(&arg_types)
            .map_err(|e| CompileError::TypeError(e.to_string()))?;

        builder.emit(Op::CallScalar {
            func: Arc::from(scalar_func),
            arg_count,
        });
        Ok(result)
    }

    // ========================================================================
    // TYPE RULES
    // ========================================================================

    fn expect_boolean(data_type: &DataType, operator: &str) -> Result<(), CompileError> {
        match data_type.non_nullable() {
            DataType::Boolean | DataType::Null => Ok(()),
            other => Err(CompileError::TypeError(format!(
                "{} requires boolean operands, got {}",
                operator, other
            ))),
        }
    }

    /// `Integer op Integer` stays integer, any float operand makes it float.
    /// NULL operands make the result nullable; `NULL op NULL` is NULL.
    fn arithmetic_type(
        left: &DataType,
        right: &DataType,
        operator: &str,
    ) -> Result<DataType, CompileError> {
        let check = |t: &DataType| {
            if t.is_numeric() || *t == DataType::Null {
                Ok(())
            } else {
                Err(CompileError::TypeError(format!(
                    "cannot apply {} to {}",
                    operator, t
                )))
            }
        };
        check(left)?;
        check(right)?;

        let inner = match (left.non_nullable(), right.non_nullable()) {
            (DataType::Null, DataType::Null) => return Ok(DataType::Null),
            (DataType::Null, t) | (t, DataType::Null) => t.clone(),
            (DataType::Integer, DataType::Integer) => DataType::Integer,
            _ => DataType::Float,
        };
        Ok(Self::with_nullability(&[left, right], inner))
    }

    fn with_nullability(operands: &[&DataType], inner: DataType) -> DataType {
        if operands.iter().any(|t| t.is_nullable()) {
            DataType::nullable(inner)
        } else {
            inner
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;

    fn infer(sql: &str) -> Result<DataType, CompileError> {
        let ctx = CompileContext::with_global_registry(&[
            ("a".to_string(), DataType::Integer),
            ("s".to_string(), DataType::nullable(DataType::Text)),
        ]);
        let expr = parse_expression(sql).unwrap();
        ExprCompiler::new(&ctx).compile(&expr).map(|p| p.result_type().clone())
    }

    #[test]
    fn test_arithmetic_types() {
        assert_eq!(infer("1 + 2").unwrap(), DataType::Integer);
        assert_eq!(infer("1 + 2.5").unwrap(), DataType::Float);
        assert_eq!(infer("a * 2").unwrap(), DataType::Integer);
        assert_eq!(
            infer("1 + NULL").unwrap(),
            DataType::nullable(DataType::Integer)
        );
        assert_eq!(infer("NULL - NULL").unwrap(), DataType::Null);
    }

    #[test]
    fn test_text_arithmetic_is_type_error() {
        assert!(matches!(infer("'x' + 1"), Err(CompileError::TypeError(_))));
        assert!(matches!(infer("-'x'"), Err(CompileError::TypeError(_))));
    }

    #[test]
    fn test_comparison_and_logic_types() {
        assert_eq!(infer("1 < 2.5").unwrap(), DataType::Boolean);
        assert_eq!(
            infer("s = 'x'").unwrap(),
            DataType::nullable(DataType::Boolean)
        );
        assert_eq!(infer("TRUE AND a > 1").unwrap(), DataType::Boolean);
        assert!(matches!(infer("1 AND TRUE"), Err(CompileError::TypeError(_))));
        assert!(matches!(infer("1 = 'x'"), Err(CompileError::TypeError(_))));
    }

    #[test]
    fn test_misc_types() {
        assert_eq!(infer("'a' || 1").unwrap(), DataType::Text);
        assert_eq!(infer("s IS NULL").unwrap(), DataType::Boolean);
        assert_eq!(
            infer("s LIKE 'a%'").unwrap(),
            DataType::nullable(DataType::Boolean)
        );
        assert_eq!(infer("CAST(a AS TEXT)").unwrap(), DataType::Text);
        assert_eq!(infer("lower('ABC')").unwrap(), DataType::Text);
        assert_eq!(infer("now()").unwrap(), DataType::Timestamp);
    }

    #[test]
    fn test_composite_types() {
        assert_eq!(
            infer("[1, 2.5]").unwrap(),
            DataType::array(DataType::Float)
        );
        assert_eq!(
            infer("[a, NULL]").unwrap(),
            DataType::array(DataType::nullable(DataType::Integer))
        );
        assert_eq!(
            infer("(a, 'x')").unwrap(),
            DataType::Tuple(vec![DataType::Integer, DataType::Text])
        );
        assert!(matches!(infer("[1, 'x']"), Err(CompileError::TypeError(_))));
    }

    #[test]
    fn test_resolution_errors() {
        assert_eq!(
            infer("missing + 1"),
            Err(CompileError::ColumnNotFound("missing".to_string()))
        );
        assert_eq!(
            infer("nosuchfn(1)"),
            Err(CompileError::FunctionNotFound("NOSUCHFN".to_string()))
        );
        assert!(matches!(infer("upper(1, 2)"), Err(CompileError::TypeError(_))));
    }

    #[test]
    fn test_constant_detection() {
        let ctx = CompileContext::with_global_registry(&[("a".to_string(), DataType::Integer)]);
        let compile = |sql: &str| {
            ExprCompiler::new(&ctx)
                .compile(&parse_expression(sql).unwrap())
                .unwrap()
        };
        assert!(compile("1 + 2").is_constant());
        assert!(!compile("a + 2").is_constant());
        assert!(!compile("now()").is_constant());
        assert!(compile("lower('X')").is_constant());
    }
}
