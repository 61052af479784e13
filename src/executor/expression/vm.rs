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

// Expression Virtual Machine
//
// The VM executes compiled Programs against one row of a column block.
// Design goals:
// - Linear instruction dispatch
// - Reusable across rows (the stack is cleared between uses)
// - No recursion
// - Errors instead of silent NULLs for overflow and division by zero

use std::cmp::Ordering;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::ops::{CompiledPattern, Op};
use super::program::Program;
use crate::core::{Block, Column, Error, Result, Value};
use crate::functions::scalar::value_to_string;

/// Stack capacity for inline storage (avoids heap allocation for simple expressions)
const STACK_INLINE_CAPACITY: usize = 16;

/// Capacity for reusable args buffer (most functions have <= 4 args)
const ARGS_BUFFER_CAPACITY: usize = 8;

/// Upper bound on distinct LIKE patterns kept per VM
const MAX_CACHED_PATTERNS: usize = 256;

/// Arithmetic operation type
#[derive(Clone, Copy)]
enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithmeticOp {
    fn name(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "addition",
            ArithmeticOp::Sub => "subtraction",
            ArithmeticOp::Mul => "multiplication",
            ArithmeticOp::Div => "division",
            ArithmeticOp::Mod => "modulo",
        }
    }
}

/// Execution context for the VM
///
/// `LoadColumn(i)` reads column `i` at `row`. Programs without column loads
/// may run against [`ExecuteContext::empty`].
#[derive(Clone, Copy)]
pub struct ExecuteContext<'a> {
    /// Column data
    pub columns: &'a [Column],

    /// Row being evaluated
    pub row: usize,
}

impl<'a> ExecuteContext<'a> {
    /// Create a context for one row of a block
    #[inline]
    pub fn new(block: &'a Block, row: usize) -> Self {
        Self {
            columns: block.columns(),
            row,
        }
    }

    /// Create a context for one row of loose, equal-length columns
    #[inline]
    pub fn for_columns(columns: &'a [Column], row: usize) -> Self {
        Self { columns, row }
    }

    /// Context with no columns
    #[inline]
    pub fn empty() -> Self {
        Self {
            columns: &[],
            row: 0,
        }
    }

    /// Move to another row of the same columns
    #[inline]
    pub fn at_row(mut self, row: usize) -> Self {
        self.row = row;
        self
    }

    fn load_column(&self, idx: u16) -> Result<Value> {
        self.columns
            .get(idx as usize)
            .and_then(|column| column.get(self.row))
            .ok_or_else(|| {
                Error::internal(format!(
                    "column {} row {} is not available to the program",
                    idx, self.row
                ))
            })
    }
}

/// Expression Virtual Machine
///
/// Executes compiled Programs against row data.
/// The VM is reusable - call execute() with different contexts.
pub struct ExprVM {
    /// Evaluation stack (reused between executions)
    stack: SmallVec<[Value; STACK_INLINE_CAPACITY]>,

    /// Reusable buffer for function arguments
    args_buffer: SmallVec<[Value; ARGS_BUFFER_CAPACITY]>,

    /// LIKE patterns seen by this VM
    patterns: FxHashMap<String, CompiledPattern>,
}

impl Default for ExprVM {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprVM {
    /// Create a new VM with default stack capacity
    pub fn new() -> Self {
        Self {
            stack: SmallVec::new(),
            args_buffer: SmallVec::new(),
            patterns: FxHashMap::default(),
        }
    }

    /// Execute a program and return the result
    pub fn execute(&mut self, program: &Program, ctx: &ExecuteContext) -> Result<Value> {
        self.stack.clear();
        if self.stack.capacity() < program.max_stack_depth() {
            self.stack.reserve(program.max_stack_depth());
        }

        let ops = program.ops();
        let mut pc: usize = 0;

        while let Some(op) = ops.get(pc) {
            match op {
                // =============================================================
                // LOADS
                // =============================================================
                Op::LoadColumn(idx) => {
                    let v = ctx.load_column(*idx)?;
                    self.stack.push(v);
                }

                Op::LoadConst(v) => self.stack.push(v.clone()),

                // =============================================================
                // COMPARISONS
                // =============================================================
                Op::Eq | Op::Ne | Op::Lt | Op::Le | Op::Gt | Op::Ge => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    let result = match a.compare(&b)? {
                        None => Value::Null,
                        Some(ord) => Value::Boolean(match op {
                            Op::Eq => ord == Ordering::Equal,
                            Op::Ne => ord != Ordering::Equal,
                            Op::Lt => ord == Ordering::Less,
                            Op::Le => ord != Ordering::Greater,
                            Op::Gt => ord == Ordering::Greater,
                            _ => ord != Ordering::Less,
                        }),
                    };
                    self.stack.push(result);
                }

                Op::IsNull => {
                    let v = self.pop()?;
                    self.stack.push(Value::Boolean(v.is_null()));
                }

                Op::IsNotNull => {
                    let v = self.pop()?;
                    self.stack.push(Value::Boolean(!v.is_null()));
                }

                Op::Like { negated } => {
                    let pattern = self.pop()?;
                    let text = self.pop()?;
                    let result = match (&text, &pattern) {
                        (Value::Null, _) | (_, Value::Null) => Value::Null,
                        (Value::Text(s), Value::Text(p)) => {
                            Value::Boolean(self.like(s, p) != *negated)
                        }
                        _ => {
                            return Err(Error::type_mismatch(
                                "TEXT",
                                format!("{} LIKE {}", text.type_name(), pattern.type_name()),
                            ))
                        }
                    };
                    self.stack.push(result);
                }

                // =============================================================
                // LOGIC
                // =============================================================
                Op::And(jump_target) => {
                    if matches!(self.stack.last(), Some(Value::Boolean(false))) {
                        pc = *jump_target as usize;
                        continue;
                    }
                }

                Op::Or(jump_target) => {
                    if matches!(self.stack.last(), Some(Value::Boolean(true))) {
                        pc = *jump_target as usize;
                        continue;
                    }
                }

                Op::AndFinalize => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    let result = match (Self::to_tribool(&a)?, Self::to_tribool(&b)?) {
                        (Some(false), _) | (_, Some(false)) => Value::Boolean(false),
                        (Some(true), Some(true)) => Value::Boolean(true),
                        _ => Value::Null,
                    };
                    self.stack.push(result);
                }

                Op::OrFinalize => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    let result = match (Self::to_tribool(&a)?, Self::to_tribool(&b)?) {
                        (Some(true), _) | (_, Some(true)) => Value::Boolean(true),
                        (Some(false), Some(false)) => Value::Boolean(false),
                        _ => Value::Null,
                    };
                    self.stack.push(result);
                }

                Op::Not => {
                    let v = self.pop()?;
                    let result = match Self::to_tribool(&v)? {
                        Some(b) => Value::Boolean(!b),
                        None => Value::Null,
                    };
                    self.stack.push(result);
                }

                // =============================================================
                // ARITHMETIC
                // =============================================================
                Op::Add => self.binary_arithmetic(ArithmeticOp::Add)?,
                Op::Sub => self.binary_arithmetic(ArithmeticOp::Sub)?,
                Op::Mul => self.binary_arithmetic(ArithmeticOp::Mul)?,
                Op::Div => self.binary_arithmetic(ArithmeticOp::Div)?,
                Op::Mod => self.binary_arithmetic(ArithmeticOp::Mod)?,

                Op::Neg => {
                    let v = self.pop()?;
                    let result = match v {
                        Value::Null => Value::Null,
                        Value::Integer(i) => i
                            .checked_neg()
                            .map(Value::Integer)
                            .ok_or(Error::IntegerOverflow("negation"))?,
                        Value::Float(f) => Value::Float(-f),
                        other => return Err(Error::type_mismatch("numeric", other.type_name())),
                    };
                    self.stack.push(result);
                }

                Op::Concat => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    let result = if a.is_null() || b.is_null() {
                        Value::Null
                    } else {
                        let mut s = value_to_string(&a);
                        s.push_str(&value_to_string(&b));
                        Value::text(s)
                    };
                    self.stack.push(result);
                }

                // =============================================================
                // CONSTRUCTORS AND CONVERSIONS
                // =============================================================
                Op::MakeArray(n) | Op::MakeTuple(n) => {
                    let n = *n as usize;
                    if self.stack.len() < n {
                        return Err(Error::internal("expression stack underflow"));
                    }
                    let start = self.stack.len() - n;
                    let items: Vec<Value> = self.stack.drain(start..).collect();
                    self.stack.push(if matches!(op, Op::MakeArray(_)) {
                        Value::array(items)
                    } else {
                        Value::tuple(items)
                    });
                }

                Op::Cast(target) => {
                    let v = self.pop()?;
                    self.stack.push(v.cast_to(target)?);
                }

                Op::CallScalar { func, arg_count } => {
                    let n = *arg_count as usize;
                    if self.stack.len() < n {
                        return Err(Error::internal("expression stack underflow"));
                    }
                    self.args_buffer.clear();
                    let start = self.stack.len() - n;
                    self.args_buffer.extend(self.stack.drain(start..));
                    let result = func.evaluate(&self.args_buffer)?;
                    self.stack.push(result);
                }

                Op::Return => return self.pop(),
            }
            pc += 1;
        }

        Ok(self.stack.pop().unwrap_or(Value::Null))
    }

    #[inline]
    fn pop(&mut self) -> Result<Value> {
        self.stack
            .pop()
            .ok_or_else(|| Error::internal("expression stack underflow"))
    }

    fn to_tribool(v: &Value) -> Result<Option<bool>> {
        match v {
            Value::Boolean(b) => Ok(Some(*b)),
            Value::Null => Ok(None),
            other => Err(Error::type_mismatch("BOOLEAN", other.type_name())),
        }
    }

    fn like(&mut self, text: &str, pattern: &str) -> bool {
        if let Some(compiled) = self.patterns.get(pattern) {
            return compiled.matches(text);
        }
        if self.patterns.len() >= MAX_CACHED_PATTERNS {
            self.patterns.clear();
        }
        let compiled = CompiledPattern::compile(pattern);
        let matched = compiled.matches(text);
        self.patterns.insert(pattern.to_string(), compiled);
        matched
    }

    fn binary_arithmetic(&mut self, op: ArithmeticOp) -> Result<()> {
        let b = self.pop()?;
        let a = self.pop()?;
        let result = Self::arithmetic_op(&a, &b, op)?;
        self.stack.push(result);
        Ok(())
    }

    fn arithmetic_op(a: &Value, b: &Value, op: ArithmeticOp) -> Result<Value> {
        match (a, b) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Integer(x), Value::Integer(y)) => {
                let result = match op {
                    ArithmeticOp::Add => x.checked_add(*y),
                    ArithmeticOp::Sub => x.checked_sub(*y),
                    ArithmeticOp::Mul => x.checked_mul(*y),
                    ArithmeticOp::Div | ArithmeticOp::Mod if *y == 0 => {
                        return Err(Error::DivisionByZero)
                    }
                    ArithmeticOp::Div => x.checked_div(*y),
                    ArithmeticOp::Mod => x.checked_rem(*y),
                };
                result
                    .map(Value::Integer)
                    .ok_or(Error::IntegerOverflow(op.name()))
            }
            (Value::Integer(x), Value::Float(y)) => Self::float_op(*x as f64, *y, op),
            (Value::Float(x), Value::Integer(y)) => Self::float_op(*x, *y as f64, op),
            (Value::Float(x), Value::Float(y)) => Self::float_op(*x, *y, op),
            _ => Err(Error::type_mismatch(
                "numeric",
                format!("{} and {}", a.type_name(), b.type_name()),
            )),
        }
    }

    fn float_op(x: f64, y: f64, op: ArithmeticOp) -> Result<Value> {
        let result = match op {
            ArithmeticOp::Add => x + y,
            ArithmeticOp::Sub => x - y,
            ArithmeticOp::Mul => x * y,
            ArithmeticOp::Div | ArithmeticOp::Mod if y == 0.0 => return Err(Error::DivisionByZero),
            ArithmeticOp::Div => x / y,
            ArithmeticOp::Mod => x % y,
        };
        Ok(Value::Float(result))
    }
}
