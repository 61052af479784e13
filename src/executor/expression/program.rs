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

// Compiled Expression Program
//
// A Program is the compiled form of an AST Expression.
// It contains:
// - A sequence of operations (the "bytecode")
// - The statically inferred result type
// - Metadata for efficient execution

use std::fmt;

use super::ops::Op;
use crate::core::{DataType, Value};

/// Compiled expression program
///
/// Cheap to share behind an `Arc`, linear to execute and self-contained.
#[derive(Clone)]
pub struct Program {
    /// The operation sequence
    ops: Vec<Op>,

    /// Maximum stack depth needed (for pre-allocation)
    max_stack_depth: usize,

    /// Type of the value produced by the program
    result_type: DataType,

    /// Whether the program reads no column and calls only
    /// deterministic functions
    is_constant: bool,
}

impl Program {
    /// Create a new program from operations
    pub fn new(ops: Vec<Op>, result_type: DataType, deterministic: bool) -> Self {
        let max_stack_depth = Self::compute_stack_depth(&ops);
        let reads_columns = ops.iter().any(|op| matches!(op, Op::LoadColumn(_)));

        Self {
            ops,
            max_stack_depth,
            result_type,
            is_constant: deterministic && !reads_columns,
        }
    }

    /// Program returning a single constant
    pub fn constant(value: Value, result_type: DataType) -> Self {
        Self::new(vec![Op::LoadConst(value), Op::Return], result_type, true)
    }

    /// Get the operations
    #[inline]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Get max stack depth
    #[inline]
    pub fn max_stack_depth(&self) -> usize {
        self.max_stack_depth
    }

    /// Type produced by the program
    #[inline]
    pub fn result_type(&self) -> &DataType {
        &self.result_type
    }

    /// True when the result does not depend on the row being evaluated
    #[inline]
    pub fn is_constant(&self) -> bool {
        self.is_constant
    }

    /// Check if program is empty
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Compute maximum stack depth
    fn compute_stack_depth(ops: &[Op]) -> usize {
        let mut depth: i64 = 0;
        let mut max_depth: i64 = 0;

        for op in ops {
            let effect: i64 = match op {
                // Push operations (+1)
                Op::LoadColumn(_) | Op::LoadConst(_) => 1,

                // Pop 2, push 1 (-1)
                Op::Eq
                | Op::Ne
                | Op::Lt
                | Op::Le
                | Op::Gt
                | Op::Ge
                | Op::Like { .. }
                | Op::AndFinalize
                | Op::OrFinalize
                | Op::Add
                | Op::Sub
                | Op::Mul
                | Op::Div
                | Op::Mod
                | Op::Concat => -1,

                // Pop 1, push 1 (0)
                Op::IsNull | Op::IsNotNull | Op::Not | Op::Neg | Op::Cast(_) => 0,

                // Jumps peek only
                Op::And(_) | Op::Or(_) => 0,

                // Pop n, push 1
                Op::MakeArray(n) | Op::MakeTuple(n) => 1 - i64::from(*n),
                Op::CallScalar { arg_count, .. } => 1 - i64::from(*arg_count),

                Op::Return => 0,
            };
            depth += effect;
            max_depth = max_depth.max(depth);
        }

        max_depth.max(1) as usize
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Program ({} ops, max stack: {}, type: {}, constant: {})",
            self.ops.len(),
            self.max_stack_depth,
            self.result_type,
            self.is_constant
        )?;
        for (i, op) in self.ops.iter().enumerate() {
            writeln!(f, "  {:4}: {:?}", i, op)?;
        }
        Ok(())
    }
}

/// Builder for constructing programs
pub struct ProgramBuilder {
    ops: Vec<Op>,
    deterministic: bool,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self {
            ops: Vec::with_capacity(32),
            deterministic: true,
        }
    }

    /// Emit an operation
    #[inline]
    pub fn emit(&mut self, op: Op) {
        if let Op::CallScalar { func, .. } = &op {
            self.deterministic &= func.is_deterministic();
        }
        self.ops.push(op);
    }

    /// Get current position (for jump targets)
    #[inline]
    pub fn position(&self) -> u16 {
        self.ops.len() as u16
    }

    /// Patch a jump target at a specific position
    pub fn patch_jump(&mut self, pos: usize, target: u16) {
        if let Some(Op::And(t) | Op::Or(t)) = self.ops.get_mut(pos) {
            *t = target;
        }
    }

    /// Build the final program
    pub fn build(self, result_type: DataType) -> Program {
        Program::new(self.ops, result_type, self.deterministic)
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}
