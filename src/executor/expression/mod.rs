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

// Compiled Expression VM
//
// Expressions are compiled once into typed, linear bytecode and then run
// for every row of a column block.
//
//   ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//   │ Expression  │ ──► │ ExprCompiler │ ──► │   Program   │
//   │    (AST)    │     │              │     │  (bytecode) │
//   └─────────────┘     └──────────────┘     └─────────────┘
//                                                   │
//                                                   ▼
//   ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//   │   Result    │ ◄── │    ExprVM    │ ◄── │ Block, row  │
//   │   (Value)   │     │              │     │             │
//   └─────────────┘     └──────────────┘     └─────────────┘

mod compiler;
mod ops;
mod program;
mod vm;

pub use compiler::{CompileContext, CompileError, ExprCompiler};
pub use ops::{CompiledPattern, Op};
pub use program::{Program, ProgramBuilder};
pub use vm::{ExecuteContext, ExprVM};
