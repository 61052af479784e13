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

// Expression VM Operations
//
// Each operation is self-contained: column indices, constants, functions
// and cast targets are all resolved at compile time.

use std::fmt;

use crate::core::{DataType, Value};
use crate::functions::ScalarFunction;

/// Compiled LIKE pattern
///
/// Simple shapes avoid the regex engine entirely.
#[derive(Debug, Clone)]
pub enum CompiledPattern {
    /// Exact match (no wildcards)
    Exact(String),
    /// Prefix match: "abc%"
    Prefix(String),
    /// Suffix match: "%abc"
    Suffix(String),
    /// Contains match: "%abc%"
    Contains(String),
    /// Complex pattern requiring regex
    Regex(regex::Regex),
    /// Match all: "%"
    MatchAll,
}

impl CompiledPattern {
    /// Compile a LIKE pattern. `\` escapes the next character.
    pub fn compile(pattern: &str) -> Self {
        let has_escape = pattern.contains('\\');
        let has_underscore = pattern.contains('_');
        let has_percent = pattern.contains('%');

        if !has_escape {
            if !has_percent && !has_underscore {
                return CompiledPattern::Exact(pattern.to_string());
            }
            if pattern == "%" {
                return CompiledPattern::MatchAll;
            }
            if !has_underscore {
                let inner = pattern.trim_matches('%');
                if !inner.contains('%') {
                    let leading = pattern.starts_with('%');
                    let trailing = pattern.ends_with('%') && pattern.len() > 1;
                    match (leading, trailing) {
                        (false, true) => return CompiledPattern::Prefix(inner.to_string()),
                        (true, false) => return CompiledPattern::Suffix(inner.to_string()),
                        (true, true) => return CompiledPattern::Contains(inner.to_string()),
                        (false, false) => {}
                    }
                }
            }
        }

        match regex::Regex::new(&format!("(?s)^{}$", Self::like_to_regex(pattern))) {
            Ok(re) => CompiledPattern::Regex(re),
            Err(_) => CompiledPattern::Exact(pattern.to_string()),
        }
    }

    /// Convert LIKE pattern to regex (% -> .*, _ -> .)
    fn like_to_regex(pattern: &str) -> String {
        let mut result = String::with_capacity(pattern.len() * 2);
        let mut chars = pattern.chars();

        while let Some(c) = chars.next() {
            match c {
                '%' => result.push_str(".*"),
                '_' => result.push('.'),
                '\\' => match chars.next() {
                    Some(next) => result.push_str(&regex::escape(&next.to_string())),
                    None => result.push_str(&regex::escape("\\")),
                },
                other => result.push_str(&regex::escape(&other.to_string())),
            }
        }
        result
    }

    /// Test a string against the pattern
    pub fn matches(&self, text: &str) -> bool {
        match self {
            CompiledPattern::Exact(p) => text == p,
            CompiledPattern::Prefix(p) => text.starts_with(p.as_str()),
            CompiledPattern::Suffix(p) => text.ends_with(p.as_str()),
            CompiledPattern::Contains(p) => text.contains(p.as_str()),
            CompiledPattern::Regex(re) => re.is_match(text),
            CompiledPattern::MatchAll => true,
        }
    }
}

/// Expression VM Operation
#[derive(Clone)]
pub enum Op {
    // =========================================================================
    // LOAD OPERATIONS - Push values onto stack
    // =========================================================================
    /// Load column value of the current row by pre-resolved index
    /// Stack: [] -> [value]
    LoadColumn(u16),

    /// Load constant value
    /// Stack: [] -> [value]
    LoadConst(Value),

    // =========================================================================
    // COMPARISON OPERATIONS - Pop 2, push bool (NULL if either side is NULL)
    // =========================================================================
    /// Equal: a == b
    Eq,
    /// Not equal: a != b
    Ne,
    /// Less than: a < b
    Lt,
    /// Less than or equal: a <= b
    Le,
    /// Greater than: a > b
    Gt,
    /// Greater than or equal: a >= b
    Ge,

    /// IS NULL check
    /// Stack: [value] -> [bool]
    IsNull,

    /// IS NOT NULL check
    /// Stack: [value] -> [bool]
    IsNotNull,

    /// LIKE with the pattern taken from the stack
    /// Stack: [text, pattern] -> [bool]
    Like { negated: bool },

    // =========================================================================
    // LOGICAL OPERATIONS (three-valued)
    // =========================================================================
    /// Short-circuit AND: jump to target if top is FALSE
    And(u16),
    /// Combine the two AND operands
    /// Stack: [a, b] -> [a AND b]
    AndFinalize,
    /// Short-circuit OR: jump to target if top is TRUE
    Or(u16),
    /// Combine the two OR operands
    /// Stack: [a, b] -> [a OR b]
    OrFinalize,
    /// Logical NOT
    /// Stack: [a] -> [NOT a]
    Not,

    // =========================================================================
    // ARITHMETIC OPERATIONS - Pop 2, push result
    // =========================================================================
    /// Addition: a + b
    Add,
    /// Subtraction: a - b
    Sub,
    /// Multiplication: a * b
    Mul,
    /// Division: a / b
    Div,
    /// Modulo: a % b
    Mod,
    /// Negation: -a
    /// Stack: [a] -> [-a]
    Neg,

    /// String concatenation: a || b
    Concat,

    // =========================================================================
    // CONSTRUCTORS AND CONVERSIONS
    // =========================================================================
    /// Build an array from the top n values
    /// Stack: [v1..vn] -> [array]
    MakeArray(u16),
    /// Build a tuple from the top n values
    /// Stack: [v1..vn] -> [tuple]
    MakeTuple(u16),
    /// Strict cast to the target type
    /// Stack: [v] -> [cast(v)]
    Cast(DataType),

    /// Call a scalar function with argc arguments
    /// Stack: [a1..an] -> [result]
    CallScalar {
        func: std::sync::Arc<dyn ScalarFunction>,
        arg_count: u8,
    },

    // =========================================================================
    // CONTROL FLOW
    // =========================================================================
    /// Return top of stack
    Return,
}

impl fmt::Debug for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::LoadColumn(idx) => write!(f, "LoadColumn({})", idx),
            Op::LoadConst(v) => write!(f, "LoadConst({})", v.to_literal()),
            Op::Eq => write!(f, "Eq"),
            Op::Ne => write!(f, "Ne"),
            Op::Lt => write!(f, "Lt"),
            Op::Le => write!(f, "Le"),
            Op::Gt => write!(f, "Gt"),
            Op::Ge => write!(f, "Ge"),
            Op::IsNull => write!(f, "IsNull"),
            Op::IsNotNull => write!(f, "IsNotNull"),
            Op::Like { negated } => write!(f, "Like(negated={})", negated),
            Op::And(t) => write!(f, "And(-> {})", t),
            Op::AndFinalize => write!(f, "AndFinalize"),
            Op::Or(t) => write!(f, "Or(-> {})", t),
            Op::OrFinalize => write!(f, "OrFinalize"),
            Op::Not => write!(f, "Not"),
            Op::Add => write!(f, "Add"),
            Op::Sub => write!(f, "Sub"),
            Op::Mul => write!(f, "Mul"),
            Op::Div => write!(f, "Div"),
            Op::Mod => write!(f, "Mod"),
            Op::Neg => write!(f, "Neg"),
            Op::Concat => write!(f, "Concat"),
            Op::MakeArray(n) => write!(f, "MakeArray({})", n),
            Op::MakeTuple(n) => write!(f, "MakeTuple({})", n),
            Op::Cast(t) => write!(f, "Cast({})", t),
            Op::CallScalar { func, arg_count } => {
                write!(f, "CallScalar({}, {})", func.name(), arg_count)
            }
            Op::Return => write!(f, "Return"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_shapes() {
        assert!(matches!(CompiledPattern::compile("abc"), CompiledPattern::Exact(_)));
        assert!(matches!(CompiledPattern::compile("abc%"), CompiledPattern::Prefix(_)));
        assert!(matches!(CompiledPattern::compile("%abc"), CompiledPattern::Suffix(_)));
        assert!(matches!(CompiledPattern::compile("%abc%"), CompiledPattern::Contains(_)));
        assert!(matches!(CompiledPattern::compile("%"), CompiledPattern::MatchAll));
        assert!(matches!(CompiledPattern::compile("a_c"), CompiledPattern::Regex(_)));
    }

    #[test]
    fn test_pattern_matching() {
        assert!(CompiledPattern::compile("a%").matches("apple"));
        assert!(!CompiledPattern::compile("a%").matches("banana"));
        assert!(CompiledPattern::compile("_pp%").matches("apple"));
        assert!(CompiledPattern::compile("a%e").matches("apple"));
        assert!(!CompiledPattern::compile("a%e").matches("apples"));
        assert!(CompiledPattern::compile("100\\%").matches("100%"));
        assert!(!CompiledPattern::compile("100\\%").matches("1000"));
        assert!(CompiledPattern::compile("a.b").matches("a.b"));
        assert!(!CompiledPattern::compile("a.b").matches("axb"));
    }
}
