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

//! Literal slots
//!
//! A template replaces every literal of its example expression with a slot.
//! Each slot remembers the type its values must have and how the literal was
//! spelled, which decides how row text is read back at that position.

use crate::config::FormatOptions;
use crate::core::{parse_timestamp, DataType, Error, Result, Value};
use crate::parser::ast::{Expression, Placeholder, Span};
use crate::parser::{read_quoted, TextCursor};

/// How the raw text of a literal is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseStrategy {
    /// Unsigned integer or float
    Number,
    /// Number written with a leading sign
    SignedNumber,
    /// Single-quoted string
    QuotedString,
    /// TRUE or FALSE
    Boolean,
    /// The NULL token
    Null,
    /// `[..]` of literals
    Array,
    /// `(a, b, ..)` of literals
    Tuple,
}

impl ParseStrategy {
    /// Strategy for a literal node, given the source text of its span.
    /// Returns `None` for non-literal nodes.
    pub fn for_literal(expr: &Expression, text: &str) -> Option<Self> {
        let strategy = match expr {
            Expression::IntegerLiteral(_) | Expression::FloatLiteral(_) => {
                if text.starts_with(['-', '+']) {
                    ParseStrategy::SignedNumber
                } else {
                    ParseStrategy::Number
                }
            }
            Expression::StringLiteral(_) => ParseStrategy::QuotedString,
            Expression::BooleanLiteral(_) => ParseStrategy::Boolean,
            Expression::NullLiteral(_) => ParseStrategy::Null,
            Expression::ArrayLiteral(_) => ParseStrategy::Array,
            Expression::TupleLiteral(_) => ParseStrategy::Tuple,
            _ => return None,
        };
        Some(strategy)
    }
}

/// One literal position of a template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LiteralSlot {
    /// Type every value read at this position must have
    pub expected_type: DataType,
    /// How the literal text is recognized
    pub parse_strategy: ParseStrategy,
}

impl LiteralSlot {
    pub fn new(expected_type: DataType, parse_strategy: ParseStrategy) -> Self {
        Self {
            expected_type,
            parse_strategy,
        }
    }

    /// Read one value for this slot at the cursor
    ///
    /// Accepts only syntax consistent with the slot type: a non-nullable
    /// slot rejects the NULL spelling, an integer slot rejects `1.5`, a
    /// number followed by a word character is rejected. Returns `None` on
    /// mismatch; the cursor position is then unspecified.
    pub fn parse(&self, cursor: &mut TextCursor<'_>, options: &FormatOptions) -> Option<Value> {
        cursor.skip_whitespace();
        if self.expected_type.is_nullable() && eat_null(cursor, options) {
            return Some(Value::Null);
        }

        let data_type = self.expected_type.non_nullable();
        match self.parse_strategy {
            ParseStrategy::Null => None,
            ParseStrategy::Number => read_number(cursor, data_type, false, options),
            ParseStrategy::SignedNumber => read_number(cursor, data_type, true, options),
            ParseStrategy::QuotedString => match data_type {
                DataType::Text => read_string(cursor, options).map(Value::text),
                DataType::Timestamp => read_string(cursor, options)
                    .and_then(|s| parse_timestamp(&s).ok())
                    .map(Value::Timestamp),
                _ => None,
            },
            ParseStrategy::Boolean => match data_type {
                DataType::Boolean => read_boolean(cursor),
                _ => None,
            },
            ParseStrategy::Array | ParseStrategy::Tuple => {
                read_value(cursor, &self.expected_type, options)
            }
        }
    }
}

/// A literal found in an example expression
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralInfo {
    /// Source span, sign included
    pub span: Span,
    /// Deduced slot
    pub slot: LiteralSlot,
}

/// Name of the placeholder column standing for slot `index`
pub fn placeholder_name(index: usize) -> String {
    format!("_dummy_{}", index)
}

/// Replace the literals of `expr` with placeholders, in source order
///
/// `source` is the text the literal spans point into. `desired` is the type
/// the whole expression must finally have; it only influences the slot of
/// a literal that forms the whole expression.
pub fn replace_literals(
    expr: &Expression,
    source: &str,
    desired: &DataType,
    accurate_types: bool,
) -> Result<(Expression, Vec<LiteralInfo>)> {
    let mut literals = Vec::new();
    let rewritten = if expr.is_literal() {
        let info = whole_expression_literal(expr, source, desired, accurate_types)?;
        let placeholder = to_placeholder(expr, 0, &info.slot.expected_type);
        literals.push(info);
        placeholder
    } else {
        rewrite(expr, source, &mut literals)?
    };

    if literals
        .windows(2)
        .any(|pair| pair[0].span.end > pair[1].span.start)
    {
        return Err(Error::template(expr, "literals are not in source order"));
    }
    Ok((rewritten, literals))
}

fn rewrite(
    expr: &Expression,
    source: &str,
    literals: &mut Vec<LiteralInfo>,
) -> Result<Expression> {
    if expr.is_literal() {
        let info = literal_info(expr, source)?;
        let placeholder = to_placeholder(expr, literals.len(), &info.slot.expected_type);
        literals.push(info);
        return Ok(placeholder);
    }

    let mut rewritten = expr.clone();
    match &mut rewritten {
        Expression::Array(list) | Expression::Tuple(list) => {
            for element in list.elements.iter_mut() {
                *element = rewrite(element, source, literals)?;
            }
        }
        Expression::Prefix(prefix) => {
            *prefix.right = rewrite(&prefix.right, source, literals)?;
        }
        Expression::Infix(infix) => {
            *infix.left = rewrite(&infix.left, source, literals)?;
            *infix.right = rewrite(&infix.right, source, literals)?;
        }
        Expression::Like(like) => {
            *like.left = rewrite(&like.left, source, literals)?;
            *like.pattern = rewrite(&like.pattern, source, literals)?;
        }
        Expression::IsNull(is_null) => {
            *is_null.expr = rewrite(&is_null.expr, source, literals)?;
        }
        Expression::Cast(cast) => {
            *cast.expr = rewrite(&cast.expr, source, literals)?;
        }
        Expression::FunctionCall(call) => {
            for argument in call.arguments.iter_mut() {
                *argument = rewrite(argument, source, literals)?;
            }
        }
        _ => {}
    }
    Ok(rewritten)
}

fn to_placeholder(expr: &Expression, index: usize, data_type: &DataType) -> Expression {
    let token = match expr {
        Expression::IntegerLiteral(l) => l.token.clone(),
        Expression::FloatLiteral(l) => l.token.clone(),
        Expression::StringLiteral(l) => l.token.clone(),
        Expression::BooleanLiteral(l) => l.token.clone(),
        Expression::NullLiteral(l) => l.token.clone(),
        Expression::ArrayLiteral(l) | Expression::TupleLiteral(l) => l.token.clone(),
        _ => crate::parser::Token::eof(expr.position()),
    };
    Expression::Placeholder(Placeholder {
        token,
        name: placeholder_name(index),
        data_type: data_type.clone(),
    })
}

fn literal_info(expr: &Expression, source: &str) -> Result<LiteralInfo> {
    let span = expr
        .literal_span()
        .ok_or_else(|| Error::template(expr, "literal without a source span"))?;
    let text = source
        .get(span.start..span.end)
        .ok_or_else(|| Error::template(expr, "literal span outside the source text"))?;
    let parse_strategy = ParseStrategy::for_literal(expr, text)
        .ok_or_else(|| Error::template(expr, "not a literal"))?;
    Ok(LiteralInfo {
        span,
        slot: LiteralSlot::new(natural_type(expr)?, parse_strategy),
    })
}

/// A literal that is the whole expression may take its type from the
/// desired result type.
fn whole_expression_literal(
    expr: &Expression,
    source: &str,
    desired: &DataType,
    accurate_types: bool,
) -> Result<LiteralInfo> {
    let mut info = literal_info(expr, source)?;
    let natural = info.slot.expected_type.clone();

    let accepts_desired = accurate_types
        && syntax_compatible(&natural, desired)
        && expr
            .literal_value()
            .is_some_and(|value| value.cast_to(desired).is_ok());

    if accepts_desired {
        info.slot.expected_type = desired.clone();
    } else if desired.is_nullable() {
        info.slot.expected_type = DataType::nullable(natural);
    }
    Ok(info)
}

/// Type of a literal node from its syntax alone
fn natural_type(expr: &Expression) -> Result<DataType> {
    match expr {
        Expression::IntegerLiteral(_) => Ok(DataType::Integer),
        Expression::FloatLiteral(_) => Ok(DataType::Float),
        Expression::StringLiteral(_) => Ok(DataType::Text),
        Expression::BooleanLiteral(_) => Ok(DataType::Boolean),
        Expression::NullLiteral(_) => Ok(DataType::Null),
        Expression::ArrayLiteral(lit) | Expression::TupleLiteral(lit) => {
            lit.value.infer_type().ok_or_else(|| {
                Error::template(expr, "elements of the literal have no common type")
            })
        }
        _ => Err(Error::template(expr, "not a literal")),
    }
}

/// Whether text written for `natural` can always be read by a slot of type
/// `desired`.
fn syntax_compatible(natural: &DataType, desired: &DataType) -> bool {
    if natural.is_nullable() && !desired.is_nullable() {
        return false;
    }
    match (natural.non_nullable(), desired.non_nullable()) {
        (DataType::Null, _) => true,
        (DataType::Integer, DataType::Integer | DataType::Float)
        | (DataType::Float, DataType::Float)
        | (DataType::Text, DataType::Text | DataType::Timestamp)
        | (DataType::Boolean, DataType::Boolean) => true,
        (DataType::Array(a), DataType::Array(b)) => syntax_compatible(a, b),
        (DataType::Tuple(xs), DataType::Tuple(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| syntax_compatible(x, y))
        }
        _ => false,
    }
}

// ============================================================================
// Readers
// ============================================================================

fn eat_null(cursor: &mut TextCursor<'_>, options: &FormatOptions) -> bool {
    let spelling = options.null_spelling.as_str();
    let word = spelling
        .chars()
        .last()
        .is_some_and(crate::parser::token::is_word_char);
    cursor.eat_str(spelling, word, true)
}

fn read_boolean(cursor: &mut TextCursor<'_>) -> Option<Value> {
    if cursor.eat_str("TRUE", true, true) {
        Some(Value::Boolean(true))
    } else if cursor.eat_str("FALSE", true, true) {
        Some(Value::Boolean(false))
    } else {
        None
    }
}

fn read_string(cursor: &mut TextCursor<'_>, options: &FormatOptions) -> Option<String> {
    if cursor.peek() != Some('\'') {
        return None;
    }
    let (value, consumed) = read_quoted(cursor.rest(), '\'', options.backslash_escapes)?;
    cursor.advance(consumed);
    Some(value)
}

/// Read an integer or float, optionally preceded by a sign
fn read_number(
    cursor: &mut TextCursor<'_>,
    data_type: &DataType,
    allow_sign: bool,
    options: &FormatOptions,
) -> Option<Value> {
    let mut negative = false;
    if allow_sign {
        if cursor.eat_char('-') {
            negative = true;
            cursor.skip_whitespace();
        } else if options.allow_leading_plus && cursor.eat_char('+') {
            cursor.skip_whitespace();
        }
    }

    let start = cursor.position();
    let int_part = cursor.take_while(|c| c.is_ascii_digit());
    let mut is_float = false;
    if cursor.eat_char('.') {
        // a fraction needs digits: "1." and "1.e5" are not numbers to the lexer
        if cursor.take_while(|c| c.is_ascii_digit()).is_empty() {
            return None;
        }
        is_float = true;
    } else if int_part.is_empty() {
        return None;
    }
    if matches!(cursor.peek(), Some('e' | 'E')) {
        cursor.advance(1);
        if !cursor.eat_char('-') {
            cursor.eat_char('+');
        }
        if cursor.take_while(|c| c.is_ascii_digit()).is_empty() {
            return None;
        }
        is_float = true;
    }
    if cursor.at_word_char() || cursor.peek() == Some('.') {
        return None;
    }
    let digits = cursor.input().get(start..cursor.position())?;

    if !is_float {
        let magnitude: u64 = digits.parse().ok()?;
        let value = if negative {
            0i64.checked_sub_unsigned(magnitude)?
        } else {
            i64::try_from(magnitude).ok()?
        };
        return match data_type {
            DataType::Integer => Some(Value::Integer(value)),
            DataType::Float => Some(Value::Float(value as f64)),
            _ => None,
        };
    }
    match data_type {
        DataType::Float => {
            let value: f64 = digits.parse().ok()?;
            Some(Value::Float(if negative { -value } else { value }))
        }
        _ => None,
    }
}

/// Read a value of `data_type`, recursing into arrays and tuples
fn read_value(
    cursor: &mut TextCursor<'_>,
    data_type: &DataType,
    options: &FormatOptions,
) -> Option<Value> {
    cursor.skip_whitespace();
    if data_type.is_nullable() && eat_null(cursor, options) {
        return Some(Value::Null);
    }

    match data_type.non_nullable() {
        t @ (DataType::Integer | DataType::Float) => read_number(cursor, t, true, options),
        DataType::Text => read_string(cursor, options).map(Value::text),
        DataType::Timestamp => read_string(cursor, options)
            .and_then(|s| parse_timestamp(&s).ok())
            .map(Value::Timestamp),
        DataType::Boolean => read_boolean(cursor),
        DataType::Array(element) => {
            if !cursor.eat_char('[') {
                return None;
            }
            let mut items = Vec::new();
            cursor.skip_whitespace();
            if cursor.eat_char(']') {
                return Some(Value::array(items));
            }
            loop {
                items.push(read_value(cursor, element, options)?);
                cursor.skip_whitespace();
                if cursor.eat_char(',') {
                    continue;
                }
                if cursor.eat_char(']') {
                    return Some(Value::array(items));
                }
                return None;
            }
        }
        DataType::Tuple(types) => {
            if !cursor.eat_char('(') {
                return None;
            }
            let mut items = Vec::with_capacity(types.len());
            for (i, t) in types.iter().enumerate() {
                if i > 0 {
                    cursor.skip_whitespace();
                    if !cursor.eat_char(',') {
                        return None;
                    }
                }
                items.push(read_value(cursor, t, options)?);
            }
            cursor.skip_whitespace();
            if cursor.eat_char(')') {
                Some(Value::tuple(items))
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;

    fn read(slot: &LiteralSlot, text: &str) -> Option<Value> {
        let mut cursor = TextCursor::new(text);
        let value = slot.parse(&mut cursor, &FormatOptions::default())?;
        Some(value)
    }

    fn slots(sql: &str, desired: &DataType, accurate: bool) -> Vec<LiteralSlot> {
        let expr = parse_expression(sql).unwrap();
        let (_, literals) = replace_literals(&expr, sql, desired, accurate).unwrap();
        literals.into_iter().map(|l| l.slot).collect()
    }

    #[test]
    fn test_strategies_from_syntax() {
        let found = slots("f(1, -2.5, 'a', TRUE, NULL, [1, 2], (1, 'x'))", &DataType::Text, false);
        let strategies: Vec<ParseStrategy> = found.iter().map(|s| s.parse_strategy).collect();
        assert_eq!(
            strategies,
            vec![
                ParseStrategy::Number,
                ParseStrategy::SignedNumber,
                ParseStrategy::QuotedString,
                ParseStrategy::Boolean,
                ParseStrategy::Null,
                ParseStrategy::Array,
                ParseStrategy::Tuple,
            ]
        );
        assert_eq!(found[1].expected_type, DataType::Float);
        assert_eq!(found[5].expected_type, DataType::array(DataType::Integer));
        assert_eq!(
            found[6].expected_type,
            DataType::Tuple(vec![DataType::Integer, DataType::Text])
        );
    }

    #[test]
    fn test_rewrite_uses_placeholders() {
        let sql = "1 + lower('A')";
        let expr = parse_expression(sql).unwrap();
        let (rewritten, literals) =
            replace_literals(&expr, sql, &DataType::Integer, false).unwrap();
        assert_eq!(literals.len(), 2);
        assert_eq!(literals[0].span, Span::new(0, 1));
        assert_eq!(literals[1].span, Span::new(10, 13));
        assert!(!rewritten.to_string().contains('\''));
        assert!(rewritten.to_string().contains("_dummy_1"));
    }

    #[test]
    fn test_whole_expression_literal_nullable() {
        let found = slots("42", &DataType::nullable(DataType::Integer), false);
        assert_eq!(found[0].expected_type, DataType::nullable(DataType::Integer));

        // Nested literals keep their natural type
        let found = slots("42 + 1", &DataType::nullable(DataType::Integer), false);
        assert_eq!(found[0].expected_type, DataType::Integer);
    }

    #[test]
    fn test_accurate_types() {
        let found = slots("42", &DataType::Float, true);
        assert_eq!(found[0].expected_type, DataType::Float);

        let found = slots("'2024-01-02 03:04:05'", &DataType::Timestamp, true);
        assert_eq!(found[0].expected_type, DataType::Timestamp);

        // Float syntax cannot fill an integer slot
        let found = slots("4.5", &DataType::Integer, true);
        assert_eq!(found[0].expected_type, DataType::Float);

        // Not a timestamp: stays text
        let found = slots("'hello'", &DataType::Timestamp, true);
        assert_eq!(found[0].expected_type, DataType::Text);
    }

    #[test]
    fn test_integer_slot_is_strict() {
        let slot = LiteralSlot::new(DataType::Integer, ParseStrategy::Number);
        assert_eq!(read(&slot, " 17"), Some(Value::Integer(17)));
        assert_eq!(read(&slot, "NULL"), None);
        assert_eq!(read(&slot, "1.5"), None);
        assert_eq!(read(&slot, "1e3"), None);
        assert_eq!(read(&slot, "12abc"), None);
        assert_eq!(read(&slot, "-3"), None);
        assert_eq!(read(&slot, "99999999999999999999"), None);
    }

    #[test]
    fn test_signed_number_slot() {
        let slot = LiteralSlot::new(DataType::Integer, ParseStrategy::SignedNumber);
        assert_eq!(read(&slot, "-3"), Some(Value::Integer(-3)));
        assert_eq!(read(&slot, "- 3"), Some(Value::Integer(-3)));
        assert_eq!(read(&slot, "+3"), Some(Value::Integer(3)));
        assert_eq!(read(&slot, "3"), Some(Value::Integer(3)));
        assert_eq!(
            read(&slot, "-9223372036854775808"),
            Some(Value::Integer(i64::MIN))
        );

        let mut cursor = TextCursor::new("+3");
        let no_plus = FormatOptions::default().with_leading_plus(false);
        assert_eq!(slot.parse(&mut cursor, &no_plus), None);
    }

    #[test]
    fn test_float_slot_accepts_integers() {
        let slot = LiteralSlot::new(DataType::Float, ParseStrategy::Number);
        assert_eq!(read(&slot, "2"), Some(Value::Float(2.0)));
        assert_eq!(read(&slot, "2.5e1"), Some(Value::Float(25.0)));
        assert_eq!(read(&slot, ".5"), Some(Value::Float(0.5)));
        assert_eq!(read(&slot, "."), None);
    }

    #[test]
    fn test_float_slot_rejects_what_the_lexer_rejects() {
        let slot = LiteralSlot::new(DataType::Float, ParseStrategy::Number);
        assert_eq!(read(&slot, "1."), None);
        assert_eq!(read(&slot, "1.e5"), None);
        assert_eq!(read(&slot, "9223372036854775808"), None);
        assert_eq!(read(&slot, "9223372036854775807"), Some(Value::Float(i64::MAX as f64)));
        assert_eq!(read(&slot, "9223372036854775808.0"), Some(Value::Float(9223372036854775808.0)));

        let signed = LiteralSlot::new(DataType::Float, ParseStrategy::SignedNumber);
        assert_eq!(
            read(&signed, "-9223372036854775808"),
            Some(Value::Float(i64::MIN as f64))
        );
        assert_eq!(read(&signed, "-9223372036854775809"), None);
    }

    #[test]
    fn test_nullable_slot_accepts_null_spelling() {
        let slot = LiteralSlot::new(DataType::nullable(DataType::Integer), ParseStrategy::Number);
        assert_eq!(read(&slot, "null"), Some(Value::Null));
        assert_eq!(read(&slot, "NULLX"), None);

        let mut cursor = TextCursor::new("\\N");
        let options = FormatOptions::default().with_null_spelling("\\N");
        assert_eq!(slot.parse(&mut cursor, &options), Some(Value::Null));
    }

    #[test]
    fn test_string_slots() {
        let slot = LiteralSlot::new(DataType::Text, ParseStrategy::QuotedString);
        assert_eq!(read(&slot, "'it''s'"), Some(Value::text("it's")));
        assert_eq!(read(&slot, "'a\\tb'"), Some(Value::text("a\tb")));
        assert_eq!(read(&slot, "'open"), None);
        assert_eq!(read(&slot, "abc"), None);

        let ts = LiteralSlot::new(DataType::Timestamp, ParseStrategy::QuotedString);
        assert!(read(&ts, "'2024-01-02'").is_some());
        assert_eq!(read(&ts, "'soon'"), None);
    }

    #[test]
    fn test_boolean_and_null_slots() {
        let slot = LiteralSlot::new(DataType::Boolean, ParseStrategy::Boolean);
        assert_eq!(read(&slot, "false"), Some(Value::Boolean(false)));
        assert_eq!(read(&slot, "TRUEST"), None);

        let null = LiteralSlot::new(DataType::Null, ParseStrategy::Null);
        assert_eq!(read(&null, "NULL"), Some(Value::Null));
        assert_eq!(read(&null, "1"), None);
    }

    #[test]
    fn test_composite_slots() {
        let slot = LiteralSlot::new(
            DataType::array(DataType::nullable(DataType::Integer)),
            ParseStrategy::Array,
        );
        assert_eq!(
            read(&slot, "[1, NULL, -3]"),
            Some(Value::array(vec![
                Value::Integer(1),
                Value::Null,
                Value::Integer(-3)
            ]))
        );
        assert_eq!(read(&slot, "[ ]"), Some(Value::array(vec![])));
        assert_eq!(read(&slot, "[1, 'a']"), None);
        assert_eq!(read(&slot, "[1, 2"), None);

        let tuple = LiteralSlot::new(
            DataType::Tuple(vec![DataType::Integer, DataType::Text]),
            ParseStrategy::Tuple,
        );
        assert_eq!(
            read(&tuple, "(7, 'x')"),
            Some(Value::tuple(vec![Value::Integer(7), Value::text("x")]))
        );
        assert_eq!(read(&tuple, "(7)"), None);
        assert_eq!(read(&tuple, "(7, 'x', 8)"), None);
    }
}
