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

//! Expression Template Tests
//!
//! Row matching, batch bookkeeping and batch evaluation

use literal_template::parser::{parse_with_tokens, TextCursor};
use literal_template::{
    DataType, DeductionContext, Error, ExpressionTemplate, FormatOptions, TemplateCache, Value,
};

fn template(sql: &str, data_type: DataType) -> ExpressionTemplate {
    let (expr, span) = parse_with_tokens(sql).expect("Failed to parse expression");
    ExpressionTemplate::deduce(&data_type, &span, &expr, &DeductionContext::default())
        .expect("Failed to deduce template")
}

fn parse(t: &mut ExpressionTemplate, row: &str) -> bool {
    t.parse_row(&mut TextCursor::new(row), &FormatOptions::default())
}

fn assert_lengths(t: &ExpressionTemplate) {
    for column in t.literal_columns() {
        assert_eq!(column.len(), t.rows_count());
    }
}

/// a + b over (1, 2) and (3, 4)
#[test]
fn test_sum_of_two_literals() {
    let mut t = template("1 + 2", DataType::Integer);
    assert!(parse(&mut t, "1 + 2"));
    assert!(parse(&mut t, "3 + 4"));

    let result = t.evaluate_all().expect("Failed to evaluate");
    assert_eq!(result.data_type(), &DataType::Integer);
    assert_eq!(result.to_values(), vec![Value::Integer(3), Value::Integer(7)]);
}

/// A row failing halfway leaves no trace
#[test]
fn test_row_isolation() {
    let mut t = template("concat('a', 1, 'b')", DataType::Text);
    assert!(parse(&mut t, "concat('x', 2, 'y')"));

    let failing_rows = [
        // Third literal has the wrong type
        "concat('x', 2, 3)",
        // Second literal is not an integer
        "concat('x', 2.5, 'y')",
        // Skeleton ends early
        "concat('x', 2",
        // Unterminated string in the last slot
        "concat('x', 2, 'y)",
        // NULL into a non-nullable slot
        "concat('x', NULL, 'y')",
    ];
    for row in failing_rows {
        let mut cursor = TextCursor::new(row);
        assert!(!t.parse_row(&mut cursor, &FormatOptions::default()), "{row}");
        assert_eq!(cursor.position(), 0, "cursor not restored for {row}");
        assert_eq!(t.rows_count(), 1);
        assert_lengths(&t);
    }

    assert!(parse(&mut t, "concat( 'p' , 9 , 'q' )"));
    assert_lengths(&t);
    assert_eq!(
        t.evaluate_all().unwrap().to_values(),
        vec![Value::text("x2y"), Value::text("p9q")]
    );
}

/// Slot column lengths follow the row count through mixed outcomes
#[test]
fn test_length_invariant() {
    let mut t = template("[1, 2]", DataType::array(DataType::Integer));
    let rows = ["[3, 4]", "[5]", "[]", "['a']", "[6, NULL]", "[-7, +8]", "7"];
    let mut expected = 0;
    for row in rows {
        if parse(&mut t, row) {
            expected += 1;
        }
        assert_eq!(t.rows_count(), expected);
        assert_lengths(&t);
    }
    assert_eq!(expected, 4);
    assert_eq!(
        t.evaluate_all().unwrap().to_values(),
        vec![
            Value::array(vec![Value::Integer(3), Value::Integer(4)]),
            Value::array(vec![Value::Integer(5)]),
            Value::array(vec![]),
            Value::array(vec![Value::Integer(-7), Value::Integer(8)]),
        ]
    );
}

/// Templates without literals still count rows
#[test]
fn test_zero_slot_template() {
    let mut t = template("length(now())", DataType::Integer);
    for _ in 0..5 {
        assert!(parse(&mut t, "length( now( ) )"));
    }
    assert!(t.literal_columns().is_empty());
    assert_eq!(t.rows_count(), 5);
    let values = t.evaluate_all().unwrap().to_values();
    assert_eq!(values.len(), 5);
    assert!(values.iter().all(|v| *v == values[0]));

    let mut now = template("now()", DataType::Timestamp);
    for _ in 0..3 {
        assert!(parse(&mut now, "now()"));
    }
    let values = now.evaluate_all().unwrap().to_values();
    assert_eq!(values.len(), 3);
    assert!(values.iter().all(|v| *v == values[0]));
}

/// Non-nullable integer slots refuse NULL
#[test]
fn test_type_strict_slots() {
    let mut t = template("abs(1)", DataType::Integer);
    assert!(!parse(&mut t, "abs(NULL)"));
    assert!(!parse(&mut t, "abs('1')"));
    assert!(!parse(&mut t, "abs(1.0)"));
    assert!(!parse(&mut t, "abs(TRUE)"));
    assert!(parse(&mut t, "abs(1)"));
    assert_eq!(t.rows_count(), 1);
}

/// Results come out in the requested type
#[test]
fn test_cast_to_requested_type() {
    let mut t = template("length('abc')", DataType::Float);
    assert!(parse(&mut t, "length('hello')"));
    let values = t.evaluate_all().unwrap().to_values();
    assert_eq!(values, vec![Value::Float(5.0)]);

    let mut t = template("1 + 1", DataType::Text);
    assert!(parse(&mut t, "20 + 22"));
    assert_eq!(t.evaluate_all().unwrap().to_values(), vec![Value::text("42")]);

    let mut t = template("'2024-03-01 10:00:00'", DataType::Timestamp);
    assert!(parse(&mut t, "'2024-03-02 11:30:00'"));
    let values = t.evaluate_all().unwrap().to_values();
    assert!(matches!(values[0], Value::Timestamp(_)));
}

/// Format options change what a slot accepts
#[test]
fn test_format_options() {
    let mut t = template("-1", DataType::nullable(DataType::Integer));
    let options = FormatOptions::default()
        .with_null_spelling("\\N")
        .with_leading_plus(false);

    let mut cursor = TextCursor::new("\\N");
    assert!(t.parse_row(&mut cursor, &options));
    let mut cursor = TextCursor::new("NULL");
    assert!(!t.parse_row(&mut cursor, &options));
    let mut cursor = TextCursor::new("+5");
    assert!(!t.parse_row(&mut cursor, &options));
    let mut cursor = TextCursor::new("-5");
    assert!(t.parse_row(&mut cursor, &options));

    assert_eq!(
        t.evaluate_all().unwrap().to_values(),
        vec![Value::Null, Value::Integer(-5)]
    );

    let mut t = template("'a'", DataType::Text);
    let raw = FormatOptions::default().with_backslash_escapes(false);
    let mut cursor = TextCursor::new("'C:\\dir'");
    assert!(t.parse_row(&mut cursor, &raw));
    assert_eq!(t.evaluate_all().unwrap().to_values(), vec![Value::text("C:\\dir")]);
}

/// Evaluation errors are returned, not swallowed
#[test]
fn test_evaluation_failure() {
    let mut t = template("abs(-1)", DataType::Integer);
    assert!(parse(&mut t, "abs(-9223372036854775808)"));
    let err = t.evaluate_all().unwrap_err();
    assert!(matches!(err, Error::IntegerOverflow(_)), "got {err:?}");
}

/// Instances created from a cached structure are independent
#[test]
fn test_instances_share_structure() {
    let cache = TemplateCache::default();
    let (expr, span) = parse_with_tokens("lower('A')").unwrap();
    let (structure, _) = cache
        .get_or_build(&DataType::Text, &span, &expr, &DeductionContext::default(), "")
        .unwrap();

    let mut first = ExpressionTemplate::new(structure.clone());
    let mut second = ExpressionTemplate::new(structure);
    assert!(parse(&mut first, "lower('X')"));
    assert!(parse(&mut second, "lower('Y')"));
    assert!(parse(&mut second, "lower('Z')"));

    assert_eq!(first.evaluate_all().unwrap().to_values(), vec![Value::text("x")]);
    assert_eq!(
        second.evaluate_all().unwrap().to_values(),
        vec![Value::text("y"), Value::text("z")]
    );
}
