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

//! VALUES Reader Tests
//!
//! End-to-end reading of VALUES lists through templates and the general
//! expression path

use std::sync::Arc;
use std::thread;

use literal_template::{
    DataType, Error, FormatOptions, TemplateCache, TemplateConfig, Value, ValuesReader,
};

/// Show library events with RUST_LOG=literal_template=debug
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn values_list(rows: usize, row: impl Fn(usize) -> String) -> String {
    (0..rows).map(row).collect::<Vec<_>>().join(", ")
}

/// A large uniform insert goes through templates after the first row
#[test]
fn test_uniform_bulk_insert() {
    init_logging();
    let reader = ValuesReader::new(vec![
        DataType::Integer,
        DataType::Text,
        DataType::Float,
        DataType::nullable(DataType::Boolean),
    ]);
    let input = values_list(10_000, |i| {
        let flag = match i % 3 {
            0 => "TRUE",
            1 => "FALSE",
            _ => "NULL",
        };
        format!("({}, upper('user_{}'), {}.5 * 2, {})", i, i, i, flag)
    });

    let (block, stats) = reader.read_with_stats(&input).expect("Failed to read VALUES");
    assert_eq!(block.rows(), 10_000);
    assert_eq!(stats.rows, 10_000);
    assert_eq!(stats.template_fields + stats.fallback_fields, 40_000);
    assert!(stats.fallback_fields <= 6, "fallback used {} times", stats.fallback_fields);

    assert_eq!(
        block.row(0),
        vec![
            Value::Integer(0),
            Value::text("USER_0"),
            Value::Float(1.0),
            Value::Boolean(true)
        ]
    );
    assert_eq!(
        block.row(9_998),
        vec![
            Value::Integer(9_998),
            Value::text("USER_9998"),
            Value::Float(19_997.0),
            Value::Null
        ]
    );
}

/// Rows that switch shape keep their order
#[test]
fn test_shape_changes_preserve_order() {
    init_logging();
    let reader = ValuesReader::new(vec![DataType::Integer, DataType::Text]);
    let input = "(1, 'a'), (2, 'b'), (1 + 2, 'c' || 'd'), (4 * 1, 'e' || 'f'), \
                 (5, lower('G')), (-6, 'h'), (7, 'i')";
    let block = reader.read(input).unwrap();

    let ids: Vec<Value> = block.column(0).unwrap().to_values();
    assert_eq!(
        ids,
        (1..=7)
            .map(|i| Value::Integer(if i == 6 { -6 } else { i }))
            .collect::<Vec<_>>()
    );
    let texts: Vec<Value> = block.column(1).unwrap().to_values();
    assert_eq!(
        texts,
        ["a", "b", "cd", "ef", "g", "h", "i"]
            .iter()
            .map(|s| Value::text(*s))
            .collect::<Vec<_>>()
    );
}

/// Composite values and casts into the column type
#[test]
fn test_composite_columns() {
    let reader = ValuesReader::new(vec![
        DataType::array(DataType::Float),
        DataType::Tuple(vec![DataType::Integer, DataType::Text]),
    ]);
    let block = reader
        .read("([1, 2.5], (1, 'one')), ([], (2, 'two')), ([-3], (3, 'three'))")
        .unwrap();
    assert_eq!(block.rows(), 3);
    assert_eq!(
        block.row(0)[0],
        Value::array(vec![Value::Float(1.0), Value::Float(2.5)])
    );
    assert_eq!(block.row(1)[0], Value::array(vec![]));
    assert_eq!(
        block.row(2),
        vec![
            Value::array(vec![Value::Float(-3.0)]),
            Value::tuple(vec![Value::Integer(3), Value::text("three")])
        ]
    );
}

/// Literals take the column type when accurate typing is on
#[test]
fn test_accurate_literal_types() {
    let config = TemplateConfig::default().with_accurate_types_of_literals(true);
    let reader = ValuesReader::with_config(vec![DataType::Timestamp], config);
    let (block, stats) = reader
        .read_with_stats("('2024-01-01 00:00:00'), ('2024-06-30 12:00:00'), ('2024-12-31')")
        .unwrap();
    assert_eq!(block.rows(), 3);
    assert_eq!(stats.fallback_fields, 1);
    assert!(block
        .column(0)
        .unwrap()
        .iter()
        .all(|v| matches!(v, Value::Timestamp(_))));

    // Without it the text slot casts at evaluation and a bad row fails late
    let reader = ValuesReader::new(vec![DataType::Timestamp]);
    let err = reader.read("('2024-01-01'), ('not a date')").unwrap_err();
    assert!(matches!(err, Error::TypeConversion { .. }), "got {err:?}");
}

/// Format options reach the template matcher
#[test]
fn test_format_options() {
    let format = FormatOptions::from_options("null_spelling=\\N").expect("Failed to parse options");
    let reader = ValuesReader::new(vec![DataType::nullable(DataType::Float)]).with_format(format);
    let (block, stats) = reader.read_with_stats("(1.5), (\\N), (2)").unwrap();
    assert_eq!(
        block.column(0).unwrap().to_values(),
        vec![Value::Float(1.5), Value::Null, Value::Float(2.0)]
    );
    assert_eq!(stats.template_fields, 2);

    let format = FormatOptions::from_options("case_insensitive_keywords=on&backslash_escapes=off")
        .expect("Failed to parse options");
    let reader = ValuesReader::new(vec![DataType::Float, DataType::Text]).with_format(format);
    let (block, stats) = reader
        .read_with_stats(
            "(CAST(1 AS FLOAT), 'a\\b'), (cast(2 as float), 'c\\d'), (Cast(3 AS Float), 'e')",
        )
        .unwrap();
    assert_eq!(
        block.column(0).unwrap().to_values(),
        vec![Value::Float(1.0), Value::Float(2.0), Value::Float(3.0)]
    );
    assert_eq!(block.row(1)[1], Value::text("c\\d"));
    assert_eq!(stats.template_fields, 4);
}

/// Readers on different threads can share one cache
#[test]
fn test_shared_cache_across_threads() {
    init_logging();
    let cache = Arc::new(TemplateCache::new(128));
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let reader = ValuesReader::new(vec![DataType::Integer, DataType::Text])
                    .with_cache(cache);
                let input = values_list(500, |i| {
                    format!("({} + {}, concat('w', {}))", worker, i, i)
                });
                let block = reader.read(&input).expect("Failed to read VALUES");
                assert_eq!(block.rows(), 500);
                assert_eq!(
                    block.row(499),
                    vec![
                        Value::Integer(worker as i64 + 499),
                        Value::text("w499")
                    ]
                );
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Worker panicked");
    }
    assert_eq!(cache.size(), 2);
}

/// Errors carry enough detail to locate the bad row
#[test]
fn test_error_reporting() {
    let reader = ValuesReader::new(vec![DataType::Integer, DataType::Integer]);

    assert_eq!(
        reader.read("(1, 2), (3, 4), (5)").unwrap_err(),
        Error::RowArity {
            row: 2,
            expected: 2,
            got: 1
        }
    );
    assert!(matches!(
        reader.read("(1, 2), (3, unknown_fn(4))").unwrap_err(),
        Error::Compile(_)
    ));
    assert!(matches!(
        reader.read("(1, 2) 3").unwrap_err(),
        Error::Parse(_)
    ));
    assert!(matches!(
        reader.read("(1, 2), (9223372036854775807 + 1, 0)").unwrap_err(),
        Error::IntegerOverflow(_)
    ));
}

/// NULL into a non-nullable column falls back and fails there
#[test]
fn test_null_into_non_nullable_column() {
    let reader = ValuesReader::new(vec![DataType::Integer]);
    let err = reader.read("(1), (NULL)").unwrap_err();
    assert!(matches!(err, Error::TypeConversion { .. }), "got {err:?}");
}

/// A number the lexer rejects is rejected even when a template is active
#[test]
fn test_template_accepts_only_what_the_parser_accepts() {
    let general = TemplateConfig::default().with_deduce_templates(false);
    for input in [
        "(1.5), (1.)",
        "(1.5), (1.e5)",
        "(1.5), (9223372036854775808)",
        "(-1.5), (-9223372036854775809)",
    ] {
        let templated = ValuesReader::new(vec![DataType::Float]).read(input);
        let plain = ValuesReader::with_config(vec![DataType::Float], general.clone()).read(input);
        assert!(templated.is_err(), "{input}: got {templated:?}");
        assert!(plain.is_err(), "{input}: got {plain:?}");
    }

    let reader = ValuesReader::new(vec![DataType::Float]);
    let (block, stats) = reader
        .read_with_stats("(1.5), (9223372036854775807), (2.5e1)")
        .unwrap();
    assert_eq!(
        block.column(0).unwrap().to_values(),
        vec![
            Value::Float(1.5),
            Value::Float(i64::MAX as f64),
            Value::Float(25.0)
        ]
    );
    assert_eq!(stats.template_fields, 2);
}
