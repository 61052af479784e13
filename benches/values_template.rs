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

//! VALUES reading benchmark: template path vs general expression path
//!
//! Run with: cargo bench --bench values_template

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;

use literal_template::{DataType, TemplateCache, TemplateConfig, ValuesReader};

const ROW_COUNTS: [usize; 3] = [100, 1_000, 10_000];

fn column_types() -> Vec<DataType> {
    vec![
        DataType::Integer,
        DataType::Text,
        DataType::Float,
        DataType::nullable(DataType::Integer),
    ]
}

fn generate_rows(count: usize) -> String {
    (0..count)
        .map(|i| {
            let maybe = if i % 5 == 0 {
                "NULL".to_string()
            } else {
                (i * 7).to_string()
            };
            format!(
                "({}, lower('Name_{}'), {}.25 * 4, {})",
                i, i, i, maybe
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn bench_values(c: &mut Criterion) {
    let mut group = c.benchmark_group("values_read");

    for &rows in &ROW_COUNTS {
        let input = generate_rows(rows);
        group.throughput(Throughput::Elements(rows as u64));

        let cache = Arc::new(TemplateCache::default());
        let templated = ValuesReader::new(column_types()).with_cache(cache);
        group.bench_with_input(BenchmarkId::new("template", rows), &input, |b, input| {
            b.iter(|| black_box(templated.read(black_box(input)).unwrap()));
        });

        let config = TemplateConfig::default().with_deduce_templates(false);
        let general = ValuesReader::with_config(column_types(), config);
        group.bench_with_input(BenchmarkId::new("general", rows), &input, |b, input| {
            b.iter(|| black_box(general.read(black_box(input)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_values);
criterion_main!(benches);
