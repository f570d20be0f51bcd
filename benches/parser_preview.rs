//! Performance benchmarks for live parser preview
//!
//! A preview re-runs the parser on every keystroke, so these measure one full
//! `compile + apply` per iteration:
//! - `any` cascades where the winning branch comes last
//! - Sorted `tagged_line` extraction over a long sample
//! - Whole-input `regex` extraction with named groups
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glossa_core::{document::ParserSpec, parser};
use serde_json::json;
use std::hint::black_box;

fn tagged_sample(lines: usize) -> String {
    (0..lines)
        .rev()
        .map(|i| format!("@@{i}@@translated line number {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn cascade_spec() -> ParserSpec {
    ParserSpec::new("any").with_option(
        "parsers",
        json!([
            {"type": "json_object", "options": {"path": "result.text"}},
            {"type": "json_array"},
            {"type": "regex", "options": {"pattern": "<out>(?P<body>.*)</out>", "group": "body", "dotall": true}},
            {"type": "tagged_line", "options": {"sort_by_id": true}},
        ]),
    )
}

// Benchmark: cascade falling through to its last branch
fn bench_cascade_fallthrough(c: &mut Criterion) {
    let spec = cascade_spec();
    let mut group = c.benchmark_group("cascade_fallthrough");
    for lines in [10, 100, 1000] {
        let sample = tagged_sample(lines);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &sample, |b, sample| {
            b.iter(|| parser::run(black_box(&spec), black_box(sample)).unwrap())
        });
    }
    group.finish();
}

// Benchmark: tagged_line with reordering
fn bench_tagged_line_sorted(c: &mut Criterion) {
    let spec = ParserSpec::new("tagged_line").with_option("sort_by_id", true);
    let sample = tagged_sample(1000);
    c.bench_function("tagged_line_sorted_1000", |b| {
        b.iter(|| parser::run(black_box(&spec), black_box(&sample)).unwrap())
    });
}

// Benchmark: regex over the whole sample
fn bench_regex_whole_input(c: &mut Criterion) {
    let spec = ParserSpec::new("regex")
        .with_option("pattern", "(?P<head>[^\\n]*)\\n(?P<rest>.*)")
        .with_option("group", "rest")
        .with_option("flags", json!(["s"]));
    let sample = tagged_sample(1000);
    c.bench_function("regex_whole_input_1000", |b| {
        b.iter(|| parser::run(black_box(&spec), black_box(&sample)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_cascade_fallthrough,
    bench_tagged_line_sorted,
    bench_regex_whole_input
);
criterion_main!(benches);
