//! Value lattice benchmarks
//!
//! These benchmarks measure canonicalization and join performance on
//! representative values. Run with: `cargo bench --bench join_bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use sable_lattice::Value;

/// Benchmark canonicalization hits and misses
fn bench_canonicalize(c: &mut Criterion) {
    sable_lattice::init();
    let mut group = c.benchmark_group("canonicalize");
    group.throughput(Throughput::Elements(1));

    // Interning a value that already exists (hit)
    group.bench_function("intern_existing_number", |b| {
        let _ = Value::make_num(42.0);
        b.iter(|| black_box(Value::make_num(42.0)))
    });

    // Interning fresh values (miss)
    group.bench_function("intern_new_string", |b| {
        let mut counter = 0u64;
        b.iter(|| {
            counter += 1;
            black_box(Value::make_str(&format!("new_string_{counter}")))
        })
    });

    group.finish();
}

/// Benchmark joins across the facets
fn bench_join(c: &mut Criterion) {
    sable_lattice::init();
    let mut group = c.benchmark_group("join");
    group.throughput(Throughput::Elements(1));

    let a = Value::make_str("file_a");
    let b = Value::make_str("file_b");
    group.bench_function("join_single_strings", |bench| {
        bench.iter(|| black_box(a.join(&b)))
    });

    let wide = Value::make_any_str().join(&Value::make_any_num());
    let narrow = Value::make_num(7.0).join(&Value::make_str("seven"));
    group.bench_function("join_wide_narrow", |bench| {
        bench.iter(|| black_box(wide.join(&narrow)))
    });

    // Reference-fast equality after interning
    let x = Value::make_str("file_a").join(&Value::make_str("file_b"));
    let y = Value::make_str("file_b").join(&Value::make_str("file_a"));
    group.bench_function("interned_equality", |bench| {
        bench.iter(|| black_box(x == y))
    });

    group.finish();
}

/// Benchmark equality-driven restriction
fn bench_restrict(c: &mut Criterion) {
    sable_lattice::init();
    let mut group = c.benchmark_group("restrict");
    group.throughput(Throughput::Elements(1));

    let any = Value::make_any_num();
    let five = Value::make_num(5.0);
    group.bench_function("strict_equals_singleton", |bench| {
        bench.iter(|| black_box(any.restrict_to_strict_equals(&five)))
    });

    let mixed = Value::make_any_bool()
        .join(&Value::make_any_str())
        .join(&Value::make_num(0.0));
    group.bench_function("restrict_to_truthy", |bench| {
        bench.iter(|| black_box(mixed.restrict_to_truthy()))
    });

    group.finish();
}

criterion_group!(benches, bench_canonicalize, bench_join, bench_restrict);
criterion_main!(benches);
