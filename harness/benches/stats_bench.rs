//! Benchmarks for the statistics hot path

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use statebench_harness::stats;

fn sample_series(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 10.0 + (i as f64 * 7.3) % 5.0 + if i % 97 == 0 { 80.0 } else { 0.0 })
        .collect()
}

fn bench_central_tendency(c: &mut Criterion) {
    let series = sample_series(1_000);
    c.bench_function("central_tendency_1k", |b| {
        b.iter(|| stats::central_tendency(black_box(&series)))
    });
}

fn bench_percentiles(c: &mut Criterion) {
    let series = sample_series(10_000);
    c.bench_function("percentile_p99_10k", |b| {
        b.iter(|| stats::percentile(black_box(&series), 99.0))
    });
}

fn bench_outlier_rejection(c: &mut Criterion) {
    let series = sample_series(1_000);
    c.bench_function("reject_outliers_1k", |b| {
        b.iter(|| stats::reject_outliers(black_box(&series)))
    });
}

criterion_group!(
    benches,
    bench_central_tendency,
    bench_percentiles,
    bench_outlier_rejection,
);
criterion_main!(benches);
