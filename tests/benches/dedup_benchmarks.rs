//! # Relay Dedup Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Duplicate hit | < 2µs |
//! | Novel insert (ENTERPRISE) | < 10µs |
//! | Insert at capacity, FIFO | < 20µs |
//!
//! Run with `cargo bench -p relay-tests`.

use criterion::{criterion_group, criterion_main, Criterion};

fn bench_dedup(c: &mut Criterion) {
    relay_tests::benchmarks::dedup::register_benchmarks(c);
}

criterion_group!(benches, bench_dedup);
criterion_main!(benches);
