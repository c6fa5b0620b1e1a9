//! Benchmark suite for filter construction and point lookups.
//!
//! Covers the main variants at a fixed key count:
//! - Construction: xor8, xor_plus8, fuse8, cuckoo8, blocked bloom
//! - Query: hit and miss paths per variant
//!
//! Run: cargo bench --bench filter_ops

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use keysieve::hash::hash64;
use keysieve::{BlockedBloom, Cuckoo8, Filter, Fuse8, SuccinctCountingBloom, Xor8, XorPlus8};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const KEY_COUNT: usize = 100_000;

fn make_keys(n: usize, salt: u64) -> Vec<u64> {
    (0..n as u64).map(|i| hash64(i, salt)).collect()
}

fn query_mix(filter: &dyn Filter, hits: &[u64], misses: &[u64]) -> usize {
    let mut found = 0;
    for (&h, &m) in hits.iter().zip(misses) {
        found += usize::from(filter.may_contain(h));
        found += usize::from(filter.may_contain(m));
    }
    found
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_construction(c: &mut Criterion) {
    let keys = make_keys(KEY_COUNT, 1);
    let mut group = c.benchmark_group("construction");
    group.sample_size(10);

    group.bench_function(BenchmarkId::new("xor8", KEY_COUNT), |b| {
        b.iter(|| Xor8::construct(black_box(&keys)).unwrap())
    });
    group.bench_function(BenchmarkId::new("xor_plus8", KEY_COUNT), |b| {
        b.iter(|| XorPlus8::construct(black_box(&keys)).unwrap())
    });
    group.bench_function(BenchmarkId::new("fuse8", KEY_COUNT), |b| {
        b.iter(|| Fuse8::construct(black_box(&keys)).unwrap())
    });
    group.bench_function(BenchmarkId::new("cuckoo8", KEY_COUNT), |b| {
        b.iter(|| Cuckoo8::construct(black_box(&keys)).unwrap())
    });
    group.bench_function(BenchmarkId::new("blocked_bloom", KEY_COUNT), |b| {
        b.iter(|| BlockedBloom::construct(black_box(&keys), 10).unwrap())
    });
    group.bench_function(BenchmarkId::new("counting_bloom", KEY_COUNT), |b| {
        b.iter(|| SuccinctCountingBloom::construct(black_box(&keys), 10).unwrap())
    });

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let keys = make_keys(KEY_COUNT, 2);
    let hits: Vec<u64> = keys.iter().copied().step_by(10).collect();
    let misses = make_keys(hits.len(), 0xdead);

    let variants: Vec<(&str, Box<dyn Filter>)> = vec![
        ("xor8", Box::new(Xor8::construct(&keys).unwrap())),
        ("xor_plus8", Box::new(XorPlus8::construct(&keys).unwrap())),
        ("fuse8", Box::new(Fuse8::construct(&keys).unwrap())),
        ("cuckoo8", Box::new(Cuckoo8::construct(&keys).unwrap())),
        (
            "blocked_bloom",
            Box::new(BlockedBloom::construct(&keys, 10).unwrap()),
        ),
    ];

    let mut group = c.benchmark_group("query");
    for (name, filter) in &variants {
        group.bench_function(BenchmarkId::new(*name, hits.len() * 2), |b| {
            b.iter(|| query_mix(black_box(filter.as_ref()), &hits, &misses))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_construction, bench_query);
criterion_main!(benches);
