use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use keytrack_match::{BruteForceMatcher, DescriptorSet, DistanceMetric, MatchSelector, NeighborSearch};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;

/// Random binary descriptors from a fixed seed
fn create_descriptors(n: usize, seed: u64) -> DescriptorSet {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let rows = (0..n)
        .map(|_| {
            let mut d = [0u8; 32];
            rng.fill(&mut d[..]);
            d
        })
        .collect();
    DescriptorSet::Binary(rows)
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("brute_force");
    let matcher = BruteForceMatcher::new(DistanceMetric::Hamming, false);

    for &n in &[100usize, 500, 1000] {
        let source = create_descriptors(n, 1);
        let reference = create_descriptors(n, 2);
        group.bench_with_input(BenchmarkId::new("knn2", n), &n, |b, _| {
            b.iter(|| black_box(matcher.knn(black_box(&source), black_box(&reference), 2).unwrap()))
        });
    }

    group.finish();
}

fn bench_ratio_test(c: &mut Criterion) {
    let mut group = c.benchmark_group("ratio_test");
    let matcher = BruteForceMatcher::new(DistanceMetric::Hamming, false);
    let selector = MatchSelector::default();

    for &n in &[1000usize, 5000] {
        let candidates = matcher
            .knn(&create_descriptors(n, 3), &create_descriptors(64, 4), 2)
            .unwrap();
        group.bench_with_input(BenchmarkId::new("select_knn", n), &candidates, |b, c| {
            b.iter(|| black_box(selector.select_knn(black_box(c)).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_search, bench_ratio_test);
criterion_main!(benches);
