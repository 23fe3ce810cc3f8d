use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use cachelab::config::CacheGeometry;
use cachelab::transpose::Strategy;
use cachelab::util::{numbered_matrix, replay_str, stride_trace};

/// Compares the transpose strategies on the tuned square shapes. The debug
/// verification inside each strategy compiles out here, so the measured work
/// is the copy alone
pub fn transpose_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Transpose");
    for size in [32usize, 1024] {
        let a = numbered_matrix(size, size);
        let mut b = vec![0.0; size * size];
        for strategy in [Strategy::Naive, Strategy::Blocked, Strategy::BlockedDiagonal] {
            group.bench_with_input(
                BenchmarkId::new(format!("{strategy:?}"), size),
                &size,
                |bench, &size| {
                    bench.iter(|| strategy.run(size, size, &a, &mut b));
                },
            );
        }
    }
    group.finish();
}

/// Replays synthetic traces end to end, parsing included
pub fn replay_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Replay");
    let geometry = CacheGeometry::new(4, 4, 6).unwrap();
    for (name, stride) in [("sequential", 8u64), ("line-stride", 64), ("thrashing", 4096)] {
        let trace = stride_trace('L', 0, stride, 100_000, 8);
        group.bench_with_input(BenchmarkId::new(name, stride), &trace, |bench, trace| {
            bench.iter(|| replay_str(geometry, trace).unwrap());
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = transpose_benchmark, replay_benchmark
);
criterion_main!(benches);
