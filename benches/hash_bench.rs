/// Key derivation benchmarks
/// Measures SHA-1 digest throughput for paste-sized inputs
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pasted::domain::value_objects::KeyKind;
use pasted::KeyCodec;
use std::hint::black_box;
use std::time::Duration;

fn key_derivation_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_derivation");
    group.measurement_time(Duration::from_secs(5));

    for size in [64usize, 1024, 64 * 1024, 1024 * 1024] {
        let data = vec![0x61u8; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("full", size), &data, |b, data| {
            b.iter(|| KeyCodec::key_for(black_box(data), KeyKind::Full))
        });

        group.bench_with_input(BenchmarkId::new("short", size), &data, |b, data| {
            b.iter(|| KeyCodec::key_for(black_box(data), KeyKind::Short))
        });
    }

    group.finish();
}

criterion_group!(benches, key_derivation_benchmarks);
criterion_main!(benches);
