use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rdrand_device::{
    source::{MockInstruction, RdRand},
    EntropySource, StreamReader,
};

fn bench_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill");

    let mock = StreamReader::new(EntropySource::new(MockInstruction::counting()));
    let rdrand = StreamReader::new(EntropySource::new(RdRand::detect()));
    let hardware = rdrand.source().instruction().is_supported();

    for size in [3usize, 64, 4096, 1 << 20] {
        let mut buf = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("mock", size), &size, |b, _| {
            b.iter(|| mock.read_into(black_box(&mut buf)))
        });

        if hardware {
            group.bench_with_input(BenchmarkId::new("rdrand", size), &size, |b, _| {
                b.iter(|| rdrand.read_into(black_box(&mut buf)))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_fill);
criterion_main!(benches);
