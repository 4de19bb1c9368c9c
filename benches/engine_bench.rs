//! Hot-path benchmarks: key encoding, comparison, lookup keys, arena
//! allocation, and memtable reads/writes.
//!
//! Run with: `cargo bench --bench engine_bench`

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use lsm_core::key::parse_internal_key;
use lsm_core::{
    Arena, Comparator, InternalKey, InternalKeyComparator, LookupKey, MemTable, ValueType,
};

fn user_keys(n: usize) -> Vec<Vec<u8>> {
    (0..n).map(|i| format!("user_key_{i:08}").into_bytes()).collect()
}

fn bench_key_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("key/codec");
    group.throughput(Throughput::Elements(1));

    group.bench_function("encode", |b| {
        b.iter(|| InternalKey::new(black_box(b"user_key_00001234"), black_box(42), ValueType::Value))
    });

    let encoded = InternalKey::new(b"user_key_00001234", 42, ValueType::Value);
    group.bench_function("parse", |b| {
        b.iter(|| parse_internal_key(black_box(encoded.encode())))
    });

    group.bench_function("lookup_key", |b| {
        b.iter(|| LookupKey::new(black_box(b"user_key_00001234"), black_box(42)))
    });

    group.finish();
}

fn bench_comparator(c: &mut Criterion) {
    let mut group = c.benchmark_group("key/compare");
    let cmp = InternalKeyComparator::default();

    let a = InternalKey::new(b"user_key_00001234", 7, ValueType::Value);
    let b_diff = InternalKey::new(b"user_key_00001235", 7, ValueType::Value);
    let b_same = InternalKey::new(b"user_key_00001234", 9, ValueType::Value);

    group.bench_function("different_user_key", |b| {
        b.iter(|| cmp.compare(black_box(a.encode()), black_box(b_diff.encode())))
    });
    group.bench_function("same_user_key", |b| {
        b.iter(|| cmp.compare(black_box(a.encode()), black_box(b_same.encode())))
    });
    group.bench_function("shortest_separator", |b| {
        b.iter_batched(
            || a.encode().to_vec(),
            |mut start| {
                cmp.find_shortest_separator(&mut start, b_diff.encode());
                start
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_arena(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena/allocate");

    for size in [16usize, 128, 2048] {
        group.throughput(Throughput::Bytes(size as u64 * 1000));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                Arena::new,
                |mut arena| {
                    for _ in 0..1000 {
                        black_box(arena.allocate(size));
                    }
                    arena
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_memtable(c: &mut Criterion) {
    let mut group = c.benchmark_group("memtable");
    let keys = user_keys(10_000);
    let value = vec![0xABu8; 100];

    group.throughput(Throughput::Elements(keys.len() as u64));
    group.sample_size(20);
    group.bench_function("add_10k", |b| {
        b.iter_batched(
            || MemTable::new(InternalKeyComparator::default()),
            |mut mem| {
                for (i, key) in keys.iter().enumerate() {
                    mem.add(i as u64 + 1, ValueType::Value, key, &value);
                }
                mem
            },
            BatchSize::LargeInput,
        )
    });

    let mut mem = MemTable::new(InternalKeyComparator::default());
    for (i, key) in keys.iter().enumerate() {
        mem.add(i as u64 + 1, ValueType::Value, key, &value);
    }
    let probes: Vec<LookupKey> = keys.iter().map(|k| LookupKey::new(k, u64::MAX >> 8)).collect();

    group.bench_function("get_10k", |b| {
        b.iter(|| {
            for probe in &probes {
                black_box(mem.get(probe).ok());
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_key_codec, bench_comparator, bench_arena, bench_memtable);
criterion_main!(benches);
