//! Benchmarks for tagframe codecs and tag lookups
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tagframe::codec::{ByteCodec, Cursor, IndicatorCodec, TextCodec};
use tagframe::storage::MemoryStorage;
use tagframe::tagstore::{TagMap, TagStore};

fn create_data(size_bytes: usize, pattern: u8) -> Vec<u8> {
    vec![pattern; size_bytes]
}

// === Codec Benchmarks ===

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let byte = ByteCodec::new();
    let text = TextCodec::new();

    for size in [16usize, 255, 4096, 65536] {
        let data = create_data(size, b'7');
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("byte", size), &data, |b, data| {
            b.iter(|| byte.encode(black_box(data)));
        });
        group.bench_with_input(BenchmarkId::new("text", size), &data, |b, data| {
            b.iter(|| text.encode(black_box(data)));
        });
    }

    group.finish();
}

fn bench_decode_sequence(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_sequence");

    for count in [100usize, 1000] {
        let codec = ByteCodec::new();
        let mut storage = MemoryStorage::new();
        for i in 0..count {
            codec.append(&mut storage, &create_data(i % 300, 1)).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("decode", count), &storage, |b, storage| {
            b.iter(|| {
                let mut cursor = Cursor::new();
                codec.decode_many(black_box(storage), &mut cursor, -1).unwrap()
            });
        });
        group.bench_with_input(BenchmarkId::new("skip", count), &storage, |b, storage| {
            b.iter(|| {
                let mut cursor = Cursor::new();
                while codec.skip(black_box(storage), &mut cursor).unwrap().is_some() {}
                cursor
            });
        });
    }

    group.finish();
}

// === Tag Store Benchmarks ===

fn bench_tag_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("tag_lookup");

    for count in [100usize, 1000] {
        let mut store = TagStore::new(MemoryStorage::new());
        for i in 0..count {
            store
                .put_unchecked(&format!("tag-{}", i), &create_data(64, 9))
                .unwrap();
        }
        let last = format!("tag-{}", count - 1);

        group.bench_with_input(BenchmarkId::new("get_last", count), &store, |b, store| {
            b.iter(|| store.get(black_box(&last)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("exists_missing", count), &store, |b, store| {
            b.iter(|| store.exists(black_box("absent")).unwrap());
        });
    }

    group.finish();
}

fn bench_checked_put(c: &mut Criterion) {
    c.bench_function("checked_put_overwrite", |b| {
        let mut store = TagStore::new(MemoryStorage::new());
        for i in 0..200 {
            store.put_unchecked(&format!("tag-{}", i), b"v").unwrap();
        }
        b.iter(|| store.put(black_box("tag-100"), b"updated").unwrap());
    });
}

criterion_group!(codec_benches, bench_encode, bench_decode_sequence);
criterion_group!(store_benches, bench_tag_lookup, bench_checked_put);
criterion_main!(codec_benches, store_benches);
