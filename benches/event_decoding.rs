//! Benchmarks for payload decoding
//!
//! Measures:
//! - Event demultiplexing into the last-known-state aggregate
//! - The structural record walk on its own
//! - Fixed-point sample decoding across a full data package
//! - Stream framing of back-to-back packages

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use telepack::test_utils::{mixed_event_payload, sample_package};
use telepack::{EventRecords, PackageCodec, PackageEvents, PackageFormat};
use tokio_util::codec::{Decoder, Encoder};

fn bench_event_demultiplexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_demultiplexing");

    for objects in [10u32, 100, 400] {
        let payload = mixed_event_payload(objects);
        group.throughput(Throughput::Bytes(payload.len() as u64));

        group.bench_with_input(BenchmarkId::new("aggregate", objects), &payload, |b, payload| {
            b.iter(|| {
                let events = PackageEvents::parse(PackageFormat::Events, black_box(payload));
                black_box(events)
            })
        });

        group.bench_with_input(BenchmarkId::new("walk_only", objects), &payload, |b, payload| {
            b.iter(|| black_box(EventRecords::new(black_box(payload)).count()))
        });
    }

    group.finish();
}

fn bench_sample_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_decoding");

    for bits in [16u8, 32] {
        let sensors = 4096usize;
        let payload: Vec<u8> = (0..sensors * bits as usize / 8).map(|i| (i % 251) as u8).collect();
        let mut package = sample_package(PackageFormat::Data, payload);
        package.bits_per_sensor = bits;
        package.sensor_count = sensors as u16;

        group.throughput(Throughput::Elements(sensors as u64));
        group.bench_with_input(BenchmarkId::new("all_sensors", bits), &package, |b, package| {
            b.iter(|| black_box(package.samples()))
        });
    }

    group.finish();
}

fn bench_stream_framing(c: &mut Criterion) {
    let payload = mixed_event_payload(50);
    let mut encoded = BytesMut::new();
    let mut codec = PackageCodec::new();
    for _ in 0..64 {
        let package = sample_package(PackageFormat::Events, payload.clone());
        if codec.encode(package, &mut encoded).is_err() {
            return;
        }
    }

    let mut group = c.benchmark_group("stream_framing");
    group.throughput(Throughput::Bytes(encoded.len() as u64));
    group.bench_function("decode_64_packages", |b| {
        b.iter(|| {
            let mut buf = encoded.clone();
            let mut codec = PackageCodec::new();
            let mut count = 0;
            while let Ok(Some(package)) = codec.decode(&mut buf) {
                black_box(package);
                count += 1;
            }
            black_box(count)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_event_demultiplexing, bench_sample_decoding, bench_stream_framing);
criterion_main!(benches);
