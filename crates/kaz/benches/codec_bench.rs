//! Benchmarks for the series codec and the bundle format.
//!
//! Run with: cargo bench --package kaz

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kaz::bundle::{write_bundle, BundleConfig, BundleReader, Precision, TimeSeries};
use kaz::codec::{compress, decompress, Sample};
use tempfile::TempDir;

const STEP: u64 = 3_600;

/// Generate a typical hourly series (regular step, slowly varying values).
fn generate_series(count: usize) -> Vec<Sample<f64>> {
    let start = 1_577_836_800_i64;
    let mut value = 50.0;
    (0..count)
        .map(|i| {
            if i % 4 == 0 {
                value += (i as f64 * 0.1).sin();
            }
            Sample::new(start + i as i64 * STEP as i64, value)
        })
        .collect()
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");
    for size in [1_000usize, 10_000, 100_000] {
        let samples = generate_series(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("f64", size), &samples, |b, samples| {
            b.iter(|| compress(black_box(samples), STEP))
        });

        let narrowed: Vec<Sample<f32>> = samples
            .iter()
            .map(|s| Sample::new(s.timestamp, s.value as f32))
            .collect();
        group.bench_with_input(BenchmarkId::new("f32", size), &narrowed, |b, samples| {
            b.iter(|| compress(black_box(samples), STEP))
        });
    }
    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompress");
    for size in [1_000usize, 10_000, 100_000] {
        let bytes = compress(&generate_series(size), STEP).unwrap();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("f64", size), &bytes, |b, bytes| {
            b.iter(|| decompress::<f64>(black_box(bytes)).unwrap())
        });
    }
    group.finish();
}

fn bench_bundle(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("bench");
    let config = BundleConfig::default().with_precision(Precision::Double);
    let series: Vec<TimeSeries> = (0..50)
        .map(|i| TimeSeries::new(format!("node{i}.flow"), generate_series(8_760)))
        .collect();

    let mut group = c.benchmark_group("bundle");
    group.sample_size(20);
    group.throughput(Throughput::Elements(50 * 8_760));
    group.bench_function("write_50x8760", |b| {
        b.iter(|| write_bundle(&base, black_box(&series), &config).unwrap())
    });

    write_bundle(&base, &series, &config).unwrap();
    let reader = BundleReader::open(&base, &config).unwrap();
    group.bench_function("read_all_50x8760", |b| b.iter(|| reader.read_all().unwrap()));
    group.throughput(Throughput::Elements(8_760));
    group.bench_function("read_one_by_name", |b| {
        b.iter(|| reader.read_series(black_box("node42.flow")).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_compress, bench_decompress, bench_bundle);
criterion_main!(benches);
