//! Benchmarks for the pixel transforms, one entry per available backend.
//! Run with: cargo bench -p cachepix --features bench --bench kernels -- "<pattern>"
//!
//! Examples:
//!   cargo bench -p cachepix --features bench --bench kernels -- "scale_bias"
//!   cargo bench -p cachepix --features bench --bench kernels -- "grayscale/u16"
//!   cargo bench -p cachepix --features bench --bench kernels -- "avx2"

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput};

use crate::prelude::*;

const WIDTH: u32 = 3840;
const HEIGHT: u32 = 2160;

/// 4K buffer filled with a deterministic pattern.
fn create_test_buffer(maxval: u16) -> PixelBuffer {
    let mut buffer = PixelBuffer::new(WIDTH, HEIGHT, maxval).unwrap();
    let depth = buffer.depth();
    for row in buffer.rows_mut() {
        match depth {
            SampleDepth::U8 => {
                for (i, v) in row.iter_mut().enumerate() {
                    *v = ((i * 7) % (maxval as usize + 1)) as u8;
                }
            }
            SampleDepth::U16 => {
                for (i, v) in row.chunks_exact_mut(2).enumerate() {
                    let sample = ((i * 613) % (maxval as usize + 1)) as u16;
                    v.copy_from_slice(&sample.to_be_bytes());
                }
            }
        }
    }
    buffer
}

fn depth_label(maxval: u16) -> &'static str {
    match SampleDepth::from_maxval(maxval) {
        SampleDepth::U8 => "u8",
        SampleDepth::U16 => "u16",
    }
}

pub fn benchmarks(c: &mut Criterion) {
    benchmark_scale_bias(c);
    benchmark_grayscale(c);
    benchmark_rescale(c);
}

fn benchmark_scale_bias(c: &mut Criterion) {
    let mut group = c.benchmark_group("scale_bias");
    group.throughput(Throughput::Elements(WIDTH as u64 * HEIGHT as u64));

    let params = ScaleBias::new(1.3, -7.0);
    for maxval in [255, 65535] {
        let src = create_test_buffer(maxval);
        for backend in Backend::available() {
            group.bench_function(BenchmarkId::new(depth_label(maxval), backend), |b| {
                let mut buffer = src.clone();
                b.iter(|| params.apply_with(backend, black_box(&mut buffer)).unwrap())
            });
        }
    }

    group.finish();
}

fn benchmark_grayscale(c: &mut Criterion) {
    let mut group = c.benchmark_group("grayscale");
    group.throughput(Throughput::Elements(WIDTH as u64 * HEIGHT as u64));

    for maxval in [255, 65535] {
        let src = create_test_buffer(maxval);
        let mut dst = PixelBuffer::new(WIDTH, HEIGHT, maxval).unwrap();
        for backend in Backend::available() {
            group.bench_function(BenchmarkId::new(depth_label(maxval), backend), |b| {
                b.iter(|| {
                    Grayscale
                        .apply_with(backend, black_box(&src), black_box(&mut dst))
                        .unwrap()
                })
            });
        }
    }

    group.finish();
}

fn benchmark_rescale(c: &mut Criterion) {
    let mut group = c.benchmark_group("rescale");
    group.throughput(Throughput::Elements(WIDTH as u64 * HEIGHT as u64));

    // fresh copy per iteration, rescale changes the maxval it starts from
    for (old, new) in [(255, 100), (65535, 4095), (255, 65535)] {
        let src = create_test_buffer(old);
        let name = format!("{}_to_{}", old, new);
        for backend in Backend::available() {
            group.bench_function(BenchmarkId::new(&name, backend), |b| {
                b.iter_batched_ref(
                    || src.clone(),
                    |buffer| RescaleMaxval::new(new).apply_with(backend, buffer).unwrap(),
                    criterion::BatchSize::LargeInput,
                )
            });
        }
    }

    group.finish();
}
