//! Benchmarks for waveshaping distortion.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use bohemian::dsp::distortion;

use crate::BLOCK_SIZES;

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");

    for &size in BLOCK_SIZES {
        // Generate a test signal (sine-like values)
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        // Default drive - gentle saturation
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("soft_clip_default", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                distortion::soft_clip_buffer(black_box(&mut buffer), black_box(0.15));
            })
        });

        // Full drive - same cost, steepest curve
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("soft_clip_full", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                distortion::soft_clip_buffer(black_box(&mut buffer), black_box(1.0));
            })
        });
    }

    group.finish();
}
