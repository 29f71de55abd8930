//! Benchmarks for the gain envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use bohemian::dsp::envelope::GainEnvelope;

use crate::BLOCK_SIZES;

// 3 ms attack / 60 ms decay at 48 kHz
const ATTACK: u32 = 144;
const DECAY: u32 = 2_880;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // One-second attack so every iteration stays on the ramp
        let mut env = GainEnvelope::new(48_000, DECAY, 0.85);
        env.start();
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Sustain phase (holding steady)
        let mut env = GainEnvelope::new(ATTACK, DECAY, 0.85);
        env.start();
        for _ in 0..(ATTACK + DECAY) {
            env.next_sample();
        }
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Exponential release
        let mut env = GainEnvelope::new(ATTACK, DECAY, 0.85);
        env.start();
        for _ in 0..(ATTACK + DECAY) {
            env.next_sample();
        }
        env.release(2_880);
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
