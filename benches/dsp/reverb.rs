//! Benchmarks for reverb processing.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use bohemian::dsp::reverb::StereoReverb;

use crate::BLOCK_SIZES;

pub fn bench_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/reverb");

    let sample_rate = 48_000.0;

    for &size in BLOCK_SIZES {
        // Generate a test signal (impulse-like with some content)
        let input: Vec<f32> = (0..size)
            .map(|i| {
                if i < 10 {
                    1.0 - (i as f32 / 10.0) // Initial impulse
                } else {
                    (i as f32 * 0.05).sin() * 0.1 // Quiet tail
                }
            })
            .collect();
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        // (name, room, damp)
        let settings = [
            ("small_room", 0.2, 0.5),
            ("default", 1.6, 0.2),
            ("large_room", 4.0, 0.3),
            ("high_damping", 1.6, 0.9),
        ];

        for (name, room, damp) in settings {
            let Ok(mut reverb) = StereoReverb::new(sample_rate) else {
                continue;
            };
            reverb.set_room(room);
            reverb.set_damping(damp);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    reverb.process_block(
                        black_box(&input),
                        black_box(&input),
                        &mut left,
                        &mut right,
                    );
                })
            });
        }
    }

    group.finish();
}
