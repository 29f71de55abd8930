//! Benchmarks for DSP primitives and the full instrument.
//!
//! Run with: cargo bench
//!
//! Everything here runs on the render path, so it has to finish well inside
//! the audio deadline.
//!
//! Reference timing at 48kHz sample rate:
//!   - 64 samples  = 1.33ms deadline
//!   - 128 samples = 2.67ms deadline
//!   - 256 samples = 5.33ms deadline
//!   - 512 samples = 10.67ms deadline
//!
//! Benchmark groups:
//!   - dsp/*        Low-level primitives (oscillator, envelope, reverb, etc.)
//!   - scenarios/*  Whole-instrument blocks with several voices sounding

use criterion::{criterion_group, criterion_main};

mod dsp;
mod scenarios;

/// Common buffer sizes used in audio applications.
pub const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

criterion_group!(
    benches,
    // Low-level DSP primitives
    dsp::bench_oscillator,
    dsp::bench_envelope,
    dsp::bench_distortion,
    dsp::bench_mix,
    dsp::bench_reverb,
    // Whole instrument
    scenarios::bench_voices,
);
criterion_main!(benches);
