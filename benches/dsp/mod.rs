//! Benchmarks for low-level DSP primitives.

mod distortion;
mod envelope;
mod mix;
mod oscillator;
mod reverb;

pub use distortion::bench_distortion;
pub use envelope::bench_envelope;
pub use mix::bench_mix;
pub use oscillator::bench_oscillator;
pub use reverb::bench_reverb;
