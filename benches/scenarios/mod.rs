//! Real-world scenario benchmarks.
//!
//! These drive the whole instrument the way the audio callback does:
//! control-side note events, then full graph blocks.

mod voices;

pub use voices::bench_voices;
