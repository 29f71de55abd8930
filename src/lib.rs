pub mod config;
pub mod dsp;
pub mod error;
pub mod graph; // Output bus: dry path, distortion + reverb wet path
pub mod io;
pub mod runtime; // Device-backed host with sweep thread
pub mod synth; // Voice lifecycle: control-side engine, render-side lanes

pub use config::{EngineConfig, VoiceTimings};
pub use error::{Error, Result};
pub use runtime::Synth;

use graph::bus::AudioGraph;
use synth::engine::VoiceEngine;

pub const MAX_BLOCK_SIZE: usize = 2048;
pub const MAX_POLYPHONY: usize = 32;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;

/// Build a connected control/render pair without touching an audio device.
///
/// The `VoiceEngine` is the control path; the `AudioGraph` is the render path
/// and is usually moved into the audio callback. Driving both from one thread
/// (offline bounce, tests) is fine: commands queued by the engine are applied
/// at the start of the next rendered block.
pub fn instrument(config: &EngineConfig, sample_rate: f32) -> (VoiceEngine, AudioGraph) {
    let config = config.validated();
    let (engine, renderer, clock) = synth::channel(&config, sample_rate);
    let graph = AudioGraph::new(renderer, clock, &config);
    (engine, graph)
}
