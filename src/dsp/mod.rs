//! Low-level DSP primitives used by the voice lanes and the output bus.
//!
//! These components are allocation-free after construction and realtime-safe,
//! so they can live directly inside render-side structs. They stay focused on
//! the signal-processing math; lifecycle and routing live in `synth` and
//! `graph`.

/// Soft-clip waveshaper for the wet path.
pub mod distortion;
/// Attack/decay/sustain gain envelope with exponential release.
pub mod envelope;
/// Block-rate LFO used for shared detune.
pub mod lfo;
/// Summing and dry/wet helpers.
pub mod mix;
/// Band-limited oscillator waveforms.
pub mod oscillator;
/// Stereo comb/allpass reverb.
pub mod reverb;

pub use envelope::EnvelopeStage;
