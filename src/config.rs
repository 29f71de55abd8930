//! Engine configuration.
//!
//! Every tuned constant of the voice lifecycle lives here as a default rather
//! than as a hard-coded value, so hosts can trade click risk for latency.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    synth::{clock::seconds_to_frames, params::SynthParams},
    MAX_POLYPHONY, MIN_TIME,
};

/// Envelope and lifecycle windows, all in seconds.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceTimings {
    /// Ramp from the gain floor (or current gain on retrigger) to full level.
    pub attack: f32,
    /// Ramp from full level down to `sustain_level`.
    pub decay: f32,
    pub sustain_level: f32,
    /// Normal note-off release window.
    pub release: f32,
    /// Release window for steals and force stops. Kept under 10ms.
    pub force_release: f32,
    /// Extra audio time after the oscillator stop before resources are freed.
    pub safety_margin: f32,
    /// Voices older than this are disposed by the sweep.
    pub max_voice_life: f32,
    /// Audio-clock period of the safety sweep.
    pub sweep_interval: f32,
}

impl Default for VoiceTimings {
    fn default() -> Self {
        Self {
            attack: 0.003,
            decay: 0.06,
            sustain_level: 0.85,
            release: 0.06,
            force_release: 0.005,
            safety_margin: 0.02,
            max_voice_life: 8.0,
            sweep_interval: 0.25,
        }
    }
}

impl VoiceTimings {
    /// Clamp every window into a usable range.
    pub fn validated(&self) -> Self {
        Self {
            attack: self.attack.max(MIN_TIME),
            decay: self.decay.max(MIN_TIME),
            sustain_level: self.sustain_level.clamp(0.0, 1.0),
            release: self.release.max(MIN_TIME),
            force_release: self.force_release.clamp(MIN_TIME, 0.0099),
            safety_margin: self.safety_margin.max(0.0),
            max_voice_life: self.max_voice_life.max(0.1),
            sweep_interval: self.sweep_interval.max(0.01),
        }
    }
}

/// `VoiceTimings` resolved to audio-clock frames for one sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTimings {
    pub attack: u64,
    pub decay: u64,
    pub release: u64,
    pub force_release: u64,
    pub safety_margin: u64,
    pub max_voice_life: u64,
    pub sweep_interval: u64,
}

impl FrameTimings {
    pub fn new(timings: &VoiceTimings, sample_rate: f32) -> Self {
        let frames = |seconds: f32| seconds_to_frames(seconds, sample_rate);
        Self {
            attack: frames(timings.attack).max(1),
            decay: frames(timings.decay).max(1),
            release: frames(timings.release).max(1),
            force_release: frames(timings.force_release).max(1),
            safety_margin: frames(timings.safety_margin),
            max_voice_life: frames(timings.max_voice_life).max(1),
            sweep_interval: frames(timings.sweep_interval).max(1),
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Voices allowed before note-on steals the oldest (1..=32).
    pub max_polyphony: usize,
    /// Gain applied to the summed voices before the dry/wet split.
    pub master_gain: f32,
    /// Capacity of the control-to-render command ring.
    pub command_capacity: usize,
    pub timings: VoiceTimings,
    /// Initial slot, reverb, distortion and LFO parameters.
    pub params: SynthParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_polyphony: 8,
            master_gain: 0.9,
            command_capacity: 1024,
            timings: VoiceTimings::default(),
            params: SynthParams::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_max_polyphony(mut self, voices: usize) -> Self {
        self.max_polyphony = voices;
        self
    }

    pub fn with_timings(mut self, timings: VoiceTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_params(mut self, params: SynthParams) -> Self {
        self.params = params;
        self
    }

    /// Copy of this config with every field clamped into range.
    pub fn validated(&self) -> Self {
        Self {
            max_polyphony: self.max_polyphony.clamp(1, MAX_POLYPHONY),
            master_gain: if self.master_gain.is_finite() {
                self.master_gain.clamp(0.0, 1.0)
            } else {
                0.9
            },
            command_capacity: self.command_capacity.max(64),
            timings: self.timings.validated(),
            params: self.params.validated(),
        }
    }
}
