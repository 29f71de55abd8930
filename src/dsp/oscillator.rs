use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Oscillator Waveforms
====================

Each voice carries one oscillator per slot. The waveform is a closed set
resolved when a block starts, never looked up per sample.

  Sine     Fundamental only. Smooth, hollow.
  Saw      All harmonics, falling off as 1/n. Bright, buzzy.
  Square   Odd harmonics only, 1/n. Hollow, woody.

Naive saw and square waves have a hard discontinuity once per period, which
aliases badly at high pitches. PolyBLEP smooths the two samples around each
edge with a polynomial residual:

    naive saw     /|/|/|      edge at phase 0
    polyblep     /‾\/‾\/      (exaggerated)

The phase runs in [0, 1); increment = frequency / sample_rate.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Saw,
    Square,
}

impl Waveform {
    /// Parse a UI shape tag. Unknown tags fall back to `Sine`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "saw" | "sawtooth" => Waveform::Saw,
            "square" => Waveform::Square,
            _ => Waveform::Sine,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Saw => "saw",
            Waveform::Square => "square",
        }
    }
}

/// Polynomial band-limited step residual for a discontinuity at phase 0.
#[inline]
fn poly_blep(t: f32, dt: f32) -> f32 {
    if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

/// Phase-accumulating oscillator (allocation-free).
#[derive(Debug, Clone)]
pub struct OscillatorBlock {
    waveform: Waveform,
    phase: f32,
}

impl OscillatorBlock {
    pub fn new(waveform: Waveform) -> Self {
        Self { waveform, phase: 0.0 }
    }

    pub fn sine() -> Self {
        Self::new(Waveform::Sine)
    }

    pub fn sawtooth() -> Self {
        Self::new(Waveform::Saw)
    }

    pub fn square() -> Self {
        Self::new(Waveform::Square)
    }

    /// Change shape without resetting phase, so retyping a sounding voice
    /// does not click more than the waveform change itself.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Produce one sample and advance by `increment` (cycles per sample).
    #[inline]
    pub fn next_sample(&mut self, increment: f32) -> f32 {
        let t = self.phase;
        let sample = match self.waveform {
            Waveform::Sine => (TAU * t).sin(),
            Waveform::Saw => 2.0 * t - 1.0 - poly_blep(t, increment),
            Waveform::Square => {
                let naive = if t < 0.5 { 1.0 } else { -1.0 };
                let falling = (t + 0.5).fract();
                naive + poly_blep(t, increment) - poly_blep(falling, increment)
            }
        };

        self.phase += increment;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }

    /// Fill `out` at `frequency` Hz.
    pub fn render(&mut self, out: &mut [f32], frequency: f32, sample_rate: f32) {
        let increment = phase_increment(frequency, sample_rate);
        for sample in out.iter_mut() {
            *sample = self.next_sample(increment);
        }
    }
}

/// Cycles per sample, limited to Nyquist.
#[inline]
pub fn phase_increment(frequency: f32, sample_rate: f32) -> f32 {
    (frequency / sample_rate).clamp(0.0, 0.5)
}
