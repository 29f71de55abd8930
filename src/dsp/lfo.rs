//! Low Frequency Oscillator for detune modulation.

use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Low Frequency Oscillators
=========================

An LFO is an oscillator at control rate (~0.01 Hz to ~20 Hz). Here a single
free-running LFO is shared by every voice and drives oscillator detune in
cents, the classic vibrato route:

    LFO (bipolar, -1..+1) × depth_cents → oscillator detune

Control rate
------------

The value is sampled once per rendered block, at the block boundary, and
held for the whole block. At 128 frames / 48 kHz that is a 375 Hz control
rate: far above any useful LFO rate, so the steps are inaudible, and every
voice in a block sees the same pitch offset.

Shapes
------

    Sine      smooth vibrato
    Triangle  constant rate of change
    Saw       rise then snap back (ramp up)
    Square    trill between two pitches
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LfoShape {
    #[default]
    Sine,
    Triangle,
    Saw,
    Square,
}

impl LfoShape {
    /// Bipolar value at `phase` in [0, 1).
    #[inline]
    pub fn value_at(self, phase: f32) -> f32 {
        match self {
            LfoShape::Sine => (TAU * phase).sin(),
            LfoShape::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            LfoShape::Saw => 2.0 * phase - 1.0,
            LfoShape::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// Free-running block-rate LFO.
#[derive(Debug, Clone, Default)]
pub struct Lfo {
    phase: f32,
}

impl Lfo {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    /// Value at the current block boundary, then advance past `frames`.
    pub fn advance(&mut self, shape: LfoShape, rate_hz: f32, frames: usize, sample_rate: f32) -> f32 {
        let value = shape.value_at(self.phase);
        let cycles = rate_hz.max(0.0) * frames as f32 / sample_rate;
        self.phase = (self.phase + cycles).fract();
        value
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_are_bipolar() {
        for shape in [LfoShape::Sine, LfoShape::Triangle, LfoShape::Saw, LfoShape::Square] {
            for i in 0..100 {
                let v = shape.value_at(i as f32 / 100.0);
                assert!((-1.0..=1.0).contains(&v), "{shape:?} gave {v}");
            }
        }
        assert!((LfoShape::Triangle.value_at(0.5) + 1.0).abs() < 1e-6);
        assert!((LfoShape::Saw.value_at(0.0) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn advance_wraps_phase() {
        let mut lfo = Lfo::new();
        // 5 Hz at 48 kHz: 9600 frames per cycle
        for _ in 0..75 {
            lfo.advance(LfoShape::Sine, 5.0, 128, 48_000.0);
        }
        assert!(lfo.phase() < 1e-3 || lfo.phase() > 0.999, "phase {}", lfo.phase());
    }
}
