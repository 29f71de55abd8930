//! Oscillator slot model and bus parameters shared by every voice.
//!
//! The control path owns one `SynthParams`, mutates it through the engine's
//! setters and publishes copies to the render path. Every field is stored
//! already clamped, so the render path can use a snapshot without checking
//! it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::{lfo::LfoShape, oscillator::Waveform};

/// Oscillator slots per voice.
pub const SLOT_COUNT: usize = 2;

pub const OCTAVE_RANGE: i32 = 4;
pub const SEMITONE_RANGE: i32 = 12;
pub const FINE_CENTS_RANGE: i32 = 100;
pub const COARSE_CENTS_RANGE: i32 = 1200;

pub const MAX_LFO_DEPTH_CENTS: f32 = 100.0;
pub const MIN_LFO_RATE: f32 = 0.01;
pub const MAX_LFO_RATE: f32 = 20.0;

/// Clamp a UI value, falling back when it is NaN or infinite.
#[inline]
pub(crate) fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Frequency of a MIDI note, A4 (69) = 440 Hz.
#[inline]
pub fn note_to_frequency(note: u8) -> f64 {
    440.0 * 2.0_f64.powf((f64::from(note) - 69.0) / 12.0)
}

/// Frequency of a slot oscillator for a voice at `base_frequency`.
#[inline]
pub fn slot_frequency(base_frequency: f64, pitch: &PitchOffset) -> f64 {
    base_frequency * pitch.ratio()
}

/// Frequency ratio of a detune in cents.
#[inline]
pub fn cents_ratio(cents: f64) -> f64 {
    2.0_f64.powf(cents / 1200.0)
}

/// Pitch offset of one slot relative to the played note.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PitchOffset {
    pub octave: i32,
    pub semitone: i32,
    pub fine_cents: i32,
    pub coarse_cents: i32,
}

impl PitchOffset {
    pub fn new(octave: i32, semitone: i32, fine_cents: i32, coarse_cents: i32) -> Self {
        Self {
            octave,
            semitone,
            fine_cents,
            coarse_cents,
        }
        .validated()
    }

    pub fn validated(&self) -> Self {
        Self {
            octave: self.octave.clamp(-OCTAVE_RANGE, OCTAVE_RANGE),
            semitone: self.semitone.clamp(-SEMITONE_RANGE, SEMITONE_RANGE),
            fine_cents: self.fine_cents.clamp(-FINE_CENTS_RANGE, FINE_CENTS_RANGE),
            coarse_cents: self
                .coarse_cents
                .clamp(-COARSE_CENTS_RANGE, COARSE_CENTS_RANGE),
        }
    }

    /// Total semitone offset (`octave · 12 + semitone`).
    pub fn semitones(&self) -> i32 {
        self.octave * 12 + self.semitone
    }

    /// Total cent offset (`fine + coarse`).
    pub fn cents(&self) -> i32 {
        self.fine_cents + self.coarse_cents
    }

    /// `2^(semis/12) · 2^(cents/1200)`
    pub fn ratio(&self) -> f64 {
        2.0_f64.powf(f64::from(self.semitones()) / 12.0) * cents_ratio(f64::from(self.cents()))
    }

    /// Merge a partial update. Absent fields keep their value; the result is
    /// clamped.
    pub fn apply(&self, partial: PartialPitch) -> Self {
        Self {
            octave: partial.octave.unwrap_or(self.octave),
            semitone: partial.semitone.unwrap_or(self.semitone),
            fine_cents: partial.fine_cents.unwrap_or(self.fine_cents),
            coarse_cents: partial.coarse_cents.unwrap_or(self.coarse_cents),
        }
        .validated()
    }
}

/// A pitch update where every field is optional.
///
/// ```
/// use bohemian::synth::params::PartialPitch;
///
/// let up_an_octave = PartialPitch::default().octave(1);
/// assert_eq!(up_an_octave.octave, Some(1));
/// assert_eq!(up_an_octave.semitone, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartialPitch {
    pub octave: Option<i32>,
    pub semitone: Option<i32>,
    pub fine_cents: Option<i32>,
    pub coarse_cents: Option<i32>,
}

impl PartialPitch {
    pub fn octave(mut self, octave: i32) -> Self {
        self.octave = Some(octave);
        self
    }

    pub fn semitone(mut self, semitone: i32) -> Self {
        self.semitone = Some(semitone);
        self
    }

    pub fn fine_cents(mut self, cents: i32) -> Self {
        self.fine_cents = Some(cents);
        self
    }

    pub fn coarse_cents(mut self, cents: i32) -> Self {
        self.coarse_cents = Some(cents);
        self
    }
}

impl From<PitchOffset> for PartialPitch {
    fn from(pitch: PitchOffset) -> Self {
        Self {
            octave: Some(pitch.octave),
            semitone: Some(pitch.semitone),
            fine_cents: Some(pitch.fine_cents),
            coarse_cents: Some(pitch.coarse_cents),
        }
    }
}

/// Shape, level and tuning of one oscillator slot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotParams {
    pub shape: Waveform,
    pub gain: f32,
    pub pitch: PitchOffset,
}

impl Default for SlotParams {
    fn default() -> Self {
        Self {
            shape: Waveform::Sine,
            gain: 0.5,
            pitch: PitchOffset::default(),
        }
    }
}

impl SlotParams {
    pub fn new(shape: Waveform, gain: f32) -> Self {
        Self {
            shape,
            gain: clamp_or(gain, 0.0, 1.0, 0.0),
            pitch: PitchOffset::default(),
        }
    }

    pub fn validated(&self) -> Self {
        Self {
            shape: self.shape,
            gain: clamp_or(self.gain, 0.0, 1.0, 0.0),
            pitch: self.pitch.validated(),
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    /// Room size, 0.2..4.0. Drives the comb feedback.
    pub room: f32,
    /// High-frequency damping inside the comb feedback, 0..0.99.
    pub damp: f32,
    /// Dry/wet mix inside the reverb, also used as the bus wet gain.
    pub mix: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            room: 1.6,
            damp: 0.2,
            mix: 0.35,
        }
    }
}

impl ReverbParams {
    pub fn validated(&self) -> Self {
        use crate::dsp::reverb::{MAX_DAMP, MAX_ROOM, MIN_ROOM};
        let defaults = Self::default();
        Self {
            room: clamp_or(self.room, MIN_ROOM, MAX_ROOM, defaults.room),
            damp: clamp_or(self.damp, 0.0, MAX_DAMP, defaults.damp),
            mix: clamp_or(self.mix, 0.0, 1.0, defaults.mix),
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionParams {
    pub drive: f32,
    pub mix: f32,
}

impl Default for DistortionParams {
    fn default() -> Self {
        Self {
            drive: 0.15,
            mix: 1.0,
        }
    }
}

impl DistortionParams {
    pub fn validated(&self) -> Self {
        let defaults = Self::default();
        Self {
            drive: clamp_or(self.drive, 0.0, 1.0, defaults.drive),
            mix: clamp_or(self.mix, 0.0, 1.0, defaults.mix),
        }
    }
}

/// Which oscillator slots the LFO detunes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LfoTarget {
    A,
    B,
    #[default]
    Both,
}

impl LfoTarget {
    pub fn applies_to(self, slot: usize) -> bool {
        match self {
            LfoTarget::A => slot == 0,
            LfoTarget::B => slot == 1,
            LfoTarget::Both => true,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LfoParams {
    pub shape: LfoShape,
    pub rate_hz: f32,
    /// Peak detune in cents. 0 disables the LFO.
    pub depth_cents: f32,
    pub target: LfoTarget,
}

impl Default for LfoParams {
    fn default() -> Self {
        Self {
            shape: LfoShape::Sine,
            rate_hz: 5.0,
            depth_cents: 0.0,
            target: LfoTarget::Both,
        }
    }
}

impl LfoParams {
    pub fn validated(&self) -> Self {
        let defaults = Self::default();
        Self {
            shape: self.shape,
            rate_hz: clamp_or(self.rate_hz, MIN_LFO_RATE, MAX_LFO_RATE, defaults.rate_hz),
            depth_cents: clamp_or(self.depth_cents, 0.0, MAX_LFO_DEPTH_CENTS, 0.0),
            target: self.target,
        }
    }
}

/// Everything the render path needs to know besides the voice commands.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthParams {
    pub slots: [SlotParams; SLOT_COUNT],
    pub reverb: ReverbParams,
    pub distortion: DistortionParams,
    pub lfo: LfoParams,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            slots: [
                SlotParams::new(Waveform::Sine, 0.5),
                SlotParams::new(Waveform::Saw, 0.5),
            ],
            reverb: ReverbParams::default(),
            distortion: DistortionParams::default(),
            lfo: LfoParams::default(),
        }
    }
}

impl SynthParams {
    pub fn validated(&self) -> Self {
        Self {
            slots: self.slots.map(|slot| slot.validated()),
            reverb: self.reverb.validated(),
            distortion: self.distortion.validated(),
            lfo: self.lfo.validated(),
        }
    }

    /// Per-slot frequency ratios for a block, including LFO detune.
    pub fn slot_ratios(&self, lfo_value: f32) -> [f64; SLOT_COUNT] {
        let detune = f64::from(lfo_value * self.lfo.depth_cents);
        let mut ratios = [1.0; SLOT_COUNT];
        for (slot, ratio) in ratios.iter_mut().enumerate() {
            *ratio = self.slots[slot].pitch.ratio();
            if self.lfo.depth_cents > 0.0 && self.lfo.target.applies_to(slot) {
                *ratio *= cents_ratio(detune);
            }
        }
        ratios
    }
}
