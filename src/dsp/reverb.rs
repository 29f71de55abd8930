//! Reverb - Stereo Feedback Delay Network
//!
//! Each channel runs its own small Schroeder-style network. The left and
//! right networks use different delay lengths so the two tails decorrelate
//! and the reverb sounds wide even from a mono source.
//!
//! # Per-Channel Architecture
//!
//! ```text
//! Input ──┬──→ [Comb 1] ──┐
//!         ├──→ [Comb 2] ──┤
//!         ├──→ [Comb 3] ──┼──→ (+) × ¼ ──→ [Allpass] ──→ wet
//!         └──→ [Comb 4] ──┘
//!
//! out = dry × (1 - mix) + wet × mix
//! ```
//!
//! ## Comb Lines
//!
//! A comb line feeds its delayed output back into itself through a one-pole
//! lowpass, so every echo is a little darker than the last (air and wall
//! absorption):
//!
//! ```text
//! y[n]  = buf[n - D]
//! lp[n] = y[n] · (1 - damp) + lp[n-1] · damp
//! buf[n] = x[n] + feedback · lp[n]
//! ```
//!
//! ## Allpass Line
//!
//! One allpass (g = 0.7) smears the summed comb echoes in time without
//! colouring them.
//!
//! ## Delay Lengths
//!
//! | line      | left (ms) | right (ms) |
//! |-----------|-----------|------------|
//! | comb 1-4  | 29.7, 37.1, 41.1, 43.7 | 30.3, 33.9, 39.7, 45.1 |
//! | allpass   | 7.5       | 6.3        |
//!
//! Lengths are fixed at construction. Only `feedback` (derived from room),
//! `damp` and `mix` are live-tunable, which keeps parameter changes
//! allocation-free and click-free.
//!
//! # Room → Feedback
//!
//! `room` spans 0.2..4.0 and maps onto feedback 0.6..0.93 along a
//! `log2(room + 1)` curve normalised so the ends of the room range land
//! exactly on the ends of the feedback range.

use crate::{dsp::mix::blend_dry_wet, error::Error};

pub const MIN_ROOM: f32 = 0.2;
pub const MAX_ROOM: f32 = 4.0;
pub const MIN_FEEDBACK: f32 = 0.6;
pub const MAX_FEEDBACK: f32 = 0.93;
pub const MAX_DAMP: f32 = 0.99;
pub const ALLPASS_GAIN: f32 = 0.7;

/// Sample rates the delay network is tuned for.
pub const MIN_SAMPLE_RATE: f32 = 8_000.0;
pub const MAX_SAMPLE_RATE: f32 = 384_000.0;

const LEFT_COMB_MS: [f32; 4] = [29.7, 37.1, 41.1, 43.7];
const RIGHT_COMB_MS: [f32; 4] = [30.3, 33.9, 39.7, 45.1];
const LEFT_ALLPASS_MS: f32 = 7.5;
const RIGHT_ALLPASS_MS: f32 = 6.3;

/// Feedback gain for a room size. Pure function of `room`.
///
/// A log2 curve normalised so `MIN_ROOM..=MAX_ROOM` spans the whole
/// `MIN_FEEDBACK..=MAX_FEEDBACK` range. It intentionally replaces the plain
/// `0.55 + 0.1·log2(room + 1)` curve, which tops out near 0.78 and never
/// reaches the feedback ceiling.
pub fn feedback_for_room(room: f32) -> f32 {
    let room = room.clamp(MIN_ROOM, MAX_ROOM);
    let low = (MIN_ROOM + 1.0).log2();
    let high = (MAX_ROOM + 1.0).log2();
    let t = ((room + 1.0).log2() - low) / (high - low);
    (MIN_FEEDBACK + (MAX_FEEDBACK - MIN_FEEDBACK) * t).clamp(MIN_FEEDBACK, MAX_FEEDBACK)
}

#[inline]
fn ms_to_samples(ms: f32, sample_rate: f32) -> usize {
    ((ms * sample_rate / 1000.0).floor() as usize).max(1)
}

/// A damped comb line (buffer allocated once, RT-safe afterwards)
pub struct CombLine {
    buffer: Box<[f32]>,
    pos: usize,
    filter_state: f32,
}

impl CombLine {
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)].into_boxed_slice(),
            pos: 0,
            filter_state: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32, feedback: f32, damp: f32) -> f32 {
        let output = self.buffer[self.pos];

        // One-pole lowpass inside the feedback path (absorbs high frequencies)
        self.filter_state = output * (1.0 - damp) + self.filter_state * damp;
        self.buffer[self.pos] = input + self.filter_state * feedback;

        self.pos += 1;
        if self.pos == self.buffer.len() {
            self.pos = 0;
        }

        output
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
        self.pos = 0;
    }
}

/// An allpass line for diffusion (buffer allocated once, RT-safe afterwards)
pub struct AllpassLine {
    buffer: Box<[f32]>,
    pos: usize,
    gain: f32,
}

impl AllpassLine {
    pub fn new(delay_samples: usize, gain: f32) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)].into_boxed_slice(),
            pos: 0,
            gain: gain.clamp(0.0, 0.9),
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.pos];

        // Allpass: output = -g*input + delayed
        let output = -self.gain * input + delayed;
        self.buffer[self.pos] = input + self.gain * output;

        self.pos += 1;
        if self.pos == self.buffer.len() {
            self.pos = 0;
        }

        output
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
    }
}

/// Four combs in parallel feeding one allpass.
pub struct ReverbChannel {
    combs: [CombLine; 4],
    allpass: AllpassLine,
}

impl ReverbChannel {
    fn new(sample_rate: f32, comb_ms: &[f32; 4], allpass_ms: f32) -> Self {
        Self {
            combs: comb_ms.map(|ms| CombLine::new(ms_to_samples(ms, sample_rate))),
            allpass: AllpassLine::new(ms_to_samples(allpass_ms, sample_rate), ALLPASS_GAIN),
        }
    }

    /// Wet output for one input sample.
    #[inline]
    pub fn process(&mut self, input: f32, feedback: f32, damp: f32) -> f32 {
        let mut sum = 0.0;
        for comb in &mut self.combs {
            sum += comb.process(input, feedback, damp);
        }
        self.allpass.process(sum * 0.25)
    }

    /// Comb lengths followed by the allpass length, in samples.
    pub fn line_lengths(&self) -> [usize; 5] {
        [
            self.combs[0].len(),
            self.combs[1].len(),
            self.combs[2].len(),
            self.combs[3].len(),
            self.allpass.len(),
        ]
    }

    pub fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.reset();
        }
        self.allpass.reset();
    }
}

/// Stereo reverb: one delay network per channel plus shared parameters.
pub struct StereoReverb {
    left: ReverbChannel,
    right: ReverbChannel,
    room: f32,
    damp: f32,
    mix: f32,
    feedback: f32,
}

impl StereoReverb {
    /// Allocate the delay lines for `sample_rate`.
    ///
    /// This is the only allocation the reverb ever does; it fails for sample
    /// rates the delay tuning does not cover.
    pub fn new(sample_rate: f32) -> Result<Self, Error> {
        if !sample_rate.is_finite() {
            return Err(Error::ReverbInit {
                sample_rate,
                reason: "sample rate is not finite",
            });
        }
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(Error::ReverbInit {
                sample_rate,
                reason: "sample rate outside 8 kHz..384 kHz",
            });
        }

        let room = 1.6;
        Ok(Self {
            left: ReverbChannel::new(sample_rate, &LEFT_COMB_MS, LEFT_ALLPASS_MS),
            right: ReverbChannel::new(sample_rate, &RIGHT_COMB_MS, RIGHT_ALLPASS_MS),
            room,
            damp: 0.2,
            mix: 0.35,
            feedback: feedback_for_room(room),
        })
    }

    /// Set room size; recomputes feedback immediately.
    pub fn set_room(&mut self, room: f32) {
        self.room = room.clamp(MIN_ROOM, MAX_ROOM);
        self.feedback = feedback_for_room(self.room);
    }

    pub fn set_damping(&mut self, damp: f32) {
        self.damp = damp.clamp(0.0, MAX_DAMP);
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    pub fn room(&self) -> f32 {
        self.room
    }

    pub fn damping(&self) -> f32 {
        self.damp
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Process one stereo frame, returning the dry/wet mixed output.
    #[inline]
    pub fn process(&mut self, in_left: f32, in_right: f32) -> (f32, f32) {
        let wet_left = self.left.process(in_left, self.feedback, self.damp);
        let wet_right = self.right.process(in_right, self.feedback, self.damp);
        (
            blend_dry_wet(in_left, wet_left, self.mix),
            blend_dry_wet(in_right, wet_right, self.mix),
        )
    }

    /// Process a block. All four slices must have the same length.
    pub fn process_block(
        &mut self,
        in_left: &[f32],
        in_right: &[f32],
        out_left: &mut [f32],
        out_right: &mut [f32],
    ) {
        debug_assert_eq!(in_left.len(), out_left.len());
        debug_assert_eq!(in_right.len(), out_right.len());

        let frames = in_left
            .iter()
            .zip(in_right)
            .zip(out_left.iter_mut().zip(out_right.iter_mut()));
        for ((&l, &r), (out_l, out_r)) in frames {
            let (yl, yr) = self.process(l, r);
            *out_l = yl;
            *out_r = yr;
        }
    }

    /// Delay lengths per channel: four combs then the allpass, in samples.
    pub fn line_lengths(&self) -> ([usize; 5], [usize; 5]) {
        (self.left.line_lengths(), self.right.line_lengths())
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}
