//! Render-side DSP state of one voice.
//!
//! A lane owns two slot oscillators and the gain envelope. It is driven only
//! by `VoiceCommand`s applied at block boundaries; the control-side `Voice`
//! holding the lane index owns the lifecycle.

use crate::{
    dsp::{
        envelope::{EnvelopeStage, GainEnvelope},
        oscillator::{phase_increment, OscillatorBlock, Waveform},
    },
    synth::params::{SynthParams, SLOT_COUNT},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneState {
    /// Not assigned or killed; renders nothing.
    Idle,
    /// Oscillators running.
    Sounding,
    /// Oscillators stopped at the scheduled stop frame; waiting for disposal.
    Stopped,
}

/// Slot settings resolved once per block from the current snapshot.
#[derive(Debug, Clone, Copy)]
pub struct BlockTuning {
    pub ratios: [f64; SLOT_COUNT],
    pub gains: [f32; SLOT_COUNT],
    pub shapes: [Waveform; SLOT_COUNT],
    pub sample_rate: f32,
}

impl BlockTuning {
    pub fn new(params: &SynthParams, lfo_value: f32, sample_rate: f32) -> Self {
        Self {
            ratios: params.slot_ratios(lfo_value),
            gains: params.slots.map(|slot| slot.gain),
            shapes: params.slots.map(|slot| slot.shape),
            sample_rate,
        }
    }
}

pub struct VoiceLane {
    oscillators: [OscillatorBlock; SLOT_COUNT],
    envelope: GainEnvelope,
    state: LaneState,
    epoch: u32,
    base_frequency: f64,
    stop_at: Option<u64>,
    dispose_at: Option<u64>,
    report_pending: bool,
}

impl VoiceLane {
    pub fn new(attack_frames: u32, decay_frames: u32, sustain_level: f32) -> Self {
        Self {
            oscillators: [OscillatorBlock::sine(), OscillatorBlock::sawtooth()],
            envelope: GainEnvelope::new(attack_frames, decay_frames, sustain_level),
            state: LaneState::Idle,
            epoch: 0,
            base_frequency: 0.0,
            stop_at: None,
            dispose_at: None,
            report_pending: false,
        }
    }

    pub fn start(&mut self, epoch: u32, base_frequency: f64) {
        for osc in &mut self.oscillators {
            osc.reset();
        }
        self.envelope.start();
        self.base_frequency = base_frequency;
        self.epoch = epoch;
        self.state = LaneState::Sounding;
        self.clear_stop();
    }

    /// Re-attack from the current gain. A lane whose oscillators already
    /// stopped is restarted.
    pub fn retrigger(&mut self, epoch: u32) {
        if self.state != LaneState::Sounding {
            for osc in &mut self.oscillators {
                osc.reset();
            }
            self.state = LaneState::Sounding;
        }
        self.envelope.retrigger();
        self.epoch = epoch;
        self.clear_stop();
    }

    pub fn stop(&mut self, epoch: u32, release_frames: u32, stop_at: u64, dispose_at: u64) {
        self.envelope.release(release_frames);
        self.epoch = epoch;
        self.stop_at = Some(stop_at);
        self.dispose_at = Some(dispose_at);
        // An idle lane (its Start was dropped) still has to be reported so
        // the control side can reclaim it.
        self.report_pending = true;
    }

    pub fn kill(&mut self) {
        self.envelope.reset();
        self.state = LaneState::Idle;
        self.clear_stop();
    }

    fn clear_stop(&mut self) {
        self.stop_at = None;
        self.dispose_at = None;
        self.report_pending = false;
    }

    /// Add this lane's output for the block starting at `block_start`.
    pub fn render_add(&mut self, out: &mut [f32], block_start: u64, tuning: &BlockTuning) {
        if self.state != LaneState::Sounding {
            return;
        }

        let mut increments = [0.0; SLOT_COUNT];
        for (slot, osc) in self.oscillators.iter_mut().enumerate() {
            osc.set_waveform(tuning.shapes[slot]);
            let frequency = (self.base_frequency * tuning.ratios[slot]) as f32;
            increments[slot] = phase_increment(frequency, tuning.sample_rate);
        }

        let [osc_a, osc_b] = &mut self.oscillators;
        let [inc_a, inc_b] = increments;
        let [gain_a, gain_b] = tuning.gains;

        // Frames before the scheduled stop, if it lands in this block
        let audible = match self.stop_at {
            Some(stop_at) => stop_at.saturating_sub(block_start).min(out.len() as u64) as usize,
            None => out.len(),
        };

        for sample in &mut out[..audible] {
            let gain = self.envelope.next_sample();
            let mixed = osc_a.next_sample(inc_a) * gain_a + osc_b.next_sample(inc_b) * gain_b;
            *sample += mixed * gain;
        }

        if audible < out.len() {
            self.state = LaneState::Stopped;
        }
    }

    /// Epoch to report if the disposal deadline has passed by `block_end`.
    pub fn finished_epoch(&self, block_end: u64) -> Option<u32> {
        match self.dispose_at {
            Some(dispose_at) if self.report_pending && block_end >= dispose_at => Some(self.epoch),
            _ => None,
        }
    }

    pub fn mark_reported(&mut self) {
        self.report_pending = false;
    }

    pub fn state(&self) -> LaneState {
        self.state
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn envelope_stage(&self) -> EnvelopeStage {
        self.envelope.stage()
    }

    pub fn envelope_level(&self) -> f32 {
        self.envelope.level()
    }

    pub fn stop_at(&self) -> Option<u64> {
        self.stop_at
    }
}
