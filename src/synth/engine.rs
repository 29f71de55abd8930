//! Control-path voice engine.
//!
//! Owns the note → voice index, the slot model and the lane pool. Every
//! public operation runs on the control path: it may allocate and log, and
//! talks to the render path only through the command and snapshot rings.
//!
//! Poly count vs live voices: a voice stays in the index through its release
//! (so a repeated note-on retriggers it) but stops counting toward the poly
//! count as soon as it is released.

use std::collections::{HashMap, VecDeque};

use log::{debug, warn};
use rtrb::{Consumer, Producer};

use crate::{
    config::{EngineConfig, FrameTimings},
    dsp::{lfo::LfoShape, oscillator::Waveform},
    synth::{
        clock::AudioClock,
        message::{RenderReport, SynthEvent, VoiceCommand},
        params::{clamp_or, LfoTarget, PartialPitch, SynthParams, SLOT_COUNT},
        voice::{Voice, VoicePhase},
    },
    MAX_POLYPHONY,
};

/// Pending events kept for the host before the oldest are dropped.
const EVENT_CAPACITY: usize = 256;

pub struct VoiceEngine {
    voices: HashMap<u8, Voice>,
    retiring: Vec<Voice>,
    free_lanes: Vec<usize>,
    // Last epoch issued on each lane; a new voice continues past it so
    // reports left over from the lane's previous owner never match.
    lane_epochs: Vec<u32>,
    lane_count: usize,
    commands: Producer<VoiceCommand>,
    snapshots: Producer<SynthParams>,
    reports: Consumer<RenderReport>,
    clock: AudioClock,
    params: SynthParams,
    params_dirty: bool,
    timings: FrameTimings,
    max_polyphony: usize,
    next_age: u64,
    next_sweep_at: u64,
    events: VecDeque<SynthEvent>,
}

impl VoiceEngine {
    pub(crate) fn new(
        config: &EngineConfig,
        clock: AudioClock,
        lane_count: usize,
        commands: Producer<VoiceCommand>,
        snapshots: Producer<SynthParams>,
        reports: Consumer<RenderReport>,
    ) -> Self {
        let timings = FrameTimings::new(&config.timings, clock.sample_rate());
        Self {
            voices: HashMap::with_capacity(MAX_POLYPHONY),
            retiring: Vec::with_capacity(lane_count),
            // Pop order hands out lane 0 first
            free_lanes: (0..lane_count).rev().collect(),
            lane_epochs: vec![0; lane_count],
            lane_count,
            commands,
            snapshots,
            reports,
            next_sweep_at: clock.now() + timings.sweep_interval,
            clock,
            params: config.params,
            params_dirty: false,
            timings,
            max_polyphony: config.max_polyphony.clamp(1, MAX_POLYPHONY),
            next_age: 0,
            events: VecDeque::with_capacity(EVENT_CAPACITY),
        }
    }

    /// Start `note`, or retrigger it if it already has a voice.
    pub fn note_on(&mut self, note: i32) {
        let note = clamp_note(note);
        let now = self.clock.now();
        let age = self.bump_age();

        if let Some(voice) = self.voices.get_mut(&note) {
            voice.retrigger(&mut self.commands, now, age, &self.timings);
            self.emit_poly_count();
            return;
        }

        while self.voices.len() >= self.max_polyphony {
            if !self.steal_oldest(now) {
                break;
            }
        }

        let Some(lane) = self.acquire_lane() else {
            warn!("no render lane available for note {note}");
            return;
        };

        let epoch = self.lane_epochs[lane].wrapping_add(1);
        let mut voice = Voice::new(note, lane, epoch, age, &self.params.slots);
        voice.start(&mut self.commands, now, &self.timings);
        self.voices.insert(note, voice);
        self.emit_poly_count();
    }

    /// Release `note`. Unknown or already releasing notes are ignored.
    pub fn note_off(&mut self, note: i32) {
        let note = clamp_note(note);
        let now = self.clock.now();
        let Some(voice) = self.voices.get_mut(&note) else {
            return;
        };
        if voice.stop(&mut self.commands, now, &self.timings) {
            self.emit_poly_count();
        }
    }

    pub fn set_slot_shape(&mut self, slot: usize, shape: Waveform) {
        let slot = clamp_slot(slot);
        self.params.slots[slot].shape = shape;
        let slots = self.params.slots;
        self.for_each_voice(|voice| voice.update_shape(&slots));
        self.publish_params();
    }

    pub fn set_slot_gain(&mut self, slot: usize, gain: f32) {
        let slot = clamp_slot(slot);
        let current = self.params.slots[slot].gain;
        self.params.slots[slot].gain = clamp_or(gain, 0.0, 1.0, current);
        let slots = self.params.slots;
        self.for_each_voice(|voice| voice.update_gain(&slots));
        self.publish_params();
    }

    pub fn set_slot_pitch(&mut self, slot: usize, pitch: PartialPitch) {
        let slot = clamp_slot(slot);
        self.params.slots[slot].pitch = self.params.slots[slot].pitch.apply(pitch);
        let slots = self.params.slots;
        self.for_each_voice(|voice| voice.update_pitch(&slots));
        self.publish_params();
    }

    /// Update any subset of the reverb parameters.
    pub fn set_reverb(&mut self, room: Option<f32>, damp: Option<f32>, mix: Option<f32>) {
        let reverb = &mut self.params.reverb;
        reverb.room = room.unwrap_or(reverb.room);
        reverb.damp = damp.unwrap_or(reverb.damp);
        reverb.mix = mix.unwrap_or(reverb.mix);
        self.params.reverb = self.params.reverb.validated();
        self.publish_params();
    }

    pub fn set_distortion(&mut self, drive: Option<f32>, mix: Option<f32>) {
        let distortion = &mut self.params.distortion;
        distortion.drive = drive.unwrap_or(distortion.drive);
        distortion.mix = mix.unwrap_or(distortion.mix);
        self.params.distortion = self.params.distortion.validated();
        self.publish_params();
    }

    pub fn set_lfo(
        &mut self,
        shape: Option<LfoShape>,
        rate_hz: Option<f32>,
        depth_cents: Option<f32>,
        target: Option<LfoTarget>,
    ) {
        let lfo = &mut self.params.lfo;
        lfo.shape = shape.unwrap_or(lfo.shape);
        lfo.rate_hz = rate_hz.unwrap_or(lfo.rate_hz);
        lfo.depth_cents = depth_cents.unwrap_or(lfo.depth_cents);
        lfo.target = target.unwrap_or(lfo.target);
        self.params.lfo = self.params.lfo.validated();
        self.publish_params();
    }

    /// Takes effect on the next note-on; nothing is stolen retroactively.
    pub fn set_max_polyphony(&mut self, voices: i32) {
        self.max_polyphony = voices.clamp(1, MAX_POLYPHONY as i32) as usize;
    }

    /// Dispose every voice immediately, skipping the release. Returns how
    /// many voices were disposed.
    pub fn panic(&mut self) -> usize {
        let mut disposed = 0;
        let voices: Vec<Voice> = self
            .voices
            .drain()
            .map(|(_, voice)| voice)
            .chain(self.retiring.drain(..))
            .collect();
        for mut voice in voices {
            if self.dispose_voice(&mut voice) {
                disposed += 1;
            }
        }
        debug!("panic disposed {disposed} voices");
        self.push_event(SynthEvent::PolyCountChanged(0));
        disposed
    }

    /// Host lost input focus; held keys may never send note-off.
    pub fn focus_lost(&mut self) {
        self.panic();
    }

    pub fn visibility_changed(&mut self, visible: bool) {
        if !visible {
            self.panic();
        }
    }

    /// Periodic control-path work: collect finished voices, retry a pending
    /// snapshot and run the safety sweep when due. Returns how many voices
    /// were disposed.
    pub fn tick(&mut self) -> usize {
        let now = self.clock.now();

        if self.params_dirty {
            self.publish_params();
        }

        let mut disposed = self.collect_reports();

        for voice in self.voices.values_mut() {
            voice.refresh(now);
        }

        if now >= self.next_sweep_at {
            disposed += self.sweep(now);
            self.next_sweep_at = now + self.timings.sweep_interval;
        }

        disposed
    }

    /// Dispose voices whose `Finished` report matches their latest stop.
    fn collect_reports(&mut self) -> usize {
        let mut disposed = 0;
        while let Ok(RenderReport::Finished { lane, epoch }) = self.reports.pop() {
            let owner = |voice: &Voice| voice.lane() == Some(lane) && voice.accepts_report(epoch);

            let note = self
                .voices
                .values()
                .find(|&voice| owner(voice))
                .map(Voice::note);
            if let Some(mut voice) = note.and_then(|note| self.voices.remove(&note)) {
                disposed += usize::from(self.dispose_voice(&mut voice));
                continue;
            }

            if let Some(index) = self.retiring.iter().position(|voice| owner(voice)) {
                let mut voice = self.retiring.swap_remove(index);
                disposed += usize::from(self.dispose_voice(&mut voice));
            }
            // Anything else is a stale report from before a retrigger
        }
        disposed
    }

    /// Dispose voices past their maximum life, and releasing voices whose
    /// report never arrived.
    fn sweep(&mut self, now: u64) -> usize {
        let life = self.timings.max_voice_life;
        let grace = self.timings.sweep_interval;
        let due = |voice: &Voice| voice.is_expired(now) || voice.is_overdue(now, grace);

        let notes: Vec<u8> = self
            .voices
            .values()
            .filter(|&voice| due(voice))
            .map(Voice::note)
            .collect();
        let mut swept: Vec<Voice> = notes
            .iter()
            .filter_map(|note| self.voices.remove(note))
            .collect();

        let mut index = 0;
        while index < self.retiring.len() {
            if due(&self.retiring[index]) {
                swept.push(self.retiring.swap_remove(index));
            } else {
                index += 1;
            }
        }

        if swept.is_empty() {
            return 0;
        }

        let mut disposed = 0;
        for voice in &mut swept {
            disposed += usize::from(self.dispose_voice(voice));
        }
        debug!(
            "sweep disposed {disposed} voices (max life {:.1}s)",
            self.clock.frames_to_seconds(life)
        );
        self.emit_poly_count();
        disposed
    }

    /// Move the oldest indexed voice to the retiring list with a fast release.
    /// Releasing voices are still live here and are stolen by age like any
    /// other.
    fn steal_oldest(&mut self, now: u64) -> bool {
        let oldest = self
            .voices
            .values()
            .min_by_key(|voice| voice.age())
            .map(Voice::note);
        let Some(mut voice) = oldest.and_then(|note| self.voices.remove(&note)) else {
            return false;
        };

        debug!("stealing note {} (age {})", voice.note(), voice.age());
        voice.force_stop(&mut self.commands, now, &self.timings);
        self.retiring.push(voice);
        true
    }

    fn acquire_lane(&mut self) -> Option<usize> {
        if let Some(lane) = self.free_lanes.pop() {
            return Some(lane);
        }

        // Pool exhausted: cut the oldest retiring voice short. Its Kill is
        // queued ahead of the new Start, so the lane is clean when reused.
        let index = self
            .retiring
            .iter()
            .enumerate()
            .min_by_key(|(_, voice)| voice.age())
            .map(|(index, _)| index)?;
        let mut voice = self.retiring.swap_remove(index);
        debug!("lane pool exhausted, disposing retiring note {}", voice.note());
        self.release_lane(&mut voice)
    }

    fn dispose_voice(&mut self, voice: &mut Voice) -> bool {
        match self.release_lane(voice) {
            Some(lane) => {
                self.free_lanes.push(lane);
                true
            }
            None => false,
        }
    }

    /// Dispose `voice` and remember the last epoch it used on its lane.
    fn release_lane(&mut self, voice: &mut Voice) -> Option<usize> {
        let lane = voice.dispose(&mut self.commands)?;
        self.lane_epochs[lane] = voice.epoch();
        Some(lane)
    }

    fn for_each_voice(&mut self, mut update: impl FnMut(&mut Voice)) {
        for voice in self.voices.values_mut() {
            update(voice);
        }
        for voice in &mut self.retiring {
            update(voice);
        }
    }

    fn publish_params(&mut self) {
        self.params_dirty = self.snapshots.push(self.params).is_err();
        if self.params_dirty {
            debug!("parameter ring full, retrying on next tick");
        }
    }

    fn bump_age(&mut self) -> u64 {
        let age = self.next_age;
        self.next_age += 1;
        age
    }

    fn emit_poly_count(&mut self) {
        let count = self.poly_count();
        self.push_event(SynthEvent::PolyCountChanged(count));
    }

    fn push_event(&mut self, event: SynthEvent) {
        if self.events.len() == EVENT_CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Voices that have not been released.
    pub fn poly_count(&self) -> usize {
        self.voices
            .values()
            .filter(|voice| voice.phase() != VoicePhase::Releasing)
            .count()
    }

    /// Voices in the note index, including ones still releasing.
    pub fn live_voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Stolen voices still fading out.
    pub fn retiring_count(&self) -> usize {
        self.retiring.len()
    }

    pub fn voice(&self, note: u8) -> Option<&Voice> {
        self.voices.get(&note)
    }

    pub fn free_lane_count(&self) -> usize {
        self.free_lanes.len()
    }

    pub fn lane_count(&self) -> usize {
        self.lane_count
    }

    pub fn max_polyphony(&self) -> usize {
        self.max_polyphony
    }

    pub fn poll_event(&mut self) -> Option<SynthEvent> {
        self.events.pop_front()
    }

    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    pub fn clock(&self) -> &AudioClock {
        &self.clock
    }

    pub fn timings(&self) -> &FrameTimings {
        &self.timings
    }
}

#[inline]
fn clamp_note(note: i32) -> u8 {
    note.clamp(0, 127) as u8
}

#[inline]
fn clamp_slot(slot: usize) -> usize {
    slot.min(SLOT_COUNT - 1)
}
