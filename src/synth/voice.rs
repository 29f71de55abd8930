use crate::{
    config::FrameTimings,
    dsp::oscillator::Waveform,
    synth::{
        message::{CommandSink, VoiceCommand},
        params::{note_to_frequency, slot_frequency, SlotParams, SLOT_COUNT},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoicePhase {
    Attacking,  // Attack/decay ramps running
    Sustaining, // Holding at sustain level
    Releasing,  // Stop scheduled, envelope decaying
    Disposed,   // Lane returned to the pool
}

/// Control-side record of one sounding note.
///
/// The voice owns the lifecycle and the index of its render lane; the audio
/// itself is produced by the `VoiceLane` on the render path. Every stop and
/// retrigger bumps `epoch`, so a `Finished` report for an earlier stop can be
/// recognised and ignored.
#[derive(Debug, Clone)]
pub struct Voice {
    note: u8,
    base_frequency: f64,
    frequencies: [f64; SLOT_COUNT],
    // Mirror of the slot settings for inspection only; the lane reads gains
    // and shapes from the shared parameter snapshot.
    gains: [f32; SLOT_COUNT],
    shapes: [Waveform; SLOT_COUNT],
    lane: Option<usize>,
    phase: VoicePhase,
    age: u64,
    born_at: u64,
    sustain_at: u64,
    scheduled_stop_at: Option<u64>,
    dispose_at: Option<u64>,
    expires_at: u64,
    epoch: u32,
}

impl Voice {
    /// `epoch` must be newer than any epoch a previous owner of `lane` used.
    pub fn new(
        note: u8,
        lane: usize,
        epoch: u32,
        age: u64,
        slots: &[SlotParams; SLOT_COUNT],
    ) -> Self {
        let base_frequency = note_to_frequency(note);
        Self {
            note,
            base_frequency,
            frequencies: slots.map(|slot| slot_frequency(base_frequency, &slot.pitch)),
            gains: slots.map(|slot| slot.gain),
            shapes: slots.map(|slot| slot.shape),
            lane: Some(lane),
            phase: VoicePhase::Attacking,
            age,
            born_at: 0,
            sustain_at: 0,
            scheduled_stop_at: None,
            dispose_at: None,
            expires_at: u64::MAX,
            epoch,
        }
    }

    fn arm(&mut self, now: u64, timings: &FrameTimings) {
        self.born_at = now;
        self.sustain_at = now + timings.attack + timings.decay;
        self.expires_at = now.saturating_add(timings.max_voice_life);
        self.phase = VoicePhase::Attacking;
    }

    /// Start the lane: oscillators begin, gain attacks from the floor.
    pub fn start(&mut self, sink: &mut impl CommandSink, now: u64, timings: &FrameTimings) {
        let Some(lane) = self.lane else {
            return;
        };
        self.arm(now, timings);
        sink.send(VoiceCommand::Start {
            lane,
            epoch: self.epoch,
            base_frequency: self.base_frequency,
        });
    }

    /// Re-attack in place from the current gain, cancelling any pending stop.
    pub fn retrigger(
        &mut self,
        sink: &mut impl CommandSink,
        now: u64,
        age: u64,
        timings: &FrameTimings,
    ) -> bool {
        let Some(lane) = self.lane else {
            return false;
        };
        self.epoch = self.epoch.wrapping_add(1);
        self.age = age;
        self.scheduled_stop_at = None;
        self.dispose_at = None;
        self.arm(now, timings);
        sink.send(VoiceCommand::Retrigger {
            lane,
            epoch: self.epoch,
        });
        true
    }

    /// Normal note-off release. No-op once releasing or disposed.
    pub fn stop(&mut self, sink: &mut impl CommandSink, now: u64, timings: &FrameTimings) -> bool {
        if self.phase == VoicePhase::Releasing {
            return false;
        }
        self.schedule_stop(sink, now, timings.release, timings.safety_margin)
    }

    /// Fast release used by steals. Shortens a release already in progress.
    pub fn force_stop(
        &mut self,
        sink: &mut impl CommandSink,
        now: u64,
        timings: &FrameTimings,
    ) -> bool {
        let stop_at = now + timings.force_release;
        if matches!(self.scheduled_stop_at, Some(scheduled) if scheduled <= stop_at) {
            return false;
        }
        self.schedule_stop(sink, now, timings.force_release, timings.safety_margin)
    }

    fn schedule_stop(
        &mut self,
        sink: &mut impl CommandSink,
        now: u64,
        window: u64,
        margin: u64,
    ) -> bool {
        let Some(lane) = self.lane else {
            return false;
        };
        let stop_at = now + window;
        let dispose_at = stop_at + margin;

        self.epoch = self.epoch.wrapping_add(1);
        self.phase = VoicePhase::Releasing;
        self.scheduled_stop_at = Some(stop_at);
        self.dispose_at = Some(dispose_at);

        sink.send(VoiceCommand::Stop {
            lane,
            epoch: self.epoch,
            release_frames: u32::try_from(window).unwrap_or(u32::MAX),
            stop_at,
            dispose_at,
        });
        true
    }

    /// Release the lane. Returns its index the first time only.
    pub fn dispose(&mut self, sink: &mut impl CommandSink) -> Option<usize> {
        if self.phase == VoicePhase::Disposed {
            return None;
        }
        self.phase = VoicePhase::Disposed;
        self.scheduled_stop_at = None;
        self.dispose_at = None;

        let lane = self.lane.take()?;
        sink.send(VoiceCommand::Kill { lane });
        Some(lane)
    }

    pub fn update_pitch(&mut self, slots: &[SlotParams; SLOT_COUNT]) {
        let base = self.base_frequency;
        self.frequencies = slots.map(|slot| slot_frequency(base, &slot.pitch));
    }

    pub fn update_gain(&mut self, slots: &[SlotParams; SLOT_COUNT]) {
        self.gains = slots.map(|slot| slot.gain);
    }

    pub fn update_shape(&mut self, slots: &[SlotParams; SLOT_COUNT]) {
        self.shapes = slots.map(|slot| slot.shape);
    }

    /// Advance Attacking → Sustaining once the ramps have elapsed.
    pub fn refresh(&mut self, now: u64) {
        if self.phase == VoicePhase::Attacking && now >= self.sustain_at {
            self.phase = VoicePhase::Sustaining;
        }
    }

    /// Whether a `Finished` report tagged `epoch` ends this voice.
    pub fn accepts_report(&self, epoch: u32) -> bool {
        self.phase == VoicePhase::Releasing && self.epoch == epoch
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.is_alive() && now >= self.expires_at
    }

    /// Releasing voice whose disposal deadline passed `grace` frames ago
    /// without a report (its commands were dropped).
    pub fn is_overdue(&self, now: u64, grace: u64) -> bool {
        matches!(self.dispose_at, Some(at) if self.is_alive() && now >= at.saturating_add(grace))
    }

    pub fn is_alive(&self) -> bool {
        self.phase != VoicePhase::Disposed
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn base_frequency(&self) -> f64 {
        self.base_frequency
    }

    pub fn frequencies(&self) -> [f64; SLOT_COUNT] {
        self.frequencies
    }

    pub fn gains(&self) -> [f32; SLOT_COUNT] {
        self.gains
    }

    pub fn shapes(&self) -> [Waveform; SLOT_COUNT] {
        self.shapes
    }

    pub fn lane(&self) -> Option<usize> {
        self.lane
    }

    pub fn phase(&self) -> VoicePhase {
        self.phase
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn born_at(&self) -> u64 {
        self.born_at
    }

    pub fn scheduled_stop_at(&self) -> Option<u64> {
        self.scheduled_stop_at
    }

    pub fn dispose_at(&self) -> Option<u64> {
        self.dispose_at
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::VoiceTimings, synth::params::SynthParams};

    impl CommandSink for Vec<VoiceCommand> {
        fn send(&mut self, command: VoiceCommand) -> bool {
            self.push(command);
            true
        }
    }

    fn timings() -> FrameTimings {
        FrameTimings::new(&VoiceTimings::default(), 48_000.0)
    }

    fn voice(note: u8) -> Voice {
        Voice::new(note, 5, 0, 0, &SynthParams::default().slots)
    }

    #[test]
    fn start_sends_base_frequency() {
        let mut sent = Vec::new();
        let mut v = voice(69);
        v.start(&mut sent, 1_000, &timings());

        assert_eq!(
            sent,
            vec![VoiceCommand::Start {
                lane: 5,
                epoch: 0,
                base_frequency: 440.0
            }]
        );
        assert_eq!(v.born_at(), 1_000);
        assert_eq!(v.expires_at(), 1_000 + 384_000);
    }

    #[test]
    fn phase_reaches_sustain_after_attack_and_decay() {
        let mut sent = Vec::new();
        let t = timings();
        let mut v = voice(60);
        v.start(&mut sent, 0, &t);

        v.refresh(t.attack);
        assert_eq!(v.phase(), VoicePhase::Attacking);
        v.refresh(t.attack + t.decay);
        assert_eq!(v.phase(), VoicePhase::Sustaining);
    }

    #[test]
    fn stop_schedules_release_and_margin() {
        let mut sent = Vec::new();
        let t = timings();
        let mut v = voice(60);
        v.start(&mut sent, 0, &t);

        assert!(v.stop(&mut sent, 500, &t));
        assert_eq!(v.phase(), VoicePhase::Releasing);
        assert_eq!(v.scheduled_stop_at(), Some(500 + 2880));
        assert_eq!(v.dispose_at(), Some(500 + 2880 + 960));
        assert_eq!(
            sent.last(),
            Some(&VoiceCommand::Stop {
                lane: 5,
                epoch: 1,
                release_frames: 2880,
                stop_at: 3380,
                dispose_at: 4340,
            })
        );

        // second note-off is ignored
        assert!(!v.stop(&mut sent, 600, &t));
        assert_eq!(sent.len(), 2);
    }

    #[test]
    fn force_stop_shortens_a_running_release() {
        let mut sent = Vec::new();
        let t = timings();
        let mut v = voice(60);
        v.start(&mut sent, 0, &t);
        v.stop(&mut sent, 0, &t);

        assert!(v.force_stop(&mut sent, 100, &t));
        assert_eq!(v.scheduled_stop_at(), Some(100 + t.force_release));

        // already stopping sooner than another force window would
        assert!(!v.force_stop(&mut sent, 100, &t));
    }

    #[test]
    fn retrigger_invalidates_earlier_reports() {
        let mut sent = Vec::new();
        let t = timings();
        let mut v = voice(60);
        v.start(&mut sent, 0, &t);
        v.stop(&mut sent, 0, &t);
        let stop_epoch = v.epoch();
        assert!(v.accepts_report(stop_epoch));

        assert!(v.retrigger(&mut sent, 10, 7, &t));
        assert_eq!(v.phase(), VoicePhase::Attacking);
        assert_eq!(v.scheduled_stop_at(), None);
        assert_eq!(v.age(), 7);
        assert!(!v.accepts_report(stop_epoch));
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut sent = Vec::new();
        let mut v = voice(60);
        v.start(&mut sent, 0, &timings());

        assert_eq!(v.dispose(&mut sent), Some(5));
        assert!(!v.is_alive());
        assert_eq!(v.dispose(&mut sent), None);
        assert_eq!(
            sent.iter()
                .filter(|c| matches!(c, VoiceCommand::Kill { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn pitch_update_retunes_without_restart() {
        let mut sent = Vec::new();
        let mut v = voice(69);
        v.start(&mut sent, 0, &timings());

        let mut slots = SynthParams::default().slots;
        slots[0].pitch.octave = 1;
        v.update_pitch(&slots);

        assert!(((v.frequencies()[0] - 880.0) / 880.0).abs() < 1e-6);
        assert!((v.frequencies()[1] - 440.0).abs() < 1e-9);
        assert_eq!(v.phase(), VoicePhase::Attacking);
        assert_eq!(sent.len(), 1);
    }

    #[test]
    fn expiry_and_overdue_checks() {
        let mut sent = Vec::new();
        let t = timings();
        let mut v = voice(60);
        v.start(&mut sent, 0, &t);

        assert!(!v.is_expired(t.max_voice_life - 1));
        assert!(v.is_expired(t.max_voice_life));

        v.stop(&mut sent, 0, &t);
        let deadline = t.release + t.safety_margin;
        assert!(!v.is_overdue(deadline, 100));
        assert!(v.is_overdue(deadline + 100, 100));
    }
}
