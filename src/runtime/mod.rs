//! Device-backed host for the instrument.
//!
//! `Synth` is the handle a UI talks to. It owns the control-side engine
//! behind a mutex, a background thread that calls `tick()` on a fixed
//! period, and (when started on a device) the output stream that owns the
//! render path.
//!
//! # Example
//!
//! ```no_run
//! use bohemian::{EngineConfig, Synth};
//!
//! let synth = Synth::start(&EngineConfig::default());
//! synth.note_on(60);
//! std::thread::sleep(std::time::Duration::from_millis(500));
//! synth.note_off(60);
//! ```
//!
//! If no output device is available the handle is *inert*: every command is
//! accepted and ignored, and `poly_count()` stays 0.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{info, warn};
use parking_lot::Mutex;

use crate::{
    config::EngineConfig,
    dsp::{lfo::LfoShape, oscillator::Waveform},
    error::Error,
    graph::bus::AudioGraph,
    instrument,
    io::{AudioOutput, OutputDevice},
    synth::{
        engine::VoiceEngine,
        message::SynthEvent,
        params::{LfoTarget, PartialPitch},
    },
};

/// Wall-clock pacing of the tick thread. The sweep itself runs on audio time.
const TICK_PERIOD: Duration = Duration::from_millis(20);

pub struct Synth {
    inner: Option<Running>,
}

struct Running {
    engine: Arc<Mutex<VoiceEngine>>,
    reverb_active: bool,
    sample_rate: f32,
    running: Arc<AtomicBool>,
    ticker: Option<JoinHandle<()>>,
    _output: Option<AudioOutput>,
}

impl Synth {
    /// Start on the default output device, falling back to an inert handle.
    pub fn start(config: &EngineConfig) -> Self {
        match Self::try_start(config) {
            Ok(synth) => synth,
            Err(err) => {
                warn!("audio output unavailable ({err}); synth is inert");
                Self::inert()
            }
        }
    }

    pub fn try_start(config: &EngineConfig) -> Result<Self, Error> {
        let device = OutputDevice::default_output()?;
        let sample_rate = device.sample_rate();
        let (engine, graph) = instrument(config, sample_rate);
        let reverb_active = graph.reverb_active();
        let output = device.play(graph)?;

        info!("synth started at {sample_rate} Hz");
        Ok(Self::running(engine, reverb_active, sample_rate, Some(output)))
    }

    /// Run without a device; the caller pulls audio from the returned graph
    /// (offline bounce, plugin hosts, tests).
    pub fn detached(config: &EngineConfig, sample_rate: f32) -> (Self, AudioGraph) {
        let (engine, graph) = instrument(config, sample_rate);
        let synth = Self::running(engine, graph.reverb_active(), sample_rate, None);
        (synth, graph)
    }

    /// A handle that ignores every command.
    pub fn inert() -> Self {
        Self { inner: None }
    }

    fn running(
        engine: VoiceEngine,
        reverb_active: bool,
        sample_rate: f32,
        output: Option<AudioOutput>,
    ) -> Self {
        let engine = Arc::new(Mutex::new(engine));
        let running = Arc::new(AtomicBool::new(true));

        let ticker = {
            let engine = Arc::clone(&engine);
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("bohemian-tick".into())
                .spawn(move || {
                    while running.load(Ordering::Acquire) {
                        engine.lock().tick();
                        thread::sleep(TICK_PERIOD);
                    }
                })
        };
        let ticker = match ticker {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!("failed to spawn tick thread ({err}); call tick() manually");
                None
            }
        };

        Self {
            inner: Some(Running {
                engine,
                reverb_active,
                sample_rate,
                running,
                ticker,
                _output: output,
            }),
        }
    }

    fn with_engine<R>(&self, default: R, f: impl FnOnce(&mut VoiceEngine) -> R) -> R {
        match &self.inner {
            Some(running) => f(&mut *running.engine.lock()),
            None => default,
        }
    }

    pub fn is_inert(&self) -> bool {
        self.inner.is_none()
    }

    pub fn note_on(&self, note: i32) {
        self.with_engine((), |engine| engine.note_on(note));
    }

    pub fn note_off(&self, note: i32) {
        self.with_engine((), |engine| engine.note_off(note));
    }

    pub fn set_slot_shape(&self, slot: usize, shape: Waveform) {
        self.with_engine((), |engine| engine.set_slot_shape(slot, shape));
    }

    pub fn set_slot_gain(&self, slot: usize, gain: f32) {
        self.with_engine((), |engine| engine.set_slot_gain(slot, gain));
    }

    pub fn set_slot_pitch(&self, slot: usize, pitch: PartialPitch) {
        self.with_engine((), |engine| engine.set_slot_pitch(slot, pitch));
    }

    pub fn set_reverb(&self, room: Option<f32>, damp: Option<f32>, mix: Option<f32>) {
        self.with_engine((), |engine| engine.set_reverb(room, damp, mix));
    }

    pub fn set_distortion(&self, drive: Option<f32>, mix: Option<f32>) {
        self.with_engine((), |engine| engine.set_distortion(drive, mix));
    }

    pub fn set_lfo(
        &self,
        shape: Option<LfoShape>,
        rate_hz: Option<f32>,
        depth_cents: Option<f32>,
        target: Option<LfoTarget>,
    ) {
        self.with_engine((), |engine| {
            engine.set_lfo(shape, rate_hz, depth_cents, target)
        });
    }

    pub fn set_max_polyphony(&self, voices: i32) {
        self.with_engine((), |engine| engine.set_max_polyphony(voices));
    }

    /// Silence everything immediately. Returns how many voices were cut.
    pub fn panic(&self) -> usize {
        self.with_engine(0, VoiceEngine::panic)
    }

    pub fn focus_lost(&self) {
        self.with_engine((), VoiceEngine::focus_lost);
    }

    pub fn visibility_changed(&self, visible: bool) {
        self.with_engine((), |engine| engine.visibility_changed(visible));
    }

    /// Run the periodic control work now instead of waiting for the thread.
    pub fn tick(&self) -> usize {
        self.with_engine(0, VoiceEngine::tick)
    }

    pub fn poly_count(&self) -> usize {
        self.with_engine(0, |engine| engine.poly_count())
    }

    pub fn live_voice_count(&self) -> usize {
        self.with_engine(0, |engine| engine.live_voice_count())
    }

    pub fn poll_event(&self) -> Option<SynthEvent> {
        self.with_engine(None, VoiceEngine::poll_event)
    }

    pub fn reverb_active(&self) -> bool {
        self.inner.as_ref().is_some_and(|running| running.reverb_active)
    }

    pub fn sample_rate(&self) -> Option<f32> {
        self.inner.as_ref().map(|running| running.sample_rate)
    }
}

impl Drop for Synth {
    fn drop(&mut self) {
        if let Some(running) = self.inner.as_mut() {
            running.running.store(false, Ordering::Release);
            if let Some(handle) = running.ticker.take() {
                let _ = handle.join();
            }
        }
    }
}
