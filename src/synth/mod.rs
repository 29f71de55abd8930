// Purpose: Voice management, polyphony and the control/render split.
// The engine (control path) owns voice lifecycles; the renderer (render path)
// owns the DSP lanes. They only talk through rtrb rings.

pub mod clock;
pub mod engine;
pub mod lane;
pub mod message;
pub mod params;
pub mod poly;
pub mod voice;

use rtrb::RingBuffer;

use crate::{config::EngineConfig, MAX_POLYPHONY};
use clock::AudioClock;
use engine::VoiceEngine;
use lane::VoiceLane;
use poly::PolyRenderer;

/// Render lanes in the pool. Twice the voice ceiling leaves room for stolen
/// voices that are still fading out.
pub const LANE_COUNT: usize = 2 * MAX_POLYPHONY;

/// Parameter snapshots in flight before the engine retries on `tick()`.
const SNAPSHOT_CAPACITY: usize = 64;

/// Build a connected engine/renderer pair sharing one audio clock.
pub fn channel(config: &EngineConfig, sample_rate: f32) -> (VoiceEngine, PolyRenderer, AudioClock) {
    let clock = AudioClock::new(sample_rate);

    let (command_tx, command_rx) = RingBuffer::new(config.command_capacity);
    let (snapshot_tx, snapshot_rx) = RingBuffer::new(SNAPSHOT_CAPACITY);
    let (report_tx, report_rx) = RingBuffer::new(LANE_COUNT * 2);

    let attack = clock.seconds_to_frames(config.timings.attack).max(1);
    let decay = clock.seconds_to_frames(config.timings.decay).max(1);
    let lanes = (0..LANE_COUNT)
        .map(|_| {
            VoiceLane::new(
                u32::try_from(attack).unwrap_or(u32::MAX),
                u32::try_from(decay).unwrap_or(u32::MAX),
                config.timings.sustain_level,
            )
        })
        .collect();

    let renderer = PolyRenderer::new(
        lanes,
        command_rx,
        snapshot_rx,
        report_tx,
        config.params,
        sample_rate,
    );
    let engine = VoiceEngine::new(
        config,
        clock.clone(),
        LANE_COUNT,
        command_tx,
        snapshot_tx,
        report_rx,
    );

    (engine, renderer, clock)
}
