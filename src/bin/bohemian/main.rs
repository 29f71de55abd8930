//! bohemian - play a short chord progression on the default output device
//!
//! Run with: RUST_LOG=info cargo run

use std::{thread, time::Duration};

use bohemian::{
    dsp::oscillator::Waveform,
    synth::{message::SynthEvent, params::PartialPitch},
    EngineConfig, Synth,
};
use color_eyre::eyre::{Result, WrapErr};
use log::info;

const CHORD_LENGTH: Duration = Duration::from_millis(900);

/// i - VI - III - VII in A minor
const PROGRESSION: [[i32; 3]; 4] = [[57, 60, 64], [53, 57, 60], [48, 52, 55], [55, 59, 62]];

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let synth = Synth::try_start(&EngineConfig::default()).wrap_err("failed to open audio output")?;
    info!(
        "playing at {} Hz, reverb {}",
        synth.sample_rate().unwrap_or_default(),
        if synth.reverb_active() { "on" } else { "off" }
    );

    // Detune slot B a touch for width, and add a slow vibrato
    synth.set_slot_shape(1, Waveform::Saw);
    synth.set_slot_pitch(1, PartialPitch::default().fine_cents(7));
    synth.set_lfo(None, Some(4.5), Some(8.0), None);

    for (bar, chord) in PROGRESSION.iter().cycle().take(8).enumerate() {
        for &note in chord {
            synth.note_on(note);
        }
        drain_events(&synth);
        thread::sleep(CHORD_LENGTH);

        for &note in chord {
            synth.note_off(note);
        }
        drain_events(&synth);

        // let the last chord ring out through the reverb
        if bar == 7 {
            thread::sleep(Duration::from_millis(1500));
        }
    }

    let cut = synth.panic();
    info!("done ({cut} voices still sounding at exit)");
    Ok(())
}

fn drain_events(synth: &Synth) {
    while let Some(SynthEvent::PolyCountChanged(count)) = synth.poll_event() {
        info!("poly count: {count}");
    }
}
