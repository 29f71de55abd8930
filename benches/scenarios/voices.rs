//! Benchmarks for whole-instrument blocks.
//!
//! Each case queues note-ons on the control side, lets them settle, then
//! times full graph blocks: lanes, master bus, distortion and reverb.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use bohemian::{
    dsp::oscillator::Waveform, graph::bus::AudioGraph, instrument, synth::engine::VoiceEngine,
    EngineConfig,
};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

fn sounding(voices: usize, config: &EngineConfig) -> (VoiceEngine, AudioGraph) {
    let (mut engine, mut graph) = instrument(config, SAMPLE_RATE);
    for i in 0..voices {
        engine.note_on(24 + (i as i32) * 3);
    }
    // Past attack and decay
    let mut left = vec![0.0f32; 4_096];
    let mut right = vec![0.0f32; 4_096];
    graph.render(&mut left, &mut right);
    (engine, graph)
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        // === IDLE ===
        // No voices: bus and reverb only
        let (_engine, mut idle) = sounding(0, &EngineConfig::default());
        group.bench_with_input(BenchmarkId::new("idle", size), &size, |b, _| {
            b.iter(|| {
                idle.render_block(black_box(&mut left), black_box(&mut right));
            })
        });

        // === SINGLE NOTE ===
        let (_engine, mut single) = sounding(1, &EngineConfig::default());
        group.bench_with_input(BenchmarkId::new("single", size), &size, |b, _| {
            b.iter(|| {
                single.render_block(black_box(&mut left), black_box(&mut right));
            })
        });

        // === FULL DEFAULT POLYPHONY ===
        let (_engine, mut chord) = sounding(8, &EngineConfig::default());
        group.bench_with_input(BenchmarkId::new("eight_voices", size), &size, |b, _| {
            b.iter(|| {
                chord.render_block(black_box(&mut left), black_box(&mut right));
            })
        });

        // === WORST CASE ===
        // Every voice on band-limited edges with vibrato
        let config = EngineConfig::default().with_max_polyphony(32);
        let (mut engine, mut dense) = sounding(32, &config);
        engine.set_slot_shape(0, Waveform::Square);
        engine.set_lfo(None, Some(6.0), Some(30.0), None);
        group.bench_with_input(BenchmarkId::new("thirty_two_voices", size), &size, |b, _| {
            b.iter(|| {
                dense.render_block(black_box(&mut left), black_box(&mut right));
            })
        });
    }

    group.finish();
}
