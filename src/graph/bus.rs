//! Output bus: voices → master → dry + (distortion → reverb) → stereo.
//!
//! ```text
//!                       ┌──────────── dry × 1.0 ─────────────┐
//! voices ─(+)─ × 0.9 ───┤                                    (+)──→ L / R
//!                       └─→ distortion ─→ reverb ─ × mix ────┘
//! ```
//!
//! If the reverb cannot be built for the device sample rate the wet branch
//! is dropped and the output is the master bus on both channels.

use log::{info, warn};

use crate::{
    config::EngineConfig,
    dsp::mix::scale_in_place,
    graph::{
        distortion::DistortionNode,
        node::{GraphNode, Parameterized, RenderCtx},
        reverb::ReverbNode,
    },
    synth::{clock::AudioClock, poly::PolyRenderer},
    MAX_BLOCK_SIZE,
};

/// Gain of the unprocessed path into the output.
const DRY_GAIN: f32 = 1.0;

pub struct AudioGraph {
    voices: PolyRenderer,
    distortion: DistortionNode,
    reverb: Option<ReverbNode>,
    clock: AudioClock,
    master_gain: f32,
    master: Box<[f32]>,
    wet: Box<[f32]>,
    wet_left: Box<[f32]>,
    wet_right: Box<[f32]>,
}

impl AudioGraph {
    pub fn new(voices: PolyRenderer, clock: AudioClock, config: &EngineConfig) -> Self {
        let sample_rate = clock.sample_rate();
        let params = *voices.params();

        let reverb = match ReverbNode::new(sample_rate, &params.reverb) {
            Ok(reverb) => Some(reverb),
            Err(err) => {
                warn!("{err}; rendering dry only");
                None
            }
        };
        info!(
            "audio graph ready at {sample_rate} Hz (reverb {})",
            if reverb.is_some() { "on" } else { "off" }
        );

        let block = || vec![0.0f32; MAX_BLOCK_SIZE].into_boxed_slice();
        Self {
            distortion: DistortionNode::new(&params.distortion),
            voices,
            reverb,
            clock,
            master_gain: config.master_gain,
            master: block(),
            wet: block(),
            wet_left: block(),
            wet_right: block(),
        }
    }

    /// Render one block of at most `MAX_BLOCK_SIZE` frames and advance the
    /// audio clock. Returns the number of frames written.
    pub fn render_block(&mut self, left: &mut [f32], right: &mut [f32]) -> usize {
        let frames = left.len().min(right.len()).min(MAX_BLOCK_SIZE);
        let ctx = RenderCtx::new(self.clock.sample_rate(), self.clock.now());

        let master = &mut self.master[..frames];
        self.voices.render_block(master, &ctx);
        scale_in_place(master, self.master_gain);

        let params = *self.voices.params();
        let (left, right) = (&mut left[..frames], &mut right[..frames]);

        match self.reverb.as_mut() {
            Some(reverb) => {
                let wet = &mut self.wet[..frames];
                wet.copy_from_slice(master);

                self.distortion.apply_params(&params.distortion);
                self.distortion.render_block(wet, &ctx);

                reverb.apply_params(&params.reverb);
                let wet_left = &mut self.wet_left[..frames];
                let wet_right = &mut self.wet_right[..frames];
                reverb.render(wet, wet_left, wet_right);

                let wet_gain = params.reverb.mix;
                for i in 0..frames {
                    left[i] = DRY_GAIN * master[i] + wet_gain * wet_left[i];
                    right[i] = DRY_GAIN * master[i] + wet_gain * wet_right[i];
                }
            }
            None => {
                left.copy_from_slice(master);
                right.copy_from_slice(master);
            }
        }

        self.clock.advance(frames);
        frames
    }

    /// Render buffers of any length in `MAX_BLOCK_SIZE` chunks.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        let mut done = 0;
        while done < frames {
            let end = (done + MAX_BLOCK_SIZE).min(frames);
            done += self.render_block(&mut left[done..end], &mut right[done..end]);
        }
    }

    pub fn reverb_active(&self) -> bool {
        self.reverb.is_some()
    }

    pub fn voices(&self) -> &PolyRenderer {
        &self.voices
    }

    pub fn clock(&self) -> &AudioClock {
        &self.clock
    }

    pub fn sample_rate(&self) -> f32 {
        self.clock.sample_rate()
    }
}

#[cfg(test)]
mod tests {
    use crate::{instrument, EngineConfig};

    #[test]
    fn silent_without_notes() {
        let (_engine, mut graph) = instrument(&EngineConfig::default(), 48_000.0);
        let mut left = vec![1.0f32; 512];
        let mut right = vec![1.0f32; 512];
        graph.render(&mut left, &mut right);

        assert!(left.iter().chain(&right).all(|&s| s == 0.0));
        assert_eq!(graph.clock().now(), 512);
    }

    #[test]
    fn long_buffers_advance_the_clock_in_blocks() {
        let (_engine, mut graph) = instrument(&EngineConfig::default(), 44_100.0);
        let mut left = vec![0.0f32; 5_000];
        let mut right = vec![0.0f32; 5_000];
        graph.render(&mut left, &mut right);
        assert_eq!(graph.clock().now(), 5_000);
    }

    #[test]
    fn wet_branch_makes_channels_differ() {
        let (mut engine, mut graph) = instrument(&EngineConfig::default(), 48_000.0);
        engine.note_on(57);

        let mut left = vec![0.0f32; 8_192];
        let mut right = vec![0.0f32; 8_192];
        graph.render(&mut left, &mut right);

        assert!(graph.reverb_active());
        assert!(left.iter().any(|&s| s.abs() > 0.01));
        assert_ne!(left, right);
    }

    #[test]
    fn unsupported_rate_renders_dry_mono() {
        let (mut engine, mut graph) = instrument(&EngineConfig::default(), 4_000.0);
        engine.note_on(57);

        let mut left = vec![0.0f32; 1_024];
        let mut right = vec![0.0f32; 1_024];
        graph.render(&mut left, &mut right);

        assert!(!graph.reverb_active());
        assert_eq!(left, right);
        assert!(left.iter().any(|&s| s.abs() > 0.01));
    }
}
