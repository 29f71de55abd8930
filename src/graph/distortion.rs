use crate::dsp::distortion::soft_clip_buffer;
use crate::dsp::mix::apply_dry_wet;
use crate::graph::node::{GraphNode, Parameterized, RenderCtx};
use crate::synth::params::DistortionParams;
use crate::MAX_BLOCK_SIZE;

/*
Distortion Node
===============

First stage of the wet path. The master bus is copied, soft clipped and
blended back with its unclipped copy before it reaches the reverb, so the
tail gets a little extra harmonic density while the dry path stays clean.

Parameters
----------

Drive (0.0 - 1.0):
  Curvature of the soft clipper (k = 100 · drive).
  0.0 = clean, 0.15 = default warmth, 1.0 = near hard clip

Mix (0.0 - 1.0):
  Dry/wet blend inside the stage. 0.0 = bypass, 1.0 = fully shaped
*/

/// Soft-clip waveshaper with dry/wet blend (processes in place)
pub struct DistortionNode {
    drive: f32,
    mix: f32,
    dry_buffer: [f32; MAX_BLOCK_SIZE], // Pre-allocated for allocation-free rendering
}

impl DistortionNode {
    pub fn new(params: &DistortionParams) -> Self {
        let params = params.validated();
        Self {
            drive: params.drive,
            mix: params.mix,
            dry_buffer: [0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn drive(&self) -> f32 {
        self.drive
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }
}

impl GraphNode for DistortionNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        if self.mix <= 0.0 {
            return;
        }

        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            let dry = &mut self.dry_buffer[..chunk.len()];
            dry.copy_from_slice(chunk);
            soft_clip_buffer(chunk, self.drive);
            apply_dry_wet(dry, chunk, self.mix);
        }
    }
}

impl Parameterized for DistortionNode {
    type Params = DistortionParams;

    fn apply_params(&mut self, params: &DistortionParams) {
        self.drive = params.drive.clamp(0.0, 1.0);
        self.mix = params.mix.clamp(0.0, 1.0);
    }

    fn params(&self) -> DistortionParams {
        DistortionParams {
            drive: self.drive,
            mix: self.mix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RenderCtx {
        RenderCtx::new(48_000.0, 0)
    }

    #[test]
    fn zero_mix_bypasses() {
        let mut node = DistortionNode::new(&DistortionParams {
            drive: 1.0,
            mix: 0.0,
        });
        let mut buffer = [0.1, -0.4, 0.9];
        node.render_block(&mut buffer, &ctx());
        assert_eq!(buffer, [0.1, -0.4, 0.9]);
    }

    #[test]
    fn default_drive_saturates_quiet_input() {
        let mut node = DistortionNode::new(&DistortionParams::default());
        let mut buffer = [0.1f32; 16];
        node.render_block(&mut buffer, &ctx());
        // k = 15 at full mix: 0.1 → 0.64
        assert!(buffer.iter().all(|&s| (s - 0.64).abs() < 1e-5));
    }

    #[test]
    fn half_mix_blends_with_dry() {
        let mut node = DistortionNode::new(&DistortionParams::default());
        node.apply_params(&DistortionParams {
            drive: 0.15,
            mix: 0.5,
        });
        let mut buffer = [0.1f32; 4];
        node.render_block(&mut buffer, &ctx());
        assert!(buffer.iter().all(|&s| (s - 0.37).abs() < 1e-5));
        assert_eq!(node.params().mix, 0.5);
    }

    #[test]
    fn long_buffers_are_processed_in_chunks() {
        let mut node = DistortionNode::new(&DistortionParams::default());
        let mut buffer = vec![0.1f32; MAX_BLOCK_SIZE + 100];
        node.render_block(&mut buffer, &ctx());
        assert!((buffer[MAX_BLOCK_SIZE + 50] - 0.64).abs() < 1e-5);
    }
}
