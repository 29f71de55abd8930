use crate::dsp::reverb::StereoReverb;
use crate::error::Error;
use crate::graph::node::Parameterized;
use crate::synth::params::ReverbParams;

/*
Reverb Node
===========

Second stage of the wet path: the shaped mono bus goes in, a decorrelated
stereo tail comes out.

When sound bounces off walls, floor, and ceiling, you hear:
1. Direct sound (original signal)
2. Early reflections (first few bounces, give sense of room size)
3. Reverb tail (dense wash of many reflections, decays over time)

The comb lines model the tail and the allpass line thickens it. Left and
right use different line lengths, so even a mono input comes out wide.

Parameters
----------

Room (0.2 - 4.0):
  Feedback of the comb lines. Larger rooms ring longer.

Damp (0.0 - 0.99):
  High-frequency absorption per echo. 0.0 = bright, 0.99 = very dark

Mix (0.0 - 1.0):
  Dry/wet blend inside the reverb. The bus also uses it as the wet gain.
*/

/// Stereo reverb stage fed from a mono bus
pub struct ReverbNode {
    reverb: StereoReverb,
}

impl ReverbNode {
    /// Allocate the delay network. Fails for sample rates the delay tuning
    /// does not cover.
    pub fn new(sample_rate: f32, params: &ReverbParams) -> Result<Self, Error> {
        let mut node = Self {
            reverb: StereoReverb::new(sample_rate)?,
        };
        node.apply_params(&params.validated());
        Ok(node)
    }

    /// Process a mono input block into the two output channels.
    pub fn render(&mut self, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(input.len(), left.len());
        debug_assert_eq!(input.len(), right.len());

        let outputs = left.iter_mut().zip(right.iter_mut());
        for (&sample, (out_l, out_r)) in input.iter().zip(outputs) {
            let (l, r) = self.reverb.process(sample, sample);
            *out_l = l;
            *out_r = r;
        }
    }

    pub fn feedback(&self) -> f32 {
        self.reverb.feedback()
    }

    pub fn line_lengths(&self) -> ([usize; 5], [usize; 5]) {
        self.reverb.line_lengths()
    }
}

impl Parameterized for ReverbNode {
    type Params = ReverbParams;

    fn apply_params(&mut self, params: &ReverbParams) {
        // Skip the log2 when nothing moved
        if params.room != self.reverb.room() {
            self.reverb.set_room(params.room);
        }
        self.reverb.set_damping(params.damp);
        self.reverb.set_mix(params.mix);
    }

    fn params(&self) -> ReverbParams {
        ReverbParams {
            room: self.reverb.room(),
            damp: self.reverb.damping(),
            mix: self.reverb.mix(),
        }
    }
}
