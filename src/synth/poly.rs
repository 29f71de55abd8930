use rtrb::{Consumer, Producer};

use crate::{
    dsp::lfo::Lfo,
    graph::node::{GraphNode, RenderCtx},
    synth::{
        lane::{BlockTuning, VoiceLane},
        message::{RenderReport, VoiceCommand},
        params::SynthParams,
    },
};

/// Render side of the voice engine: a fixed pool of lanes driven by
/// commands from the control path.
///
/// Commands and parameter snapshots are applied at the start of each block,
/// so every block sees one consistent parameter set. Nothing here allocates
/// after construction.
pub struct PolyRenderer {
    lanes: Vec<VoiceLane>,
    commands: Consumer<VoiceCommand>,
    snapshots: Consumer<SynthParams>,
    reports: Producer<RenderReport>,
    params: SynthParams,
    lfo: Lfo,
    sample_rate: f32,
}

impl PolyRenderer {
    pub(crate) fn new(
        lanes: Vec<VoiceLane>,
        commands: Consumer<VoiceCommand>,
        snapshots: Consumer<SynthParams>,
        reports: Producer<RenderReport>,
        params: SynthParams,
        sample_rate: f32,
    ) -> Self {
        Self {
            lanes,
            commands,
            snapshots,
            reports,
            params,
            lfo: Lfo::new(),
            sample_rate,
        }
    }

    /// Apply pending commands and the newest snapshot.
    fn process_messages(&mut self) {
        while let Ok(command) = self.commands.pop() {
            let Some(lane) = self.lanes.get_mut(command.lane()) else {
                continue;
            };
            match command {
                VoiceCommand::Start {
                    epoch,
                    base_frequency,
                    ..
                } => lane.start(epoch, base_frequency),
                VoiceCommand::Retrigger { epoch, .. } => lane.retrigger(epoch),
                VoiceCommand::Stop {
                    epoch,
                    release_frames,
                    stop_at,
                    dispose_at,
                    ..
                } => lane.stop(epoch, release_frames, stop_at, dispose_at),
                VoiceCommand::Kill { .. } => lane.kill(),
            }
        }

        while let Ok(params) = self.snapshots.pop() {
            self.params = params;
        }
    }

    /// Render every sounding lane into `out` (overwritten) for the block
    /// starting at audio frame `block_start`.
    pub fn render_voices(&mut self, out: &mut [f32], block_start: u64) {
        self.process_messages();
        out.fill(0.0);

        let lfo = &self.params.lfo;
        let lfo_value = self
            .lfo
            .advance(lfo.shape, lfo.rate_hz, out.len(), self.sample_rate);
        let tuning = BlockTuning::new(&self.params, lfo_value, self.sample_rate);

        for lane in &mut self.lanes {
            lane.render_add(out, block_start, &tuning);
        }

        let block_end = block_start + out.len() as u64;
        for (index, lane) in self.lanes.iter_mut().enumerate() {
            if let Some(epoch) = lane.finished_epoch(block_end) {
                // Ring full: leave it pending and try again next block
                let report = RenderReport::Finished { lane: index, epoch };
                if self.reports.push(report).is_ok() {
                    lane.mark_reported();
                }
            }
        }
    }

    /// Parameters in effect for the last rendered block.
    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    pub fn lane(&self, index: usize) -> Option<&VoiceLane> {
        self.lanes.get(index)
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

impl GraphNode for PolyRenderer {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.render_voices(out, ctx.block_start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtrb::RingBuffer;

    struct Harness {
        renderer: PolyRenderer,
        commands: Producer<VoiceCommand>,
        snapshots: Producer<SynthParams>,
        reports: Consumer<RenderReport>,
    }

    fn harness() -> Harness {
        let (commands, command_rx) = RingBuffer::new(64);
        let (snapshots, snapshot_rx) = RingBuffer::new(8);
        let (report_tx, reports) = RingBuffer::new(8);
        let lanes = (0..4).map(|_| VoiceLane::new(144, 2880, 0.85)).collect();
        Harness {
            renderer: PolyRenderer::new(
                lanes,
                command_rx,
                snapshot_rx,
                report_tx,
                SynthParams::default(),
                48_000.0,
            ),
            commands,
            snapshots,
            reports,
        }
    }

    #[test]
    fn commands_apply_at_block_start() {
        let mut h = harness();
        let mut out = vec![0.0f32; 256];

        h.renderer.render_voices(&mut out, 0);
        assert!(out.iter().all(|&s| s == 0.0));

        h.commands
            .push(VoiceCommand::Start {
                lane: 2,
                epoch: 0,
                base_frequency: 440.0,
            })
            .unwrap();
        h.renderer.render_voices(&mut out, 256);
        assert!(out.iter().any(|&s| s.abs() > 0.01));
    }

    #[test]
    fn newest_snapshot_wins() {
        let mut h = harness();
        let mut first = SynthParams::default();
        first.slots[0].gain = 0.1;
        let mut second = SynthParams::default();
        second.slots[0].gain = 0.9;
        h.snapshots.push(first).unwrap();
        h.snapshots.push(second).unwrap();

        let mut out = vec![0.0f32; 64];
        h.renderer.render_voices(&mut out, 0);
        assert_eq!(h.renderer.params().slots[0].gain, 0.9);
    }

    #[test]
    fn finished_report_follows_the_disposal_deadline() {
        let mut h = harness();
        let mut out = vec![0.0f32; 128];
        h.commands
            .push(VoiceCommand::Start {
                lane: 1,
                epoch: 0,
                base_frequency: 330.0,
            })
            .unwrap();
        h.commands
            .push(VoiceCommand::Stop {
                lane: 1,
                epoch: 1,
                release_frames: 100,
                stop_at: 100,
                dispose_at: 200,
            })
            .unwrap();

        h.renderer.render_voices(&mut out, 0);
        assert!(h.reports.pop().is_err());

        h.renderer.render_voices(&mut out, 128);
        assert_eq!(
            h.reports.pop().ok(),
            Some(RenderReport::Finished { lane: 1, epoch: 1 })
        );

        // reported once only
        h.renderer.render_voices(&mut out, 256);
        assert!(h.reports.pop().is_err());
    }

    #[test]
    fn out_of_range_lanes_are_ignored() {
        let mut h = harness();
        h.commands.push(VoiceCommand::Kill { lane: 99 }).unwrap();
        let mut out = vec![0.0f32; 32];
        h.renderer.render_voices(&mut out, 0);
        assert_eq!(h.renderer.lane_count(), 4);
    }
}
