/// Context passed to graph nodes during rendering
///
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - block_start: Audio-clock frame of the first sample in the block
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub block_start: u64,
}

impl RenderCtx {
    pub fn new(sample_rate: f32, block_start: u64) -> Self {
        Self {
            sample_rate,
            block_start,
        }
    }

    /// Audio-clock frame just past a block of `frames` samples.
    pub fn block_end(&self, frames: usize) -> u64 {
        self.block_start + frames as u64
    }
}

/// Core trait for mono audio processing nodes.
///
/// Sources overwrite `out`; effects process `out` in place.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Check if this node is still producing sound
    fn is_active(&self) -> bool {
        true
    }
}

/// Nodes whose parameters arrive as snapshots at block boundaries.
pub trait Parameterized {
    type Params: Copy + Send;

    fn apply_params(&mut self, params: &Self::Params);

    fn params(&self) -> Self::Params;
}
