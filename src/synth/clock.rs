use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Frames rendered so far, shared between the render and control paths.
///
/// Only the render path advances it (once per block, after the block is
/// written). The control path reads it to timestamp commands and to pace the
/// safety sweep, so nothing in the voice lifecycle depends on wall time.
#[derive(Debug, Clone)]
pub struct AudioClock {
    frames: Arc<AtomicU64>,
    sample_rate: f32,
}

impl AudioClock {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            frames: Arc::new(AtomicU64::new(0)),
            sample_rate,
        }
    }

    /// Current audio time in frames.
    #[inline]
    pub fn now(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn advance(&self, frames: usize) {
        self.frames.fetch_add(frames as u64, Ordering::Release);
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn seconds_to_frames(&self, seconds: f32) -> u64 {
        seconds_to_frames(seconds, self.sample_rate)
    }

    pub fn frames_to_seconds(&self, frames: u64) -> f64 {
        frames as f64 / f64::from(self.sample_rate)
    }

    /// Current audio time in seconds.
    pub fn seconds(&self) -> f64 {
        self.frames_to_seconds(self.now())
    }
}

/// Round a duration to whole frames. Negative and NaN durations become 0.
#[inline]
pub fn seconds_to_frames(seconds: f32, sample_rate: f32) -> u64 {
    let frames = f64::from(seconds) * f64::from(sample_rate);
    if frames.is_finite() && frames > 0.0 {
        frames.round() as u64
    } else {
        0
    }
}
