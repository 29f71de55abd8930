//! Distortion / Waveshaping
//!
//! The wet path of the output bus runs through a light soft-clipper before
//! the reverb, which thickens the tail without audibly distorting the dry
//! signal.
//!
//! # Transfer Curve
//!
//! ```text
//! f(x) = (1 + k) · x / (1 + k · |x|)      k = 100 · drive
//! ```
//!
//! - `drive = 0`   → k = 0, f(x) = x (clean)
//! - `drive = 0.15` → k = 15, gentle saturation (default)
//! - `drive = 1`   → k = 100, close to a hard clip
//!
//! f(±1) = ±1 for every k, so full-scale input stays full-scale; only the
//! curvature in between changes. Input is clamped to [-1, 1] first, matching
//! the fixed domain of a lookup-table waveshaper.

/// Map a normalised drive amount to the curve coefficient.
#[inline]
pub fn curve_coefficient(drive: f32) -> f32 {
    drive.clamp(0.0, 1.0) * 100.0
}

/// Soft clip a single sample with the given curve coefficient.
#[inline]
pub fn soft_clip(sample: f32, k: f32) -> f32 {
    let x = sample.clamp(-1.0, 1.0);
    (1.0 + k) * x / (1.0 + k * x.abs())
}

/// Apply soft clipping to an entire buffer in place.
pub fn soft_clip_buffer(buffer: &mut [f32], drive: f32) {
    let k = curve_coefficient(drive);
    for sample in buffer.iter_mut() {
        *sample = soft_clip(*sample, k);
    }
}
