//! Signal mixing primitives.

/*
Signal Mixing
=============

  summing   Adding signals at equal level. Voices are summed into the master
            bus this way; the master gain keeps the sum in range.

  wet/dry   Linear crossfade between the unprocessed (dry) and processed
            (wet) signal:

                output = dry × (1 - mix) + wet × mix

            The weights sum to 1.0, so a fully correlated signal keeps its
            level through the crossfade.
*/

/// Add signal B into signal A in-place (summing).
///
/// ⚠️ WARNING: Can exceed [-1.0, +1.0] range!
#[inline]
pub fn sum_in_place(a: &mut [f32], b: &[f32]) {
    debug_assert_eq!(a.len(), b.len());

    for (sa, &sb) in a.iter_mut().zip(b.iter()) {
        *sa += sb;
    }
}

/// Multiply a buffer by a constant gain.
#[inline]
pub fn scale_in_place(buffer: &mut [f32], gain: f32) {
    for sample in buffer.iter_mut() {
        *sample *= gain;
    }
}

/// Blend dry and wet samples using linear crossfade (single sample version).
///
/// output = (dry × (1-mix)) + (wet × mix)
#[inline]
pub fn blend_dry_wet(dry: f32, wet: f32, mix: f32) -> f32 {
    dry * (1.0 - mix) + wet * mix
}

/// Apply dry/wet mixing to a buffer, blending original (dry) with processed (wet).
///
/// wet[i] = (dry[i] × (1-mix)) + (wet[i] × mix)
#[inline]
pub fn apply_dry_wet(dry: &[f32], wet: &mut [f32], mix: f32) {
    debug_assert_eq!(dry.len(), wet.len());

    let mix = mix.clamp(0.0, 1.0);
    for (w, &d) in wet.iter_mut().zip(dry.iter()) {
        *w = blend_dry_wet(d, *w, mix);
    }
}
