//! Parabolic peak interpolation
//!
//! # Algorithm
//!
//! For a peak at bin `k` with dB magnitudes `a = X[k-1]`, `b = X[k]`, `c = X[k+1]`:
//!
//! 1. Vertex location: `p = k + 0.5 * (a - c) / (a - 2b + c)`
//! 2. Vertex height: `b - 0.25 * (a - c) * (p - k)`
//! 3. Phase: linear interpolation of the unwrapped phase spectrum at `p`
//!
//! A strict local maximum always has `a - 2b + c < 0`, so the vertex stays within half a
//! bin of `k`.

use super::SpectralPeak;

/// Refine detected peaks to sub-bin precision
///
/// # Arguments
///
/// * `mag_db` - Magnitude spectrum in dB
/// * `phase` - Unwrapped phase spectrum (same length as `mag_db`)
/// * `peak_bins` - Bins returned by [`detect_peaks`](super::detect_peaks)
///
/// # Returns
///
/// One refined peak per input bin, in the same order. Bins without a valid 3-bin
/// neighborhood are skipped.
pub fn interpolate_peaks(mag_db: &[f32], phase: &[f32], peak_bins: &[usize]) -> Vec<SpectralPeak> {
    let len = mag_db.len().min(phase.len());

    peak_bins
        .iter()
        .filter(|&&k| k >= 1 && k + 1 < len)
        .map(|&k| {
            let left = mag_db[k - 1];
            let center = mag_db[k];
            let right = mag_db[k + 1];

            let denom = left - 2.0 * center + right;
            let offset = if denom.abs() > f32::EPSILON {
                (0.5 * (left - right) / denom).clamp(-0.5, 0.5)
            } else {
                0.0
            };

            let bin = k as f32 + offset;
            let mag_db = center - 0.25 * (left - right) * offset;

            SpectralPeak {
                bin,
                mag_db,
                phase: interp_linear(phase, bin),
            }
        })
        .collect()
}

/// Linearly interpolate `values` at fractional index `x` (clamped to the valid range)
fn interp_linear(values: &[f32], x: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let last = values.len() - 1;
    if x <= 0.0 {
        return values[0];
    }
    if x >= last as f32 {
        return values[last];
    }
    let i0 = x.floor() as usize;
    let frac = x - i0 as f32;
    values[i0] + frac * (values[i0 + 1] - values[i0])
}
