//! Window helpers
//!
//! Analysis windows are supplied by the caller; this module only normalizes them and
//! builds the two windows the engine owns: the Blackman-Harris synthesis window and the
//! triangular overlap window used for overlap-add.

use std::f64::consts::PI;

/// 4-term Blackman-Harris coefficients
pub const BH_COEFFS: [f64; 4] = [0.35875, 0.48829, 0.14128, 0.01168];

/// Scale a window so its coefficients sum to one
///
/// A window summing to zero is returned unchanged; configuration validation rejects
/// such windows before they reach the engine.
pub fn normalize_window(window: &[f32]) -> Vec<f32> {
    let sum: f64 = window.iter().map(|&w| w as f64).sum();
    if sum.abs() < f64::EPSILON {
        return window.to_vec();
    }
    window.iter().map(|&w| (w as f64 / sum) as f32).collect()
}

/// Symmetric 4-term Blackman-Harris window
pub fn blackman_harris(size: usize) -> Vec<f32> {
    match size {
        0 => return vec![],
        1 => return vec![1.0],
        _ => {}
    }
    let denom = (size - 1) as f64;
    (0..size)
        .map(|i| {
            let x = 2.0 * PI * i as f64 / denom;
            let w = BH_COEFFS[0] - BH_COEFFS[1] * x.cos() + BH_COEFFS[2] * (2.0 * x).cos()
                - BH_COEFFS[3] * (3.0 * x).cos();
            w as f32
        })
        .collect()
}

/// Triangular window with non-zero end points
///
/// For even sizes `M` the coefficients are `(2n - 1) / M` rising to the center and
/// mirrored, so two copies shifted by `M / 2` add up to exactly one.
pub fn triangular(size: usize) -> Vec<f32> {
    if size == 0 {
        return vec![];
    }
    let half = (size + 1) / 2;
    let rising: Vec<f32> = if size % 2 == 0 {
        (1..=half)
            .map(|n| (2 * n - 1) as f32 / size as f32)
            .collect()
    } else {
        (1..=half)
            .map(|n| (2 * n) as f32 / (size + 1) as f32)
            .collect()
    };

    let mut window = rising.clone();
    let mirror_len = size - half;
    window.extend(rising[..mirror_len].iter().rev());
    window
}
