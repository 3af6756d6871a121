//! Stochastic envelope: decimated residual magnitude in dB

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::config::MAG_FLOOR_DB;
use crate::features::spectrum::magnitude_db;

/// Decimated magnitude envelope of a residual spectrum
///
/// Takes the dB magnitude of the positive bins `0..Ns/2`, floors it at -200 dB and
/// resamples it to `bins` points with [`resample_fft`]. With `bins == Ns/2` the floored
/// magnitudes are returned unchanged.
pub fn stochastic_envelope(residual: &[Complex<f32>], bins: usize) -> Vec<f32> {
    let half = residual.len() / 2;
    let mag: Vec<f32> = magnitude_db(&residual[..half])
        .into_iter()
        .map(|m| m.max(MAG_FLOOR_DB))
        .collect();
    resample_fft(&mag, bins)
}

/// Resample a sequence to `num` points by truncating or zero-padding its spectrum
///
/// The sequence is treated as one period of a band-limited periodic signal. When
/// shrinking an even-length spectrum the Nyquist bin of the result takes both halves
/// of the split bin; when growing from an even length the old Nyquist bin is split
/// evenly. The output is the real part of the inverse FFT scaled by `1 / len`.
pub fn resample_fft(x: &[f32], num: usize) -> Vec<f32> {
    let len = x.len();
    if num == len {
        return x.to_vec();
    }
    if len == 0 || num == 0 {
        return vec![0.0; num];
    }

    let mut planner = FftPlanner::<f64>::new();
    let mut spectrum: Vec<Complex<f64>> = x.iter().map(|&v| Complex::new(v as f64, 0.0)).collect();
    planner.plan_fft_forward(len).process(&mut spectrum);

    let n = num.min(len);
    let nyq = n / 2 + 1;
    let mut resampled = vec![Complex::new(0.0f64, 0.0); num];
    resampled[..nyq].copy_from_slice(&spectrum[..nyq]);
    if n > 2 {
        let tail = n - nyq;
        resampled[num - tail..].copy_from_slice(&spectrum[len - tail..]);
    }
    if n % 2 == 0 {
        if num < len {
            resampled[n / 2] += spectrum[len - n / 2];
        } else if num > len {
            resampled[n / 2] *= 0.5;
            resampled[num - n / 2] = resampled[n / 2];
        }
    }

    planner.plan_fft_inverse(num).process(&mut resampled);
    let scale = 1.0 / len as f64;
    resampled.iter().map(|c| (c.re * scale) as f32).collect()
}
