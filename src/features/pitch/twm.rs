//! Two-way mismatch f0 estimation
//!
//! Scores every f0 candidate by how badly its harmonic series and the measured peaks
//! disagree, in both directions:
//!
//! - Predicted-to-measured: each predicted harmonic `h * f0` is matched to its nearest
//!   measured peak; the error grows with the frequency distance and shrinks with the
//!   peak's loudness.
//! - Measured-to-predicted: each measured peak is matched to its nearest harmonic of `f0`,
//!   weighted by the peak's loudness.
//!
//! Candidates are the measured peaks strictly inside `(min_f0, max_f0)`. The candidate with
//! the smallest combined error wins; it is reported as unpitched (`f0 = 0`) when the error is
//! above the threshold or no candidate exists.
//!
//! # Reference
//!
//! Maher, R. C., & Beauchamp, J. W. (1994). Fundamental frequency estimation of musical
//! signals using a two-way mismatch procedure. *Journal of the Acoustical Society of
//! America*, 95(4), 2254-2263.
//!
//! # Example
//!
//! ```
//! use sms_dsp::features::peaks::FrequencyPeak;
//! use sms_dsp::features::pitch::{estimate_f0_twm, TwmParams};
//!
//! let peaks: Vec<FrequencyPeak> = (1..=5)
//!     .map(|h| FrequencyPeak { freq_hz: 220.0 * h as f32, mag_db: -20.0, phase: 0.0 })
//!     .collect();
//! let params = TwmParams { min_f0: 100.0, max_f0: 500.0, error_threshold: 5.0, max_peaks: 10 };
//! let estimate = estimate_f0_twm(&peaks, 44100, &params);
//! assert!((estimate.f0 - 220.0).abs() < 1e-3);
//! ```

use crate::features::peaks::FrequencyPeak;

/// Frequency-distance exponent
const P: f32 = 0.5;
/// Frequency-distance weight inside the magnitude term
const Q: f32 = 1.4;
/// Magnitude offset
const R: f32 = 0.5;
/// Weight of the measured-to-predicted error
const RHO: f32 = 0.33;

/// Search parameters for [`estimate_f0_twm`]
#[derive(Debug, Clone, Copy)]
pub struct TwmParams {
    /// Lower bound of the candidate range in Hz (exclusive)
    pub min_f0: f32,
    /// Upper bound of the candidate range in Hz (exclusive)
    pub max_f0: f32,
    /// Largest accepted mismatch error
    pub error_threshold: f32,
    /// Number of lowest-frequency peaks that take part in the error computation
    pub max_peaks: usize,
}

/// Result of an f0 search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct F0Estimate {
    /// Fundamental frequency in Hz, `0.0` when unpitched
    pub f0: f32,
    /// Mismatch error of the best candidate (`f32::INFINITY` when there was none)
    pub error: f32,
}

impl F0Estimate {
    /// Unpitched frame
    pub fn unvoiced() -> Self {
        Self {
            f0: 0.0,
            error: f32::INFINITY,
        }
    }

    /// True if a fundamental was found
    pub fn is_voiced(&self) -> bool {
        self.f0 > 0.0
    }
}

/// Estimate the fundamental frequency of a frame from its peaks
///
/// # Arguments
///
/// * `peaks` - Interpolated peaks in Hz
/// * `sample_rate` - Sample rate in Hz (bounds the predicted harmonic series at Nyquist)
/// * `params` - Candidate range, error threshold and peak cap
///
/// # Returns
///
/// Always returns an estimate; `f0 == 0.0` means no pitch. Never fails on empty input.
pub fn estimate_f0_twm(
    peaks: &[FrequencyPeak],
    sample_rate: u32,
    params: &TwmParams,
) -> F0Estimate {
    let mut measured: Vec<FrequencyPeak> = peaks
        .iter()
        .filter(|p| p.freq_hz > 0.0 && p.freq_hz.is_finite() && p.mag_db.is_finite())
        .copied()
        .collect();

    if measured.is_empty() {
        return F0Estimate::unvoiced();
    }
    measured.sort_by(|a, b| {
        a.freq_hz
            .partial_cmp(&b.freq_hz)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let candidates: Vec<f32> = measured
        .iter()
        .map(|p| p.freq_hz)
        .filter(|&f| f > params.min_f0 && f < params.max_f0)
        .collect();

    if candidates.is_empty() {
        log::debug!(
            "No f0 candidates among {} peaks in ({:.1}, {:.1}) Hz",
            measured.len(),
            params.min_f0,
            params.max_f0
        );
        return F0Estimate::unvoiced();
    }

    let errors = twm_errors(&measured, &candidates, params.max_peaks, sample_rate as f32 / 2.0);

    let best = errors
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_finite())
        .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal));

    match best {
        Some((idx, &error)) if error <= params.error_threshold => {
            log::debug!(
                "TWM f0 = {:.2} Hz (error {:.3}, {} candidates)",
                candidates[idx],
                error,
                candidates.len()
            );
            F0Estimate {
                f0: candidates[idx],
                error,
            }
        }
        Some((idx, &error)) => {
            log::debug!(
                "TWM best candidate {:.2} Hz rejected: error {:.3} > {:.3}",
                candidates[idx],
                error,
                params.error_threshold
            );
            F0Estimate { f0: 0.0, error }
        }
        None => F0Estimate::unvoiced(),
    }
}

/// Two-way mismatch error for each candidate fundamental
///
/// # Arguments
///
/// * `measured` - Peaks sorted by ascending frequency, all with positive frequency
/// * `candidates` - Candidate fundamentals in Hz
/// * `max_peaks` - Cap on harmonics predicted and peaks explained per candidate
/// * `nyquist` - Predicted harmonics above this frequency are not scored
///
/// # Returns
///
/// One error per candidate, in candidate order
pub fn twm_errors(
    measured: &[FrequencyPeak],
    candidates: &[f32],
    max_peaks: usize,
    nyquist: f32,
) -> Vec<f32> {
    if measured.is_empty() {
        return vec![f32::INFINITY; candidates.len()];
    }

    let max_mag = measured
        .iter()
        .map(|p| p.mag_db)
        .fold(f32::NEG_INFINITY, f32::max);
    let n_peaks = max_peaks.max(1).min(measured.len());
    let explained = &measured[..n_peaks];

    candidates
        .iter()
        .map(|&f0| {
            if f0 <= 0.0 {
                return f32::INFINITY;
            }

            // Predicted to measured
            let n_harmonics = n_peaks.min((nyquist / f0).floor() as usize).max(1);
            let mut error_pm = 0.0f32;
            for h in 1..=n_harmonics {
                let harmonic = f0 * h as f32;
                let nearest = nearest_peak(measured, harmonic);
                let distance = (nearest.freq_hz - harmonic).abs();
                let weighted = distance * harmonic.powf(-P);
                let mag_factor = 10f32.powf((nearest.mag_db - max_mag) / 20.0);
                error_pm += weighted + mag_factor * (Q * weighted - R);
            }

            // Measured to predicted
            let mut error_mp = 0.0f32;
            for peak in explained {
                let n = (peak.freq_hz / f0).round().max(1.0);
                let distance = (peak.freq_hz - n * f0).abs();
                let weighted = distance * peak.freq_hz.powf(-P);
                let mag_factor = 10f32.powf((peak.mag_db - max_mag) / 20.0);
                error_mp += mag_factor * (weighted + mag_factor * (Q * weighted - R));
            }

            error_pm / n_peaks as f32 + RHO * error_mp / n_peaks as f32
        })
        .collect()
}

/// Peak closest in frequency to `freq` (`measured` must be non-empty)
fn nearest_peak(measured: &[FrequencyPeak], freq: f32) -> FrequencyPeak {
    let mut best = measured[0];
    for peak in &measured[1..] {
        if (peak.freq_hz - freq).abs() < (best.freq_hz - freq).abs() {
            best = *peak;
        }
    }
    best
}
