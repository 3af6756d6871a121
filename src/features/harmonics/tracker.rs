//! Harmonic detection with frame-to-frame continuity
//!
//! # Algorithm
//!
//! For a voiced frame with fundamental `f0`, for each slot `i = 1..=nH` whose predicted
//! frequency `i * f0` is below Nyquist:
//!
//! 1. If slot `i` was present in the previous frame, take the peak nearest to its previous
//!    frequency; it wins when it lies within the tolerance of that frequency and within
//!    `f0 / 2` of `i * f0` (continuity bias)
//! 2. Otherwise take the peak nearest to `i * f0`; it wins when it lies within the tolerance
//!    of either `i * f0` or the previous frequency
//! 3. Otherwise the slot is absent this frame
//!
//! The tolerance is `f0 / 3 + slope * peak_freq`. Unvoiced frames (`f0 == 0`) yield an all
//! absent frame. The previous-frame frequencies live in a [`TrackingState`] owned by the
//! caller, so single frames can be tracked in isolation and the stateless stages can run
//! in parallel before a cheap sequential tracking pass.

use super::{HarmonicFrame, Partial};
use crate::features::peaks::FrequencyPeak;

/// Previous-frame harmonic frequencies carried across frames
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingState {
    previous: Vec<Option<f32>>,
}

impl TrackingState {
    /// Empty state (first frame)
    pub fn new() -> Self {
        Self::default()
    }

    /// Previous frequency of slot `index`, if that harmonic was present
    pub fn previous(&self, index: usize) -> Option<f32> {
        self.previous.get(index).copied().flatten()
    }

    /// Record a frame as the new "previous frame"
    pub fn update(&mut self, frame: &HarmonicFrame) {
        self.previous = frame.harmonics.iter().map(|h| h.map(|p| p.freq_hz)).collect();
    }
}

/// Harmonic tracker parameters
#[derive(Debug, Clone, Copy)]
pub struct HarmonicTracker {
    max_harmonics: usize,
    sample_rate: u32,
    deviation_slope: f32,
}

impl HarmonicTracker {
    /// Create a tracker producing `max_harmonics` slots per frame
    pub fn new(max_harmonics: usize, sample_rate: u32, deviation_slope: f32) -> Self {
        Self {
            max_harmonics,
            sample_rate,
            deviation_slope,
        }
    }

    /// Number of slots per frame
    pub fn max_harmonics(&self) -> usize {
        self.max_harmonics
    }

    /// Track one frame and advance `state`
    pub fn track(
        &self,
        peaks: &[FrequencyPeak],
        f0: f32,
        state: &mut TrackingState,
    ) -> HarmonicFrame {
        let frame = self.detect(peaks, f0, state);
        state.update(&frame);
        frame
    }

    /// Detect the harmonics of one frame without modifying `state`
    pub fn detect(&self, peaks: &[FrequencyPeak], f0: f32, state: &TrackingState) -> HarmonicFrame {
        let mut frame = HarmonicFrame::silent(self.max_harmonics);
        if !(f0 > 0.0) || peaks.is_empty() {
            return frame;
        }

        let nyquist = self.sample_rate as f32 / 2.0;
        let tolerance = |freq: f32| f0 / 3.0 + self.deviation_slope * freq;

        for (slot, entry) in frame.harmonics.iter_mut().enumerate() {
            let predicted = f0 * (slot + 1) as f32;
            if predicted >= nyquist {
                break;
            }
            let previous = state.previous(slot);

            let continued = previous.and_then(|prev| {
                let candidate = nearest_peak(peaks, prev);
                let near_prev = (candidate.freq_hz - prev).abs() < tolerance(candidate.freq_hz);
                let near_series = (candidate.freq_hz - predicted).abs() < f0 / 2.0;
                (near_prev && near_series).then_some(candidate)
            });

            let chosen = continued.or_else(|| {
                let candidate = nearest_peak(peaks, predicted);
                let limit = tolerance(candidate.freq_hz);
                let near_series = (candidate.freq_hz - predicted).abs() < limit;
                let near_prev =
                    previous.map_or(false, |prev| (candidate.freq_hz - prev).abs() < limit);
                (near_series || near_prev).then_some(candidate)
            });

            *entry = chosen.map(|p| Partial {
                freq_hz: p.freq_hz,
                mag_db: p.mag_db,
                phase: p.phase,
            });
        }

        log::debug!(
            "Tracked {}/{} harmonics for f0 = {:.2} Hz",
            frame.present(),
            self.max_harmonics,
            f0
        );

        frame
    }
}

/// Peak closest in frequency to `freq` (`peaks` must be non-empty)
fn nearest_peak(peaks: &[FrequencyPeak], freq: f32) -> FrequencyPeak {
    let mut best = peaks[0];
    for peak in &peaks[1..] {
        if (peak.freq_hz - freq).abs() < (best.freq_hz - freq).abs() {
            best = *peak;
        }
    }
    best
}
