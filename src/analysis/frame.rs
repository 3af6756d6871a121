//! Per-frame peak front end shared by both models
//!
//! Windowed DFT, peak detection and parabolic interpolation of one analysis frame,
//! with the resulting peaks expressed in Hz.

use crate::error::AnalysisError;
use crate::features::peaks::{detect_peaks, interpolate_peaks, to_frequency_peaks, FrequencyPeak};
use crate::features::spectrum::SpectralAnalyzer;
use crate::preprocessing::frames::FramePosition;

/// Peak extraction for analysis frames of a fixed window and FFT size
#[derive(Debug, Clone)]
pub struct PeakAnalyzer {
    spectral: SpectralAnalyzer,
    threshold_db: f32,
    sample_rate: u32,
}

impl PeakAnalyzer {
    /// Create a peak analyzer
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` if the window is empty or longer than `fft_size`.
    pub fn new(
        window: &[f32],
        fft_size: usize,
        threshold_db: f32,
        sample_rate: u32,
    ) -> Result<Self, AnalysisError> {
        Ok(Self {
            spectral: SpectralAnalyzer::new(window, fft_size)?,
            threshold_db,
            sample_rate,
        })
    }

    /// Analysis window length `M`
    pub fn window_len(&self) -> usize {
        self.spectral.window().len()
    }

    /// Interpolated peaks of one analysis frame
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::NumericalError` for a non-finite spectrum and
    /// `AnalysisError::ProcessingError` for a frame of the wrong length.
    pub fn peaks(&self, frame: &[f32]) -> Result<Vec<FrequencyPeak>, AnalysisError> {
        let spectrum = self.spectral.analyze(frame)?;
        let bins = detect_peaks(&spectrum.magnitude_db, self.threshold_db);
        let peaks = interpolate_peaks(&spectrum.magnitude_db, &spectrum.phase, &bins);
        Ok(to_frequency_peaks(
            &peaks,
            self.sample_rate,
            self.spectral.fft_size(),
        ))
    }

    /// Interpolated peaks of the analysis frame at `position` in `samples`
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::ProcessingError` if the frame does not lie inside `samples`,
    /// and propagates the errors of [`PeakAnalyzer::peaks`].
    pub fn peaks_at(
        &self,
        samples: &[f32],
        position: &FramePosition,
    ) -> Result<Vec<FrequencyPeak>, AnalysisError> {
        let end = position.analysis_start + self.window_len();
        let frame = samples.get(position.analysis_start..end).ok_or_else(|| {
            AnalysisError::ProcessingError(format!(
                "Analysis frame {} [{}, {}) exceeds signal length {}",
                position.index,
                position.analysis_start,
                end,
                samples.len()
            ))
        })?;
        self.peaks(frame)
    }
}
