//! Configuration parameters for spectral modeling analysis

use crate::error::AnalysisError;

/// FFT size used for spectral synthesis and residual analysis
///
/// Fixed regardless of the analysis FFT size.
pub const SYNTHESIS_FFT_SIZE: usize = 512;

/// Hop size in samples, shared by analysis and synthesis (`SYNTHESIS_FFT_SIZE / 4`)
pub const HOP_SIZE: usize = SYNTHESIS_FFT_SIZE / 4;

/// Smallest analysis FFT size accepted
pub const MIN_FFT_SIZE: usize = 512;

/// Floor applied to every magnitude spectrum before taking logarithms (dB)
pub const MAG_FLOOR_DB: f32 = -200.0;

/// Analysis configuration parameters
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    // Spectral analysis
    /// Analysis FFT size `N` (default: 1024, minimum 512)
    pub fft_size: usize,

    /// Peak detection threshold in dB (default: -80.0)
    /// Spectral maxima at or below this level are ignored
    pub threshold_db: f32,

    // Harmonic analysis
    /// Number of harmonic slots `nH` per frame (default: 60)
    pub max_harmonics: usize,

    /// Minimum f0 candidate in Hz (default: 100.0)
    pub min_f0: f32,

    /// Maximum f0 candidate in Hz (default: 1000.0)
    pub max_f0: f32,

    /// Two-way mismatch error above which a frame is declared unpitched (default: 10.0)
    pub f0_error_threshold: f32,

    /// Number of low-frequency peaks that take part in the TWM search (default: 10)
    pub max_twm_peaks: usize,

    /// Growth of the harmonic tolerance window per Hz of peak frequency (default: 0.01)
    ///
    /// A peak is accepted as harmonic `i` when it deviates from the prediction by less
    /// than `f0 / 3 + harmonic_deviation_slope * peak_freq`.
    pub harmonic_deviation_slope: f32,

    // Stochastic analysis
    /// Decimation factor of the residual magnitude envelope, in (0, 1] (default: 0.2)
    pub stochastic_factor: f32,

    // Execution
    /// Run the stateless per-frame stages on the rayon thread pool (default: false)
    ///
    /// Tracking stays sequential; output is identical to the sequential run.
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            threshold_db: -80.0,
            max_harmonics: 60,
            min_f0: 100.0,
            max_f0: 1000.0,
            f0_error_threshold: 10.0,
            max_twm_peaks: 10,
            harmonic_deviation_slope: 0.01,
            stochastic_factor: 0.2,
            parallel: false,
        }
    }
}

impl AnalysisConfig {
    /// Validate the parameters shared by every model against the analysis window
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` if `fft_size < 512`, the window is empty,
    /// longer than `fft_size`, non-finite or sums to zero, or the sample rate is zero.
    pub fn validate_spectral(&self, window: &[f32], sample_rate: u32) -> Result<(), AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidConfig(
                "Sample rate must be > 0".to_string(),
            ));
        }

        if self.fft_size < MIN_FFT_SIZE {
            return Err(AnalysisError::InvalidConfig(format!(
                "FFT size {} is below the minimum of {}",
                self.fft_size, MIN_FFT_SIZE
            )));
        }

        if window.is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "Analysis window is empty".to_string(),
            ));
        }

        if window.len() > self.fft_size {
            return Err(AnalysisError::InvalidConfig(format!(
                "Window length {} exceeds FFT size {}",
                window.len(),
                self.fft_size
            )));
        }

        if window.iter().any(|w| !w.is_finite()) {
            return Err(AnalysisError::InvalidConfig(
                "Analysis window contains non-finite coefficients".to_string(),
            ));
        }

        let sum: f32 = window.iter().sum();
        if sum.abs() < f32::EPSILON {
            return Err(AnalysisError::InvalidConfig(
                "Analysis window sums to zero and cannot be normalized".to_string(),
            ));
        }

        if !self.threshold_db.is_finite() {
            return Err(AnalysisError::InvalidConfig(format!(
                "Peak threshold must be finite, got {}",
                self.threshold_db
            )));
        }

        if window.len() % 2 == 0 {
            log::warn!(
                "Even window length {} (odd lengths keep the zero-phase center on a sample)",
                window.len()
            );
        }

        Ok(())
    }

    /// Validate the parameters used only by the harmonic-plus-stochastic model
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` if the f0 range is empty or negative,
    /// `stochastic_factor` is outside (0, 1], or a count parameter is zero.
    pub fn validate_harmonic(&self, sample_rate: u32) -> Result<(), AnalysisError> {
        if !(self.min_f0 >= 0.0) || !(self.min_f0 < self.max_f0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "Invalid f0 range: [{:.1}, {:.1}] Hz",
                self.min_f0, self.max_f0
            )));
        }

        if !(self.stochastic_factor > 0.0 && self.stochastic_factor <= 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "Stochastic factor must be in (0, 1], got {}",
                self.stochastic_factor
            )));
        }

        if self.max_harmonics == 0 {
            return Err(AnalysisError::InvalidConfig(
                "max_harmonics must be >= 1".to_string(),
            ));
        }

        if self.max_twm_peaks == 0 {
            return Err(AnalysisError::InvalidConfig(
                "max_twm_peaks must be >= 1".to_string(),
            ));
        }

        if !self.f0_error_threshold.is_finite() || !self.harmonic_deviation_slope.is_finite() {
            return Err(AnalysisError::InvalidConfig(
                "f0_error_threshold and harmonic_deviation_slope must be finite".to_string(),
            ));
        }

        let nyquist = sample_rate as f32 / 2.0;
        if self.max_f0 > nyquist {
            log::warn!(
                "max_f0 {:.1} Hz lies above Nyquist ({:.1} Hz); candidates stop there",
                self.max_f0,
                nyquist
            );
        }

        Ok(())
    }

    /// Number of bins in the decimated stochastic envelope (`floor(stocf * Ns / 2)`, at least 1)
    pub fn stochastic_bins(&self) -> usize {
        ((self.stochastic_factor * (SYNTHESIS_FFT_SIZE / 2) as f32).floor() as usize).max(1)
    }
}
