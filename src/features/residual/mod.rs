//! Residual and stochastic analysis
//!
//! The residual of a frame is its synthesis-size spectrum minus the spectrum of the
//! detected harmonics rendered as Blackman-Harris lobes. Its magnitude envelope,
//! decimated in frequency, is the stochastic component of the model.

pub mod stochastic;

pub use stochastic::{resample_fft, stochastic_envelope};

use rustfft::num_complex::Complex;

use crate::error::AnalysisError;
use crate::features::harmonics::HarmonicFrame;
use crate::features::spectrum::SpectralAnalyzer;
use crate::features::synthesis::{SineSpectrumGenerator, Sinusoid};

/// Computes residual spectra of synthesis-size frames
#[derive(Debug, Clone)]
pub struct ResidualAnalyzer {
    analyzer: SpectralAnalyzer,
    sample_rate: u32,
}

impl ResidualAnalyzer {
    /// Create a residual analyzer
    ///
    /// # Arguments
    ///
    /// * `synthesis_window` - Window of length `Ns` (normalized internally)
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` for an empty window.
    pub fn new(synthesis_window: &[f32], sample_rate: u32) -> Result<Self, AnalysisError> {
        Ok(Self {
            analyzer: SpectralAnalyzer::new(synthesis_window, synthesis_window.len())?,
            sample_rate,
        })
    }

    /// Synthesis FFT size `Ns`
    pub fn size(&self) -> usize {
        self.analyzer.fft_size()
    }

    /// Full complex spectrum of a synthesis-size frame
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::ProcessingError` if `frame` is not `Ns` samples long.
    pub fn frame_spectrum(&self, frame: &[f32]) -> Result<Vec<Complex<f32>>, AnalysisError> {
        self.analyzer.complex_spectrum(frame)
    }

    /// Spectrum of the harmonics of one frame at synthesis size
    pub fn harmonic_spectrum(
        &self,
        harmonics: &HarmonicFrame,
        generator: &dyn SineSpectrumGenerator,
    ) -> Vec<Complex<f32>> {
        let size = self.size();
        let sines: Vec<Sinusoid> = harmonics
            .partials()
            .map(|p| Sinusoid::from_hz(p.freq_hz, p.mag_db, p.phase, size, self.sample_rate))
            .collect();
        generator.generate(&sines, size)
    }

    /// Residual spectrum of a frame: its spectrum minus the harmonic spectrum
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::ProcessingError` if `frame` is not `Ns` samples long.
    pub fn residual(
        &self,
        frame: &[f32],
        harmonics: &HarmonicFrame,
        generator: &dyn SineSpectrumGenerator,
    ) -> Result<Vec<Complex<f32>>, AnalysisError> {
        let spectrum = self.frame_spectrum(frame)?;
        let harmonic = self.harmonic_spectrum(harmonics, generator);
        residual_spectrum(&spectrum, &harmonic)
    }
}

/// Bin-wise difference of two spectra of equal length
///
/// # Errors
///
/// Returns `AnalysisError::ProcessingError` if the lengths differ.
pub fn residual_spectrum(
    spectrum: &[Complex<f32>],
    harmonic: &[Complex<f32>],
) -> Result<Vec<Complex<f32>>, AnalysisError> {
    if spectrum.len() != harmonic.len() {
        return Err(AnalysisError::ProcessingError(format!(
            "Spectrum lengths differ: {} vs {}",
            spectrum.len(),
            harmonic.len()
        )));
    }
    Ok(spectrum
        .iter()
        .zip(harmonic.iter())
        .map(|(x, h)| x - h)
        .collect())
}
