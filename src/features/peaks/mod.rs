//! Spectral peak picking
//!
//! Two steps:
//! - Detection: local maxima of the dB magnitude spectrum above a threshold
//! - Interpolation: parabolic refinement of location and magnitude, linear phase interpolation

pub mod detection;
pub mod interpolation;

pub use detection::detect_peaks;
pub use interpolation::interpolate_peaks;

/// Spectral peak refined to sub-bin precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralPeak {
    /// Fractional bin location
    pub bin: f32,

    /// Magnitude in dB
    pub mag_db: f32,

    /// Phase in radians
    pub phase: f32,
}

impl SpectralPeak {
    /// Peak frequency in Hz for a spectrum of size `fft_size` at `sample_rate`
    pub fn frequency(&self, sample_rate: u32, fft_size: usize) -> f32 {
        sample_rate as f32 * self.bin / fft_size as f32
    }
}

/// Spectral peak expressed in Hz, as consumed by f0 estimation and harmonic tracking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyPeak {
    /// Frequency in Hz
    pub freq_hz: f32,

    /// Magnitude in dB
    pub mag_db: f32,

    /// Phase in radians
    pub phase: f32,
}

/// Convert bin-domain peaks to Hz
pub fn to_frequency_peaks(
    peaks: &[SpectralPeak],
    sample_rate: u32,
    fft_size: usize,
) -> Vec<FrequencyPeak> {
    peaks
        .iter()
        .map(|p| FrequencyPeak {
            freq_hz: p.frequency(sample_rate, fft_size),
            mag_db: p.mag_db,
            phase: p.phase,
        })
        .collect()
}
