//! Analysis result types

use serde::{Deserialize, Serialize};

use super::metadata::AnalysisMetadata;
use crate::features::harmonics::HarmonicFrame;

/// Output of the harmonic-plus-stochastic analysis
///
/// One entry per frame in every per-frame field. Each harmonic frame has exactly
/// `max_harmonics` slots; each stochastic envelope has `stochastic_bins` values in dB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HpsAnalysis {
    /// Tracked harmonics per frame (absent slots are `None`)
    pub harmonics: Vec<HarmonicFrame>,

    /// Fundamental frequency per frame in Hz, `0.0` when unpitched
    pub f0: Vec<f32>,

    /// Decimated residual magnitude envelope per frame, in dB
    pub stochastic_envelope: Vec<Vec<f32>>,

    /// Synthesis FFT size `Ns`
    pub synthesis_fft_size: usize,

    /// Hop size `H`
    pub hop_size: usize,

    /// Run metadata
    pub metadata: AnalysisMetadata,
}

impl HpsAnalysis {
    /// Number of analysis frames
    pub fn num_frames(&self) -> usize {
        self.harmonics.len()
    }

    /// Harmonic frequency matrix (frames x nH, Hz), `0.0` where a harmonic is absent
    pub fn harmonic_frequencies(&self) -> Vec<Vec<f32>> {
        self.harmonics.iter().map(HarmonicFrame::frequencies).collect()
    }

    /// Harmonic magnitude matrix (frames x nH, dB), `0.0` where a harmonic is absent
    pub fn harmonic_magnitudes(&self) -> Vec<Vec<f32>> {
        self.harmonics.iter().map(HarmonicFrame::magnitudes).collect()
    }

    /// Harmonic phase matrix (frames x nH, radians), `0.0` where a harmonic is absent
    pub fn harmonic_phases(&self) -> Vec<Vec<f32>> {
        self.harmonics.iter().map(HarmonicFrame::phases).collect()
    }

    /// Harmonic frequency matrix with absent harmonics as `NaN`, for plotting
    pub fn masked_frequencies(&self) -> Vec<Vec<f32>> {
        self.harmonics
            .iter()
            .map(|frame| {
                frame
                    .harmonics
                    .iter()
                    .map(|h| h.map_or(f32::NAN, |p| p.freq_hz))
                    .collect()
            })
            .collect()
    }

    /// Time in seconds of each frame (`k * H / fs`)
    pub fn frame_times(&self) -> Vec<f32> {
        let sample_rate = self.metadata.sample_rate.max(1) as f32;
        (0..self.num_frames())
            .map(|k| (k * self.hop_size) as f32 / sample_rate)
            .collect()
    }

    /// Center frequency in Hz of each stochastic envelope bin
    ///
    /// The envelope spans `0..fs/2` in as many steps as it has bins: `k * (fs / 2) / bins`.
    pub fn stochastic_bin_frequencies(&self) -> Vec<f32> {
        let bins = self.stochastic_envelope.first().map_or(0, Vec::len);
        if bins == 0 {
            return vec![];
        }
        let nyquist = self.metadata.sample_rate as f32 / 2.0;
        (0..bins).map(|k| k as f32 * nyquist / bins as f32).collect()
    }
}

/// Output of the sinusoidal-plus-residual analysis/synthesis
///
/// All signals have the length of the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprOutput {
    /// Reconstructed signal `sinusoidal + residual`
    pub y: Vec<f32>,

    /// Sinusoidal component
    pub sinusoidal: Vec<f32>,

    /// Residual component
    pub residual: Vec<f32>,

    /// Run metadata
    pub metadata: AnalysisMetadata,
}
