//! Analysis run metadata

use serde::{Deserialize, Serialize};

/// Analysis metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Number of frames produced
    pub num_frames: usize,

    /// Hop size `H` in samples
    pub hop_size: usize,

    /// Analysis FFT size `N`
    pub fft_size: usize,

    /// Synthesis FFT size `Ns`
    pub synthesis_fft_size: usize,

    /// Analysis window length `M`
    pub window_len: usize,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Input duration in seconds
    pub duration_seconds: f32,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// Algorithm version
    pub algorithm_version: String,

    /// Frames whose computation failed and were replaced by silent frames
    pub degraded_frames: usize,

    /// Whether the per-frame stages ran on the rayon thread pool
    pub parallel: bool,
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        Self {
            num_frames: 0,
            hop_size: crate::config::HOP_SIZE,
            fft_size: 0,
            synthesis_fft_size: crate::config::SYNTHESIS_FFT_SIZE,
            window_len: 0,
            sample_rate: 0,
            duration_seconds: 0.0,
            processing_time_ms: 0.0,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            degraded_frames: 0,
            parallel: false,
        }
    }
}
