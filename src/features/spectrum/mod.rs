//! Short-time spectral analysis
//!
//! Zero-phase windowed DFT of a single frame:
//! - Windowing with a unit-sum window
//! - Zero-phase buffering (frame center moved to time index 0)
//! - Magnitude in dB (floored at -200 dB) and unwrapped phase of the positive bins

pub mod dft;

pub use dft::{
    magnitude_db, undo_zero_phase, unwrap_phase, zero_phase_buffer, SpectralAnalyzer,
};

/// Positive-frequency spectrum of one analysis frame
#[derive(Debug, Clone, Default)]
pub struct Spectrum {
    /// Magnitude in dB of bins `0..N/2`
    pub magnitude_db: Vec<f32>,

    /// Unwrapped phase in radians of bins `0..N/2`
    pub phase: Vec<f32>,
}

impl Spectrum {
    /// Number of positive-frequency bins
    pub fn len(&self) -> usize {
        self.magnitude_db.len()
    }

    /// True if the spectrum holds no bins
    pub fn is_empty(&self) -> bool {
        self.magnitude_db.is_empty()
    }
}
