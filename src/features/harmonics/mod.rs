//! Harmonic trajectory tracking
//!
//! Fixed-width harmonic frames (`nH` slots, slot `i` is roughly the `(i+1)`-th partial)
//! built from the peaks of each frame and kept continuous with the previous frame.

pub mod tracker;

pub use tracker::{HarmonicTracker, TrackingState};

use serde::{Deserialize, Serialize};

/// One detected partial
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Partial {
    /// Frequency in Hz
    pub freq_hz: f32,
    /// Magnitude in dB
    pub mag_db: f32,
    /// Phase in radians
    pub phase: f32,
}

/// Harmonics of a single frame
///
/// Always holds exactly `nH` slots. `None` marks a harmonic that is absent in this frame;
/// the flattened accessors write absent slots as `0.0`, the convention downstream
/// consumers expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicFrame {
    /// Per-slot partials, `None` if absent
    pub harmonics: Vec<Option<Partial>>,
}

impl HarmonicFrame {
    /// Frame with every harmonic absent
    pub fn silent(max_harmonics: usize) -> Self {
        Self {
            harmonics: vec![None; max_harmonics],
        }
    }

    /// Number of slots (`nH`)
    pub fn len(&self) -> usize {
        self.harmonics.len()
    }

    /// True if the frame has no slots
    pub fn is_empty(&self) -> bool {
        self.harmonics.is_empty()
    }

    /// Number of harmonics present in this frame
    pub fn present(&self) -> usize {
        self.harmonics.iter().filter(|h| h.is_some()).count()
    }

    /// Partial in slot `index`, if present
    pub fn get(&self, index: usize) -> Option<Partial> {
        self.harmonics.get(index).copied().flatten()
    }

    /// Frequencies in Hz, `0.0` for absent harmonics
    pub fn frequencies(&self) -> Vec<f32> {
        self.harmonics
            .iter()
            .map(|h| h.map_or(0.0, |p| p.freq_hz))
            .collect()
    }

    /// Magnitudes in dB, `0.0` for absent harmonics
    pub fn magnitudes(&self) -> Vec<f32> {
        self.harmonics
            .iter()
            .map(|h| h.map_or(0.0, |p| p.mag_db))
            .collect()
    }

    /// Phases in radians, `0.0` for absent harmonics
    pub fn phases(&self) -> Vec<f32> {
        self.harmonics
            .iter()
            .map(|h| h.map_or(0.0, |p| p.phase))
            .collect()
    }

    /// Present partials only, in slot order
    pub fn partials(&self) -> impl Iterator<Item = Partial> + '_ {
        self.harmonics.iter().filter_map(|h| *h)
    }
}
