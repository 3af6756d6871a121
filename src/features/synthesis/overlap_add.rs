//! Inverse FFT and overlap-add
//!
//! Synthesis frames are `Ns` samples long and analyzed with the unit-sum Blackman-Harris
//! window. After the inverse FFT the frame is multiplied by the overlap window `sw`:
//! a triangle of length `2H` centered in the frame, divided by that same Blackman-Harris
//! window. The product with the analysis window is then the bare triangle, and triangles
//! spaced `H` apart sum to one, so the windowing cancels on overlap-add.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::AnalysisError;
use crate::features::spectrum::undo_zero_phase;
use crate::preprocessing::window::{blackman_harris, normalize_window, triangular};

/// Frame synthesizer for a fixed synthesis size and hop
#[derive(Clone)]
pub struct OverlapAdd {
    ifft: Arc<dyn Fft<f32>>,
    size: usize,
    hop: usize,
    synthesis_window: Vec<f32>,
    overlap_window: Vec<f32>,
}

impl std::fmt::Debug for OverlapAdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlapAdd")
            .field("size", &self.size)
            .field("hop", &self.hop)
            .finish()
    }
}

impl OverlapAdd {
    /// Create a synthesizer for `size`-sample frames spaced `hop` samples apart
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` unless `size` is even and `0 < 2 * hop <= size`.
    pub fn new(size: usize, hop: usize) -> Result<Self, AnalysisError> {
        if size < 4 || size % 2 != 0 || hop == 0 || 2 * hop > size {
            return Err(AnalysisError::InvalidConfig(format!(
                "Overlap-add needs an even size and 0 < 2 * hop <= size (size {}, hop {})",
                size, hop
            )));
        }

        let synthesis_window = normalize_window(&blackman_harris(size));
        let half = size / 2;
        let triangle = triangular(2 * hop);

        let mut overlap_window = vec![0.0f32; size];
        for (i, &t) in triangle.iter().enumerate() {
            let idx = half - hop + i;
            let w = synthesis_window[idx];
            overlap_window[idx] = if w > 0.0 { t / w } else { 0.0 };
        }

        let mut planner = FftPlanner::new();
        let ifft = planner.plan_fft_inverse(size);

        log::debug!("Overlap-add synthesizer: size {}, hop {}", size, hop);

        Ok(Self {
            ifft,
            size,
            hop,
            synthesis_window,
            overlap_window,
        })
    }

    /// Synthesis frame size `Ns`
    pub fn size(&self) -> usize {
        self.size
    }

    /// Hop size `H`
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Unit-sum Blackman-Harris window the synthesis frames are analyzed with
    pub fn synthesis_window(&self) -> &[f32] {
        &self.synthesis_window
    }

    /// Overlap window `sw` applied after the inverse FFT
    pub fn overlap_window(&self) -> &[f32] {
        &self.overlap_window
    }

    /// Inverse FFT of a full `Ns`-bin spectrum, back in time order, times `sw`
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::ProcessingError` if the spectrum has the wrong length.
    pub fn synthesize_frame(&self, spectrum: &[Complex<f32>]) -> Result<Vec<f32>, AnalysisError> {
        if spectrum.len() != self.size {
            return Err(AnalysisError::ProcessingError(format!(
                "Synthesis spectrum has {} bins, expected {}",
                spectrum.len(),
                self.size
            )));
        }

        let mut buffer = spectrum.to_vec();
        self.ifft.process(&mut buffer);

        let scale = 1.0 / self.size as f32;
        let real: Vec<f32> = buffer.iter().map(|c| c.re * scale).collect();

        Ok(undo_zero_phase(&real)
            .iter()
            .zip(self.overlap_window.iter())
            .map(|(&x, &w)| x * w)
            .collect())
    }

    /// Add `frame` into `output` starting at signal index `start`
    ///
    /// Samples that fall outside `output` are dropped.
    pub fn accumulate(output: &mut [f32], frame: &[f32], start: isize) {
        for (i, &x) in frame.iter().enumerate() {
            let idx = start + i as isize;
            if idx < 0 {
                continue;
            }
            match output.get_mut(idx as usize) {
                Some(y) => *y += x,
                None => break,
            }
        }
    }
}
