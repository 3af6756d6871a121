//! Zero-phase windowed DFT
//!
//! # Algorithm
//!
//! 1. Multiply the frame by the normalized window
//! 2. Zero-phase buffering: the second half of the windowed frame goes to the start of an
//!    `N`-sample buffer, the first half to its end, zeros in between. Time index 0 of the
//!    FFT is the window center, so peak phases refer to the frame center.
//! 3. FFT, then `20 * log10(max(|X|, 1e-10))` and unwrapped `arg(X)` over bins `0..N/2`
//!
//! # Example
//!
//! ```
//! use sms_dsp::features::spectrum::SpectralAnalyzer;
//!
//! let window = vec![1.0f32; 511];
//! let analyzer = SpectralAnalyzer::new(&window, 1024)?;
//! let frame = vec![0.0f32; 511];
//! let spectrum = analyzer.analyze(&frame)?;
//! assert_eq!(spectrum.len(), 512);
//! # Ok::<(), sms_dsp::AnalysisError>(())
//! ```

use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::Spectrum;
use crate::error::AnalysisError;
use crate::preprocessing::window::normalize_window;

/// Linear magnitude corresponding to the -200 dB floor
const MAG_FLOOR: f32 = 1e-10;

/// Zero-phase windowed DFT of fixed size
#[derive(Clone)]
pub struct SpectralAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    window: Vec<f32>,
}

impl std::fmt::Debug for SpectralAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralAnalyzer")
            .field("fft_size", &self.fft_size)
            .field("window_len", &self.window.len())
            .finish()
    }
}

impl SpectralAnalyzer {
    /// Create an analyzer for the given window and FFT size
    ///
    /// The window is normalized to unit sum here; the caller's copy is not modified.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` if the window is empty or longer than `fft_size`.
    pub fn new(window: &[f32], fft_size: usize) -> Result<Self, AnalysisError> {
        if window.is_empty() || window.len() > fft_size {
            return Err(AnalysisError::InvalidConfig(format!(
                "Window length {} must be in [1, {}]",
                window.len(),
                fft_size
            )));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        Ok(Self {
            fft,
            fft_size,
            window: normalize_window(window),
        })
    }

    /// FFT size `N`
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Normalized window in use
    pub fn window(&self) -> &[f32] {
        &self.window
    }

    /// Full complex spectrum (all `N` bins) of a zero-phase windowed frame
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::ProcessingError` if the frame length differs from the window length.
    pub fn complex_spectrum(&self, frame: &[f32]) -> Result<Vec<Complex<f32>>, AnalysisError> {
        if frame.len() != self.window.len() {
            return Err(AnalysisError::ProcessingError(format!(
                "Frame length {} does not match window length {}",
                frame.len(),
                self.window.len()
            )));
        }

        let windowed: Vec<f32> = frame
            .iter()
            .zip(self.window.iter())
            .map(|(&x, &w)| x * w)
            .collect();

        let mut buffer = zero_phase_buffer(&windowed, self.fft_size);
        self.fft.process(&mut buffer);
        Ok(buffer)
    }

    /// Magnitude (dB) and unwrapped phase of the positive bins `0..N/2`
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::NumericalError` if the spectrum contains non-finite values,
    /// or a processing error for a frame of the wrong length.
    pub fn analyze(&self, frame: &[f32]) -> Result<Spectrum, AnalysisError> {
        let spectrum = self.complex_spectrum(frame)?;
        let half = self.fft_size / 2;

        let mag = magnitude_db(&spectrum[..half]);
        if mag.iter().any(|m| !m.is_finite()) {
            return Err(AnalysisError::NumericalError(
                "Non-finite magnitude in analysis spectrum".to_string(),
            ));
        }

        let mut phase: Vec<f32> = spectrum[..half].iter().map(|c| c.arg()).collect();
        unwrap_phase(&mut phase);

        Ok(Spectrum {
            magnitude_db: mag,
            phase,
        })
    }
}

/// Place a windowed frame into an `fft_size` buffer with its center at index 0
///
/// `windowed[hM2..]` fills the start of the buffer and `windowed[..hM2]` its end,
/// where `hM2 = floor(M/2)`.
pub fn zero_phase_buffer(windowed: &[f32], fft_size: usize) -> Vec<Complex<f32>> {
    let mut buffer = vec![Complex::new(0.0f32, 0.0); fft_size];
    let len = windowed.len().min(fft_size);
    let half_round = (len + 1) / 2;
    let half_floor = len / 2;

    for (i, &x) in windowed[half_floor..len].iter().enumerate() {
        buffer[i].re = x;
    }
    for (i, &x) in windowed[..half_floor].iter().enumerate() {
        buffer[fft_size - half_floor + i].re = x;
    }
    debug_assert_eq!(len - half_floor, half_round);
    buffer
}

/// Rotate an even-length zero-phase frame back to natural time order
pub fn undo_zero_phase(buffer: &[f32]) -> Vec<f32> {
    let half = buffer.len() / 2;
    let mut out = Vec::with_capacity(buffer.len());
    out.extend_from_slice(&buffer[half..]);
    out.extend_from_slice(&buffer[..half]);
    out
}

/// Magnitude in dB, floored at -200 dB
pub fn magnitude_db(spectrum: &[Complex<f32>]) -> Vec<f32> {
    spectrum
        .iter()
        .map(|c| 20.0 * c.norm().max(MAG_FLOOR).log10())
        .collect()
}

/// Unwrap a phase sequence in place so consecutive values differ by less than pi
pub fn unwrap_phase(phase: &mut [f32]) {
    if phase.len() < 2 {
        return;
    }
    let two_pi = 2.0 * PI;
    let mut correction = 0.0f64;
    let mut prev = phase[0] as f64;

    for p in phase.iter_mut().skip(1) {
        let raw = *p as f64;
        let d = raw - prev;
        prev = raw;
        if d.abs() >= PI {
            let mut dd = (d + PI).rem_euclid(two_pi) - PI;
            if dd == -PI && d > 0.0 {
                dd = PI;
            }
            correction += dd - d;
        }
        *p = (raw + correction) as f32;
    }
}
