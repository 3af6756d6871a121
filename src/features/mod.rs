//! Feature extraction and synthesis modules
//!
//! This module contains the per-frame building blocks:
//! - Spectral analysis (zero-phase windowed DFT)
//! - Peak detection and interpolation
//! - f0 estimation (two-way mismatch)
//! - Harmonic tracking
//! - Spectral synthesis and overlap-add
//! - Residual and stochastic analysis

pub mod harmonics;
pub mod peaks;
pub mod pitch;
pub mod residual;
pub mod spectrum;
pub mod synthesis;
