//! Fundamental frequency estimation
//!
//! Two-way mismatch (TWM) search over spectral peaks.

pub mod twm;

pub use twm::{estimate_f0_twm, twm_errors, F0Estimate, TwmParams};
