//! Analysis drivers and result aggregation
//!
//! - Frame front end (spectrum and peaks)
//! - Harmonic-plus-stochastic and sinusoidal-plus-residual drivers
//! - Result types, metadata and trajectory sinks

pub mod frame;
pub mod hps;
pub mod metadata;
pub mod result;
pub mod sink;
pub mod spr;

pub use frame::PeakAnalyzer;
pub use hps::{HpsAnalyzer, HpsFrames};
pub use spr::{SprAnalyzer, SprSignals};
