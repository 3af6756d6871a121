//! Spectral synthesis
//!
//! - Sine spectrum generation: sinusoids rendered as Blackman-Harris main lobes
//! - Overlap-add: inverse FFT, overlap windowing and accumulation into the output signal

pub mod overlap_add;
pub mod sines;

pub use overlap_add::OverlapAdd;
pub use sines::{blackman_harris_lobe, BlackmanHarrisLobe, SineSpectrumGenerator, Sinusoid};
