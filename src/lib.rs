//! # SMS DSP
//!
//! Spectral modeling analysis and synthesis: a sound is decomposed into time-varying
//! sinusoidal or harmonic partials plus a residual, and can be resynthesized from them.
//!
//! ## Features
//!
//! - **Harmonic-plus-stochastic analysis**: two-way mismatch f0 estimation, harmonic
//!   trajectories continuous across frames, decimated residual envelopes
//! - **Sinusoidal-plus-residual synthesis**: every spectral peak resynthesized as a
//!   sinusoid, the exact residual recovered by overlap-add
//! - **Parallel frames**: stateless stages on the rayon thread pool with identical output
//!
//! ## Quick Start
//!
//! ```no_run
//! use sms_dsp::{analyze_hps, AnalysisConfig};
//!
//! // Mono f32 samples and a caller-supplied analysis window (odd length recommended)
//! let samples: Vec<f32> = vec![]; // Your audio data
//! let window: Vec<f32> = vec![1.0; 801];
//!
//! let analysis = analyze_hps(&samples, 44100, &window, AnalysisConfig::default())?;
//!
//! println!("{} frames, f0 track: {:?}", analysis.num_frames(), analysis.f0);
//! # Ok::<(), sms_dsp::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! The analysis pipeline follows this flow, once per hop:
//!
//! ```text
//! Frame scheduler → Spectrum → Peaks → f0 (TWM) → Harmonic tracker
//!     → Sine spectrum → Residual → Overlap-add
//! ```
//!
//! Analysis frames use the caller's window and FFT size `N`; synthesis and residual
//! frames are fixed at `Ns = 512` samples with a hop of `H = 128`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod preprocessing;

// Re-export main types
pub use analysis::metadata::AnalysisMetadata;
pub use analysis::result::{HpsAnalysis, SprOutput};
pub use analysis::sink::{TrajectoryAxes, TrajectorySink};
pub use config::{AnalysisConfig, HOP_SIZE, SYNTHESIS_FFT_SIZE};
pub use error::AnalysisError;
pub use features::harmonics::{HarmonicFrame, Partial};

use analysis::{HpsAnalyzer, SprAnalyzer};
use preprocessing::FrameScheduler;

/// Harmonic-plus-stochastic analysis
///
/// Estimates f0 and tracks up to `max_harmonics` harmonics per frame, then models what
/// the harmonics do not explain as a decimated magnitude envelope.
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `sample_rate` - Sample rate in Hz
/// * `window` - Analysis window (any scale; normalized internally)
/// * `config` - Analysis configuration parameters
///
/// # Returns
///
/// `HpsAnalysis` with one harmonic frame, f0 value and stochastic envelope per frame.
/// A signal shorter than one frame yields zero frames.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidConfig` for parameters outside their preconditions
/// and `AnalysisError::InvalidInput` for non-finite samples.
///
/// # Example
///
/// ```no_run
/// use sms_dsp::{analyze_hps, AnalysisConfig};
///
/// let samples = vec![0.0f32; 44100]; // one second of silence
/// let window = vec![1.0f32; 801];
/// let analysis = analyze_hps(&samples, 44100, &window, AnalysisConfig::default())?;
/// assert!(analysis.f0.iter().all(|&f0| f0 == 0.0));
/// # Ok::<(), sms_dsp::AnalysisError>(())
/// ```
pub fn analyze_hps(
    samples: &[f32],
    sample_rate: u32,
    window: &[f32],
    config: AnalysisConfig,
) -> Result<HpsAnalysis, AnalysisError> {
    use std::time::Instant;
    let start_time = Instant::now();

    log::debug!(
        "Starting HPS analysis: {} samples at {} Hz, M = {}, N = {}",
        samples.len(),
        sample_rate,
        window.len(),
        config.fft_size
    );

    config.validate_spectral(window, sample_rate)?;
    config.validate_harmonic(sample_rate)?;
    validate_samples(samples)?;

    let analyzer = HpsAnalyzer::new(window, sample_rate, &config)?;
    let scheduler = FrameScheduler::new(samples.len(), window.len(), SYNTHESIS_FFT_SIZE, HOP_SIZE);
    let frames = analyzer.run(samples, &scheduler, config.parallel);

    if frames.degraded > 0 {
        log::warn!(
            "{} of {} frames degraded during HPS analysis",
            frames.degraded,
            scheduler.num_frames()
        );
    }

    let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;
    log::debug!(
        "HPS analysis finished: {} frames in {:.2} ms",
        scheduler.num_frames(),
        processing_time_ms
    );

    Ok(HpsAnalysis {
        harmonics: frames.harmonics,
        f0: frames.f0,
        stochastic_envelope: frames.stochastic,
        synthesis_fft_size: SYNTHESIS_FFT_SIZE,
        hop_size: HOP_SIZE,
        metadata: metadata(
            samples,
            sample_rate,
            window,
            &config,
            scheduler.num_frames(),
            frames.degraded,
            processing_time_ms,
        ),
    })
}

/// Harmonic-plus-stochastic analysis delivered to a trajectory sink
///
/// Same as [`analyze_hps`]; on success the sink receives every frame in order and then
/// the complete analysis with its time and frequency axes.
///
/// # Errors
///
/// Same as [`analyze_hps`]. The sink is not called when analysis fails.
pub fn analyze_hps_with_sink(
    samples: &[f32],
    sample_rate: u32,
    window: &[f32],
    config: AnalysisConfig,
    sink: &mut dyn TrajectorySink,
) -> Result<HpsAnalysis, AnalysisError> {
    let analysis = analyze_hps(samples, sample_rate, window, config)?;
    analysis::sink::deliver(&analysis, sink);
    Ok(analysis)
}

/// Sinusoidal-plus-residual analysis and synthesis
///
/// Every spectral peak above `threshold_db` is resynthesized as a sinusoid; the residual
/// is the rest of the spectrum, recovered exactly by overlap-add. Only `fft_size`,
/// `threshold_db` and `parallel` of `config` are used.
///
/// # Returns
///
/// `SprOutput` with `y = sinusoidal + residual`, all the length of the input. Samples
/// near the signal edges that no synthesis frame fully covers are attenuated.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidConfig` for an invalid window or FFT size and
/// `AnalysisError::InvalidInput` for non-finite samples.
pub fn analyze_spr(
    samples: &[f32],
    sample_rate: u32,
    window: &[f32],
    config: AnalysisConfig,
) -> Result<SprOutput, AnalysisError> {
    use std::time::Instant;
    let start_time = Instant::now();

    log::debug!(
        "Starting SPR analysis: {} samples at {} Hz, M = {}, N = {}",
        samples.len(),
        sample_rate,
        window.len(),
        config.fft_size
    );

    config.validate_spectral(window, sample_rate)?;
    validate_samples(samples)?;

    let analyzer = SprAnalyzer::new(window, sample_rate, &config)?;
    let scheduler = FrameScheduler::new(samples.len(), window.len(), SYNTHESIS_FFT_SIZE, HOP_SIZE);
    let signals = analyzer.run(samples, &scheduler, config.parallel);

    if signals.degraded > 0 {
        log::warn!(
            "{} of {} frames degraded during SPR synthesis",
            signals.degraded,
            scheduler.num_frames()
        );
    }

    let y: Vec<f32> = signals
        .sinusoidal
        .iter()
        .zip(signals.residual.iter())
        .map(|(s, r)| s + r)
        .collect();

    let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;
    log::debug!(
        "SPR synthesis finished: {} frames in {:.2} ms",
        scheduler.num_frames(),
        processing_time_ms
    );

    Ok(SprOutput {
        y,
        sinusoidal: signals.sinusoidal,
        residual: signals.residual,
        metadata: metadata(
            samples,
            sample_rate,
            window,
            &config,
            scheduler.num_frames(),
            signals.degraded,
            processing_time_ms,
        ),
    })
}

fn validate_samples(samples: &[f32]) -> Result<(), AnalysisError> {
    if let Some(idx) = samples.iter().position(|s| !s.is_finite()) {
        return Err(AnalysisError::InvalidInput(format!(
            "Non-finite sample at index {}",
            idx
        )));
    }
    Ok(())
}

fn metadata(
    samples: &[f32],
    sample_rate: u32,
    window: &[f32],
    config: &AnalysisConfig,
    num_frames: usize,
    degraded_frames: usize,
    processing_time_ms: f32,
) -> AnalysisMetadata {
    AnalysisMetadata {
        num_frames,
        hop_size: HOP_SIZE,
        fft_size: config.fft_size,
        synthesis_fft_size: SYNTHESIS_FFT_SIZE,
        window_len: window.len(),
        sample_rate,
        duration_seconds: samples.len() as f32 / sample_rate as f32,
        processing_time_ms,
        algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
        degraded_frames,
        parallel: config.parallel,
    }
}
