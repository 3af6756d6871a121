//! Harmonic-plus-stochastic analysis driver
//!
//! Per frame: peaks and TWM f0 from the analysis frame, harmonic tracking against the
//! previous frame, then the residual of the synthesis-centered frame decimated into a
//! stochastic envelope.
//!
//! The sequential path runs the three stages frame by frame. The parallel path splits
//! them into passes: peaks and f0 for all frames on the rayon pool, tracking in frame
//! order, then residual envelopes on the pool again. Both paths produce identical output.
//!
//! A frame whose computation fails is logged, counted as degraded and replaced by an
//! unpitched frame (no peaks, f0 = 0) or a floor-level envelope.

use rayon::prelude::*;

use super::frame::PeakAnalyzer;
use crate::config::{AnalysisConfig, MAG_FLOOR_DB, SYNTHESIS_FFT_SIZE};
use crate::error::AnalysisError;
use crate::features::harmonics::{HarmonicFrame, HarmonicTracker, TrackingState};
use crate::features::peaks::FrequencyPeak;
use crate::features::pitch::{estimate_f0_twm, F0Estimate, TwmParams};
use crate::features::residual::{stochastic_envelope, ResidualAnalyzer};
use crate::features::synthesis::{BlackmanHarrisLobe, SineSpectrumGenerator};
use crate::preprocessing::frames::{padded_slice, FramePosition, FrameScheduler};
use crate::preprocessing::window::blackman_harris;

/// Peaks and f0 of one frame
#[derive(Debug, Clone)]
struct PitchedFrame {
    peaks: Vec<FrequencyPeak>,
    f0: F0Estimate,
    degraded: bool,
}

/// Per-frame trajectories of a harmonic-plus-stochastic run
#[derive(Debug, Clone, Default)]
pub struct HpsFrames {
    /// Tracked harmonics per frame
    pub harmonics: Vec<HarmonicFrame>,
    /// f0 per frame in Hz
    pub f0: Vec<f32>,
    /// Stochastic envelope per frame in dB
    pub stochastic: Vec<Vec<f32>>,
    /// Number of frames replaced after a failure
    pub degraded: usize,
}

/// Frame-level harmonic-plus-stochastic analyzer
pub struct HpsAnalyzer {
    peaks: PeakAnalyzer,
    twm: TwmParams,
    tracker: HarmonicTracker,
    residual: ResidualAnalyzer,
    generator: Box<dyn SineSpectrumGenerator>,
    stochastic_bins: usize,
    sample_rate: u32,
}

impl std::fmt::Debug for HpsAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HpsAnalyzer")
            .field("peaks", &self.peaks)
            .field("twm", &self.twm)
            .field("tracker", &self.tracker)
            .field("stochastic_bins", &self.stochastic_bins)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

impl HpsAnalyzer {
    /// Build the analyzer for a window, sample rate and configuration
    ///
    /// The configuration is expected to be validated already.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` if the window does not fit the FFT size.
    pub fn new(
        window: &[f32],
        sample_rate: u32,
        config: &AnalysisConfig,
    ) -> Result<Self, AnalysisError> {
        Ok(Self {
            peaks: PeakAnalyzer::new(window, config.fft_size, config.threshold_db, sample_rate)?,
            twm: TwmParams {
                min_f0: config.min_f0,
                max_f0: config.max_f0,
                error_threshold: config.f0_error_threshold,
                max_peaks: config.max_twm_peaks,
            },
            tracker: HarmonicTracker::new(
                config.max_harmonics,
                sample_rate,
                config.harmonic_deviation_slope,
            ),
            residual: ResidualAnalyzer::new(&blackman_harris(SYNTHESIS_FFT_SIZE), sample_rate)?,
            generator: Box::new(BlackmanHarrisLobe),
            stochastic_bins: config.stochastic_bins(),
            sample_rate,
        })
    }

    /// Replace the sine spectrum generator used for the harmonic subtraction
    pub fn with_generator(mut self, generator: Box<dyn SineSpectrumGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Analysis window length `M`
    pub fn window_len(&self) -> usize {
        self.peaks.window_len()
    }

    /// Analyze every frame of `samples` scheduled by `scheduler`
    pub fn run(&self, samples: &[f32], scheduler: &FrameScheduler, parallel: bool) -> HpsFrames {
        let positions: Vec<FramePosition> = scheduler.positions().collect();
        log::debug!(
            "HPS analysis: {} frames, nH = {}, {} stochastic bins, {}",
            positions.len(),
            self.tracker.max_harmonics(),
            self.stochastic_bins,
            if parallel { "parallel" } else { "sequential" }
        );

        if parallel {
            self.run_parallel(samples, &positions)
        } else {
            self.run_sequential(samples, &positions)
        }
    }

    fn run_sequential(&self, samples: &[f32], positions: &[FramePosition]) -> HpsFrames {
        let mut frames = HpsFrames::default();
        let mut state = TrackingState::new();

        for position in positions {
            let pitched = self.pitch_frame(samples, position);
            let harmonics = self.tracker.track(&pitched.peaks, pitched.f0.f0, &mut state);
            let (envelope, residual_failed) = self.stochastic_frame(samples, position, &harmonics);

            if pitched.degraded || residual_failed {
                frames.degraded += 1;
            }
            frames.f0.push(pitched.f0.f0);
            frames.harmonics.push(harmonics);
            frames.stochastic.push(envelope);
        }

        frames
    }

    fn run_parallel(&self, samples: &[f32], positions: &[FramePosition]) -> HpsFrames {
        // Pass 1: stateless spectral front end
        let pitched: Vec<PitchedFrame> = positions
            .par_iter()
            .map(|position| self.pitch_frame(samples, position))
            .collect();

        // Pass 2: tracking carries state from frame to frame
        let mut state = TrackingState::new();
        let harmonics: Vec<HarmonicFrame> = pitched
            .iter()
            .map(|p| self.tracker.track(&p.peaks, p.f0.f0, &mut state))
            .collect();

        // Pass 3: residual envelopes given the tracked harmonics
        let stochastic: Vec<(Vec<f32>, bool)> = positions
            .par_iter()
            .zip(harmonics.par_iter())
            .map(|(position, frame)| self.stochastic_frame(samples, position, frame))
            .collect();

        let degraded = pitched
            .iter()
            .zip(stochastic.iter())
            .filter(|(p, (_, failed))| p.degraded || *failed)
            .count();

        HpsFrames {
            f0: pitched.iter().map(|p| p.f0.f0).collect(),
            harmonics,
            stochastic: stochastic.into_iter().map(|(envelope, _)| envelope).collect(),
            degraded,
        }
    }

    fn pitch_frame(&self, samples: &[f32], position: &FramePosition) -> PitchedFrame {
        match self.peaks.peaks_at(samples, position) {
            Ok(peaks) => {
                let f0 = estimate_f0_twm(&peaks, self.sample_rate, &self.twm);
                PitchedFrame {
                    peaks,
                    f0,
                    degraded: false,
                }
            }
            Err(e) => {
                log::warn!(
                    "Frame {}: spectral analysis failed, treating as unpitched: {}",
                    position.index,
                    e
                );
                PitchedFrame {
                    peaks: vec![],
                    f0: F0Estimate::unvoiced(),
                    degraded: true,
                }
            }
        }
    }

    /// Stochastic envelope of one frame, and whether it had to be replaced
    fn stochastic_frame(
        &self,
        samples: &[f32],
        position: &FramePosition,
        harmonics: &HarmonicFrame,
    ) -> (Vec<f32>, bool) {
        let frame = padded_slice(samples, position.synthesis_start, self.residual.size());
        match self.residual.residual(&frame, harmonics, self.generator.as_ref()) {
            Ok(residual) => (stochastic_envelope(&residual, self.stochastic_bins), false),
            Err(e) => {
                log::warn!(
                    "Frame {}: residual analysis failed, using floor envelope: {}",
                    position.index,
                    e
                );
                (vec![MAG_FLOOR_DB; self.stochastic_bins], true)
            }
        }
    }
}
