//! Sinusoidal-plus-residual analysis and synthesis driver
//!
//! Per frame: every interpolated peak becomes a sinusoid, rendered at synthesis size.
//! The residual is the synthesis-centered frame's spectrum minus that sine spectrum.
//! Both spectra are inverted, windowed with the overlap window and added into the
//! sinusoidal and residual output buffers. Frames are independent, so the parallel path
//! computes them on the rayon pool and only the accumulation is sequential.

use rayon::prelude::*;

use super::frame::PeakAnalyzer;
use crate::config::{AnalysisConfig, HOP_SIZE, SYNTHESIS_FFT_SIZE};
use crate::error::AnalysisError;
use crate::features::residual::{residual_spectrum, ResidualAnalyzer};
use crate::features::synthesis::{BlackmanHarrisLobe, OverlapAdd, SineSpectrumGenerator, Sinusoid};
use crate::preprocessing::frames::{padded_slice, FramePosition, FrameScheduler};

/// Synthesized frames of one analysis position
#[derive(Debug, Clone)]
struct SynthesizedFrame {
    start: isize,
    sinusoidal: Vec<f32>,
    residual: Vec<f32>,
}

/// Output buffers of a sinusoidal-plus-residual run
#[derive(Debug, Clone, Default)]
pub struct SprSignals {
    /// Sinusoidal component
    pub sinusoidal: Vec<f32>,
    /// Residual component
    pub residual: Vec<f32>,
    /// Number of frames replaced by silence after a failure
    pub degraded: usize,
}

/// Frame-level sinusoidal-plus-residual analyzer/synthesizer
pub struct SprAnalyzer {
    peaks: PeakAnalyzer,
    residual: ResidualAnalyzer,
    overlap_add: OverlapAdd,
    generator: Box<dyn SineSpectrumGenerator>,
    sample_rate: u32,
}

impl std::fmt::Debug for SprAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SprAnalyzer")
            .field("peaks", &self.peaks)
            .field("overlap_add", &self.overlap_add)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

impl SprAnalyzer {
    /// Build the analyzer for a window, sample rate and configuration
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` if the window does not fit the FFT size.
    pub fn new(
        window: &[f32],
        sample_rate: u32,
        config: &AnalysisConfig,
    ) -> Result<Self, AnalysisError> {
        let overlap_add = OverlapAdd::new(SYNTHESIS_FFT_SIZE, HOP_SIZE)?;
        Ok(Self {
            peaks: PeakAnalyzer::new(window, config.fft_size, config.threshold_db, sample_rate)?,
            residual: ResidualAnalyzer::new(overlap_add.synthesis_window(), sample_rate)?,
            overlap_add,
            generator: Box::new(BlackmanHarrisLobe),
            sample_rate,
        })
    }

    /// Replace the sine spectrum generator
    pub fn with_generator(mut self, generator: Box<dyn SineSpectrumGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Analysis window length `M`
    pub fn window_len(&self) -> usize {
        self.peaks.window_len()
    }

    /// Analyze and resynthesize every frame of `samples` scheduled by `scheduler`
    pub fn run(&self, samples: &[f32], scheduler: &FrameScheduler, parallel: bool) -> SprSignals {
        let positions: Vec<FramePosition> = scheduler.positions().collect();
        log::debug!(
            "SPR analysis: {} frames, {}",
            positions.len(),
            if parallel { "parallel" } else { "sequential" }
        );

        let mut signals = SprSignals {
            sinusoidal: vec![0.0; samples.len()],
            residual: vec![0.0; samples.len()],
            degraded: 0,
        };

        let mut add = |result: Result<SynthesizedFrame, AnalysisError>, index: usize| match result {
            Ok(frame) => {
                OverlapAdd::accumulate(&mut signals.sinusoidal, &frame.sinusoidal, frame.start);
                OverlapAdd::accumulate(&mut signals.residual, &frame.residual, frame.start);
            }
            Err(e) => {
                log::warn!("Frame {}: synthesis failed, leaving it silent: {}", index, e);
                signals.degraded += 1;
            }
        };

        if parallel {
            let frames: Vec<Result<SynthesizedFrame, AnalysisError>> = positions
                .par_iter()
                .map(|position| self.synthesize(samples, position))
                .collect();
            for (position, frame) in positions.iter().zip(frames) {
                add(frame, position.index);
            }
        } else {
            for position in &positions {
                add(self.synthesize(samples, position), position.index);
            }
        }

        signals
    }

    fn synthesize(
        &self,
        samples: &[f32],
        position: &FramePosition,
    ) -> Result<SynthesizedFrame, AnalysisError> {
        let size = self.overlap_add.size();
        let peaks = self.peaks.peaks_at(samples, position)?;
        let sines: Vec<Sinusoid> = peaks
            .iter()
            .map(|p| Sinusoid::from_hz(p.freq_hz, p.mag_db, p.phase, size, self.sample_rate))
            .collect();
        let sine_spectrum = self.generator.generate(&sines, size);

        let frame = padded_slice(samples, position.synthesis_start, size);
        let spectrum = self.residual.frame_spectrum(&frame)?;
        let residual = residual_spectrum(&spectrum, &sine_spectrum)?;

        Ok(SynthesizedFrame {
            start: position.synthesis_start,
            sinusoidal: self.overlap_add.synthesize_frame(&sine_spectrum)?,
            residual: self.overlap_add.synthesize_frame(&residual)?,
        })
    }
}
