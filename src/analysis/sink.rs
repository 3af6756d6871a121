//! Trajectory sinks for telemetry and plotting
//!
//! A sink receives the harmonic-plus-stochastic trajectories once analysis is complete,
//! together with the time and frequency axes needed to render them.

use super::result::HpsAnalysis;
use crate::features::harmonics::HarmonicFrame;

/// Time and frequency axes of an [`HpsAnalysis`]
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryAxes {
    /// Frame times in seconds
    pub frame_times: Vec<f32>,

    /// Stochastic envelope bin frequencies in Hz
    pub stochastic_frequencies: Vec<f32>,

    /// Hop size `H`
    pub hop_size: usize,

    /// Synthesis FFT size `Ns`
    pub synthesis_fft_size: usize,

    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl TrajectoryAxes {
    /// Axes of a finished analysis
    pub fn from_analysis(analysis: &HpsAnalysis) -> Self {
        Self {
            frame_times: analysis.frame_times(),
            stochastic_frequencies: analysis.stochastic_bin_frequencies(),
            hop_size: analysis.hop_size,
            synthesis_fft_size: analysis.synthesis_fft_size,
            sample_rate: analysis.metadata.sample_rate,
        }
    }
}

/// Consumer of harmonic trajectories
pub trait TrajectorySink {
    /// Called once per frame, in frame order, after tracking
    fn frame(&mut self, _index: usize, _harmonics: &HarmonicFrame, _f0: f32) {}

    /// Called once with the complete analysis
    fn finish(&mut self, analysis: &HpsAnalysis, axes: &TrajectoryAxes);
}

/// Deliver a finished analysis to `sink`: every frame in order, then the whole result
pub fn deliver(analysis: &HpsAnalysis, sink: &mut dyn TrajectorySink) {
    for (index, (frame, &f0)) in analysis.harmonics.iter().zip(analysis.f0.iter()).enumerate() {
        sink.frame(index, frame, f0);
    }
    let axes = TrajectoryAxes::from_analysis(analysis);
    log::debug!(
        "Delivering {} frames to trajectory sink ({} stochastic bins)",
        analysis.num_frames(),
        axes.stochastic_frequencies.len()
    );
    sink.finish(analysis, &axes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::metadata::AnalysisMetadata;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<(usize, f32)>,
        finished: Option<TrajectoryAxes>,
    }

    impl TrajectorySink for Recorder {
        fn frame(&mut self, index: usize, _harmonics: &HarmonicFrame, f0: f32) {
            self.frames.push((index, f0));
        }

        fn finish(&mut self, _analysis: &HpsAnalysis, axes: &TrajectoryAxes) {
            self.finished = Some(axes.clone());
        }
    }

    #[test]
    fn test_deliver_in_frame_order() {
        let analysis = HpsAnalysis {
            harmonics: vec![HarmonicFrame::silent(3); 3],
            f0: vec![0.0, 220.0, 0.0],
            stochastic_envelope: vec![vec![-200.0; 2]; 3],
            synthesis_fft_size: 512,
            hop_size: 128,
            metadata: AnalysisMetadata {
                sample_rate: 48000,
                ..AnalysisMetadata::default()
            },
        };
        let mut recorder = Recorder::default();
        deliver(&analysis, &mut recorder);

        assert_eq!(recorder.frames, vec![(0, 0.0), (1, 220.0), (2, 0.0)]);
        let axes = recorder.finished.unwrap();
        assert_eq!(axes.frame_times.len(), 3);
        assert_eq!(axes.stochastic_frequencies, vec![0.0, 12000.0]);
        assert_eq!(axes.sample_rate, 48000);
    }
}
