//! Integration tests for the spectral modeling engine

use std::f32::consts::PI;
use std::path::Path;

use rustfft::num_complex::Complex;

use sms_dsp::analysis::{HpsAnalyzer, SprAnalyzer};
use sms_dsp::features::synthesis::{SineSpectrumGenerator, Sinusoid};
use sms_dsp::preprocessing::FrameScheduler;
use sms_dsp::{
    analyze_hps, analyze_hps_with_sink, analyze_spr, AnalysisConfig, AnalysisError, HarmonicFrame,
    HpsAnalysis, TrajectoryAxes, TrajectorySink, HOP_SIZE, SYNTHESIS_FFT_SIZE,
};

const SAMPLE_RATE: u32 = 44100;

/// Symmetric Blackman window
fn blackman(len: usize) -> Vec<f32> {
    let denom = (len - 1) as f32;
    (0..len)
        .map(|i| {
            let x = 2.0 * PI * i as f32 / denom;
            0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
        })
        .collect()
}

/// Symmetric Hamming window
fn hamming(len: usize) -> Vec<f32> {
    let denom = (len - 1) as f32;
    (0..len)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f32 / denom).cos())
        .collect()
}

fn sine(freq: f32, amplitude: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| amplitude * (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
        .collect()
}

/// Linear sweep from `f_start` to `f_end` Hz over `len` samples
fn sweep(f_start: f32, f_end: f32, amplitude: f32, len: usize) -> Vec<f32> {
    let duration = len as f64 / SAMPLE_RATE as f64;
    let rate = (f_end - f_start) as f64 / duration;
    (0..len)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE as f64;
            let phase = 2.0 * std::f64::consts::PI * (f_start as f64 * t + 0.5 * rate * t * t);
            amplitude * phase.sin() as f32
        })
        .collect()
}

fn expected_frames(len: usize, window_len: usize) -> usize {
    let margin = (SYNTHESIS_FFT_SIZE / 2).max((window_len + 1) / 2);
    if len < 2 * margin {
        0
    } else {
        (len - 2 * margin) / HOP_SIZE + 1
    }
}

fn tone_config() -> AnalysisConfig {
    AnalysisConfig {
        fft_size: 1024,
        threshold_db: -60.0,
        min_f0: 400.0,
        max_f0: 500.0,
        ..AnalysisConfig::default()
    }
}

/// Load a WAV file and return (samples, sample_rate)
fn load_wav(path: &Path) -> Result<(Vec<f32>, u32), Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok((samples, spec.sample_rate))
}

/// Write a 16-bit mono WAV file
fn write_wav(
    path: &Path,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample((s * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Generator that renders nothing, leaving the whole signal to the residual
struct SilentGenerator;

impl SineSpectrumGenerator for SilentGenerator {
    fn generate(&self, _sines: &[Sinusoid], size: usize) -> Vec<Complex<f32>> {
        vec![Complex::new(0.0, 0.0); size]
    }
}

#[derive(Default)]
struct RecordingSink {
    frames: usize,
    voiced: usize,
    axes: Option<TrajectoryAxes>,
}

impl TrajectorySink for RecordingSink {
    fn frame(&mut self, _index: usize, _harmonics: &HarmonicFrame, f0: f32) {
        self.frames += 1;
        if f0 > 0.0 {
            self.voiced += 1;
        }
    }

    fn finish(&mut self, _analysis: &HpsAnalysis, axes: &TrajectoryAxes) {
        self.axes = Some(axes.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_formula() {
        for &window_len in &[255usize, 801] {
            let window = blackman(window_len);
            for &len in &[0usize, 100, 801, 802, 1000, 4096, 10000] {
                let samples = sine(440.0, 0.5, len);
                let analysis = analyze_hps(&samples, SAMPLE_RATE, &window, tone_config())
                    .expect("Analysis should succeed");
                let expected = expected_frames(len, window_len);
                assert_eq!(analysis.num_frames(), expected, "M = {}, L = {}", window_len, len);
                assert_eq!(analysis.f0.len(), expected);
                assert_eq!(analysis.stochastic_envelope.len(), expected);
                assert_eq!(analysis.metadata.num_frames, expected);

                let scheduler = FrameScheduler::new(len, window_len, SYNTHESIS_FFT_SIZE, HOP_SIZE);
                assert_eq!(scheduler.num_frames(), expected);
            }
        }
    }

    #[test]
    fn test_boundary_lengths() {
        // 2 * max(Ns / 2, hM1) with M = 801 is 802
        let window = blackman(801);
        let exact =
            analyze_hps(&sine(440.0, 0.5, 802), SAMPLE_RATE, &window, tone_config()).unwrap();
        assert_eq!(exact.num_frames(), 1);
        let short =
            analyze_hps(&sine(440.0, 0.5, 801), SAMPLE_RATE, &window, tone_config()).unwrap();
        assert_eq!(short.num_frames(), 0);
        assert!(short.harmonic_frequencies().is_empty());

        // With a short window the synthesis frame dominates: 2 * 256
        let window = blackman(255);
        let exact =
            analyze_hps(&sine(440.0, 0.5, 512), SAMPLE_RATE, &window, tone_config()).unwrap();
        assert_eq!(exact.num_frames(), 1);
        let short =
            analyze_hps(&sine(440.0, 0.5, 511), SAMPLE_RATE, &window, tone_config()).unwrap();
        assert_eq!(short.num_frames(), 0);
    }

    #[test]
    fn test_short_signal_spr_is_silent() {
        let window = blackman(801);
        let samples = sine(440.0, 0.5, 700);
        let out = analyze_spr(&samples, SAMPLE_RATE, &window, AnalysisConfig::default()).unwrap();
        assert_eq!(out.metadata.num_frames, 0);
        assert_eq!(out.y.len(), 700);
        assert!(out.y.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_fixed_width_harmonics() {
        let window = blackman(801);
        let mut samples = sine(440.0, 0.5, 22050);
        samples.extend(vec![0.0; 8000]);
        let config = AnalysisConfig {
            max_harmonics: 60,
            ..tone_config()
        };
        let analysis = analyze_hps(&samples, SAMPLE_RATE, &window, config).unwrap();

        assert!(analysis.num_frames() > 0);
        for row in analysis.harmonic_frequencies() {
            assert_eq!(row.len(), 60);
        }
        for row in analysis.harmonic_magnitudes() {
            assert_eq!(row.len(), 60);
        }
        for row in &analysis.stochastic_envelope {
            assert_eq!(row.len(), 51);
        }
    }

    #[test]
    fn test_silence_in_silence_out() {
        let window = blackman(801);
        let samples = vec![0.0f32; 8192];

        let analysis = analyze_hps(&samples, SAMPLE_RATE, &window, tone_config()).unwrap();
        assert!(analysis.num_frames() > 0);
        assert!(analysis.f0.iter().all(|&f0| f0 == 0.0));
        for row in analysis.harmonic_frequencies() {
            assert!(row.iter().all(|&f| f == 0.0));
        }
        for row in &analysis.stochastic_envelope {
            assert!(row.iter().all(|&v| (v + 200.0).abs() < 1e-2));
        }

        let out = analyze_spr(&samples, SAMPLE_RATE, &window, AnalysisConfig::default()).unwrap();
        assert_eq!(out.y.len(), samples.len());
        assert!(out.y.iter().all(|&v| v == 0.0));
        assert!(out.sinusoidal.iter().all(|&v| v == 0.0));
        assert!(out.residual.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_single_tone_recovery() {
        let window = blackman(801);
        let samples = sine(440.0, 0.5, SAMPLE_RATE as usize);
        let analysis = analyze_hps(&samples, SAMPLE_RATE, &window, tone_config()).unwrap();

        let expected_db = 20.0 * (0.5f32 / 2.0).log10();
        assert!(analysis.num_frames() > 300);
        for (k, frame) in analysis.harmonics.iter().enumerate() {
            let first = frame.get(0).expect("first harmonic present");
            assert!(
                (first.freq_hz - 440.0).abs() < 2.0,
                "frame {}: first harmonic at {:.2} Hz",
                k,
                first.freq_hz
            );
            assert!(
                (first.mag_db - expected_db).abs() < 1.0,
                "frame {}: first harmonic at {:.2} dB",
                k,
                first.mag_db
            );
            assert!((analysis.f0[k] - 440.0).abs() < 2.0);
        }
        for row in analysis.harmonic_frequencies() {
            assert!(row[1..].iter().all(|&f| f == 0.0));
        }
    }

    #[test]
    fn test_single_tone_with_default_settings() {
        let window = blackman(801);
        let samples = sine(440.0, 0.5, SAMPLE_RATE as usize);
        let config = AnalysisConfig {
            min_f0: 400.0,
            max_f0: 500.0,
            ..AnalysisConfig::default()
        };
        let analysis = analyze_hps(&samples, SAMPLE_RATE, &window, config).unwrap();

        assert_eq!(analysis.num_frames(), expected_frames(samples.len(), 801));
        for (k, frame) in analysis.harmonics.iter().enumerate() {
            let first = frame.get(0).expect("first harmonic present");
            assert!(
                (first.freq_hz - 440.0).abs() < 2.0,
                "frame {}: first harmonic at {:.2} Hz",
                k,
                first.freq_hz
            );
            assert!((analysis.f0[k] - 440.0).abs() < 2.0, "frame {}: f0 {:.2}", k, analysis.f0[k]);
        }
        for row in analysis.harmonic_frequencies() {
            assert!(row[1..].iter().all(|&f| f == 0.0));
        }
    }

    #[test]
    fn test_harmonic_series_tracked() {
        let window = blackman(1001);
        let len = 16384;
        let samples: Vec<f32> = sine(220.0, 0.4, len)
            .iter()
            .zip(sine(440.0, 0.2, len).iter())
            .zip(sine(660.0, 0.1, len).iter())
            .map(|((a, b), c)| a + b + c)
            .collect();
        let config = AnalysisConfig {
            fft_size: 2048,
            threshold_db: -60.0,
            max_harmonics: 10,
            min_f0: 150.0,
            max_f0: 300.0,
            ..AnalysisConfig::default()
        };
        let analysis = analyze_hps(&samples, SAMPLE_RATE, &window, config).unwrap();

        for frame in &analysis.harmonics {
            assert_eq!(frame.present(), 3);
            for (slot, expected) in [220.0f32, 440.0, 660.0].iter().enumerate() {
                let partial = frame.get(slot).expect("harmonic present");
                assert!((partial.freq_hz - expected).abs() < 2.0);
            }
        }
    }

    #[test]
    fn test_reconstruction_and_idempotence() {
        let window = hamming(801);
        let len = 16384;
        let x: Vec<f32> = sine(440.0, 0.3, len)
            .iter()
            .zip(sine(1250.0, 0.2, len).iter())
            .map(|(a, b)| a + b)
            .collect();

        let first = analyze_spr(&x, SAMPLE_RATE, &window, AnalysisConfig::default()).unwrap();
        let second =
            analyze_spr(&first.y, SAMPLE_RATE, &window, AnalysisConfig::default()).unwrap();

        assert_eq!(first.y.len(), len);
        for i in 2048..len - 2048 {
            assert!((first.y[i] - x[i]).abs() < 1e-3, "sample {}: {} vs {}", i, first.y[i], x[i]);
            assert!(
                (second.y[i] - first.y[i]).abs() < 1e-3,
                "sample {}: {} vs {}",
                i,
                second.y[i],
                first.y[i]
            );
            let sum = first.sinusoidal[i] + first.residual[i];
            assert!((sum - first.y[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sweep_continuity() {
        let window = blackman(801);
        let len = SAMPLE_RATE as usize;
        let (f_start, f_end) = (300.0f32, 600.0f32);
        let samples = sweep(f_start, f_end, 0.5, len);
        let config = AnalysisConfig {
            fft_size: 2048,
            threshold_db: -60.0,
            max_harmonics: 5,
            min_f0: 200.0,
            max_f0: 800.0,
            ..AnalysisConfig::default()
        };
        let analysis = analyze_hps(&samples, SAMPLE_RATE, &window, config).unwrap();

        let sweep_rate = (f_end - f_start) / (len as f32 / SAMPLE_RATE as f32);
        let per_hop = sweep_rate * HOP_SIZE as f32 / SAMPLE_RATE as f32;
        let tolerance = 2.0;

        let first: Vec<f32> = analysis.harmonic_frequencies().iter().map(|row| row[0]).collect();
        assert!(first.iter().all(|&f| f > 0.0), "every frame should be voiced");
        for pair in first.windows(2) {
            assert!(
                (pair[1] - pair[0]).abs() <= per_hop + tolerance,
                "jump from {:.2} to {:.2} Hz",
                pair[0],
                pair[1]
            );
        }
        assert!(first[0] < first[first.len() - 1]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let window = blackman(801);
        let samples: Vec<f32> = sweep(200.0, 500.0, 0.4, 30000)
            .iter()
            .zip(sine(3000.0, 0.05, 30000).iter())
            .map(|(a, b)| a + b)
            .collect();
        let sequential_config = AnalysisConfig {
            min_f0: 150.0,
            max_f0: 600.0,
            threshold_db: -70.0,
            ..AnalysisConfig::default()
        };
        let parallel_config = AnalysisConfig {
            parallel: true,
            ..sequential_config.clone()
        };

        let sequential =
            analyze_hps(&samples, SAMPLE_RATE, &window, sequential_config.clone()).unwrap();
        let parallel =
            analyze_hps(&samples, SAMPLE_RATE, &window, parallel_config.clone()).unwrap();
        assert_eq!(sequential.harmonics, parallel.harmonics);
        assert_eq!(sequential.f0, parallel.f0);
        assert_eq!(sequential.stochastic_envelope, parallel.stochastic_envelope);
        assert!(parallel.metadata.parallel);

        let sequential = analyze_spr(&samples, SAMPLE_RATE, &window, sequential_config).unwrap();
        let parallel = analyze_spr(&samples, SAMPLE_RATE, &window, parallel_config).unwrap();
        assert_eq!(sequential.y, parallel.y);
    }

    #[test]
    fn test_configuration_errors() {
        let window = blackman(801);
        let samples = sine(440.0, 0.5, 4096);

        let small_fft = AnalysisConfig {
            fft_size: 256,
            ..AnalysisConfig::default()
        };
        let err =
            analyze_hps(&samples, SAMPLE_RATE, &blackman(201), small_fft.clone()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
        assert!(analyze_spr(&samples, SAMPLE_RATE, &blackman(201), small_fft).is_err());

        let err = analyze_hps(&samples, SAMPLE_RATE, &blackman(1025), AnalysisConfig::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));

        let bad_stocf = AnalysisConfig {
            stochastic_factor: 0.0,
            ..AnalysisConfig::default()
        };
        let err = analyze_hps(&samples, SAMPLE_RATE, &window, bad_stocf.clone()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
        // The residual model has no stochastic stage
        assert!(analyze_spr(&samples, SAMPLE_RATE, &window, bad_stocf).is_ok());

        let bad_range = AnalysisConfig {
            min_f0: 600.0,
            max_f0: 500.0,
            ..AnalysisConfig::default()
        };
        assert!(analyze_hps(&samples, SAMPLE_RATE, &window, bad_range).is_err());

        let mut noisy = samples.clone();
        noisy[100] = f32::NAN;
        let err = analyze_hps(&noisy, SAMPLE_RATE, &window, AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
        assert!(err.to_string().contains("index 100"));
    }

    #[test]
    fn test_sink_receives_trajectories() {
        let window = blackman(801);
        let samples = sine(440.0, 0.5, 8192);
        let mut sink = RecordingSink::default();
        let analysis =
            analyze_hps_with_sink(&samples, SAMPLE_RATE, &window, tone_config(), &mut sink)
                .unwrap();

        assert_eq!(sink.frames, analysis.num_frames());
        assert_eq!(sink.voiced, analysis.num_frames());
        let axes = sink.axes.expect("sink finished");
        assert_eq!(axes.frame_times.len(), analysis.num_frames());
        assert_eq!(axes.hop_size, HOP_SIZE);
        assert_eq!(axes.synthesis_fft_size, SYNTHESIS_FFT_SIZE);
        assert_eq!(axes.stochastic_frequencies.len(), 51);
    }

    #[test]
    fn test_stochastic_envelope_of_noise() {
        // Deterministic pseudo-random noise
        let mut state = 12345u32;
        let samples: Vec<f32> = (0..20000)
            .map(|_| {
                state = state.wrapping_mul(1103515245).wrapping_add(12345);
                ((state >> 16) & 0x7fff) as f32 / 32768.0 - 0.5
            })
            .collect();
        let window = hamming(801);
        let analysis =
            analyze_hps(&samples, SAMPLE_RATE, &window, AnalysisConfig::default()).unwrap();

        for row in &analysis.stochastic_envelope {
            assert_eq!(row.len(), 51);
            assert!(row.iter().all(|v| v.is_finite() && *v >= -200.0 - 1e-3));
            let mean = row.iter().sum::<f32>() / row.len() as f32;
            assert!(mean > -120.0, "noise envelope too low: {:.1} dB", mean);
        }
    }

    #[test]
    fn test_custom_generator_moves_everything_to_residual() {
        let window = hamming(801);
        let samples = sine(440.0, 0.5, 8192);
        let analyzer = SprAnalyzer::new(&window, SAMPLE_RATE, &AnalysisConfig::default())
            .unwrap()
            .with_generator(Box::new(SilentGenerator));
        let scheduler = FrameScheduler::new(
            samples.len(),
            analyzer.window_len(),
            SYNTHESIS_FFT_SIZE,
            HOP_SIZE,
        );
        let signals = analyzer.run(&samples, &scheduler, false);

        assert!(signals.sinusoidal.iter().all(|&v| v == 0.0));
        for i in 1024..7168 {
            assert!((signals.residual[i] - samples[i]).abs() < 1e-4);
        }
    }

    #[test]
    fn test_hps_custom_generator_only_changes_residual() {
        let window = blackman(801);
        let samples = sine(440.0, 0.5, 16384);
        let config = AnalysisConfig {
            min_f0: 400.0,
            max_f0: 500.0,
            ..AnalysisConfig::default()
        };
        let scheduler =
            FrameScheduler::new(samples.len(), window.len(), SYNTHESIS_FFT_SIZE, HOP_SIZE);

        let lobes = HpsAnalyzer::new(&window, SAMPLE_RATE, &config)
            .unwrap()
            .run(&samples, &scheduler, false);
        let silent = HpsAnalyzer::new(&window, SAMPLE_RATE, &config)
            .unwrap()
            .with_generator(Box::new(SilentGenerator))
            .run(&samples, &scheduler, false);

        // Pitch and tracking do not depend on the generator
        assert_eq!(silent.f0, lobes.f0);
        assert_eq!(silent.harmonics, lobes.harmonics);
        assert!(silent.f0.iter().all(|&f0| f0 > 0.0));

        // A range that excludes the tone leaves nothing to subtract
        let unpitched_config = AnalysisConfig {
            min_f0: 1000.0,
            max_f0: 1100.0,
            ..config
        };
        let unpitched = HpsAnalyzer::new(&window, SAMPLE_RATE, &unpitched_config)
            .unwrap()
            .run(&samples, &scheduler, false);
        assert!(unpitched.f0.iter().all(|&f0| f0 == 0.0));
        assert_eq!(silent.stochastic, unpitched.stochastic);
        assert_ne!(silent.stochastic, lobes.stochastic);
    }

    #[test]
    fn test_stochastic_axis_spans_nyquist() {
        let window = hamming(801);
        let samples = sine(440.0, 0.5, 8192);
        let analysis =
            analyze_hps(&samples, SAMPLE_RATE, &window, AnalysisConfig::default()).unwrap();

        // Default stocf 0.2 gives floor(0.2 * 256) = 51 bins over 0..fs/2
        let freqs = analysis.stochastic_bin_frequencies();
        assert_eq!(freqs.len(), 51);
        assert_eq!(freqs[0], 0.0);
        assert!((freqs[1] - 22050.0 / 51.0).abs() < 1e-3);
        assert!((freqs[50] - 50.0 * 22050.0 / 51.0).abs() < 1e-2);
    }

    #[test]
    fn test_wav_file_analysis() {
        let path = std::env::temp_dir().join(format!("sms_dsp_tone_{}.wav", std::process::id()));
        write_wav(&path, &sine(330.0, 0.5, 22050), SAMPLE_RATE).expect("Failed to write WAV");
        let (samples, sample_rate) = load_wav(&path).expect("Failed to load WAV");
        let _ = std::fs::remove_file(&path);

        assert_eq!(sample_rate, SAMPLE_RATE);
        assert_eq!(samples.len(), 22050);

        let config = AnalysisConfig {
            threshold_db: -60.0,
            min_f0: 250.0,
            max_f0: 400.0,
            ..AnalysisConfig::default()
        };
        let analysis = analyze_hps(&samples, sample_rate, &blackman(801), config).unwrap();
        let duration = analysis.metadata.duration_seconds;
        assert!(duration > 0.49 && duration < 0.51);
        assert_eq!(analysis.metadata.sample_rate, sample_rate);
        for &f0 in &analysis.f0 {
            assert!((f0 - 330.0).abs() < 2.0, "f0 {:.2}", f0);
        }
    }
}
