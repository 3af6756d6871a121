//! Example: Analyze a WAV file with both spectral models
//!
//! Usage: `cargo run --example analyze_file -- <input.wav> [output.wav]`
//!
//! Prints a JSON summary of the harmonic-plus-stochastic analysis and, if an output
//! path is given, writes the sinusoidal-plus-residual resynthesis there.

use serde::Serialize;
use sms_dsp::{analyze_hps, analyze_spr, AnalysisConfig, AnalysisMetadata};

#[derive(Serialize)]
struct Summary {
    frames: usize,
    voiced_frames: usize,
    mean_f0_hz: f32,
    mean_harmonics_per_frame: f32,
    hps: AnalysisMetadata,
    spr: AnalysisMetadata,
    reconstruction_snr_db: f32,
}

/// Load a WAV file as mono f32 and return (samples, sample_rate)
fn load_wav(path: &str) -> Result<(Vec<f32>, u32), Box<dyn std::error::Error>> {
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

    let channels = spec.channels.max(1) as usize;
    let mono = samples
        .chunks(channels)
        .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
        .collect();

    Ok((mono, spec.sample_rate))
}

/// Symmetric Blackman window
fn blackman(len: usize) -> Vec<f32> {
    let denom = (len - 1) as f32;
    (0..len)
        .map(|i| {
            let x = 2.0 * std::f32::consts::PI * i as f32 / denom;
            0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let input = args
        .get(1)
        .ok_or("usage: analyze_file <input.wav> [output.wav]")?;
    let (samples, sample_rate) = load_wav(input)?;

    let window = blackman(1201);
    let config = AnalysisConfig {
        fft_size: 2048,
        threshold_db: -90.0,
        max_harmonics: 100,
        min_f0: 100.0,
        max_f0: 300.0,
        f0_error_threshold: 7.0,
        stochastic_factor: 0.1,
        parallel: true,
        ..AnalysisConfig::default()
    };

    let hps = analyze_hps(&samples, sample_rate, &window, config.clone())?;
    let spr = analyze_spr(&samples, sample_rate, &window, config)?;

    let voiced: Vec<f32> = hps.f0.iter().copied().filter(|&f0| f0 > 0.0).collect();
    let harmonics: usize = hps.harmonics.iter().map(|h| h.present()).sum();

    let signal_energy: f32 = samples.iter().map(|x| x * x).sum();
    let error_energy: f32 = samples
        .iter()
        .zip(spr.y.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum();

    let summary = Summary {
        frames: hps.num_frames(),
        voiced_frames: voiced.len(),
        mean_f0_hz: if voiced.is_empty() {
            0.0
        } else {
            voiced.iter().sum::<f32>() / voiced.len() as f32
        },
        mean_harmonics_per_frame: harmonics as f32 / hps.num_frames().max(1) as f32,
        hps: hps.metadata.clone(),
        spr: spr.metadata.clone(),
        reconstruction_snr_db: 10.0 * (signal_energy / error_energy.max(1e-20)).log10(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(output) = args.get(2) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(output, spec)?;
        for &s in &spr.y {
            writer.write_sample(s)?;
        }
        writer.finalize()?;
        eprintln!("Wrote resynthesis to {}", output);
    }

    Ok(())
}
