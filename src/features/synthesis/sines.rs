//! Frequency-domain sinusoid synthesis
//!
//! Each sinusoid is rendered as the 9-bin main lobe of the Blackman-Harris window,
//! centered on its fractional bin, scaled by its linear magnitude and rotated by its
//! phase. Lobe bins that fall below DC or above Nyquist are folded back with conjugated
//! phase, and the negative-frequency half is the conjugate mirror of the positive half,
//! so the inverse FFT is real.
//!
//! The lobe is normalized to 1 at its center: after an inverse FFT a sinusoid with
//! magnitude `20 * log10(A / 2)` becomes `A * cos(...)` shaped by the unit-sum
//! Blackman-Harris window, matching the analysis of a frame windowed the same way.

use std::f64::consts::PI;

use rustfft::num_complex::Complex;

use crate::preprocessing::window::BH_COEFFS;

/// Half-width of the rendered main lobe in bins
const LOBE_HALF_WIDTH: isize = 4;

/// One sinusoid to render
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sinusoid {
    /// Fractional bin location in the synthesis spectrum
    pub bin: f32,
    /// Magnitude in dB
    pub mag_db: f32,
    /// Phase in radians at the frame center
    pub phase: f32,
}

impl Sinusoid {
    /// Sinusoid at `freq_hz` for a synthesis spectrum of `size` bins at `sample_rate`
    pub fn from_hz(freq_hz: f32, mag_db: f32, phase: f32, size: usize, sample_rate: u32) -> Self {
        Self {
            bin: size as f32 * freq_hz / sample_rate as f32,
            mag_db,
            phase,
        }
    }
}

/// Capability: build the complex spectrum of a bank of sinusoids
pub trait SineSpectrumGenerator: Send + Sync {
    /// Spectrum of `size` bins containing every sinusoid of `sines`
    ///
    /// Sinusoids at bin 0 (absent) or above `size / 2 - 1` contribute nothing.
    /// The result is additive and does not depend on the order of `sines`.
    fn generate(&self, sines: &[Sinusoid], size: usize) -> Vec<Complex<f32>>;
}

/// Blackman-Harris main-lobe generator
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackmanHarrisLobe;

impl SineSpectrumGenerator for BlackmanHarrisLobe {
    fn generate(&self, sines: &[Sinusoid], size: usize) -> Vec<Complex<f32>> {
        if size < 4 {
            return vec![Complex::new(0.0, 0.0); size];
        }
        let mut spectrum = vec![Complex::new(0.0f64, 0.0); size];
        let half = (size / 2) as isize;
        let max_bin = (half - 1) as f32;

        for sine in sines {
            if sine.bin.is_nan()
                || sine.bin <= 0.0
                || sine.bin > max_bin
                || !sine.mag_db.is_finite()
            {
                continue;
            }

            let amplitude = 10f64.powf(sine.mag_db as f64 / 20.0);
            let phase = sine.phase as f64;
            let positive = Complex::from_polar(1.0, phase);
            let negative = positive.conj();

            let center = sine.bin.round() as isize;
            let remainder = center as f64 - sine.bin as f64;

            for m in -LOBE_HALF_WIDTH..=LOBE_HALF_WIDTH {
                let weight = amplitude * blackman_harris_lobe(remainder + m as f64, size);
                let b = center + m;
                if b < 0 {
                    spectrum[(-b) as usize] += negative * weight;
                } else if b > half {
                    spectrum[(size as isize - b) as usize] += negative * weight;
                } else if b == 0 || b == half {
                    spectrum[b as usize] += (positive + negative) * weight;
                } else {
                    spectrum[b as usize] += positive * weight;
                }
            }
        }

        for k in 1..half as usize {
            spectrum[size - k] = spectrum[k].conj();
        }

        spectrum
            .into_iter()
            .map(|c| Complex::new(c.re as f32, c.im as f32))
            .collect()
    }
}

/// Blackman-Harris transform at `x` bins from the lobe center, normalized to 1 at `x = 0`
pub fn blackman_harris_lobe(x: f64, size: usize) -> f64 {
    let n = size as f64;
    let f = x * 2.0 * PI / n;
    let df = 2.0 * PI / n;

    let mut y = 0.0;
    for (m, &c) in BH_COEFFS.iter().enumerate() {
        let shift = df * m as f64;
        y += c / 2.0 * (dirichlet(f - shift, n) + dirichlet(f + shift, n));
    }
    y / n / BH_COEFFS[0]
}

/// Aliased sinc `sin(N x / 2) / sin(x / 2)`, equal to `N` at `x = 0`
fn dirichlet(x: f64, n: f64) -> f64 {
    let denom = (x / 2.0).sin();
    if denom.abs() < 1e-12 {
        n
    } else {
        (n * x / 2.0).sin() / denom
    }
}
