//! Spectral peak detection
//!
//! A bin `k` is a peak when its magnitude is strictly above both neighbors and strictly
//! above the threshold. The first and last bins are never peaks, so every detected peak has
//! a valid 3-bin neighborhood for interpolation.
//!
//! # Example
//!
//! ```
//! use sms_dsp::features::peaks::detect_peaks;
//!
//! let mag_db = vec![-90.0, -60.0, -20.0, -50.0, -80.0, -30.0, -70.0];
//! let peaks = detect_peaks(&mag_db, -40.0);
//! assert_eq!(peaks, vec![2, 5]);
//! ```

/// Find bins that are local maxima above `threshold_db`
///
/// # Arguments
///
/// * `mag_db` - Magnitude spectrum in dB (positive bins)
/// * `threshold_db` - Minimum peak level in dB (typically negative)
///
/// # Returns
///
/// Peak bin indices in ascending order (possibly empty)
pub fn detect_peaks(mag_db: &[f32], threshold_db: f32) -> Vec<usize> {
    if mag_db.len() < 3 {
        return vec![];
    }

    let peaks: Vec<usize> = (1..mag_db.len() - 1)
        .filter(|&k| {
            let value = mag_db[k];
            value > threshold_db && value > mag_db[k - 1] && value > mag_db[k + 1]
        })
        .collect();

    log::debug!(
        "Detected {} peaks in {} bins (threshold {:.1} dB)",
        peaks.len(),
        mag_db.len(),
        threshold_db
    );

    peaks
}
