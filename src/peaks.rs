//! Spectrum peak picker. Internal: only `deconvolve.rs` calls
//! `pick_peaks` directly, since it is the one place
//! `InsufficientPeaks`/`EmptyInput` need to be visible as a typed
//! `Result` rather than flattened away. `locate_peaks` is the shared,
//! gate-free prologue (smooth, find maxima, reject noise, centroid) that
//! both `pick_peaks` and the singly-charged detector build on — the
//! detector has no `min_peaks` floor to enforce, matching the original's
//! own inline peak-picking prologue there.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{RawPeak, Spectrum};
use crate::signal::{find_simple_maxima, gaussian_smooth, median_diff, parabolic_centroid};

/// `max(2, round(pwhh / resolution))`, per the picker's minimum-distance
/// rule. Falls back to `2` when the spectrum has no usable resolution.
fn min_distance_points(pwhh: f64, resolution: f64) -> usize {
    if resolution > 0.0 {
        (2usize).max((pwhh / resolution).round() as usize)
    } else {
        2
    }
}

/// Smooth at `config.pwhh`, find simple maxima at the resolution-scaled
/// minimum distance, reject below `noise_cutoff`, centroid, and sort by
/// descending intensity. No `min_peaks` gate — callers decide whether a
/// short result is acceptable.
pub(crate) fn locate_peaks(spectrum: &Spectrum, config: &Config) -> Vec<RawPeak> {
    let smoothed = gaussian_smooth(&spectrum.mz, &spectrum.intensity, config.pwhh);

    let resolution = median_diff(&spectrum.mz);
    let min_distance = min_distance_points(config.pwhh, resolution);

    let mut peaks: Vec<RawPeak> = find_simple_maxima(&smoothed, min_distance)
        .into_iter()
        .filter(|&idx| smoothed[idx] >= config.noise_cutoff)
        .map(|idx| RawPeak {
            index: idx,
            mz: parabolic_centroid(&spectrum.mz, &smoothed, idx),
            intensity: smoothed[idx],
        })
        .collect();

    peaks.sort_by(|a, b| b.intensity.partial_cmp(&a.intensity).unwrap());
    peaks
}

/// `locate_peaks`, additionally enforcing `config.min_peaks` as
/// `InsufficientPeaks`. Used by the charge-ladder path, which needs at
/// least a handful of peaks before a ladder hypothesis is meaningful.
pub(crate) fn pick_peaks(spectrum: &Spectrum, config: &Config) -> Result<Vec<RawPeak>> {
    if spectrum.is_empty() {
        return Err(Error::EmptyInput);
    }

    let peaks = locate_peaks(spectrum, config);

    if peaks.len() < config.min_peaks {
        return Err(Error::InsufficientPeaks {
            min_peaks: config.min_peaks,
            found: peaks.len(),
        });
    }

    Ok(peaks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_peak(center: f64, height: f64, width_pts: usize, mz: &mut Vec<f64>, intensity: &mut Vec<f64>) {
        for i in 0..width_pts {
            let x = center + i as f64 * 0.1 - (width_pts as f64 * 0.05);
            let y = height * (-0.5 * ((x - center) / 0.3).powi(2)).exp();
            mz.push(x);
            intensity.push(y);
        }
    }

    #[test]
    fn picks_peaks_above_noise_and_sorts_descending() {
        let mut mz = Vec::new();
        let mut intensity = Vec::new();
        synthetic_peak(100.0, 5000.0, 20, &mut mz, &mut intensity);
        synthetic_peak(110.0, 20000.0, 20, &mut mz, &mut intensity);
        synthetic_peak(120.0, 500.0, 20, &mut mz, &mut intensity);

        // sort by mz so centroiding and min-distance logic behave sanely
        let mut pairs: Vec<(f64, f64)> = mz.into_iter().zip(intensity).collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        let mz: Vec<f64> = pairs.iter().map(|p| p.0).collect();
        let intensity: Vec<f64> = pairs.iter().map(|p| p.1).collect();

        let spectrum = Spectrum::new(mz, intensity);
        let mut config = Config::default();
        config.noise_cutoff = 1000.0;
        config.min_peaks = 1;
        config.pwhh = 0.1;

        let peaks = pick_peaks(&spectrum, &config).unwrap();
        assert!(peaks.len() >= 2);
        assert!(peaks[0].intensity >= peaks[1].intensity);
    }

    #[test]
    fn empty_spectrum_errors() {
        let spectrum = Spectrum::new(Vec::new(), Vec::new());
        let config = Config::default();
        assert_eq!(pick_peaks(&spectrum, &config), Err(Error::EmptyInput));
    }

    #[test]
    fn too_few_peaks_errors() {
        let mut mz = Vec::new();
        let mut intensity = Vec::new();
        synthetic_peak(100.0, 5000.0, 20, &mut mz, &mut intensity);
        let spectrum = Spectrum::new(mz, intensity);
        let mut config = Config::default();
        config.min_peaks = 5;
        config.noise_cutoff = 1000.0;
        let err = pick_peaks(&spectrum, &config).unwrap_err();
        matches!(err, Error::InsufficientPeaks { .. });
    }

    #[test]
    fn min_distance_rounds_rather_than_truncates() {
        // 0.6 / 0.2 = 3.0 exactly: round and truncate agree.
        assert_eq!(min_distance_points(0.6, 0.2), 3);
        // 0.6 / 0.1 = 6.0 exactly: round and truncate agree.
        assert_eq!(min_distance_points(0.6, 0.1), 6);
        // 0.55 / 0.2 = 2.75: rounds up to 3, truncation would give 2.
        assert_eq!(min_distance_points(0.55, 0.2), 3);
        // 0.58 / 0.2 = 2.9: rounds up to 3, truncation would give 2.
        assert_eq!(min_distance_points(0.58, 0.2), 3);
        // Floor of 2 still applies once rounding would go below it.
        assert_eq!(min_distance_points(0.05, 1.0), 2);
    }
}
