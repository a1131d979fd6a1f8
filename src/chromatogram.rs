//! Chromatogram extractor and the adjunct chromatogram peak finder.
//! TIC/EIC/sum all treat a missing or malformed scan as contributing
//! zero and keep going, per the engine's recovery policy — no error
//! propagates out of these functions.

use tracing::warn;

use crate::error::{Error, Result};
use crate::model::{ChromPeak, Sample, Scan};
use crate::signal::trapezoidal_integrate;

const SUM_BIN_WIDTH_DA: f64 = 0.01;

fn scan_eic_contribution(scan: &Scan, mz_min: f64, mz_max: f64, shared_mask: Option<&[bool]>) -> f64 {
    match scan {
        Scan::SharedAxis(intensity) => match shared_mask {
            Some(mask) => intensity
                .iter()
                .zip(mask.iter())
                .filter(|(_, &m)| m)
                .map(|(&i, _)| i)
                .sum(),
            None => 0.0,
        },
        Scan::Paired { mz, intensity } => {
            if mz.len() != intensity.len() || mz.is_empty() {
                return 0.0;
            }
            mz.iter()
                .zip(intensity.iter())
                .filter(|(&m, _)| m >= mz_min && m <= mz_max)
                .map(|(_, &i)| i)
                .sum()
        }
    }
}

/// Extracted ion chromatogram: for each scan, sum intensities whose m/z
/// lies in `[target - window, target + window]`. Output length always
/// equals `len(sample.scans)`.
pub fn eic(sample: &Sample, target_mz: f64, window: f64) -> Vec<f64> {
    let mz_min = target_mz - window;
    let mz_max = target_mz + window;

    let shared_mask: Option<Vec<bool>> = sample
        .mz_axis
        .as_ref()
        .map(|axis| axis.iter().map(|&m| m >= mz_min && m <= mz_max).collect());

    sample
        .scans
        .iter()
        .enumerate()
        .map(|(idx, scan)| {
            if !scan.is_well_formed() {
                warn!(index = idx, "malformed scan contributes zero to EIC");
                return 0.0;
            }
            scan_eic_contribution(scan, mz_min, mz_max, shared_mask.as_deref())
        })
        .collect()
}

/// Total ion chromatogram: the sample's precomputed TIC if present, else
/// the per-scan intensity sum.
pub fn tic(sample: &Sample) -> Vec<f64> {
    if let Some(tic) = &sample.tic {
        return tic.clone();
    }

    sample
        .scans
        .iter()
        .enumerate()
        .map(|(idx, scan)| {
            if !scan.is_well_formed() {
                warn!(index = idx, "malformed scan contributes zero to TIC");
                return 0.0;
            }
            match scan {
                Scan::SharedAxis(intensity) => intensity.iter().sum(),
                Scan::Paired { intensity, .. } => intensity.iter().sum(),
            }
        })
        .collect()
}

/// Sum mass spectra within `[t_start, t_end]`. When the sample carries a
/// shared m/z axis the scan vectors are summed elementwise on that axis;
/// otherwise all `(mz, intensity)` pairs from the selected scans are
/// concatenated and re-binned into uniform `0.01` Da bins over the
/// observed m/z range. Returns empty arrays if no scans match.
pub fn sum_spectra_in_range(sample: &Sample, t_start: f64, t_end: f64) -> Result<(Vec<f64>, Vec<f64>)> {
    if t_end <= t_start {
        return Err(Error::InvalidRange(format!(
            "t_end ({t_end}) must be greater than t_start ({t_start})"
        )));
    }

    let selected: Vec<usize> = sample
        .times
        .iter()
        .enumerate()
        .filter(|(_, &t)| t >= t_start && t <= t_end)
        .map(|(i, _)| i)
        .collect();

    if selected.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    if let Some(axis) = &sample.mz_axis {
        let mut summed = vec![0.0; axis.len()];
        for idx in &selected {
            match &sample.scans[*idx] {
                Scan::SharedAxis(intensity) if intensity.len() == axis.len() => {
                    for (s, &v) in summed.iter_mut().zip(intensity.iter()) {
                        *s += v;
                    }
                }
                _ => {
                    warn!(index = idx, "malformed scan contributes zero to spectrum sum");
                }
            }
        }
        return Ok((axis.clone(), summed));
    }

    let mut all_mz: Vec<f64> = Vec::new();
    let mut all_int: Vec<f64> = Vec::new();
    for idx in &selected {
        match &sample.scans[*idx] {
            Scan::Paired { mz, intensity } if mz.len() == intensity.len() && !mz.is_empty() => {
                all_mz.extend_from_slice(mz);
                all_int.extend_from_slice(intensity);
            }
            _ => {
                warn!(index = idx, "malformed scan contributes zero to spectrum sum");
            }
        }
    }

    if all_mz.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let mz_min = all_mz.iter().cloned().fold(f64::INFINITY, f64::min);
    let mz_max = all_mz.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let num_bins = (((mz_max - mz_min) / SUM_BIN_WIDTH_DA).ceil() as usize) + 1;

    let mut bins = vec![0.0; num_bins];
    for (&m, &i) in all_mz.iter().zip(all_int.iter()) {
        let bin = (((m - mz_min) / SUM_BIN_WIDTH_DA) as usize).min(num_bins - 1);
        bins[bin] += i;
    }

    let centers: Vec<f64> = (0..num_bins)
        .map(|b| mz_min + (b as f64 + 0.5) * SUM_BIN_WIDTH_DA)
        .collect();

    Ok((centers, bins))
}

fn prominence(y: &[f64], peak: usize) -> (f64, usize, usize) {
    let n = y.len();

    let mut left_min = y[peak];
    let mut left_base = peak;
    let mut i = peak;
    while i > 0 {
        i -= 1;
        if y[i] > y[peak] {
            break;
        }
        if y[i] < left_min {
            left_min = y[i];
            left_base = i;
        }
    }

    let mut right_min = y[peak];
    let mut right_base = peak;
    let mut j = peak;
    while j + 1 < n {
        j += 1;
        if y[j] > y[peak] {
            break;
        }
        if y[j] < right_min {
            right_min = y[j];
            right_base = j;
        }
    }

    (y[peak] - left_min.max(right_min), left_base, right_base)
}

/// Local maxima of a plateau-aware 1-D signal: the midpoint of each
/// maximal run of equal-height samples that is strictly greater than
/// both of its immediate neighbors.
fn local_maxima(y: &[f64]) -> Vec<usize> {
    let n = y.len();
    if n < 3 {
        return Vec::new();
    }
    let mut maxima = Vec::new();
    let mut i = 1;
    while i < n - 1 {
        if y[i - 1] < y[i] {
            let mut i_ahead = i + 1;
            while i_ahead < n - 1 && y[i_ahead] == y[i] {
                i_ahead += 1;
            }
            if y[i_ahead] < y[i] {
                maxima.push((i + i_ahead - 1) / 2);
                i = i_ahead;
                continue;
            }
            i = i_ahead;
        } else {
            i += 1;
        }
    }
    maxima
}

/// Peaks in a chromatogram (time series), gated by height and prominence
/// expressed as fractions of the series maximum. `area` is the
/// trapezoidal integral over `[left_index, right_index]`, the bases found
/// while walking out from the apex during prominence calculation.
pub fn find_chromatogram_peaks(
    times: &[f64],
    intensities: &[f64],
    height_rel: f64,
    prominence_rel: f64,
) -> Vec<ChromPeak> {
    if times.len() != intensities.len() || times.len() < 3 {
        return Vec::new();
    }

    let max_intensity = intensities.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max_intensity <= 0.0 {
        return Vec::new();
    }

    let min_height = max_intensity * height_rel;
    let min_prominence = max_intensity * prominence_rel;

    local_maxima(intensities)
        .into_iter()
        .filter(|&p| intensities[p] >= min_height)
        .filter_map(|p| {
            let (prom, left, right) = prominence(intensities, p);
            if prom < min_prominence {
                return None;
            }
            let area = trapezoidal_integrate(&times[left..=right], &intensities[left..=right]);
            Some(ChromPeak {
                apex_time: times[p],
                intensity: intensities[p],
                left_index: left,
                right_index: right,
                area,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared_sample() -> Sample {
        let axis = vec![100.0, 100.5, 101.0, 101.5, 102.0];
        Sample {
            times: vec![0.0, 1.0, 2.0],
            scans: vec![
                Scan::SharedAxis(vec![1.0, 2.0, 3.0, 4.0, 5.0]),
                Scan::SharedAxis(vec![2.0, 4.0, 6.0, 8.0, 10.0]),
                Scan::SharedAxis(vec![0.0, 0.0, 0.0, 0.0, 0.0]),
            ],
            mz_axis: Some(axis),
            tic: None,
            acq_method: None,
            acq_info: Default::default(),
        }
    }

    #[test]
    fn eic_shared_axis_sums_window() {
        let sample = shared_sample();
        let out = eic(&sample, 101.0, 0.3);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], 3.0);
        assert_eq!(out[1], 6.0);
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn eic_malformed_scan_contributes_zero() {
        let mut sample = shared_sample();
        sample.scans.push(Scan::Paired {
            mz: vec![1.0, 2.0],
            intensity: vec![1.0],
        });
        sample.times.push(3.0);
        let out = eic(&sample, 101.0, 0.3);
        assert_eq!(out.len(), 4);
        assert_eq!(out[3], 0.0);
    }

    #[test]
    fn tic_uses_precomputed_when_present() {
        let mut sample = shared_sample();
        sample.tic = Some(vec![10.0, 20.0, 30.0]);
        assert_eq!(tic(&sample), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn tic_sums_scans_when_absent() {
        let sample = shared_sample();
        assert_eq!(tic(&sample), vec![15.0, 30.0, 0.0]);
    }

    #[test]
    fn sum_spectra_shared_axis_elementwise() {
        let sample = shared_sample();
        let (mz, intensity) = sum_spectra_in_range(&sample, 0.0, 1.0).unwrap();
        assert_eq!(mz, vec![100.0, 100.5, 101.0, 101.5, 102.0]);
        assert_eq!(intensity, vec![3.0, 6.0, 9.0, 12.0, 15.0]);
    }

    #[test]
    fn sum_spectra_invalid_range_errors() {
        let sample = shared_sample();
        assert!(sum_spectra_in_range(&sample, 5.0, 1.0).is_err());
    }

    #[test]
    fn sum_spectra_no_scans_in_window_is_empty() {
        let sample = shared_sample();
        let (mz, intensity) = sum_spectra_in_range(&sample, 10.0, 20.0).unwrap();
        assert!(mz.is_empty());
        assert!(intensity.is_empty());
    }

    #[test]
    fn sum_spectra_paired_rebins_at_fixed_width() {
        let sample = Sample {
            times: vec![0.0, 1.0],
            scans: vec![
                Scan::Paired {
                    mz: vec![100.001, 100.05],
                    intensity: vec![10.0, 5.0],
                },
                Scan::Paired {
                    mz: vec![100.002],
                    intensity: vec![20.0],
                },
            ],
            mz_axis: None,
            tic: None,
            acq_method: None,
            acq_info: Default::default(),
        };
        let (mz, intensity) = sum_spectra_in_range(&sample, 0.0, 1.0).unwrap();
        assert!(!mz.is_empty());
        let total: f64 = intensity.iter().sum();
        assert!((total - 35.0).abs() < 1e-9);
    }

    #[test]
    fn chromatogram_peak_finder_basic() {
        let times: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let mut intensities = vec![0.0; 20];
        for i in 5..15 {
            let x = (i as f64 - 10.0) / 3.0;
            intensities[i] = 100.0 * (-0.5 * x * x).exp();
        }
        let peaks = find_chromatogram_peaks(&times, &intensities, 0.1, 0.05);
        assert_eq!(peaks.len(), 1);
        assert!((peaks[0].apex_time - 10.0).abs() <= 1.0);
        assert!(peaks[0].area > 0.0);
    }

    #[test]
    fn chromatogram_peak_finder_rejects_below_height() {
        let times: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let intensities = vec![0.0, 1.0, 2.0, 1.0, 0.0, 0.0, 100.0, 50.0, 0.0, 0.0];
        let peaks = find_chromatogram_peaks(&times, &intensities, 0.5, 0.05);
        assert_eq!(peaks.len(), 1);
        assert!((peaks[0].apex_time - 6.0).abs() < 1e-9);
    }

    #[test]
    fn chromatogram_peak_finder_empty_on_flat_signal() {
        let times: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let intensities = vec![0.0; 10];
        assert!(find_chromatogram_peaks(&times, &intensities, 0.1, 0.05).is_empty());
    }
}
