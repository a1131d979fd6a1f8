//! Charge-ladder candidate generator — the engine's heart,
//! unchanged from the original algorithm. Builds, for every (anchor peak,
//! starting charge) pair, the best-matching set of ions across all other
//! peaks and every charge in `[min_charge, max_charge]`, then gates the
//! result on size, mass bounds, and ladder contiguity.

use std::collections::HashSet;

use crate::config::Config;
use crate::estimator::estimate_mass;
use crate::model::{Ion, RawPeak};

/// Bin width used for `Candidate::claimed_mz_bins`, matching the 0.5 Da
/// bin the original's candidate record reports alongside its ion set.
const MZ_BIN_WIDTH_DA: f64 = 0.5;

/// One candidate ion set assembled around an anchor peak and starting
/// charge. Not public: the selector consumes these and produces
/// `Component`s. `claimed_mz_bins` and `anchor_peak_index` are carried
/// through write-only, same as the original's `anchor_idx`/binned-m/z
/// set: nothing downstream reads them back (see `analysis.py:987-1001`),
/// but the data model names them, so they are populated rather than
/// dropped.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub mass: f64,
    pub mass_std: f64,
    pub charge_states: Vec<u16>,
    pub num_charges: usize,
    pub intensity: f64,
    pub ions: Vec<Ion>,
    pub r2: f64,
    pub second_pass: bool,
    pub claimed_mz_bins: HashSet<i64>,
    pub anchor_peak_index: usize,
}

impl Candidate {
    pub fn claimed_peak_indices(&self) -> HashSet<usize> {
        self.ions.iter().map(|ion| ion.peak_index).collect()
    }
}

fn mz_bins(ions: &[Ion]) -> HashSet<i64> {
    ions.iter().map(|ion| (ion.mz / MZ_BIN_WIDTH_DA).floor() as i64).collect()
}

/// Longest run of consecutive integers in an already-sorted, deduplicated
/// slice.
fn longest_contiguous_run(sorted_charges: &[u16]) -> usize {
    if sorted_charges.is_empty() {
        return 0;
    }
    let mut longest = 1;
    let mut current = 1;
    for i in 1..sorted_charges.len() {
        if sorted_charges[i] == sorted_charges[i - 1] + 1 {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 1;
        }
    }
    longest
}

/// Two-tier contiguity gate that suppresses sparse pseudo-ladders at high
/// `max_charge`. `relaxed` is used for the residual second pass, which
/// only requires a run of at least 2 once there are at least 2 unique
/// charges.
fn passes_contiguity_gate(sorted_charges: &[u16], contig_min: usize, relaxed: bool) -> bool {
    let longest = longest_contiguous_run(sorted_charges);
    let num_charges = sorted_charges.len();

    if relaxed {
        return num_charges < 2 || longest >= 2;
    }

    if contig_min > 1 && longest < contig_min {
        return false;
    }

    if num_charges >= 8 {
        let ratio = longest as f64 / num_charges as f64;
        longest >= contig_min.max(6) && ratio >= 0.60
    } else if num_charges >= 4 {
        let ratio = longest as f64 / num_charges as f64;
        longest >= 4 && ratio >= 0.60
    } else {
        true
    }
}

/// Quadratic (degree-2) OLS fit of `ln(max(intensity, 1))` against charge,
/// returning the clamped R². Informational only — never used to gate or
/// override the mass estimate (see `estimator::estimate_mass`).
fn gaussian_fit_r2(charges: &[u16], intensities: &[f64]) -> f64 {
    if charges.len() < 3 {
        return 0.0;
    }
    let x: Vec<f64> = charges.iter().map(|&c| c as f64).collect();
    let y: Vec<f64> = intensities.iter().map(|&i| i.max(1.0).ln()).collect();

    let n = x.len() as f64;
    let (mut s1, mut s2, mut s3, mut s4) = (0.0, 0.0, 0.0, 0.0);
    let (mut t0, mut t1, mut t2) = (0.0, 0.0, 0.0);
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let x2 = xi * xi;
        s1 += xi;
        s2 += x2;
        s3 += x2 * xi;
        s4 += x2 * x2;
        t0 += yi;
        t1 += xi * yi;
        t2 += x2 * yi;
    }

    // Solve [[s4 s3 s2] [s3 s2 s1] [s2 s1 n]] [a b c]^T = [t2 t1 t0]^T
    let m = [[s4, s3, s2], [s3, s2, s1], [s2, s1, n]];
    let rhs = [t2, t1, t0];
    let coeffs = match solve_3x3(m, rhs) {
        Some(c) => c,
        None => return 0.0,
    };
    let (a, b, c) = (coeffs[0], coeffs[1], coeffs[2]);

    let mean_y = t0 / n;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let yhat = a * xi * xi + b * xi + c;
        ss_res += (yi - yhat).powi(2);
        ss_tot += (yi - mean_y).powi(2);
    }
    if ss_tot == 0.0 {
        return 0.0;
    }
    (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
}

fn solve_3x3(m: [[f64; 3]; 3], rhs: [f64; 3]) -> Option<[f64; 3]> {
    let det3 = |a: [[f64; 3]; 3]| -> f64 {
        a[0][0] * (a[1][1] * a[2][2] - a[1][2] * a[2][1])
            - a[0][1] * (a[1][0] * a[2][2] - a[1][2] * a[2][0])
            + a[0][2] * (a[1][0] * a[2][1] - a[1][1] * a[2][0])
    };
    let det = det3(m);
    if det.abs() < 1e-12 {
        return None;
    }
    let mut result = [0.0; 3];
    for col in 0..3 {
        let mut replaced = m;
        for row in 0..3 {
            replaced[row][col] = rhs[row];
        }
        result[col] = det3(replaced) / det;
    }
    Some(result)
}

/// Build the flat `P x Z` mass matrix: `matrix[p*num_z+z] = (mz[p] -
/// proton) * charges[z]`.
fn build_mass_matrix(peak_mzs: &[f64], charges: &[u16], proton: f64) -> Vec<f64> {
    let num_z = charges.len();
    let mut matrix = vec![0.0; peak_mzs.len() * num_z];
    for (p, &mz) in peak_mzs.iter().enumerate() {
        let base = mz - proton;
        for (z_idx, &z) in charges.iter().enumerate() {
            matrix[p * num_z + z_idx] = base * z as f64;
        }
    }
    matrix
}

/// Assemble candidate ion sets around the top `max_anchors` peaks (by
/// intensity; `peaks` is assumed pre-sorted descending). `relaxed`
/// switches the contiguity gate to the residual-pass rule and tags
/// resulting candidates as `second_pass`.
pub(crate) fn generate_candidates(peaks: &[RawPeak], config: &Config, max_anchors: usize, relaxed: bool) -> Vec<Candidate> {
    if peaks.is_empty() {
        return Vec::new();
    }

    let proton = config.proton_mass();
    let charges: Vec<u16> = (config.min_charge..=config.max_charge).collect();
    let num_z = charges.len();
    if num_z == 0 {
        return Vec::new();
    }

    let peak_mzs: Vec<f64> = peaks.iter().map(|p| p.mz).collect();
    let peak_ints: Vec<f64> = peaks.iter().map(|p| p.intensity).collect();
    let masses_matrix = build_mass_matrix(&peak_mzs, &charges, proton);

    let max_anchors = max_anchors.min(peaks.len());
    let mut candidates = Vec::new();

    for anchor_idx in 0..max_anchors {
        let anchor = &peaks[anchor_idx];
        let anchor_base = anchor.mz - proton;
        let anchor_int = anchor.intensity;

        for (z0_idx, &z0) in charges.iter().enumerate() {
            let m0 = anchor_base * z0 as f64;
            if m0 < config.low_mw || m0 > config.high_mw {
                continue;
            }

            let intensity_floor = config.noise_cutoff.max(anchor_int * config.abundance_cutoff);

            let mut ions: Vec<Ion> = Vec::new();
            for (p, peak) in peaks.iter().enumerate() {
                if peak_ints[p] < intensity_floor {
                    continue;
                }
                let row = &masses_matrix[p * num_z..p * num_z + num_z];
                let (mut best_z_idx, mut best_err) = (0usize, f64::INFINITY);
                for (z_idx, &mass) in row.iter().enumerate() {
                    let err = (mass - m0).abs() / m0;
                    if err < best_err {
                        best_err = err;
                        best_z_idx = z_idx;
                    }
                }
                if best_err > config.mw_agreement {
                    continue;
                }

                let best_z = charges[best_z_idx];
                if config.use_mz_agreement {
                    let mz_pred = (m0 + best_z as f64 * proton) / best_z as f64;
                    let mz_err = (peak_mzs[p] - mz_pred).abs() / mz_pred;
                    if mz_err > config.mw_agreement {
                        continue;
                    }
                }

                ions.push(Ion {
                    mz: peak_mzs[p],
                    intensity: peak_ints[p],
                    charge: best_z,
                    mass: row[best_z_idx],
                    peak_index: peak.index,
                });
            }

            if ions.len() < config.min_peaks {
                continue;
            }

            let mut unique_charges: Vec<u16> = ions.iter().map(|i| i.charge).collect();
            unique_charges.sort_unstable();
            unique_charges.dedup();

            if !passes_contiguity_gate(&unique_charges, config.contig_min, relaxed) {
                continue;
            }

            let intensities: Vec<f64> = ions.iter().map(|i| i.intensity).collect();
            let r2 = gaussian_fit_r2(&unique_charges, &intensities);

            let (mass, mass_std) = estimate_mass(&ions);
            let total_intensity: f64 = intensities.iter().sum();
            let claimed_mz_bins = mz_bins(&ions);

            candidates.push(Candidate {
                mass,
                mass_std,
                num_charges: unique_charges.len(),
                charge_states: unique_charges,
                intensity: total_intensity,
                ions,
                r2,
                second_pass: relaxed,
                claimed_mz_bins,
                anchor_peak_index: anchor.index,
            });
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charge_ladder_peaks(mass: f64, charges: &[u16], proton: f64, intensity: f64) -> Vec<RawPeak> {
        charges
            .iter()
            .enumerate()
            .map(|(i, &z)| RawPeak {
                index: i,
                mz: (mass + z as f64 * proton) / z as f64,
                intensity,
            })
            .collect()
    }

    #[test]
    fn finds_candidate_for_clean_charge_ladder() {
        let proton = Config::default().proton_mass();
        let peaks = charge_ladder_peaks(15000.0, &[10, 11, 12, 13, 14, 15], proton, 5000.0);
        let config = Config::default();
        let candidates = generate_candidates(&peaks, &config, 30, false);
        assert!(!candidates.is_empty());
        let best = &candidates[0];
        assert!((best.mass - 15000.0).abs() < 1.0);
        assert_eq!(best.num_charges, 6);
    }

    #[test]
    fn rejects_ladder_shorter_than_min_peaks() {
        let proton = Config::default().proton_mass();
        let peaks = charge_ladder_peaks(15000.0, &[10, 11], proton, 5000.0);
        let mut config = Config::default();
        config.min_peaks = 3;
        let candidates = generate_candidates(&peaks, &config, 30, false);
        assert!(candidates.is_empty());
    }

    #[test]
    fn contiguity_gate_blocks_sparse_ladder() {
        assert!(!passes_contiguity_gate(&[5, 6, 7, 20, 30, 40, 41, 42], 3, false));
        assert!(passes_contiguity_gate(&[5, 6, 7, 8, 9, 10, 11, 12], 3, false));
    }

    #[test]
    fn relaxed_gate_allows_short_run() {
        assert!(passes_contiguity_gate(&[5, 6], 3, true));
        assert!(!passes_contiguity_gate(&[5, 8], 3, true));
    }

    #[test]
    fn r2_is_zero_for_fewer_than_three_points() {
        assert_eq!(gaussian_fit_r2(&[5, 6], &[1.0, 2.0]), 0.0);
    }
}
