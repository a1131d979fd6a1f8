//! Deferred exclusive candidate selector. Candidates compete for
//! peaks rather than claiming them eagerly: the whole candidate pool is
//! ranked first, then walked once, each accepted candidate locking its
//! peaks away from everything ranked after it.

use std::collections::HashSet;

use crate::candidates::{generate_candidates, Candidate};
use crate::config::Config;
use crate::model::{Component, RawPeak};

const PRIMARY_DUP_TOLERANCE: f64 = 0.00005; // 50 ppm
const RESIDUAL_DUP_TOLERANCE: f64 = 0.001; // 0.1%
const MAX_RESIDUAL_ANCHORS: usize = 15;

fn rank_key(c: &Candidate) -> (usize, f64) {
    (c.num_charges, c.intensity)
}

fn sort_by_quality(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| rank_key(b).partial_cmp(&rank_key(a)).unwrap());
}

fn is_mass_duplicate(mass: f64, charge_states: &[u16], accepted: &[Component], tolerance: f64, check_charge_overlap: bool) -> bool {
    accepted.iter().any(|r| {
        let diff_pct = (r.mass - mass).abs() / mass;
        if diff_pct >= tolerance {
            return false;
        }
        if !check_charge_overlap {
            return true;
        }
        r.charge_states.iter().any(|z| charge_states.contains(z))
    })
}

fn candidate_to_component(c: Candidate) -> Component {
    let ion_mzs = c.ions.iter().map(|i| i.mz).collect();
    let ion_charges = c.ions.iter().map(|i| i.charge).collect();
    let ion_intensities = c.ions.iter().map(|i| i.intensity).collect();
    Component {
        mass: c.mass,
        mass_std: c.mass_std,
        charge_states: c.charge_states,
        num_charges: c.num_charges,
        intensity: c.intensity,
        peaks_found: c.ions.len(),
        r2: c.r2,
        ion_mzs,
        ion_charges,
        ion_intensities,
        second_pass: c.second_pass,
    }
}

/// Select non-overlapping candidates by quality, then run a relaxed
/// second pass over the leftover peaks to recover weaker species.
pub(crate) fn select(peaks: &[RawPeak], config: &Config) -> Vec<Component> {
    let mut candidates = generate_candidates(peaks, config, 30, false);
    sort_by_quality(&mut candidates);

    let mut results: Vec<Component> = Vec::new();
    let mut used_peaks: HashSet<usize> = HashSet::new();

    for candidate in candidates {
        let claimed = candidate.claimed_peak_indices();
        if claimed.is_empty() {
            continue;
        }

        let overlap = claimed.intersection(&used_peaks).count();
        let overlap_ratio = overlap as f64 / claimed.len() as f64;
        if overlap_ratio > config.max_overlap {
            continue;
        }

        if is_mass_duplicate(candidate.mass, &candidate.charge_states, &results, PRIMARY_DUP_TOLERANCE, true) {
            continue;
        }

        used_peaks.extend(claimed);
        results.push(candidate_to_component(candidate));
    }

    let all_peak_indices: HashSet<usize> = peaks.iter().map(|p| p.index).collect();
    let residual_indices: HashSet<usize> = all_peak_indices.difference(&used_peaks).copied().collect();

    if residual_indices.len() >= config.min_peaks {
        let mut residual_peaks: Vec<RawPeak> = peaks.iter().filter(|p| residual_indices.contains(&p.index)).copied().collect();
        residual_peaks.sort_by(|a, b| b.intensity.partial_cmp(&a.intensity).unwrap());

        let mut residual_candidates = generate_candidates(&residual_peaks, config, MAX_RESIDUAL_ANCHORS, true);
        sort_by_quality(&mut residual_candidates);

        let mut used_residual: HashSet<usize> = HashSet::new();
        for candidate in residual_candidates {
            let claimed = candidate.claimed_peak_indices();
            if claimed.is_empty() {
                continue;
            }
            let overlap = claimed.intersection(&used_residual).count();
            let overlap_ratio = overlap as f64 / claimed.len() as f64;
            if overlap_ratio > config.max_overlap {
                continue;
            }
            if is_mass_duplicate(candidate.mass, &candidate.charge_states, &results, RESIDUAL_DUP_TOLERANCE, false) {
                continue;
            }
            used_residual.extend(&claimed);
            results.push(candidate_to_component(candidate));
        }
    }

    sort_by_quality_components(&mut results);
    results
}

fn sort_by_quality_components(results: &mut [Component]) {
    results.sort_by(|a, b| {
        (b.num_charges, b.intensity)
            .partial_cmp(&(a.num_charges, a.intensity))
            .unwrap()
    });
}
