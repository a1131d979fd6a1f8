//! Singly-charged `[M+H]+` detector. Runs independently over the
//! *full* spectrum rather than reusing the charge-ladder peak list —
//! small molecules show up as a single peak and would never survive the
//! ladder candidate generator's `min_peaks` gate. It picks its own peaks
//! via `peaks::locate_peaks` rather than `pick_peaks`: the original's
//! `detect_singly_charged` has its own inline smooth/find/centroid
//! prologue with no `min_peaks` floor, only an `if not peaks: return []`
//! check, so a spectrum with a single clean peak still reports.

use crate::config::Config;
use crate::model::{Component, Spectrum};
use crate::peaks::locate_peaks;

/// Detect z=1 species, excluding any peak whose m/z falls inside one of
/// `exclude_mz_ranges` (inclusive), typically the m/z span already
/// claimed by a charge-envelope component. Sorted by intensity
/// descending.
pub fn detect_singly_charged(spectrum: &Spectrum, config: &Config, exclude_mz_ranges: &[(f64, f64)]) -> Vec<Component> {
    if spectrum.is_empty() {
        return Vec::new();
    }

    let peaks = locate_peaks(spectrum, config);
    if peaks.is_empty() {
        return Vec::new();
    }

    let max_intensity = peaks.iter().map(|p| p.intensity).fold(f64::NEG_INFINITY, f64::max);
    let min_intensity = max_intensity * config.singly_charged_min_intensity_pct / 100.0;
    let proton = config.proton_mass();

    let mut results: Vec<Component> = peaks
        .iter()
        .filter(|p| p.intensity >= min_intensity)
        .filter_map(|p| {
            let mass = p.mz - proton;
            if mass < config.singly_charged_low_mw || mass > config.singly_charged_high_mw {
                return None;
            }
            if exclude_mz_ranges.iter().any(|&(lo, hi)| p.mz >= lo && p.mz <= hi) {
                return None;
            }
            Some(Component {
                mass,
                mass_std: 0.0,
                charge_states: vec![1],
                num_charges: 1,
                intensity: p.intensity,
                peaks_found: 1,
                r2: 1.0,
                ion_mzs: vec![p.mz],
                ion_charges: vec![1],
                ion_intensities: vec![p.intensity],
                second_pass: false,
            })
        })
        .collect();

    results.sort_by(|a, b| b.intensity.partial_cmp(&a.intensity).unwrap());
    results
}
