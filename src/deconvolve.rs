//! Top-level orchestrator: peak-pick, generate and select
//! charge-ladder candidates, then sweep the full spectrum again for
//! singly-charged species outside the claimed envelopes.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Error;
use crate::model::{Component, Spectrum};
use crate::peaks::pick_peaks;
use crate::selector::select;
use crate::singly_charged::detect_singly_charged;

/// Exclusion margin (Da) padded around a selected component's claimed
/// m/z span before sweeping for `[M+H]+` species.
const EXCLUSION_MARGIN_DA: f64 = 2.0;

fn exclusion_range(component: &Component) -> Option<(f64, f64)> {
    let lo = component.ion_mzs.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = component.ion_mzs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if lo.is_finite() && hi.is_finite() {
        Some((lo - EXCLUSION_MARGIN_DA, hi + EXCLUSION_MARGIN_DA))
    } else {
        None
    }
}

fn sort_by_quality(components: &mut [Component]) {
    components.sort_by(|a, b| {
        (b.num_charges, b.intensity)
            .partial_cmp(&(a.num_charges, a.intensity))
            .unwrap()
    });
}

/// Run the full deconvolution pipeline. Never errors: an empty or
/// unusable spectrum simply yields an empty result, per the engine's
/// recovery policy.
pub fn deconvolute(spectrum: &Spectrum, config: &Config) -> Vec<Component> {
    let peaks = match pick_peaks(spectrum, config) {
        Ok(peaks) => peaks,
        Err(Error::EmptyInput) => {
            warn!("empty spectrum passed to deconvolute");
            return Vec::new();
        }
        Err(Error::InsufficientPeaks { min_peaks, found }) => {
            debug!(min_peaks, found, "too few peaks above noise floor");
            return Vec::new();
        }
        Err(other) => {
            warn!(error = %other, "unexpected error during peak picking");
            return Vec::new();
        }
    };

    info!(peak_count = peaks.len(), "picked spectrum peaks");

    let mut components = select(&peaks, config);
    info!(component_count = components.len(), "selected charge-ladder candidates");

    let exclude_ranges: Vec<(f64, f64)> = components.iter().filter_map(exclusion_range).collect();

    let singly_charged = detect_singly_charged(spectrum, config, &exclude_ranges);
    info!(count = singly_charged.len(), "detected singly-charged species");
    components.extend(singly_charged);

    sort_by_quality(&mut components);
    components
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charge_ladder_spectrum(mass: f64, charges: &[u16], proton: f64, intensity: f64) -> Spectrum {
        let mut pairs: Vec<(f64, f64)> = charges
            .iter()
            .map(|&z| ((mass + z as f64 * proton) / z as f64, intensity))
            .collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        Spectrum::new(pairs.iter().map(|p| p.0).collect(), pairs.iter().map(|p| p.1).collect())
    }

    #[test]
    fn empty_spectrum_returns_empty_result() {
        let spectrum = Spectrum::new(Vec::new(), Vec::new());
        let config = Config::default();
        assert!(deconvolute(&spectrum, &config).is_empty());
    }

    #[test]
    fn too_sparse_spectrum_returns_empty_result() {
        let spectrum = Spectrum::new(vec![100.0, 200.0], vec![5000.0, 6000.0]);
        let config = Config::default();
        assert!(deconvolute(&spectrum, &config).is_empty());
    }

    #[test]
    fn full_pipeline_recovers_single_charge_ladder() {
        let config = Config::default();
        let proton = config.proton_mass();
        let spectrum = charge_ladder_spectrum(15000.0, &[10, 11, 12, 13, 14, 15], proton, 8000.0);
        let results = deconvolute(&spectrum, &config);
        assert_eq!(results.len(), 1);
        assert!((results[0].mass - 15000.0).abs() < 1.0);
    }
}
