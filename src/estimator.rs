//! Robust mass estimator. Default estimator is the ion-mass
//! median; broad charge envelopes (>= 20 unique charges) get a
//! per-charge, core-intensity-weighted refinement to reduce edge-charge
//! contamination.

use crate::model::Ion;
use crate::signal::{median, population_std};

const BROAD_CHARGE_THRESHOLD: usize = 20;
const CORE_REL_INTENSITY: f64 = 0.35;

/// Remove ions whose mass deviates too far from the median. `mad < 0.1`
/// uses a fixed 5 Da threshold (very tight clusters); otherwise `3*mad`.
/// Never drops below 3 survivors — returns the input unchanged if the
/// filter would.
fn reject_mass_outliers(masses: &[f64], intensities: &[f64]) -> (Vec<f64>, Vec<f64>) {
    if masses.len() < 4 {
        return (masses.to_vec(), intensities.to_vec());
    }

    let median_mass = median(masses);
    let abs_devs: Vec<f64> = masses.iter().map(|m| (m - median_mass).abs()).collect();
    let mad = median(&abs_devs);

    let threshold = if mad < 0.1 { 5.0 } else { 3.0 * mad };
    let keep: Vec<bool> = abs_devs.iter().map(|&d| d < threshold).collect();

    if keep.iter().filter(|&&k| k).count() < 3 {
        return (masses.to_vec(), intensities.to_vec());
    }

    let kept_masses: Vec<f64> = masses.iter().zip(keep.iter()).filter(|(_, &k)| k).map(|(&m, _)| m).collect();
    let kept_intensities: Vec<f64> = intensities.iter().zip(keep.iter()).filter(|(_, &k)| k).map(|(&i, _)| i).collect();
    (kept_masses, kept_intensities)
}

fn component_mass(ions: &[Ion]) -> f64 {
    if ions.is_empty() {
        return f64::NAN;
    }

    let masses: Vec<f64> = ions.iter().map(|i| i.mass).collect();
    let intensities: Vec<f64> = ions.iter().map(|i| i.intensity).collect();
    let charges: Vec<u16> = ions.iter().map(|i| i.charge).collect();

    let (masses_clean, intensities_clean) = reject_mass_outliers(&masses, &intensities);
    if masses_clean.is_empty() || intensities_clean.is_empty() {
        return median(&masses);
    }

    let mass_median = median(&masses_clean);

    let mut unique_charges = charges.clone();
    unique_charges.sort_unstable();
    unique_charges.dedup();
    if unique_charges.len() < BROAD_CHARGE_THRESHOLD {
        return mass_median;
    }

    // Broad envelope: keep the strongest ion per charge to avoid
    // over-counting multiple assignments within the same charge.
    use std::collections::HashMap;
    let mut charge_to_best: HashMap<u16, usize> = HashMap::new();
    for (idx, ion) in ions.iter().enumerate() {
        match charge_to_best.get(&ion.charge) {
            Some(&best_idx) if ions[best_idx].intensity >= ion.intensity => {}
            _ => {
                charge_to_best.insert(ion.charge, idx);
            }
        }
    }

    let per_charge_idx: Vec<usize> = charge_to_best.values().copied().collect();
    let pc_masses: Vec<f64> = per_charge_idx.iter().map(|&i| ions[i].mass).collect();
    let pc_intensities: Vec<f64> = per_charge_idx.iter().map(|&i| ions[i].intensity).collect();

    let (mut pc_masses, mut pc_intensities) = reject_mass_outliers(&pc_masses, &pc_intensities);
    if pc_masses.len() < 3 {
        return mass_median;
    }

    let pc_max = pc_intensities.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if pc_max > 0.0 {
        let core_mask: Vec<bool> = pc_intensities.iter().map(|&i| i >= CORE_REL_INTENSITY * pc_max).collect();
        if core_mask.iter().filter(|&&k| k).count() >= 3 {
            pc_masses = pc_masses.iter().zip(core_mask.iter()).filter(|(_, &k)| k).map(|(&m, _)| m).collect();
            pc_intensities = pc_intensities.iter().zip(core_mask.iter()).filter(|(_, &k)| k).map(|(&i, _)| i).collect();
        }
    }

    let intensity_sum: f64 = pc_intensities.iter().sum();
    if intensity_sum <= 0.0 {
        return mass_median;
    }

    pc_masses.iter().zip(pc_intensities.iter()).map(|(&m, &i)| m * i).sum::<f64>() / intensity_sum
}

/// `(mass, mass_std)`. `mass_std` is the population standard deviation of
/// the full, pre-rejection ion mass set.
pub(crate) fn estimate_mass(ions: &[Ion]) -> (f64, f64) {
    let masses: Vec<f64> = ions.iter().map(|i| i.mass).collect();
    (component_mass(ions), population_std(&masses))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ion(mass: f64, intensity: f64, charge: u16) -> Ion {
        Ion {
            mz: mass / charge as f64,
            intensity,
            charge,
            mass,
            peak_index: charge as usize,
        }
    }

    #[test]
    fn narrow_envelope_uses_median() {
        let ions: Vec<Ion> = vec![
            ion(15000.0, 100.0, 10),
            ion(15000.5, 200.0, 11),
            ion(14999.5, 150.0, 12),
        ];
        let (mass, _) = estimate_mass(&ions);
        assert!((mass - 15000.0).abs() < 1.0);
    }

    #[test]
    fn outlier_ion_is_rejected() {
        let mut ions: Vec<Ion> = (5..15).map(|z| ion(15000.0, 100.0, z)).collect();
        ions.push(ion(25000.0, 100.0, 20));
        let (mass, _) = estimate_mass(&ions);
        assert!((mass - 15000.0).abs() < 5.0);
    }

    #[test]
    fn mass_std_is_population_std_of_full_set() {
        let ions: Vec<Ion> = vec![ion(100.0, 1.0, 2), ion(102.0, 1.0, 3), ion(104.0, 1.0, 4)];
        let (_, std) = estimate_mass(&ions);
        assert!((std - 1.632_993).abs() < 1e-3);
    }

    #[test]
    fn broad_envelope_uses_core_weighted_average() {
        let mut ions: Vec<Ion> = Vec::new();
        for z in 5u16..=30u16 {
            ions.push(ion(20000.0, 1000.0, z));
        }
        let (mass, _) = estimate_mass(&ions);
        assert!((mass - 20000.0).abs() < 1.0);
    }
}
