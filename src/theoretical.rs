//! Theoretical m/z calculation, the inverse of the mass estimate: given a
//! neutral mass and a set of charge states, what m/z would each ion
//! appear at.

use crate::config::Config;

/// `(charge, mz)` pairs for `mz = (mass + z * proton) / z`.
pub fn theoretical_mz(mass: f64, charge_states: &[u16], config: &Config) -> Vec<(u16, f64)> {
    let proton = config.proton_mass();
    charge_states
        .iter()
        .map(|&z| (z, (mass + z as f64 * proton) / z as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_against_proton_mass() {
        let config = Config::default();
        let out = theoretical_mz(15000.0, &[10, 15, 20], &config);
        assert_eq!(out.len(), 3);
        for (z, mz) in out {
            let recovered_mass = mz * z as f64 - z as f64 * config.proton_mass();
            assert!((recovered_mass - 15000.0).abs() < 1e-6);
        }
    }
}
