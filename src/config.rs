//! Engine configuration: every tunable the deconvolution pipeline reads,
//! with its documented default, serializable so a file can be layered
//! under CLI flags at the binary's entry point.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Monoisotopic proton mass (Da).
pub const PROTON_MASS_MONOISOTOPIC: f64 = 1.007276;
/// Average chemical proton mass (Da), used by default.
pub const PROTON_MASS_AVERAGE: f64 = 1.00784;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub min_charge: u16,
    pub max_charge: u16,
    pub min_peaks: usize,
    pub noise_cutoff: f64,
    pub abundance_cutoff: f64,
    pub mw_agreement: f64,
    pub mw_assign_cutoff: f64,
    pub envelope_cutoff: f64,
    pub pwhh: f64,
    pub low_mw: f64,
    pub high_mw: f64,
    pub contig_min: usize,
    pub use_mz_agreement: bool,
    pub use_monoisotopic_proton: bool,
    pub max_overlap: f64,

    /// Minimum peak intensity for the singly-charged detector, as a
    /// percentage of its own base peak (distinct from `abundance_cutoff`,
    /// which gates the charge-ladder candidate generator).
    pub singly_charged_min_intensity_pct: f64,
    /// Mass-range gate for the singly-charged detector. Narrower than
    /// `low_mw`/`high_mw`, which bound intact-protein masses.
    pub singly_charged_low_mw: f64,
    pub singly_charged_high_mw: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_charge: 5,
            max_charge: 50,
            min_peaks: 3,
            noise_cutoff: 1000.0,
            abundance_cutoff: 0.10,
            mw_agreement: 5e-4,
            mw_assign_cutoff: 0.40,
            envelope_cutoff: 0.50,
            pwhh: 0.6,
            low_mw: 500.0,
            high_mw: 50_000.0,
            contig_min: 3,
            use_mz_agreement: false,
            use_monoisotopic_proton: false,
            max_overlap: 0.0,

            singly_charged_min_intensity_pct: 1.0,
            singly_charged_low_mw: 100.0,
            singly_charged_high_mw: 2000.0,
        }
    }
}

impl Config {
    /// The proton mass selected by `use_monoisotopic_proton`.
    pub fn proton_mass(&self) -> f64 {
        if self.use_monoisotopic_proton {
            PROTON_MASS_MONOISOTOPIC
        } else {
            PROTON_MASS_AVERAGE
        }
    }

    /// Load a config from a TOML or JSON file, falling back to defaults
    /// for any field the file omits.
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let c = Config::default();
        assert_eq!(c.min_charge, 5);
        assert_eq!(c.max_charge, 50);
        assert_eq!(c.min_peaks, 3);
        assert_eq!(c.noise_cutoff, 1000.0);
        assert_eq!(c.abundance_cutoff, 0.10);
        assert_eq!(c.mw_agreement, 5e-4);
        assert_eq!(c.mw_assign_cutoff, 0.40);
        assert_eq!(c.envelope_cutoff, 0.50);
        assert_eq!(c.pwhh, 0.6);
        assert_eq!(c.low_mw, 500.0);
        assert_eq!(c.high_mw, 50_000.0);
        assert_eq!(c.contig_min, 3);
        assert!(!c.use_mz_agreement);
        assert!(!c.use_monoisotopic_proton);
        assert_eq!(c.max_overlap, 0.0);
        assert_eq!(c.singly_charged_min_intensity_pct, 1.0);
        assert_eq!(c.singly_charged_low_mw, 100.0);
        assert_eq!(c.singly_charged_high_mw, 2000.0);
    }

    #[test]
    fn proton_mass_toggle() {
        let mut c = Config::default();
        assert_eq!(c.proton_mass(), PROTON_MASS_AVERAGE);
        c.use_monoisotopic_proton = true;
        assert_eq!(c.proton_mass(), PROTON_MASS_MONOISOTOPIC);
    }
}
