//! Core data types shared across the deconvolution pipeline.
//!
//! `Scan`/`Sample` are the reader boundary: any
//! vendor-format adapter that can produce a `Sample` satisfies the
//! engine's input contract. Everything downstream of the chromatogram
//! extractor works on plain `Spectrum` values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One MS acquisition at a retention time.
///
/// The source application duck-typed scans (objects exposing any of
/// several attribute-name pairs for m/z/intensity). Here that collapses
/// into a two-variant enum; a reader adapter normalizes vendor data into
/// one of these before the core ever runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Scan {
    /// Intensity vector sharing the sample's global `mz_axis`.
    SharedAxis(Vec<f64>),
    /// Scan carrying its own private m/z axis.
    Paired { mz: Vec<f64>, intensity: Vec<f64> },
}

impl Scan {
    /// `true` when the scan's arrays are internally consistent and
    /// non-empty. A scan failing this check contributes zero to
    /// TIC/EIC/sum rather than aborting processing.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Scan::SharedAxis(intensity) => !intensity.is_empty(),
            Scan::Paired { mz, intensity } => !mz.is_empty() && mz.len() == intensity.len(),
        }
    }
}

/// An ordered sequence of scans plus parallel retention times.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Sample {
    pub times: Vec<f64>,
    pub scans: Vec<Scan>,
    pub mz_axis: Option<Vec<f64>>,
    pub tic: Option<Vec<f64>>,
    pub acq_method: Option<String>,
    pub acq_info: HashMap<String, String>,
}

impl Sample {
    pub fn new(times: Vec<f64>, scans: Vec<Scan>) -> Self {
        Self {
            times,
            scans,
            mz_axis: None,
            tic: None,
            acq_method: None,
            acq_info: HashMap::new(),
        }
    }

    pub fn with_mz_axis(mut self, mz_axis: Vec<f64>) -> Self {
        self.mz_axis = Some(mz_axis);
        self
    }
}

/// `(mz[], intensity[])`, equal length, `mz` strictly increasing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Spectrum {
    pub mz: Vec<f64>,
    pub intensity: Vec<f64>,
}

impl Spectrum {
    pub fn new(mz: Vec<f64>, intensity: Vec<f64>) -> Self {
        Self { mz, intensity }
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty() || self.intensity.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mz.len()
    }
}

/// A centroided spectrum peak. `mz` is the parabolic-centroid estimate,
/// not the bin center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPeak {
    pub index: usize,
    pub mz: f64,
    pub intensity: f64,
}

/// A single m/z peak assigned to a candidate charge ladder.
/// `mass = mz * z - z * proton`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ion {
    pub mz: f64,
    pub intensity: f64,
    pub charge: u16,
    pub mass: f64,
    pub peak_index: usize,
}

/// The public deconvolution result. Carries no internal bookkeeping —
/// `claimed_peaks`/`claimed_mz_bins`/`anchor_peak_index` live only on the
/// private `Candidate` type consumed while building this value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub mass: f64,
    pub mass_std: f64,
    pub charge_states: Vec<u16>,
    pub num_charges: usize,
    pub intensity: f64,
    pub peaks_found: usize,
    pub r2: f64,
    pub ion_mzs: Vec<f64>,
    pub ion_charges: Vec<u16>,
    pub ion_intensities: Vec<f64>,
    pub second_pass: bool,
}

/// A peak in a chromatogram (time series), as produced by the adjunct
/// chromatogram peak finder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChromPeak {
    pub apex_time: f64,
    pub intensity: f64,
    pub left_index: usize,
    pub right_index: usize,
    pub area: f64,
}
