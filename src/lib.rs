//! Charge-envelope deconvolution for intact-protein and small-molecule
//! LC-MS spectra.
//!
//! The public surface is small and deliberately synchronous: build a
//! [`Config`], hand it a [`model::Spectrum`] or [`model::Sample`], and
//! call [`deconvolute`] / [`detect_singly_charged`] / the chromatogram
//! helpers. Nothing here spawns a thread or holds a lock — callers that
//! want to fan independent spectra out across a pool are free to do so
//! with whatever runtime fits their application.

pub mod chromatogram;
pub mod config;
pub mod error;
pub mod model;
pub mod signal;
pub mod theoretical;

mod candidates;
mod estimator;
mod peaks;
mod selector;
mod singly_charged;

mod deconvolve;

pub use chromatogram::{eic, find_chromatogram_peaks, sum_spectra_in_range, tic};
pub use config::Config;
pub use deconvolve::deconvolute;
pub use error::{Error, Result};
pub use model::{ChromPeak, Component, Ion, RawPeak, Sample, Scan, Spectrum};
pub use singly_charged::detect_singly_charged;
pub use theoretical::theoretical_mz;
