//! Error types for the deconvolution engine.
//!
//! Per the engine's error policy, most of these never escape the public
//! API: `EmptyInput`, `InsufficientPeaks` and `NoMatch` are caught at the
//! public boundary and turned into an empty result instead. `InvalidRange`
//! is a caller bug and is the one variant callers should expect to see.
//! `MalformedScan` is recovered locally inside the chromatogram extractor
//! and is only exposed here so that recovery path can be logged uniformly.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("empty input spectrum")]
    EmptyInput,

    #[error("fewer than {min_peaks} peaks found above noise floor (found {found})")]
    InsufficientPeaks { min_peaks: usize, found: usize },

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("no candidate survived selection filters")]
    NoMatch,

    #[error("scan {index} is malformed: {reason}")]
    MalformedScan { index: usize, reason: String },

    #[error("failed to load configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
