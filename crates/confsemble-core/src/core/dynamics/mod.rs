//! # Dynamics Module
//!
//! Principal component analysis of conformational ensembles and the derived
//! quantities used to inspect collective motions.
//!
//! ## Key Components
//!
//! - [`mode`] - Normal-mode style vectors ([`mode::Mode`]) and ordered collections of them ([`mode::ModeSet`])
//! - [`pca`] - Covariance construction and diagonalization of an ensemble
//! - [`analysis`] - Fractional variances, square fluctuations, projections, overlaps and cross-correlations
//!
//! Mode vectors are flattened `3N` vectors laid out as `x1, y1, z1, x2, ...`,
//! matching the order of the selected atoms of the ensemble they came from.

pub mod analysis;
pub mod mode;
pub mod pca;

use crate::core::models::ensemble::EnsembleError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum DynamicsError {
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("At least 2 conformations are required (found {found})")]
    TooFewConformations { found: usize },

    #[error("Mode set is empty")]
    EmptyModeSet,

    #[error("Mode index {index} is out of range for {len} modes")]
    ModeIndexOutOfRange { index: usize, len: usize },

    #[error("Mode vector length {0} is not a multiple of 3")]
    InvalidVectorLength(usize),

    #[error("Ensemble error: {0}")]
    Ensemble(#[from] EnsembleError),
}
