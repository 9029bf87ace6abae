//! # Report Module
//!
//! Plot-ready tables derived from ensemble and mode analyses, and their CSV
//! serialization.
//!
//! Each builder in [`plots`] produces the data behind one kind of figure
//! (fraction of variance bars, square-fluctuation profiles, projection
//! scatter plots, overlap and cross-correlation maps, ...) as a [`Series`]
//! or a [`Matrix`]. Rendering is left to external tools; [`export`] writes
//! the tables as CSV.
//!
//! Mode and conformation numbers in labels and x values start at 1.

pub mod export;
pub mod plots;
pub mod series;

pub use series::{Column, Matrix, Series};

use crate::core::dynamics::DynamicsError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    Dimension { expected: usize, found: usize },

    #[error("No data available for {0}")]
    Empty(&'static str),

    #[error("Mode analysis failed: {0}")]
    Dynamics(#[from] DynamicsError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
