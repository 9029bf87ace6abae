//! # Core Models Module
//!
//! Data structures for conformational ensembles.
//!
//! ## Key Components
//!
//! - [`topology`] - Per-atom descriptive records shared by every conformation
//! - [`selection`] - Atom selection expressions and resolved index sets
//! - [`ensemble`] - Reference coordinates, coordinate sets, weights and selection
//! - [`conformation`] - A lightweight view of one coordinate set of an ensemble
//!
//! ## Usage
//!
//! ```ignore
//! use confsemble::core::models::{ensemble::Ensemble, selection::AtomSelection};
//!
//! let mut ensemble = Ensemble::from_topology(topology, coordsets)?;
//! ensemble.select(&AtomSelection::CalphaOnly)?;
//! let rmsfs = ensemble.rmsfs();
//! ```

pub mod conformation;
pub mod ensemble;
pub mod selection;
pub mod topology;
