//! # Core Module
//!
//! Fundamental building blocks for conformational ensemble analysis.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atom records, selections, ensembles and conformations
//! - **Collective Motions** ([`dynamics`]) - Principal component analysis and mode comparison
//! - **File I/O** ([`io`]) - Reading and writing multi-model structure files
//! - **Numerics** ([`utils`]) - Superposition, RMSD and element data
//! - **Release Notes** ([`changelog`]) - Parsing and linting of reStructuredText changelogs
//!
//! ## Scientific Foundation
//!
//! - **Optimal superposition** via the Kabsch algorithm, with optional per-atom weights
//! - **Iterative superposition** onto an evolving mean structure
//! - **Principal component analysis** of positional covariance
//! - **Fluctuation analysis** (MSF/RMSF) and RMSD measures

pub mod changelog;
pub mod dynamics;
pub mod io;
pub mod models;
pub mod utils;
