//! # Confsemble Core Library
//!
//! A library for the analysis of conformational ensembles: collections of
//! coordinate sets of the same atoms, such as NMR models, MD snapshots or
//! aligned crystal structures.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture, with a small reporting
//! layer on top for tabular output.
//!
//! - **[`core`]: The Foundation.** Data models (`Topology`, `Ensemble`,
//!   `Conformation`), numerical helpers (Kabsch superposition, RMSD),
//!   principal component analysis (`dynamics`), file I/O and release-notes
//!   linting.
//!
//! - **[`engine`]: The Logic Core.** Iterative and parallel algorithms that
//!   mutate an ensemble (superposition, iterative superposition) or scan it
//!   (pairwise RMSD), together with their configuration, progress reporting
//!   and error types.
//!
//! - **[`workflows`]: The Public API.** Complete procedures, such as
//!   "superpose then analyze", that tie `engine` and `core` together.
//!
//! - **[`report`]**: Plot-ready data series derived from analysis results and
//!   their CSV serialization.

pub mod core;
pub mod engine;
pub mod report;
pub mod workflows;
