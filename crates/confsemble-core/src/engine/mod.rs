//! # Engine Module
//!
//! Algorithms that act on a whole ensemble: rigid-body superposition of
//! every conformation, iterative superposition onto an evolving mean
//! structure, and pairwise RMSD scans.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Superposition and analysis parameters with validating builders
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events for front ends
//! - **Error Handling** ([`error`]) - A single error type for all engine operations
//! - **Tasks** ([`tasks`]) - The individual algorithms, parallelized with `rayon` when the
//!   `parallel` feature is enabled
//!
//! Tasks consider only the selected atoms of an ensemble when fitting or
//! measuring, but rigid-body transformations are applied to every atom.

pub mod config;
pub mod error;
pub mod progress;
pub mod tasks;
