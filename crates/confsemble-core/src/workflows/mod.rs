//! # Workflows Module
//!
//! High-level procedures that take an ensemble from "as read" to analyzed.
//!
//! - **Superposition** ([`superpose`]) - applies the atom selection and
//!   weighting of a [`SuperpositionConfig`](crate::engine::config::SuperpositionConfig)
//!   and runs single or iterative superposition, reporting RMSDs before and
//!   after.
//! - **Analysis** ([`analyze`]) - optional superposition followed by RMSD,
//!   RMSF, pairwise RMSD and principal component analysis.
//!
//! Both report phases through a [`ProgressReporter`](crate::engine::progress::ProgressReporter)
//! and fail with [`EngineError`](crate::engine::error::EngineError).

pub mod analyze;
pub mod superpose;
