//! Provides input/output functionality for ensemble file formats.
//!
//! Ensembles are read from and written to multi-model structure files, where
//! each model holds one coordinate set of the same atoms. A unified
//! trait-based interface ([`traits::EnsembleFile`]) keeps format-specific
//! parsing behind a common API.

pub mod pdb;
pub mod traits;
