//! Ensemble-wide algorithms.
//!
//! Each task takes the ensemble and a [`ProgressReporter`], logs through
//! `tracing` and returns an [`EngineError`] on failure. The convenience
//! methods on [`Ensemble`] run a task with a silent reporter.

pub mod iterpose;
pub mod pairwise_rmsd;
pub mod superpose;

use crate::core::models::ensemble::Ensemble;
use crate::core::utils::geometry::Transform;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;

impl Ensemble {
    /// Superposes every conformation onto the reference coordinates and
    /// returns the applied transformations.
    pub fn superpose(&mut self) -> Result<Vec<Transform>, EngineError> {
        superpose::run(self, &ProgressReporter::new())
    }

    /// Iteratively superposes the ensemble onto its mean structure until the
    /// mean changes by at most `rmsd_threshold`. The reference coordinates
    /// end up as the mean of the conformations.
    pub fn iterpose(&mut self, rmsd_threshold: f64) -> Result<iterpose::IterposeReport, EngineError> {
        iterpose::run(
            self,
            rmsd_threshold,
            iterpose::DEFAULT_MAX_ITERATIONS,
            &ProgressReporter::new(),
        )
    }

    /// Symmetric matrix of RMSDs between all pairs of conformations.
    pub fn pairwise_rmsds(&self) -> Result<Vec<Vec<f64>>, EngineError> {
        pairwise_rmsd::run(self, &ProgressReporter::new())
    }
}
