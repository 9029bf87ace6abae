use super::superpose;
use crate::core::models::ensemble::Ensemble;
use crate::core::utils::geometry;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

/// Convergence threshold on the change of the mean structure, in Angstrom.
pub const DEFAULT_RMSD_THRESHOLD: f64 = 1e-4;
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct IterposeReport {
    pub iterations: usize,
    /// RMSD between consecutive reference structures, one entry per iteration.
    pub rmsd_changes: Vec<f64>,
}

impl IterposeReport {
    pub fn last_change(&self) -> Option<f64> {
        self.rmsd_changes.last().copied()
    }
}

/// Superposes onto the reference, replaces the reference with the mean of
/// the conformations, and repeats until the RMSD between the old and new
/// reference (over all atoms) is at most `rmsd_threshold`.
///
/// Fails with [`EngineError::Convergence`] when `max_iterations` rounds do
/// not reach the threshold; the ensemble is left in its last state.
#[instrument(skip_all, name = "iterpose_task", fields(title = ensemble.title()))]
pub fn run(
    ensemble: &mut Ensemble,
    rmsd_threshold: f64,
    max_iterations: usize,
    reporter: &ProgressReporter,
) -> Result<IterposeReport, EngineError> {
    if ensemble.raw_reference().is_none() {
        return Err(EngineError::NoReference);
    }
    if ensemble.is_empty() {
        return Err(EngineError::NoConformations);
    }

    info!(rmsd_threshold, "Starting iterative superposition.");
    reporter.report(Progress::PhaseStart {
        name: "Iterative Superposition",
    });

    let silent = ProgressReporter::new();
    let mut rmsd_changes = Vec::new();
    loop {
        superpose::run(ensemble, &silent)?;

        let mean = geometry::mean_coords(ensemble.raw_coordsets())
            .ok_or_else(|| EngineError::Internal("cannot average coordinate sets".to_string()))?;
        let previous = ensemble.raw_reference().ok_or(EngineError::NoReference)?;
        let change = geometry::rmsd(previous, &mean, None).ok_or_else(|| {
            EngineError::Internal("reference and mean have different sizes".to_string())
        })?;
        ensemble.set_reference(mean)?;

        rmsd_changes.push(change);
        let step = rmsd_changes.len();
        info!("Step #{}: RMSD difference = {:.4e}", step, change);
        reporter.report(Progress::Iteration {
            step,
            rmsd_change: change,
        });

        if change <= rmsd_threshold {
            break;
        }
        if step >= max_iterations {
            reporter.report(Progress::PhaseFinish);
            return Err(EngineError::Convergence {
                iterations: step,
                last_change: change,
            });
        }
    }

    reporter.report(Progress::PhaseFinish);
    info!(
        iterations = rmsd_changes.len(),
        "Iterative superposition completed."
    );
    Ok(IterposeReport {
        iterations: rmsd_changes.len(),
        rmsd_changes,
    })
}
