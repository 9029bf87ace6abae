use crate::core::models::ensemble::{Coords, Ensemble};
use crate::core::utils::geometry::{self, Transform};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter, Scan};
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Fits the selected atoms of every conformation onto the selected atoms of
/// the reference (weighted when the ensemble has weights) and applies each
/// transformation to all atoms of its conformation.
#[instrument(skip_all, name = "superpose_task", fields(title = ensemble.title()))]
pub fn run(ensemble: &mut Ensemble, reporter: &ProgressReporter) -> Result<Vec<Transform>, EngineError> {
    let target = ensemble.reference(true).ok_or(EngineError::NoReference)?;
    if ensemble.is_empty() {
        return Err(EngineError::NoConformations);
    }
    let weights = ensemble.weights(true);
    let selection = ensemble.selection().cloned();
    let n_confs = ensemble.num_confs();

    info!(
        conformations = n_confs,
        fitted_atoms = target.len(),
        "Superposing conformations onto the reference."
    );
    reporter.report(Progress::ScanStart {
        scan: Scan::Superposition,
        conformations: n_confs as u64,
    });

    let fit = |(index, coords): (usize, &mut Coords)| -> Option<Transform> {
        let transform = match &selection {
            Some(selection) => {
                geometry::kabsch(&selection.gather(coords.as_slice()), &target, weights.as_deref())
            }
            None => geometry::kabsch(coords.as_slice(), &target, weights.as_deref()),
        }?;
        transform.apply(coords);
        reporter.report(Progress::ConformationFitted { index });
        Some(transform)
    };

    #[cfg(not(feature = "parallel"))]
    let iterator = ensemble.raw_coordsets_mut().iter_mut().enumerate();

    #[cfg(feature = "parallel")]
    let iterator = ensemble.raw_coordsets_mut().par_iter_mut().enumerate();

    let fitted: Vec<Option<Transform>> = iterator.map(fit).collect();
    reporter.report(Progress::ScanFinish {
        scan: Scan::Superposition,
    });

    let transforms = fitted
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            t.ok_or_else(|| {
                EngineError::Internal(format!(
                    "superposition of conformation {} is undefined (zero total weight)",
                    i
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Superposition complete.");
    Ok(transforms)
}
