use crate::core::models::ensemble::Ensemble;
use crate::core::utils::geometry;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter, Scan};
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// RMSD between every pair of conformations over the selected atoms,
/// weighted when the ensemble has weights. Conformations are compared as
/// they are, without superposition.
#[instrument(skip_all, name = "pairwise_rmsd_task", fields(title = ensemble.title()))]
pub fn run(ensemble: &Ensemble, reporter: &ProgressReporter) -> Result<Vec<Vec<f64>>, EngineError> {
    let n = ensemble.num_confs();
    if n == 0 {
        return Err(EngineError::NoConformations);
    }
    let coordsets = ensemble.coordsets(true);
    let weights = ensemble.weights(true);

    info!(conformations = n, "Calculating pairwise RMSD matrix.");
    reporter.report(Progress::ScanStart {
        scan: Scan::PairwiseRmsd,
        conformations: n as u64,
    });

    let upper_row = |i: usize| -> Option<Vec<f64>> {
        let row = ((i + 1)..n)
            .map(|j| geometry::rmsd(&coordsets[i], &coordsets[j], weights.as_deref()))
            .collect::<Option<Vec<f64>>>();
        reporter.report(Progress::RowComputed { index: i });
        row
    };

    #[cfg(not(feature = "parallel"))]
    let iterator = 0..n;

    #[cfg(feature = "parallel")]
    let iterator = (0..n).into_par_iter();

    let rows: Vec<Option<Vec<f64>>> = iterator.map(upper_row).collect();
    reporter.report(Progress::ScanFinish {
        scan: Scan::PairwiseRmsd,
    });

    let mut matrix = vec![vec![0.0; n]; n];
    for (i, row) in rows.into_iter().enumerate() {
        let row = row.ok_or_else(|| {
            EngineError::Internal(format!("RMSD undefined for conformation {}", i))
        })?;
        for (offset, value) in row.into_iter().enumerate() {
            let j = i + 1 + offset;
            matrix[i][j] = value;
            matrix[j][i] = value;
        }
    }
    Ok(matrix)
}
