use super::DynamicsError;
use super::mode::{Mode, ModeSet};
use crate::core::models::ensemble::{Coords, Ensemble};
use crate::core::utils::geometry;
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use tracing::{debug, instrument};

/// Eigenvalues at or below this are treated as zero variance.
const ZERO_VARIANCE: f64 = 1e-8;

/// Principal component analysis of the selected atoms of an ensemble.
#[derive(Debug, Clone)]
pub struct Pca {
    mean: Coords,
    covariance: DMatrix<f64>,
    modes: ModeSet,
}

impl Pca {
    /// Builds the covariance matrix of the selected coordinates about their
    /// mean and keeps the `n_modes` modes of largest variance. `n_modes == 0`
    /// keeps every mode with non-zero variance.
    ///
    /// Conformations should be superposed beforehand.
    #[instrument(skip_all, name = "pca_build", fields(title = ensemble.title()))]
    pub fn build(ensemble: &Ensemble, n_modes: usize) -> Result<Self, DynamicsError> {
        let coordsets = ensemble.coordsets(true);
        if coordsets.len() < 2 {
            return Err(DynamicsError::TooFewConformations {
                found: coordsets.len(),
            });
        }
        let mean = geometry::mean_coords(&coordsets).ok_or(DynamicsError::EmptyModeSet)?;
        if mean.is_empty() {
            return Err(DynamicsError::EmptyModeSet);
        }
        let dof = mean.len() * 3;
        let n_confs = coordsets.len();

        let centered = DMatrix::from_fn(n_confs, dof, |row, col| {
            coordsets[row][col / 3][col % 3] - mean[col / 3][col % 3]
        });
        let covariance = (centered.transpose() * &centered) / n_confs as f64;
        let total_variance = covariance.trace();

        debug!(n_confs, dof, total_variance, "Diagonalizing covariance matrix.");
        let eigen = SymmetricEigen::new(covariance.clone());

        let mut order: Vec<usize> = (0..dof)
            .filter(|&i| eigen.eigenvalues[i] > ZERO_VARIANCE)
            .collect();
        order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));
        if n_modes > 0 {
            order.truncate(n_modes);
        }

        let modes = order
            .iter()
            .enumerate()
            .map(|(index, &col)| {
                let vector = canonical_sign(eigen.eigenvectors.column(col).into_owned());
                Mode::new(index, eigen.eigenvalues[col], vector)
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(kept = modes.len(), "PCA modes calculated.");
        let modes = ModeSet::new(ensemble.title(), modes, total_variance)?;
        Ok(Self {
            mean,
            covariance,
            modes,
        })
    }

    pub fn modes(&self) -> &ModeSet {
        &self.modes
    }

    pub fn into_modes(self) -> ModeSet {
        self.modes
    }

    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Mean coordinates of the selected atoms.
    pub fn mean(&self) -> &Coords {
        &self.mean
    }
}

/// Eigenvectors are defined up to sign; make the largest component positive.
fn canonical_sign(vector: DVector<f64>) -> DVector<f64> {
    let pivot = vector.iter().copied().fold(0.0_f64, |acc, v| {
        if v.abs() > acc.abs() { v } else { acc }
    });
    if pivot < 0.0 { -vector } else { vector }
}
