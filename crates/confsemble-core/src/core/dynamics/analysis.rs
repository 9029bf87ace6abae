use super::DynamicsError;
use super::mode::{Mode, ModeSet};
use crate::core::models::ensemble::{Ensemble, EnsembleError};
use nalgebra::DVector;

/// Fraction of the total variance carried by each mode.
pub fn fract_variance(modes: &ModeSet) -> Vec<f64> {
    let total = modes.total_variance();
    modes
        .iter()
        .map(|m| if total > 0.0 { m.variance() / total } else { 0.0 })
        .collect()
}

pub fn cumul_fract_variance(modes: &ModeSet) -> Vec<f64> {
    fract_variance(modes)
        .into_iter()
        .scan(0.0, |acc, f| {
            *acc += f;
            Some(*acc)
        })
        .collect()
}

/// Per-atom square fluctuations summed over all modes of the set.
pub fn sq_flucts(modes: &ModeSet) -> Vec<f64> {
    let mut total = vec![0.0; modes.n_atoms()];
    for mode in modes {
        for (acc, value) in total.iter_mut().zip(mode.sq_flucts()) {
            *acc += value;
        }
    }
    total
}

/// Flattened deviations of every conformation from the reference, for the
/// selected atoms.
fn flattened_deviations(ensemble: &Ensemble) -> Result<Vec<DVector<f64>>, DynamicsError> {
    if ensemble.is_empty() {
        return Err(EnsembleError::NoConformations.into());
    }
    let deviations = ensemble.deviations().ok_or(EnsembleError::NoReference)?;
    Ok(deviations
        .into_iter()
        .map(|set| DVector::from_iterator(set.len() * 3, set.into_iter().flat_map(|d| [d.x, d.y, d.z])))
        .collect())
}

fn check_dimension(expected: usize, mode: &Mode) -> Result<(), DynamicsError> {
    if mode.vector().len() != expected {
        return Err(DynamicsError::DimensionMismatch {
            expected,
            found: mode.vector().len(),
        });
    }
    Ok(())
}

/// Projection of each conformation's deviation onto each mode; one row per
/// conformation, one column per mode.
///
/// With `rmsd` the values are divided by the square root of the number of
/// selected atoms, turning them into RMSD-like distances along the mode.
pub fn projection(
    ensemble: &Ensemble,
    modes: &ModeSet,
    rmsd: bool,
) -> Result<Vec<Vec<f64>>, DynamicsError> {
    let dof = ensemble.num_selected() * 3;
    for mode in modes {
        check_dimension(dof, mode)?;
    }
    let scale = if rmsd {
        (ensemble.num_selected() as f64).sqrt()
    } else {
        1.0
    };
    Ok(flattened_deviations(ensemble)?
        .iter()
        .map(|d| modes.iter().map(|m| d.dot(m.vector()) / scale).collect())
        .collect())
}

/// Cosine of the angle between two vectors of equal length.
pub fn overlap(a: &DVector<f64>, b: &DVector<f64>) -> Result<f64, DynamicsError> {
    if a.len() != b.len() {
        return Err(DynamicsError::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    let norms = a.norm() * b.norm();
    Ok(if norms > 0.0 { a.dot(b) / norms } else { 0.0 })
}

/// Overlaps between every mode of `rows` and every mode of `cols`.
pub fn overlap_table(rows: &ModeSet, cols: &ModeSet) -> Result<Vec<Vec<f64>>, DynamicsError> {
    rows.iter()
        .map(|r| {
            cols.iter()
                .map(|c| overlap(r.vector(), c.vector()))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

/// Square root of the running sum of squared overlaps between `mode` and
/// each mode of `modes`, in order.
pub fn cumulative_overlap(mode: &Mode, modes: &ModeSet) -> Result<Vec<f64>, DynamicsError> {
    let mut acc = 0.0;
    modes
        .iter()
        .map(|m| {
            let o = overlap(mode.vector(), m.vector())?;
            acc += o * o;
            Ok(acc.sqrt())
        })
        .collect()
}

/// Normalized per-atom cross-correlations, `C_ij / sqrt(C_ii * C_jj)` with
/// `C_ij = sum_k variance_k * (v_ik . v_jk)`.
pub fn cross_correlations(modes: &ModeSet) -> Vec<Vec<f64>> {
    let n = modes.n_atoms();
    let mut cov = vec![vec![0.0; n]; n];
    for mode in modes {
        let rows = mode.array_nx3();
        for i in 0..n {
            for j in i..n {
                let value = mode.variance() * rows[i].dot(&rows[j]);
                cov[i][j] += value;
                if i != j {
                    cov[j][i] += value;
                }
            }
        }
    }
    let diag: Vec<f64> = (0..n).map(|i| cov[i][i].sqrt()).collect();
    for i in 0..n {
        for j in 0..n {
            let norm = diag[i] * diag[j];
            cov[i][j] = if norm > 0.0 { cov[i][j] / norm } else { 0.0 };
        }
    }
    cov
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleAxis {
    X,
    Y,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossProjection {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Factor applied to the scaled axis, if any.
    pub scalar: Option<f64>,
}

/// Projections onto two modes, possibly from different mode sets.
///
/// When `scale` names an axis, that axis is multiplied by a factor that
/// makes the widths of both projections equal and their correlation
/// positive. An explicit `scalar` replaces the computed factor.
pub fn cross_projection(
    ensemble: &Ensemble,
    mode_x: &Mode,
    mode_y: &Mode,
    scale: Option<ScaleAxis>,
    scalar: Option<f64>,
    rmsd: bool,
) -> Result<CrossProjection, DynamicsError> {
    let single = |mode: &Mode| -> Result<Vec<f64>, DynamicsError> {
        let set = ModeSet::new("", vec![mode.clone()], mode.variance())?;
        Ok(projection(ensemble, &set, rmsd)?
            .into_iter()
            .map(|row| row[0])
            .collect())
    };
    let mut x = single(mode_x)?;
    let mut y = single(mode_y)?;

    let Some(axis) = scale else {
        return Ok(CrossProjection { x, y, scalar: None });
    };

    let factor = match scalar {
        Some(s) => s,
        None => {
            let width = |v: &[f64]| {
                let max = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let min = v.iter().copied().fold(f64::INFINITY, f64::min);
                max - min
            };
            let (wx, wy) = (width(&x), width(&y));
            let sign = x.iter().zip(&y).map(|(a, b)| a * b).sum::<f64>().signum();
            match axis {
                ScaleAxis::Y if wy > 0.0 => sign * wx / wy,
                ScaleAxis::X if wx > 0.0 => sign * wy / wx,
                _ => 1.0,
            }
        }
    };
    match axis {
        ScaleAxis::X => x.iter_mut().for_each(|v| *v *= factor),
        ScaleAxis::Y => y.iter_mut().for_each(|v| *v *= factor),
    }
    Ok(CrossProjection {
        x,
        y,
        scalar: Some(factor),
    })
}
