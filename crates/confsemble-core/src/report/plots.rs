use super::ReportError;
use super::series::{Matrix, Series, one_based};
use crate::core::dynamics::analysis::{self, ScaleAxis};
use crate::core::dynamics::mode::{Mode, ModeSet};
use crate::core::models::ensemble::Ensemble;

fn mode_label(mode: &Mode) -> String {
    format!("Mode {}", mode.index() + 1)
}

fn mode_positions(modes: &ModeSet) -> Vec<f64> {
    modes.iter().map(|m| (m.index() + 1) as f64).collect()
}

fn check_atoms(first: &ModeSet, other: &ModeSet) -> Result<(), ReportError> {
    if first.n_atoms() != other.n_atoms() {
        return Err(ReportError::Dimension {
            expected: first.n_atoms(),
            found: other.n_atoms(),
        });
    }
    Ok(())
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

pub fn fract_vars(modes: &ModeSet) -> Series {
    Series::new(
        &format!("Fraction of variance for {}", modes.title()),
        "Mode index",
        "Fraction of variance",
        mode_positions(modes),
    )
    .with_column(modes.title(), analysis::fract_variance(modes))
}

pub fn cumul_fract_vars(modes: &ModeSet) -> Series {
    Series::new(
        &format!("Cumulative fraction of variance for {}", modes.title()),
        "Mode index",
        "Fraction of variance",
        mode_positions(modes),
    )
    .with_column(modes.title(), analysis::cumul_fract_variance(modes))
}

pub fn sq_flucts(modes: &ModeSet) -> Series {
    Series::new(
        modes.title(),
        "Indices",
        "Square fluctuations",
        one_based(modes.n_atoms()),
    )
    .with_column(modes.title(), analysis::sq_flucts(modes))
}

/// Square fluctuations of several mode sets, each after the first scaled to
/// the mean square fluctuation of the first.
pub fn scaled_sq_flucts(sets: &[&ModeSet]) -> Result<Series, ReportError> {
    let (first, rest) = sets
        .split_first()
        .ok_or(ReportError::Empty("scaled square fluctuations"))?;
    let reference = analysis::sq_flucts(first);
    let reference_mean = mean(&reference);

    let mut series = Series::new(
        "Scaled square fluctuations",
        "Indices",
        "Square fluctuations",
        one_based(first.n_atoms()),
    )
    .with_column(first.title(), reference);

    for modes in rest {
        check_atoms(first, modes)?;
        let sqf = analysis::sq_flucts(modes);
        let other_mean = mean(&sqf);
        let scale = if other_mean > 0.0 {
            reference_mean / other_mean
        } else {
            1.0
        };
        series = series.with_column(
            &format!("{} (x{:.2})", modes.title(), scale),
            sqf.into_iter().map(|v| v * scale).collect(),
        );
    }
    Ok(series)
}

/// Square fluctuations of several mode sets, each divided by its L2 norm.
pub fn normed_sq_flucts(sets: &[&ModeSet]) -> Result<Series, ReportError> {
    let first = sets
        .first()
        .ok_or(ReportError::Empty("normalized square fluctuations"))?;
    let mut series = Series::new(
        "Normalized square fluctuations",
        "Indices",
        "Square fluctuations",
        one_based(first.n_atoms()),
    );
    for modes in sets {
        check_atoms(first, modes)?;
        let sqf = analysis::sq_flucts(modes);
        let norm = sqf.iter().map(|v| v * v).sum::<f64>().sqrt();
        let normed = if norm > 0.0 {
            sqf.into_iter().map(|v| v / norm).collect()
        } else {
            sqf
        };
        series = series.with_column(modes.title(), normed);
    }
    Ok(series)
}

/// Per-atom x, y and z components of a mode vector.
pub fn mode_components(mode: &Mode) -> Series {
    let rows = mode.array_nx3();
    Series::new(&mode_label(mode), "Indices", "Component", one_based(rows.len()))
        .with_column("x", rows.iter().map(|v| v.x).collect())
        .with_column("y", rows.iter().map(|v| v.y).collect())
        .with_column("z", rows.iter().map(|v| v.z).collect())
}

/// Absolute overlap of `mode` with each mode of `modes`.
pub fn overlap(mode: &Mode, modes: &ModeSet) -> Result<Series, ReportError> {
    let values = modes
        .iter()
        .map(|m| analysis::overlap(mode.vector(), m.vector()).map(f64::abs))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Series::new(
        &format!("Overlap with {}", mode_label(mode)),
        &format!("{} mode index", modes.title()),
        "Overlap",
        mode_positions(modes),
    )
    .with_column("Overlap", values))
}

pub fn cumul_overlap(mode: &Mode, modes: &ModeSet) -> Result<Series, ReportError> {
    let values = analysis::cumulative_overlap(mode, modes)?;
    Ok(Series::new(
        &format!("Cumulative overlap with {}", mode_label(mode)),
        &format!("{} mode index", modes.title()),
        "Cumulative overlap",
        mode_positions(modes),
    )
    .with_column("Cumulative overlap", values))
}

/// Projection of each conformation onto each mode; x is the conformation number.
pub fn projection(ensemble: &Ensemble, modes: &ModeSet, rmsd: bool) -> Result<Series, ReportError> {
    let rows = analysis::projection(ensemble, modes, rmsd)?;
    let mut series = Series::new(
        &format!("Projection of {} onto {}", ensemble.title(), modes.title()),
        "Conformation",
        if rmsd { "RMSD (A)" } else { "Projection" },
        one_based(rows.len()),
    );
    for (k, mode) in modes.iter().enumerate() {
        series = series.with_column(
            &format!("{} coordinate", mode_label(mode)),
            rows.iter().map(|row| row[k]).collect(),
        );
    }
    Ok(series)
}

/// Scatter data of projections onto two modes; x holds the projection onto
/// `mode_x`.
pub fn cross_projection(
    ensemble: &Ensemble,
    mode_x: &Mode,
    mode_y: &Mode,
    scale: Option<ScaleAxis>,
    rmsd: bool,
) -> Result<Series, ReportError> {
    let projected = analysis::cross_projection(ensemble, mode_x, mode_y, scale, None, rmsd)?;
    let scaled = |axis: ScaleAxis, label: String| match (scale, projected.scalar) {
        (Some(a), Some(s)) if a == axis => format!("{} (x{:.2})", label, s),
        _ => label,
    };
    let x_label = scaled(ScaleAxis::X, format!("{} coordinate", mode_label(mode_x)));
    let y_label = scaled(ScaleAxis::Y, format!("{} coordinate", mode_label(mode_y)));
    Ok(Series::new(
        &format!("Cross projection of {}", ensemble.title()),
        &x_label,
        &y_label,
        projected.x,
    )
    .with_column(&y_label, projected.y))
}

/// Absolute overlaps; rows follow `modes_y`, columns follow `modes_x`.
pub fn overlap_table(modes_x: &ModeSet, modes_y: &ModeSet) -> Result<Matrix, ReportError> {
    let values = analysis::overlap_table(modes_y, modes_x)?
        .into_iter()
        .map(|row| row.into_iter().map(f64::abs).collect())
        .collect();
    Ok(Matrix {
        title: format!("Overlap of {} and {}", modes_y.title(), modes_x.title()),
        row_labels: modes_y.iter().map(mode_label).collect(),
        col_labels: modes_x.iter().map(mode_label).collect(),
        values,
    })
}

pub fn cross_corr(modes: &ModeSet) -> Matrix {
    cross_corr_matrix(modes.title(), analysis::cross_correlations(modes))
}

/// Labels precomputed per-atom cross-correlations with 1-based atom numbers.
pub fn cross_corr_matrix(title: &str, values: Vec<Vec<f64>>) -> Matrix {
    let labels: Vec<String> = (1..=values.len()).map(|i| i.to_string()).collect();
    Matrix {
        title: format!("Cross-correlations for {}", title),
        row_labels: labels.clone(),
        col_labels: labels,
        values,
    }
}

pub fn rmsd_series(title: &str, rmsds: &[f64]) -> Series {
    Series::new(
        &format!("RMSD from reference for {}", title),
        "Conformation",
        "RMSD (A)",
        one_based(rmsds.len()),
    )
    .with_column("RMSD", rmsds.to_vec())
}

pub fn rmsf_series(title: &str, rmsfs: &[f64]) -> Series {
    Series::new(
        &format!("RMSF for {}", title),
        "Indices",
        "RMSF (A)",
        one_based(rmsfs.len()),
    )
    .with_column("RMSF", rmsfs.to_vec())
}

pub fn pairwise_rmsd_matrix(title: &str, values: Vec<Vec<f64>>) -> Matrix {
    let labels: Vec<String> = (1..=values.len()).map(|i| i.to_string()).collect();
    Matrix {
        title: format!("Pairwise RMSD for {}", title),
        row_labels: labels.clone(),
        col_labels: labels,
        values,
    }
}

/// Element-wise `second - first`, e.g. to compare cross-correlations of two
/// mode sets. With `absolute` the magnitudes are reported. Labels are taken
/// from `second`.
pub fn diff_matrix(first: &Matrix, second: &Matrix, absolute: bool) -> Result<Matrix, ReportError> {
    let (rows, cols) = second.shape();
    if rows * cols == 0 {
        return Err(ReportError::Empty("difference matrix"));
    }
    if first.shape() != (rows, cols) {
        let (first_rows, first_cols) = first.shape();
        return Err(ReportError::Dimension {
            expected: rows * cols,
            found: first_rows * first_cols,
        });
    }

    let mut values = Vec::with_capacity(rows);
    for (a, b) in first.values.iter().zip(&second.values) {
        if a.len() != cols || b.len() != cols {
            return Err(ReportError::Dimension {
                expected: cols,
                found: if a.len() != cols { a.len() } else { b.len() },
            });
        }
        values.push(
            a.iter()
                .zip(b)
                .map(|(x, y)| if absolute { (y - x).abs() } else { y - x })
                .collect(),
        );
    }
    if values.len() != rows {
        return Err(ReportError::Dimension {
            expected: rows,
            found: values.len(),
        });
    }

    Ok(Matrix {
        title: "Difference Matrix".to_string(),
        row_labels: second.row_labels.clone(),
        col_labels: second.col_labels.clone(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{DVector, Point3};

    fn mode(index: usize, variance: f64, values: &[f64]) -> Mode {
        Mode::new(index, variance, DVector::from_row_slice(values)).unwrap()
    }

    fn set(title: &str, scale: f64) -> ModeSet {
        ModeSet::new(
            title,
            vec![
                mode(0, 3.0 * scale, &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0]),
                mode(1, 1.0 * scale, &[0.0, 1.0, 0.0, 0.0, 0.0, 0.0]),
            ],
            5.0 * scale,
        )
        .unwrap()
    }

    #[test]
    fn fract_vars_uses_one_based_mode_numbers() {
        let series = fract_vars(&set("pca", 1.0));
        assert_eq!(series.x, vec![1.0, 2.0]);
        assert_eq!(series.x_label, "Mode index");
        let column = series.column("pca").unwrap();
        assert!((column.values[0] - 0.6).abs() < 1e-12);

        let cumul = cumul_fract_vars(&set("pca", 1.0));
        assert!((cumul.columns[0].values[1] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn scaled_sq_flucts_matches_first_mean_and_labels_scale() {
        let a = set("a", 1.0);
        let b = set("b", 4.0);
        let series = scaled_sq_flucts(&[&a, &b]).unwrap();

        assert_eq!(series.columns.len(), 2);
        assert_eq!(series.columns[1].label, "b (x0.25)");
        let first_mean = mean(&series.columns[0].values);
        let second_mean = mean(&series.columns[1].values);
        assert!((first_mean - second_mean).abs() < 1e-12);
        assert!(matches!(scaled_sq_flucts(&[]), Err(ReportError::Empty(_))));
    }

    #[test]
    fn normed_sq_flucts_have_unit_norm() {
        let a = set("a", 1.0);
        let series = normed_sq_flucts(&[&a]).unwrap();
        let norm: f64 = series.columns[0].values.iter().map(|v| v * v).sum();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mismatched_atom_counts_are_rejected() {
        let a = set("a", 1.0);
        let small = ModeSet::new("s", vec![mode(0, 1.0, &[1.0, 0.0, 0.0])], 1.0).unwrap();
        assert!(matches!(
            normed_sq_flucts(&[&a, &small]),
            Err(ReportError::Dimension { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn mode_components_split_axes() {
        let m = mode(2, 1.0, &[0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let series = mode_components(&m);
        assert_eq!(series.title, "Mode 3");
        assert_eq!(series.column("y").unwrap().values, vec![1.0, 0.0]);
    }

    #[test]
    fn overlap_series_are_absolute() {
        let modes = set("pca", 1.0);
        let target = mode(0, 1.0, &[-1.0, 0.0, 0.0, -1.0, 0.0, 0.0]);
        let series = overlap(&target, &modes).unwrap();
        assert!((series.columns[0].values[0] - 1.0).abs() < 1e-12);

        let cumul = cumul_overlap(&target, &modes).unwrap();
        assert!((cumul.columns[0].values[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn overlap_table_rows_follow_y_modes() {
        let x = set("x", 1.0).select(&[0]).unwrap();
        let y = set("y", 1.0);
        let table = overlap_table(&x, &y).unwrap();
        assert_eq!(table.shape(), (2, 1));
        assert_eq!(table.row_labels, vec!["Mode 1", "Mode 2"]);
        assert!((table.values[0][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cross_corr_and_pairwise_matrices_are_square() {
        let cc = cross_corr(&set("pca", 1.0));
        assert_eq!(cc.shape(), (2, 2));
        assert_eq!(cc.title, "Cross-correlations for pca");

        let pairwise = pairwise_rmsd_matrix("e", vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
        assert_eq!(pairwise.col_labels, vec!["1", "2"]);
    }

    #[test]
    fn projection_series_has_column_per_mode() {
        let mut ensemble = Ensemble::new("pair");
        ensemble
            .set_reference(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)])
            .unwrap();
        ensemble
            .add_coordsets(vec![
                vec![Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)],
                vec![Point3::new(0.0, 1.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
            ])
            .unwrap();
        let modes = set("pca", 1.0);

        let series = projection(&ensemble, &modes, false).unwrap();
        assert_eq!(series.x, vec![1.0, 2.0]);
        assert_eq!(series.columns.len(), 2);
        assert_eq!(series.columns[0].label, "Mode 1 coordinate");
        assert!((series.columns[0].values[0] - 2.0_f64.sqrt()).abs() < 1e-12);

        let (m1, m2) = (modes.get(0).unwrap(), modes.get(1).unwrap());
        let scatter = cross_projection(&ensemble, m1, m2, Some(ScaleAxis::Y), false).unwrap();
        assert_eq!(scatter.x_label, "Mode 1 coordinate");
        assert!(scatter.y_label.starts_with("Mode 2 coordinate (x"));
    }

    #[test]
    fn rmsd_and_rmsf_series() {
        let rmsd = rmsd_series("e", &[0.5, 1.5]);
        assert_eq!(rmsd.len(), 2);
        assert_eq!(rmsd.columns[0].label, "RMSD");
        let rmsf = rmsf_series("e", &[0.1, 0.2, 0.3]);
        assert_eq!(rmsf.x, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn diff_matrix_subtracts_first_from_second() {
        let first = cross_corr_matrix("a", vec![vec![1.0, 0.5], vec![0.5, 1.0]]);
        let second = cross_corr_matrix("b", vec![vec![1.0, -0.25], vec![-0.25, 1.0]]);

        let diff = diff_matrix(&first, &second, false).unwrap();
        assert_eq!(diff.title, "Difference Matrix");
        assert_eq!(diff.shape(), (2, 2));
        assert_eq!(diff.values, vec![vec![0.0, -0.75], vec![-0.75, 0.0]]);

        let abs = diff_matrix(&first, &second, true).unwrap();
        assert_eq!(abs.values[0][1], 0.75);
    }

    #[test]
    fn diff_matrix_rejects_mismatched_or_empty_input() {
        let two = pairwise_rmsd_matrix("two", vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
        let three = pairwise_rmsd_matrix("three", vec![vec![0.0; 3]; 3]);
        assert!(matches!(
            diff_matrix(&two, &three, false),
            Err(ReportError::Dimension { expected: 9, found: 4 })
        ));

        let empty = pairwise_rmsd_matrix("empty", Vec::new());
        assert!(matches!(
            diff_matrix(&empty, &empty, false),
            Err(ReportError::Empty(_))
        ));
    }
}
