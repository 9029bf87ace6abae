use super::ReportError;
use super::series::{Matrix, Series};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Writes a series as CSV: a header row `x_label, column labels...` followed
/// by one row per x value.
pub fn write_series_csv(series: &Series, writer: impl Write) -> Result<(), ReportError> {
    for column in &series.columns {
        if column.values.len() != series.x.len() {
            return Err(ReportError::Dimension {
                expected: series.x.len(),
                found: column.values.len(),
            });
        }
    }

    let mut csv = csv::Writer::from_writer(writer);
    let mut header = vec![series.x_label.as_str()];
    header.extend(series.columns.iter().map(|c| c.label.as_str()));
    csv.write_record(&header)?;

    for (i, x) in series.x.iter().enumerate() {
        let mut record = vec![x.to_string()];
        record.extend(series.columns.iter().map(|c| c.values[i].to_string()));
        csv.write_record(&record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes a matrix as CSV with column labels in the header and the row label
/// leading each row.
pub fn write_matrix_csv(matrix: &Matrix, writer: impl Write) -> Result<(), ReportError> {
    let (n_rows, n_cols) = matrix.shape();
    if matrix.values.len() != n_rows {
        return Err(ReportError::Dimension {
            expected: n_rows,
            found: matrix.values.len(),
        });
    }
    if let Some(row) = matrix.values.iter().find(|row| row.len() != n_cols) {
        return Err(ReportError::Dimension {
            expected: n_cols,
            found: row.len(),
        });
    }

    let mut csv = csv::Writer::from_writer(writer);
    let mut header = vec![""];
    header.extend(matrix.col_labels.iter().map(String::as_str));
    csv.write_record(&header)?;

    for (label, row) in matrix.row_labels.iter().zip(&matrix.values) {
        let mut record = vec![label.clone()];
        record.extend(row.iter().map(f64::to_string));
        csv.write_record(&record)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_series_csv_to_path<P: AsRef<Path>>(series: &Series, path: P) -> Result<(), ReportError> {
    let path = path.as_ref();
    debug!(path = %path.display(), title = %series.title, "Writing series.");
    write_series_csv(series, File::create(path)?)
}

pub fn write_matrix_csv_to_path<P: AsRef<Path>>(matrix: &Matrix, path: P) -> Result<(), ReportError> {
    let path = path.as_ref();
    debug!(path = %path.display(), title = %matrix.title, "Writing matrix.");
    write_matrix_csv(matrix, File::create(path)?)
}
