pub mod analyze;
pub mod changelog;
pub mod superpose;

use crate::error::{CliError, Result};
use confsemble::core::io::pdb::{PdbFile, PdbMetadata};
use confsemble::core::io::traits::EnsembleFile;
use confsemble::core::models::ensemble::Ensemble;
use std::path::Path;
use tracing::info;

pub(crate) fn read_ensemble(path: &Path) -> Result<(Ensemble, PdbMetadata)> {
    info!("Loading input ensemble from {:?}", path);
    let (ensemble, metadata) = PdbFile::read_from_path(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    info!("Loaded {}", ensemble.summary());
    Ok((ensemble, metadata))
}

pub(crate) fn write_ensemble(ensemble: &Ensemble, metadata: &PdbMetadata, path: &Path) -> Result<()> {
    info!("Writing ensemble to {:?}", path);
    PdbFile::write_to_path(ensemble, metadata, path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
