use crate::core::models::ensemble::Ensemble;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing ensemble file formats.
///
/// Implementors handle format-specific parsing and serialization; the
/// provided methods add file-path convenience on top.
pub trait EnsembleFile {
    /// Format-specific data that is not part of the ensemble itself
    /// (e.g., header records), kept so that it can be written back.
    type Metadata;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads an ensemble and associated metadata from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<(Ensemble, Self::Metadata), Self::Error>;

    /// Writes an ensemble and metadata to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the ensemble cannot be represented in the format
    /// or writing fails.
    fn write_to(
        ensemble: &Ensemble,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Writes an ensemble without metadata.
    fn write_ensemble_to(ensemble: &Ensemble, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads an ensemble from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<(Ensemble, Self::Metadata), Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes an ensemble and metadata to a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(
        ensemble: &Ensemble,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(ensemble, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes an ensemble to a file path without metadata.
    fn write_ensemble_to_path<P: AsRef<Path>>(ensemble: &Ensemble, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_ensemble_to(ensemble, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
