use crate::core::io::traits::EnsembleFile;
use crate::core::models::ensemble::{Coords, Ensemble, EnsembleError};
use crate::core::models::topology::{AtomRecord, Topology};
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, warn};

const MIN_COORDINATE_LINE_LENGTH: usize = 54;
const DEFAULT_TITLE: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdbMetadata {
    /// Records preceding the first coordinate record, written back verbatim.
    pub header_lines: Vec<String>,
    /// Text of the TITLE records, if any.
    pub title: Option<String>,
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Inconsistent model on line {line}: {message}")]
    Inconsistency { line: usize, message: String },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error("Atom records are required to write PDB files")]
    MissingTopology,
    #[error("Invalid ensemble: {0}")]
    Ensemble(#[from] EnsembleError),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 54 chars)")]
    LineTooShort,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn column_char(line: &str, index: usize) -> Option<char> {
    line.get(index..index + 1)
        .and_then(|s| s.chars().next())
        .filter(|c| !c.is_whitespace())
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

struct ParsedAtom {
    record: AtomRecord,
    position: Point3<f64>,
}

fn parse_atom_line(line: &str, line_num: usize, record_type: &str) -> Result<ParsedAtom, PdbError> {
    if line.len() < MIN_COORDINATE_LINE_LENGTH {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::LineTooShort,
        });
    }

    let serial_str = slice_and_trim(line, 6, 11);
    let name_str = slice_and_trim(line, 12, 16);
    let res_name_str = slice_and_trim(line, 17, 20);
    let res_seq_str = slice_and_trim(line, 22, 26);
    let element_str = slice_and_trim(line, 76, 78);

    if name_str.is_empty() {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::MissingRequiredField {
                columns: "13-16".into(),
            },
        });
    }
    let serial: usize = serial_str.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: "7-11".into(),
            value: serial_str.into(),
        },
    })?;
    let residue_number: isize = res_seq_str.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: "23-26".into(),
            value: res_seq_str.into(),
        },
    })?;
    let x = parse_float(line, line_num, 30, 38)?;
    let y = parse_float(line, line_num, 38, 46)?;
    let z = parse_float(line, line_num, 46, 54)?;

    let mut record = AtomRecord::new(
        serial,
        name_str,
        res_name_str,
        column_char(line, 21).unwrap_or(' '),
        residue_number,
    );
    record.insertion_code = column_char(line, 26);
    record.element = element_str.to_string();
    record.is_hetero = record_type == "HETATM";

    Ok(ParsedAtom {
        record,
        position: Point3::new(x, y, z),
    })
}

/// Accumulates coordinate records model by model; the first model defines
/// the atom records, later models must repeat them in the same order.
#[derive(Default)]
struct ModelCollector {
    topology: Vec<AtomRecord>,
    models: Vec<Coords>,
    current: Coords,
}

impl ModelCollector {
    fn push(&mut self, atom: ParsedAtom, line_num: usize) -> Result<(), PdbError> {
        if self.models.is_empty() {
            self.topology.push(atom.record);
        } else {
            let index = self.current.len();
            match self.topology.get(index) {
                Some(expected) if expected.name == atom.record.name => {}
                Some(expected) => {
                    return Err(PdbError::Inconsistency {
                        line: line_num,
                        message: format!(
                            "atom {} of model {} is '{}', expected '{}'",
                            index + 1,
                            self.models.len() + 1,
                            atom.record.name,
                            expected.name
                        ),
                    });
                }
                None => {
                    return Err(PdbError::Inconsistency {
                        line: line_num,
                        message: format!(
                            "model {} has more atoms than the first model ({})",
                            self.models.len() + 1,
                            self.topology.len()
                        ),
                    });
                }
            }
        }
        self.current.push(atom.position);
        Ok(())
    }

    fn finish_model(&mut self, line_num: usize) -> Result<(), PdbError> {
        if self.current.is_empty() {
            warn!(line = line_num, "Skipping model without coordinate records.");
            return Ok(());
        }
        if self.current.len() != self.topology.len() {
            return Err(PdbError::Inconsistency {
                line: line_num,
                message: format!(
                    "model {} has {} atoms, expected {}",
                    self.models.len() + 1,
                    self.current.len(),
                    self.topology.len()
                ),
            });
        }
        self.models.push(std::mem::take(&mut self.current));
        Ok(())
    }
}

pub struct PdbFile;

impl PdbFile {
    fn format_atom_line(record: &AtomRecord, position: &Point3<f64>) -> String {
        let record_type = if record.is_hetero { "HETATM" } else { "ATOM" };
        let name_field = if record.name.len() < 4 {
            format!(" {:<3}", record.name)
        } else {
            record.name.clone()
        };
        let element = record.element_symbol().unwrap_or_default();
        format!(
            "{:<6}{:>5} {:<4} {:>3} {}{:>4}{}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
            record_type,
            record.serial % 100_000,
            name_field,
            record.residue_name,
            record.chain_id,
            record.residue_number,
            record.insertion_code.unwrap_or(' '),
            position.x,
            position.y,
            position.z,
            1.0,
            0.0,
            element
        )
    }

    fn write_coordset(
        topology: &Topology,
        coords: &[Point3<f64>],
        writer: &mut impl Write,
    ) -> Result<(), PdbError> {
        for (record, position) in topology.atoms().iter().zip(coords) {
            writeln!(writer, "{}", Self::format_atom_line(record, position))?;
        }
        Ok(())
    }
}

impl EnsembleFile for PdbFile {
    type Metadata = PdbMetadata;
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Ensemble, Self::Metadata), Self::Error> {
        let mut metadata = PdbMetadata::default();
        let mut collector = ModelCollector::default();
        let mut title_parts: Vec<String> = Vec::new();
        let mut classification: Option<String> = None;
        let mut seen_coordinates = false;
        let mut last_line = 0;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            last_line = line_num;
            let record_type = slice_and_trim(&line, 0, 6);

            match record_type {
                "ATOM" | "HETATM" => {
                    seen_coordinates = true;
                    if let Some(alt_loc) = column_char(&line, 16) {
                        if alt_loc != 'A' {
                            continue;
                        }
                    }
                    let atom = parse_atom_line(&line, line_num, record_type)?;
                    collector.push(atom, line_num)?;
                }
                "MODEL" => {
                    seen_coordinates = true;
                    if !collector.current.is_empty() {
                        collector.finish_model(line_num)?;
                    }
                }
                "ENDMDL" => collector.finish_model(line_num)?,
                "TER" | "ANISOU" | "CONECT" | "MASTER" | "END" => {}
                _ => {
                    match record_type {
                        "TITLE" => title_parts.push(slice_and_trim(&line, 10, 80).to_string()),
                        "HEADER" => {
                            let text = slice_and_trim(&line, 10, 50);
                            if !text.is_empty() && classification.is_none() {
                                classification = Some(text.to_string());
                            }
                        }
                        _ => {}
                    }
                    if !seen_coordinates && !line.trim().is_empty() {
                        metadata.header_lines.push(line);
                    }
                }
            }
        }
        if !collector.current.is_empty() {
            collector.finish_model(last_line)?;
        }

        if collector.models.is_empty() {
            return Err(PdbError::MissingRecord("ATOM/HETATM".to_string()));
        }

        if !title_parts.is_empty() {
            metadata.title = Some(title_parts.join(" "));
        }
        // HEADER classification (columns 11-50) stands in for a missing TITLE
        let title = metadata
            .title
            .as_deref()
            .or(classification.as_deref())
            .unwrap_or(DEFAULT_TITLE);

        debug!(
            models = collector.models.len(),
            atoms = collector.topology.len(),
            "Parsed PDB ensemble."
        );

        let topology = Topology::from_atoms(title, collector.topology);
        let ensemble = Ensemble::from_topology(topology, collector.models)?;
        Ok((ensemble, metadata))
    }

    fn write_to(
        ensemble: &Ensemble,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        for line in &metadata.header_lines {
            writeln!(writer, "{}", line)?;
        }
        Self::write_ensemble_to(ensemble, writer)
    }

    fn write_ensemble_to(ensemble: &Ensemble, writer: &mut impl Write) -> Result<(), Self::Error> {
        let topology = ensemble.topology().ok_or(PdbError::MissingTopology)?;

        if ensemble.is_empty() {
            let reference = ensemble
                .reference(false)
                .ok_or(EnsembleError::NoReference)?;
            Self::write_coordset(topology, &reference, writer)?;
        } else {
            for (i, coords) in ensemble.coordsets(false).iter().enumerate() {
                writeln!(writer, "MODEL     {:>4}", i + 1)?;
                Self::write_coordset(topology, coords, writer)?;
                writeln!(writer, "ENDMDL")?;
            }
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}
