use super::topology::{AtomRecord, Topology};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const BACKBONE_ATOM_NAMES: [&str; 4] = ["N", "CA", "C", "O"];

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SelectionError {
    #[error("Invalid selection expression '{0}'")]
    Parse(String),
    #[error("Selection '{0}' does not match any atom")]
    EmptySelection(String),
    #[error("Atom index {index} is out of range for {n_atoms} atoms")]
    IndexOutOfRange { index: usize, n_atoms: usize },
    #[error("Selection indices must be strictly increasing")]
    Unordered,
    #[error("Selection '{0}' requires atom records (topology) to be set")]
    TopologyRequired(String),
}

/// A declarative atom selection, resolved against a [`Topology`] into a [`Selection`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AtomSelection {
    #[default]
    All,
    CalphaOnly,
    Backbone,
    Heavy,
    Chain(char),
    Names(Vec<String>),
    Residues {
        chain_id: Option<char>,
        start: isize,
        end: isize,
    },
    Indices(Vec<usize>),
}

impl AtomSelection {
    fn matches(&self, index: usize, atom: &AtomRecord) -> bool {
        match self {
            AtomSelection::All => true,
            AtomSelection::CalphaOnly => atom.name == "CA" && !atom.is_hetero,
            AtomSelection::Backbone => {
                !atom.is_hetero && BACKBONE_ATOM_NAMES.contains(&atom.name.as_str())
            }
            AtomSelection::Heavy => !atom.is_hydrogen(),
            AtomSelection::Chain(chain_id) => atom.chain_id == *chain_id,
            AtomSelection::Names(names) => names.iter().any(|n| *n == atom.name),
            AtomSelection::Residues {
                chain_id,
                start,
                end,
            } => {
                chain_id.is_none_or(|c| c == atom.chain_id)
                    && (*start..=*end).contains(&atom.residue_number)
            }
            AtomSelection::Indices(indices) => indices.contains(&index),
        }
    }

    /// Resolves the expression into sorted atom indices.
    ///
    /// `All` and `Indices` can be resolved without atom records; every other
    /// variant needs a topology.
    pub fn resolve(
        &self,
        topology: Option<&Topology>,
        n_atoms: usize,
    ) -> Result<Selection, SelectionError> {
        let indices: Vec<usize> = match (self, topology) {
            (AtomSelection::All, _) => (0..n_atoms).collect(),
            (AtomSelection::Indices(indices), _) => {
                let mut sorted = indices.clone();
                sorted.sort_unstable();
                sorted.dedup();
                sorted
            }
            (_, Some(topology)) => topology
                .atoms()
                .iter()
                .enumerate()
                .filter(|(i, atom)| self.matches(*i, atom))
                .map(|(i, _)| i)
                .collect(),
            (_, None) => return Err(SelectionError::TopologyRequired(self.to_string())),
        };

        if indices.is_empty() {
            return Err(SelectionError::EmptySelection(self.to_string()));
        }
        Selection::new(indices, n_atoms)
    }
}

impl fmt::Display for AtomSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomSelection::All => write!(f, "all"),
            AtomSelection::CalphaOnly => write!(f, "calpha"),
            AtomSelection::Backbone => write!(f, "backbone"),
            AtomSelection::Heavy => write!(f, "heavy"),
            AtomSelection::Chain(c) => write!(f, "chain {}", c),
            AtomSelection::Names(names) => write!(f, "name {}", names.join(" ")),
            AtomSelection::Residues {
                chain_id: Some(c),
                start,
                end,
            } => write!(f, "resnum {} {} {}", c, start, end),
            AtomSelection::Residues {
                chain_id: None,
                start,
                end,
            } => write!(f, "resnum {} {}", start, end),
            AtomSelection::Indices(indices) => {
                let parts: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
                write!(f, "index {}", parts.join(" "))
            }
        }
    }
}

impl FromStr for AtomSelection {
    type Err = SelectionError;

    /// Parses expressions such as `all`, `calpha`, `backbone`, `heavy`,
    /// `chain A`, `name CA CB`, `resnum A 10 20`, `resnum 10 20` or `index 0 4 7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || SelectionError::Parse(s.to_string());
        let tokens: Vec<&str> = s.split_whitespace().collect();
        let (keyword, args) = tokens.split_first().ok_or_else(err)?;

        match (keyword.to_ascii_lowercase().as_str(), args) {
            ("all", []) => Ok(AtomSelection::All),
            ("calpha" | "ca", []) => Ok(AtomSelection::CalphaOnly),
            ("backbone" | "bb", []) => Ok(AtomSelection::Backbone),
            ("heavy" | "noh", []) => Ok(AtomSelection::Heavy),
            ("chain", [chain]) => {
                let mut chars = chain.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(AtomSelection::Chain(c)),
                    _ => Err(err()),
                }
            }
            ("name", names) if !names.is_empty() => Ok(AtomSelection::Names(
                names.iter().map(|n| n.to_string()).collect(),
            )),
            ("resnum", [start, end]) => Ok(AtomSelection::Residues {
                chain_id: None,
                start: start.parse().map_err(|_| err())?,
                end: end.parse().map_err(|_| err())?,
            }),
            ("resnum", [chain, start, end]) => {
                let mut chars = chain.chars();
                let chain_id = match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => return Err(err()),
                };
                Ok(AtomSelection::Residues {
                    chain_id: Some(chain_id),
                    start: start.parse().map_err(|_| err())?,
                    end: end.parse().map_err(|_| err())?,
                })
            }
            ("index", indices) if !indices.is_empty() => indices
                .iter()
                .map(|i| i.parse::<usize>().map_err(|_| err()))
                .collect::<Result<Vec<_>, _>>()
                .map(AtomSelection::Indices),
            _ => Err(err()),
        }
    }
}

/// A resolved set of atom indices: sorted, unique and within range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    indices: Vec<usize>,
}

impl Selection {
    /// Creates a selection from strictly increasing indices below `n_atoms`.
    pub fn new(indices: Vec<usize>, n_atoms: usize) -> Result<Self, SelectionError> {
        if indices.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SelectionError::Unordered);
        }
        if let Some(&index) = indices.iter().find(|&&i| i >= n_atoms) {
            return Err(SelectionError::IndexOutOfRange { index, n_atoms });
        }
        Ok(Self { indices })
    }

    pub fn all(n_atoms: usize) -> Self {
        Self {
            indices: (0..n_atoms).collect(),
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    pub fn covers_all(&self, n_atoms: usize) -> bool {
        self.indices.len() == n_atoms
    }

    /// Picks the selected items out of a per-atom slice.
    pub fn gather<T: Clone>(&self, items: &[T]) -> Vec<T> {
        self.indices.iter().map(|&i| items[i].clone()).collect()
    }
}
