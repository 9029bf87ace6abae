use super::selection::Selection;
use crate::core::utils::elements::{atomic_mass, infer_element};
use thiserror::Error;

/// Descriptive data of one atom, independent of its coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomRecord {
    /// The serial number as found in the input file.
    pub serial: usize,
    /// The atom name (e.g., "CA", "N", "OG1").
    pub name: String,
    /// The three-letter residue name (e.g., "ALA").
    pub residue_name: String,
    /// The single-character chain identifier.
    pub chain_id: char,
    /// The residue sequence number.
    pub residue_number: isize,
    /// Optional residue insertion code.
    pub insertion_code: Option<char>,
    /// The element symbol, possibly empty when the input did not provide one.
    pub element: String,
    /// Whether the atom came from a HETATM record.
    pub is_hetero: bool,
}

impl AtomRecord {
    pub fn new(
        serial: usize,
        name: &str,
        residue_name: &str,
        chain_id: char,
        residue_number: isize,
    ) -> Self {
        Self {
            serial,
            name: name.to_string(),
            residue_name: residue_name.to_string(),
            chain_id,
            residue_number,
            insertion_code: None,
            element: String::new(),
            is_hetero: false,
        }
    }

    /// The element symbol, inferred from the atom name when not given explicitly.
    pub fn element_symbol(&self) -> Option<String> {
        if self.element.trim().is_empty() {
            infer_element(&self.name, self.is_hetero)
        } else {
            Some(self.element.trim().to_ascii_uppercase())
        }
    }

    pub fn is_hydrogen(&self) -> bool {
        matches!(self.element_symbol().as_deref(), Some("H") | Some("D"))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Cannot determine the mass of atom {serial} ('{name}'): unknown element")]
    UnknownElement { serial: usize, name: String },
}

/// The ordered list of atoms shared by all conformations of an ensemble.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    pub title: String,
    atoms: Vec<AtomRecord>,
}

impl Topology {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            atoms: Vec::new(),
        }
    }

    pub fn from_atoms(title: &str, atoms: Vec<AtomRecord>) -> Self {
        Self {
            title: title.to_string(),
            atoms,
        }
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atoms(&self) -> &[AtomRecord] {
        &self.atoms
    }

    pub fn atom(&self, index: usize) -> Option<&AtomRecord> {
        self.atoms.get(index)
    }

    pub fn push(&mut self, atom: AtomRecord) {
        self.atoms.push(atom);
    }

    /// Returns a new topology containing only the atoms of `selection`.
    pub fn subset(&self, selection: &Selection) -> Topology {
        Topology {
            title: self.title.clone(),
            atoms: selection.gather(&self.atoms),
        }
    }

    /// Atomic masses of all atoms, in the topology order.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownElement`] for the first atom whose
    /// element cannot be determined or has no tabulated mass.
    pub fn masses(&self) -> Result<Vec<f64>, TopologyError> {
        self.atoms
            .iter()
            .map(|atom| {
                atom.element_symbol()
                    .and_then(|symbol| atomic_mass(&symbol))
                    .ok_or_else(|| TopologyError::UnknownElement {
                        serial: atom.serial,
                        name: atom.name.clone(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(serial: usize, name: &str) -> AtomRecord {
        AtomRecord::new(serial, name, "ALA", 'A', 1)
    }

    #[test]
    fn element_symbol_prefers_explicit_element() {
        let mut record = atom(1, "CA");
        assert_eq!(record.element_symbol().as_deref(), Some("C"));
        record.element = "ca".to_string();
        assert_eq!(record.element_symbol().as_deref(), Some("CA"));
    }

    #[test]
    fn hydrogen_detection_uses_inferred_element() {
        assert!(atom(1, "HB1").is_hydrogen());
        assert!(!atom(2, "CB").is_hydrogen());
    }

    #[test]
    fn masses_are_returned_in_atom_order() {
        let topology = Topology::from_atoms("t", vec![atom(1, "N"), atom(2, "CA"), atom(3, "O")]);
        let masses = topology.masses().unwrap();
        assert_eq!(masses, vec![14.007, 12.011, 15.999]);
    }

    #[test]
    fn masses_fail_for_unknown_element() {
        let topology = Topology::from_atoms("t", vec![atom(1, "N"), atom(7, "X1")]);
        assert_eq!(
            topology.masses(),
            Err(TopologyError::UnknownElement {
                serial: 7,
                name: "X1".to_string()
            })
        );
    }

    #[test]
    fn subset_keeps_selected_atoms_in_order() {
        let topology = Topology::from_atoms("t", vec![atom(1, "N"), atom(2, "CA"), atom(3, "C")]);
        let selection = Selection::new(vec![0, 2], 3).unwrap();
        let subset = topology.subset(&selection);
        assert_eq!(subset.len(), 2);
        assert_eq!(subset.atom(1).unwrap().name, "C");
        assert_eq!(subset.title, "t");
    }
}
