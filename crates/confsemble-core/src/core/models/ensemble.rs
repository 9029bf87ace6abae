use super::conformation::Conformation;
use super::selection::{AtomSelection, Selection, SelectionError};
use super::topology::Topology;
use crate::core::utils::geometry;
use nalgebra::{Point3, Vector3};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Add;
use thiserror::Error;
use tracing::{info, warn};

/// Coordinates of every atom in one coordinate set, in topology order.
pub type Coords = Vec<Point3<f64>>;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum EnsembleError {
    #[error("Atom count mismatch: expected {expected} atoms, found {found}")]
    AtomCountMismatch { expected: usize, found: usize },

    #[error("Coordinate sets must contain at least one atom")]
    EmptyCoordinates,

    #[error("Reference coordinates are not set")]
    NoReference,

    #[error("Atoms are not set; first set reference coordinates")]
    NoAtoms,

    #[error("Conformations are not set")]
    NoConformations,

    #[error("Conformation index {index} is out of range for {len} conformations")]
    IndexOutOfRange { index: isize, len: usize },

    #[error("Slice step cannot be zero")]
    ZeroSliceStep,

    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),
}

/// A conformational ensemble: reference coordinates plus any number of
/// coordinate sets of the same atoms.
///
/// A subset of atoms can be selected with [`Ensemble::select`]. Once a
/// selection is set, coordinate requests, RMSD/RMSF calculations and
/// superposition consider only the selected atoms, while transformations are
/// still applied to every atom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ensemble {
    title: String,
    reference: Option<Coords>,
    n_atoms: usize,
    coordsets: Vec<Coords>,
    weights: Option<Vec<f64>>,
    topology: Option<Topology>,
    selection: Option<Selection>,
}

impl Ensemble {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            ..Default::default()
        }
    }

    /// Builds an ensemble from atom records and their coordinate sets.
    ///
    /// The first coordinate set becomes the reference and every set,
    /// including the first, is added as a conformation.
    pub fn from_topology(topology: Topology, coordsets: Vec<Coords>) -> Result<Self, EnsembleError> {
        let mut ensemble = Ensemble::new(&topology.title);
        ensemble.set_topology(Some(topology))?;
        if let Some(first) = coordsets.first() {
            ensemble.set_reference(first.clone())?;
        }
        ensemble.add_coordsets(coordsets)?;
        Ok(ensemble)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn num_atoms(&self) -> usize {
        self.n_atoms
    }

    pub fn num_confs(&self) -> usize {
        self.coordsets.len()
    }

    pub fn len(&self) -> usize {
        self.coordsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordsets.is_empty()
    }

    /// Number of selected atoms, or of all atoms when no selection is set.
    pub fn num_selected(&self) -> usize {
        self.selection.as_ref().map_or(self.n_atoms, Selection::len)
    }

    pub fn is_selected(&self) -> bool {
        self.selection.is_some()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn topology(&self) -> Option<&Topology> {
        self.topology.as_ref()
    }

    /// Atom records of the selected atoms (all atoms when `selected` is false).
    pub fn selected_topology(&self, selected: bool) -> Option<Topology> {
        let topology = self.topology.as_ref()?;
        match (&self.selection, selected) {
            (Some(selection), true) => Some(topology.subset(selection)),
            _ => Some(topology.clone()),
        }
    }

    /// Associates atom records with the ensemble. Passing `None` removes both
    /// the topology and any atom selection.
    pub fn set_topology(&mut self, topology: Option<Topology>) -> Result<(), EnsembleError> {
        let Some(topology) = topology else {
            self.topology = None;
            self.selection = None;
            return Ok(());
        };

        if self.n_atoms == 0 {
            if topology.is_empty() {
                return Err(EnsembleError::EmptyCoordinates);
            }
            self.n_atoms = topology.len();
        } else if topology.len() != self.n_atoms {
            return Err(EnsembleError::AtomCountMismatch {
                expected: self.n_atoms,
                found: topology.len(),
            });
        }
        self.topology = Some(topology);
        Ok(())
    }

    /// Resolves `selection` against the topology and makes it the active selection.
    pub fn select(&mut self, selection: &AtomSelection) -> Result<(), EnsembleError> {
        if self.n_atoms == 0 {
            return Err(EnsembleError::NoAtoms);
        }
        let resolved = selection.resolve(self.topology.as_ref(), self.n_atoms)?;
        self.set_selection(Some(resolved))
    }

    /// Sets or clears the active selection. A selection covering every atom
    /// is stored as no selection.
    pub fn set_selection(&mut self, selection: Option<Selection>) -> Result<(), EnsembleError> {
        let Some(selection) = selection else {
            self.selection = None;
            return Ok(());
        };
        if self.n_atoms == 0 {
            return Err(EnsembleError::NoAtoms);
        }
        if let Some(&index) = selection.indices().last() {
            if index >= self.n_atoms {
                return Err(SelectionError::IndexOutOfRange {
                    index,
                    n_atoms: self.n_atoms,
                }
                .into());
            }
        }
        self.selection = if selection.covers_all(self.n_atoms) {
            None
        } else {
            Some(selection)
        };
        Ok(())
    }

    fn pick<T: Clone>(&self, items: &[T], selected: bool) -> Vec<T> {
        match (&self.selection, selected) {
            (Some(selection), true) => selection.gather(items),
            _ => items.to_vec(),
        }
    }

    /// Copy of the reference coordinates of the selected (or all) atoms.
    pub fn reference(&self, selected: bool) -> Option<Coords> {
        self.reference.as_ref().map(|r| self.pick(r, selected))
    }

    pub fn set_reference(&mut self, coords: Coords) -> Result<(), EnsembleError> {
        if coords.is_empty() {
            return Err(EnsembleError::EmptyCoordinates);
        }
        if self.n_atoms != 0 && coords.len() != self.n_atoms {
            return Err(EnsembleError::AtomCountMismatch {
                expected: self.n_atoms,
                found: coords.len(),
            });
        }
        self.n_atoms = coords.len();
        self.reference = Some(coords);
        Ok(())
    }

    pub fn weights(&self, selected: bool) -> Option<Vec<f64>> {
        self.weights.as_ref().map(|w| self.pick(w, selected))
    }

    /// Sets per-atom weights.
    ///
    /// `weights` may cover all atoms, or only the selected atoms, in which
    /// case unselected atoms keep their current weight (1.0 when none was set).
    pub fn set_weights(&mut self, weights: Vec<f64>) -> Result<(), EnsembleError> {
        if self.n_atoms == 0 {
            return Err(EnsembleError::NoAtoms);
        }
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(EnsembleError::InvalidWeights(format!(
                "weights must be finite and non-negative (found {})",
                bad
            )));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(EnsembleError::InvalidWeights(
                "weights must not all be zero".to_string(),
            ));
        }

        if weights.len() == self.n_atoms {
            self.weights = Some(weights);
            return Ok(());
        }

        match &self.selection {
            Some(selection) if selection.len() == weights.len() => {
                let mut full = self
                    .weights
                    .take()
                    .unwrap_or_else(|| vec![1.0; self.n_atoms]);
                for (&index, weight) in selection.indices().iter().zip(weights) {
                    full[index] = weight;
                }
                self.weights = Some(full);
                Ok(())
            }
            _ => Err(EnsembleError::AtomCountMismatch {
                expected: self.n_atoms,
                found: weights.len(),
            }),
        }
    }

    pub fn clear_weights(&mut self) {
        self.weights = None;
    }

    fn expand_coordset(&self, coords: Coords) -> Result<Coords, EnsembleError> {
        if coords.len() == self.n_atoms {
            return Ok(coords);
        }
        match &self.selection {
            Some(selection) if selection.len() == coords.len() => {
                let mut full = self.reference.clone().ok_or(EnsembleError::NoReference)?;
                for (&index, point) in selection.indices().iter().zip(coords) {
                    full[index] = point;
                }
                Ok(full)
            }
            _ => Err(EnsembleError::AtomCountMismatch {
                expected: self.n_atoms,
                found: coords.len(),
            }),
        }
    }

    /// Adds one coordinate set.
    ///
    /// The set must contain either all atoms or only the selected atoms; in
    /// the latter case unselected atoms are filled in from the reference.
    pub fn add_coordset(&mut self, coords: Coords) -> Result<(), EnsembleError> {
        self.add_coordsets(vec![coords])
    }

    /// Adds several coordinate sets. Nothing is added if any set is invalid.
    pub fn add_coordsets(&mut self, coordsets: Vec<Coords>) -> Result<(), EnsembleError> {
        if coordsets.iter().any(Vec::is_empty) {
            return Err(EnsembleError::EmptyCoordinates);
        }
        let previous_n_atoms = self.n_atoms;
        if self.n_atoms == 0 {
            if let Some(first) = coordsets.first() {
                self.n_atoms = first.len();
            }
        }

        let expanded: Result<Vec<Coords>, EnsembleError> = coordsets
            .into_iter()
            .map(|coords| self.expand_coordset(coords))
            .collect();
        match expanded {
            Ok(expanded) => {
                self.coordsets.extend(expanded);
                Ok(())
            }
            Err(e) => {
                self.n_atoms = previous_n_atoms;
                Err(e)
            }
        }
    }

    /// Adds all coordinate sets of `other` (all atoms, regardless of its selection).
    pub fn extend_from(&mut self, other: &Ensemble) -> Result<(), EnsembleError> {
        self.add_coordsets(other.coordsets.clone())
    }

    /// Copies of all coordinate sets for the selected (or all) atoms.
    pub fn coordsets(&self, selected: bool) -> Vec<Coords> {
        self.coordsets
            .iter()
            .map(|set| self.pick(set, selected))
            .collect()
    }

    pub fn coordset(&self, index: isize, selected: bool) -> Result<Coords, EnsembleError> {
        let index = self.resolve_index(index)?;
        Ok(self.pick(&self.coordsets[index], selected))
    }

    /// Iterates over copies of the coordinate sets for the selected atoms.
    /// Reference coordinates are not included.
    pub fn iter_coordsets(&self) -> impl Iterator<Item = Coords> + '_ {
        self.coordsets.iter().map(|set| self.pick(set, true))
    }

    pub(crate) fn raw_coordsets(&self) -> &[Coords] {
        &self.coordsets
    }

    pub(crate) fn raw_coordsets_mut(&mut self) -> &mut [Coords] {
        &mut self.coordsets
    }

    pub(crate) fn raw_reference(&self) -> Option<&Coords> {
        self.reference.as_ref()
    }

    /// Deletes the coordinate sets at `indices`. Negative indices count from
    /// the end and repeated indices are removed once.
    pub fn del_coordsets(&mut self, indices: &[isize]) -> Result<(), EnsembleError> {
        let resolved: BTreeSet<usize> = indices
            .iter()
            .map(|&i| self.resolve_index(i))
            .collect::<Result<_, _>>()?;
        for index in resolved.into_iter().rev() {
            self.coordsets.remove(index);
        }
        Ok(())
    }

    pub(crate) fn resolve_index(&self, index: isize) -> Result<usize, EnsembleError> {
        let len = self.coordsets.len();
        if len == 0 {
            return Err(EnsembleError::NoConformations);
        }
        let resolved = if index < 0 {
            len as isize + index
        } else {
            index
        };
        if resolved < 0 || resolved >= len as isize {
            return Err(EnsembleError::IndexOutOfRange { index, len });
        }
        Ok(resolved as usize)
    }

    pub fn conformation(&self, index: isize) -> Result<Conformation<'_>, EnsembleError> {
        let index = self.resolve_index(index)?;
        Ok(Conformation::new(self, index))
    }

    pub fn conformations(&self) -> impl Iterator<Item = Conformation<'_>> + '_ {
        (0..self.coordsets.len()).map(move |i| Conformation::new(self, i))
    }

    fn with_coordsets(&self, title: String, coordsets: Vec<Coords>) -> Ensemble {
        Ensemble {
            title,
            reference: self.reference.clone(),
            n_atoms: self.n_atoms,
            coordsets,
            weights: self.weights.clone(),
            topology: self.topology.clone(),
            selection: self.selection.clone(),
        }
    }

    /// Copies a slice of the conformations into a new ensemble, with the
    /// bound semantics of half-open `start:stop:step` slices (negative values
    /// count from the end, bounds are clamped).
    pub fn slice(
        &self,
        start: Option<isize>,
        stop: Option<isize>,
        step: Option<isize>,
    ) -> Result<Ensemble, EnsembleError> {
        let step = step.unwrap_or(1);
        if step == 0 {
            return Err(EnsembleError::ZeroSliceStep);
        }
        let len = self.coordsets.len() as isize;
        let clamp = |value: Option<isize>, default: isize| -> isize {
            match value {
                None => default,
                Some(v) if v < 0 => {
                    let v = v + len;
                    if v < 0 { if step < 0 { -1 } else { 0 } } else { v }
                }
                Some(v) if v >= len => {
                    if step < 0 { len - 1 } else { len }
                }
                Some(v) => v,
            }
        };
        let (start, stop) = if step > 0 {
            (clamp(start, 0), clamp(stop, len))
        } else {
            (clamp(start, len - 1), clamp(stop, -1))
        };

        let mut picked = Vec::new();
        let mut i = start;
        while (step > 0 && i < stop) || (step < 0 && i > stop) {
            picked.push(self.coordsets[i as usize].clone());
            i += step;
        }

        let title = format!("{} ({}:{}:{})", self.title, start, stop, step);
        Ok(self.with_coordsets(title, picked))
    }

    /// Copies the conformations at `indices` into a new ensemble with the same title.
    pub fn take(&self, indices: &[isize]) -> Result<Ensemble, EnsembleError> {
        let picked = indices
            .iter()
            .map(|&i| self.resolve_index(i).map(|i| self.coordsets[i].clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.with_coordsets(self.title.clone(), picked))
    }

    /// Concatenates two ensembles.
    ///
    /// Reference coordinates come from `self`. Weights, topology and
    /// selection come from `self` when set, otherwise from `other`.
    pub fn concat(&self, other: &Ensemble) -> Result<Ensemble, EnsembleError> {
        if self.n_atoms != other.n_atoms {
            return Err(EnsembleError::AtomCountMismatch {
                expected: self.n_atoms,
                found: other.n_atoms,
            });
        }
        let title = format!("{} + {}", self.title, other.title);

        let weights = if self.weights.is_some() {
            info!(
                "Atom weights from '{}' are used in '{}'.",
                self.title, title
            );
            self.weights.clone()
        } else {
            other.weights.clone()
        };

        let (topology, selection) = if self.topology.is_some() {
            (self.topology.clone(), self.selection.clone())
        } else {
            (other.topology.clone(), other.selection.clone())
        };

        let mut coordsets = self.coordsets.clone();
        coordsets.extend(other.coordsets.iter().cloned());

        Ok(Ensemble {
            title,
            reference: self.reference.clone(),
            n_atoms: self.n_atoms,
            coordsets,
            weights,
            topology,
            selection,
        })
    }

    /// Mean square fluctuations of the selected atoms about their mean position.
    ///
    /// Conformations are typically superposed first.
    pub fn msfs(&self) -> Option<Vec<f64>> {
        if self.coordsets.is_empty() {
            return None;
        }
        let selected = self.coordsets(true);
        let mean = geometry::mean_coords(&selected)?;
        let n_confs = selected.len() as f64;

        let msfs = mean
            .iter()
            .enumerate()
            .map(|(i, m)| {
                selected
                    .iter()
                    .map(|set| (set[i] - m).norm_squared())
                    .sum::<f64>()
                    / n_confs
            })
            .collect();
        Some(msfs)
    }

    pub fn rmsfs(&self) -> Option<Vec<f64>> {
        self.msfs()
            .map(|msfs| msfs.into_iter().map(f64::sqrt).collect())
    }

    /// Deviations of each conformation from the reference, for selected atoms.
    pub fn deviations(&self) -> Option<Vec<Vec<Vector3<f64>>>> {
        if self.coordsets.is_empty() {
            warn!("Conformations are not set.");
            return None;
        }
        let Some(reference) = self.reference(true) else {
            warn!("Coordinates are not set.");
            return None;
        };
        Some(
            self.iter_coordsets()
                .map(|set| set.iter().zip(&reference).map(|(p, r)| p - r).collect())
                .collect(),
        )
    }

    /// RMSD of each conformation from the reference, for selected atoms,
    /// weighted when weights are set.
    pub fn rmsds(&self) -> Option<Vec<f64>> {
        let reference = self.reference(true)?;
        if self.coordsets.is_empty() {
            return None;
        }
        let weights = self.weights(true);
        self.iter_coordsets()
            .map(|set| geometry::rmsd(&reference, &set, weights.as_deref()))
            .collect()
    }

    /// RMSD between conformations `i` and `j` over the selected atoms.
    pub fn rmsd_between(&self, i: usize, j: usize) -> Option<f64> {
        let a = self.coordsets.get(i)?;
        let b = self.coordsets.get(j)?;
        let weights = self.weights(true);
        geometry::rmsd(
            &self.pick(a, true),
            &self.pick(b, true),
            weights.as_deref(),
        )
    }

    /// A one-line description, e.g. `<Ensemble: t (10 conformations; 120 atoms)>`.
    pub fn summary(&self) -> String {
        match &self.selection {
            None => format!(
                "<Ensemble: {} ({} conformations; {} atoms)>",
                self.title,
                self.len(),
                self.n_atoms
            ),
            Some(selection) => format!(
                "<Ensemble: {} ({} conformations; selected {} of {} atoms)>",
                self.title,
                self.len(),
                selection.len(),
                self.n_atoms
            ),
        }
    }
}

impl fmt::Display for Ensemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ensemble {}", self.title)
    }
}

impl Add for &Ensemble {
    type Output = Result<Ensemble, EnsembleError>;

    fn add(self, other: &Ensemble) -> Self::Output {
        self.concat(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::topology::AtomRecord;

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    fn three_atom_set(offset: f64) -> Coords {
        vec![
            p(offset, 0.0, 0.0),
            p(1.0 + offset, 0.0, 0.0),
            p(2.0 + offset, 1.0, 0.0),
        ]
    }

    fn topology() -> Topology {
        let names = ["N", "CA", "C"];
        let atoms = names
            .iter()
            .enumerate()
            .map(|(i, n)| AtomRecord::new(i + 1, n, "GLY", 'A', 1))
            .collect();
        Topology::from_atoms("gly", atoms)
    }

    fn ensemble_with_sets(n: usize) -> Ensemble {
        let sets = (0..n).map(|i| three_atom_set(i as f64)).collect();
        Ensemble::from_topology(topology(), sets).unwrap()
    }

    #[test]
    fn new_trims_title_and_starts_empty() {
        let ensemble = Ensemble::new("  my ensemble ");
        assert_eq!(ensemble.title(), "my ensemble");
        assert_eq!(ensemble.num_atoms(), 0);
        assert!(ensemble.is_empty());
        assert!(ensemble.reference(true).is_none());
        assert_eq!(ensemble.to_string(), "Ensemble my ensemble");
    }

    #[test]
    fn from_topology_uses_first_set_as_reference() {
        let ensemble = ensemble_with_sets(3);
        assert_eq!(ensemble.num_confs(), 3);
        assert_eq!(ensemble.num_atoms(), 3);
        assert_eq!(ensemble.reference(false).unwrap(), three_atom_set(0.0));
        assert_eq!(ensemble.title(), "gly");
    }

    #[test]
    fn first_coordset_fixes_atom_count() {
        let mut ensemble = Ensemble::new("e");
        ensemble.add_coordset(three_atom_set(0.0)).unwrap();
        assert_eq!(ensemble.num_atoms(), 3);
        let err = ensemble.add_coordset(vec![p(0.0, 0.0, 0.0)]).unwrap_err();
        assert_eq!(
            err,
            EnsembleError::AtomCountMismatch {
                expected: 3,
                found: 1
            }
        );
        assert_eq!(ensemble.num_confs(), 1);
    }

    #[test]
    fn add_coordsets_is_all_or_nothing() {
        let mut ensemble = Ensemble::new("e");
        let result = ensemble.add_coordsets(vec![three_atom_set(0.0), vec![p(0.0, 0.0, 0.0)]]);
        assert!(result.is_err());
        assert_eq!(ensemble.num_confs(), 0);
        assert_eq!(ensemble.num_atoms(), 0);
    }

    #[test]
    fn empty_coordinate_sets_are_rejected() {
        let mut ensemble = Ensemble::new("e");
        assert_eq!(
            ensemble.add_coordset(Vec::new()),
            Err(EnsembleError::EmptyCoordinates)
        );
        assert_eq!(
            ensemble.set_reference(Vec::new()),
            Err(EnsembleError::EmptyCoordinates)
        );
    }

    #[test]
    fn set_reference_checks_atom_count() {
        let mut ensemble = ensemble_with_sets(1);
        assert!(ensemble.set_reference(vec![p(0.0, 0.0, 0.0)]).is_err());
        assert!(ensemble.set_reference(three_atom_set(5.0)).is_ok());
    }

    #[test]
    fn set_topology_validates_size_and_none_clears_selection() {
        let mut ensemble = ensemble_with_sets(2);
        ensemble.select(&AtomSelection::CalphaOnly).unwrap();
        assert!(ensemble.is_selected());

        let short = Topology::from_atoms("short", topology().atoms()[..2].to_vec());
        assert!(matches!(
            ensemble.set_topology(Some(short)),
            Err(EnsembleError::AtomCountMismatch { .. })
        ));

        ensemble.set_topology(None).unwrap();
        assert!(!ensemble.is_selected());
        assert!(ensemble.topology().is_none());
    }

    #[test]
    fn selection_restricts_coordinates_and_summary() {
        let mut ensemble = ensemble_with_sets(2);
        ensemble.select(&AtomSelection::Names(vec!["N".into(), "C".into()])).unwrap();

        assert_eq!(ensemble.num_selected(), 2);
        assert_eq!(ensemble.reference(true).unwrap().len(), 2);
        assert_eq!(ensemble.reference(false).unwrap().len(), 3);
        assert_eq!(ensemble.coordset(1, true).unwrap(), vec![p(1.0, 0.0, 0.0), p(3.0, 1.0, 0.0)]);
        assert_eq!(
            ensemble.summary(),
            "<Ensemble: gly (2 conformations; selected 2 of 3 atoms)>"
        );
        assert_eq!(ensemble.selected_topology(true).unwrap().len(), 2);
    }

    #[test]
    fn selecting_every_atom_is_stored_as_no_selection() {
        let mut ensemble = ensemble_with_sets(1);
        ensemble.select(&AtomSelection::All).unwrap();
        assert!(!ensemble.is_selected());
        assert_eq!(
            ensemble.summary(),
            "<Ensemble: gly (1 conformations; 3 atoms)>"
        );
    }

    #[test]
    fn selected_size_coordsets_are_expanded_from_reference() {
        let mut ensemble = ensemble_with_sets(1);
        ensemble.select(&AtomSelection::CalphaOnly).unwrap();
        ensemble.add_coordset(vec![p(9.0, 9.0, 9.0)]).unwrap();

        let full = ensemble.coordset(-1, false).unwrap();
        assert_eq!(full[0], p(0.0, 0.0, 0.0));
        assert_eq!(full[1], p(9.0, 9.0, 9.0));
        assert_eq!(full[2], p(2.0, 1.0, 0.0));
    }

    #[test]
    fn set_weights_requires_atoms_and_valid_values() {
        let mut empty = Ensemble::new("e");
        assert_eq!(empty.set_weights(vec![1.0]), Err(EnsembleError::NoAtoms));

        let mut ensemble = ensemble_with_sets(1);
        assert!(matches!(
            ensemble.set_weights(vec![1.0, -1.0, 1.0]),
            Err(EnsembleError::InvalidWeights(_))
        ));
        assert!(matches!(
            ensemble.set_weights(vec![0.0, 0.0, 0.0]),
            Err(EnsembleError::InvalidWeights(_))
        ));
        assert!(matches!(
            ensemble.set_weights(vec![1.0, 2.0]),
            Err(EnsembleError::AtomCountMismatch { .. })
        ));
        ensemble.set_weights(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(ensemble.weights(true).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn selected_size_weights_fill_unselected_atoms_with_one() {
        let mut ensemble = ensemble_with_sets(1);
        ensemble.select(&AtomSelection::CalphaOnly).unwrap();
        ensemble.set_weights(vec![5.0]).unwrap();
        assert_eq!(ensemble.weights(false).unwrap(), vec![1.0, 5.0, 1.0]);
        assert_eq!(ensemble.weights(true).unwrap(), vec![5.0]);
    }

    #[test]
    fn conformation_indexing_supports_negative_indices() {
        let ensemble = ensemble_with_sets(3);
        assert_eq!(ensemble.conformation(-1).unwrap().index(), 2);
        assert_eq!(ensemble.conformation(0).unwrap().index(), 0);
        assert_eq!(
            ensemble.conformation(3).unwrap_err(),
            EnsembleError::IndexOutOfRange { index: 3, len: 3 }
        );
        assert_eq!(
            ensemble.conformation(-4).unwrap_err(),
            EnsembleError::IndexOutOfRange { index: -4, len: 3 }
        );
        assert_eq!(
            Ensemble::new("e").conformation(0).unwrap_err(),
            EnsembleError::NoConformations
        );
    }

    #[test]
    fn del_coordsets_removes_unique_indices() {
        let mut ensemble = ensemble_with_sets(4);
        ensemble.del_coordsets(&[0, -1, 0]).unwrap();
        assert_eq!(ensemble.num_confs(), 2);
        assert_eq!(ensemble.coordset(0, false).unwrap(), three_atom_set(1.0));
        assert!(ensemble.del_coordsets(&[5]).is_err());
        assert_eq!(ensemble.num_confs(), 2);
    }

    #[test]
    fn slice_follows_half_open_semantics_and_titles() {
        let ensemble = ensemble_with_sets(5);

        let sub = ensemble.slice(Some(1), Some(4), None).unwrap();
        assert_eq!(sub.num_confs(), 3);
        assert_eq!(sub.title(), "gly (1:4:1)");
        assert_eq!(sub.coordset(0, false).unwrap(), three_atom_set(1.0));

        let every_other = ensemble.slice(None, None, Some(2)).unwrap();
        assert_eq!(every_other.num_confs(), 3);
        assert_eq!(every_other.title(), "gly (0:5:2)");

        let reversed = ensemble.slice(None, None, Some(-1)).unwrap();
        assert_eq!(reversed.num_confs(), 5);
        assert_eq!(reversed.coordset(0, false).unwrap(), three_atom_set(4.0));

        let tail = ensemble.slice(Some(-2), Some(100), None).unwrap();
        assert_eq!(tail.num_confs(), 2);

        assert_eq!(
            ensemble.slice(None, None, Some(0)).unwrap_err(),
            EnsembleError::ZeroSliceStep
        );
    }

    #[test]
    fn take_copies_selected_conformations_and_state() {
        let mut ensemble = ensemble_with_sets(4);
        ensemble.set_weights(vec![1.0, 2.0, 3.0]).unwrap();
        let picked = ensemble.take(&[3, 0]).unwrap();
        assert_eq!(picked.title(), "gly");
        assert_eq!(picked.num_confs(), 2);
        assert_eq!(picked.coordset(0, false).unwrap(), three_atom_set(3.0));
        assert_eq!(picked.weights(false), ensemble.weights(false));
        assert!(ensemble.take(&[7]).is_err());
    }

    #[test]
    fn concat_merges_conformations_and_prefers_own_state() {
        let a = ensemble_with_sets(2);
        let mut b = ensemble_with_sets(3);
        b.set_title("other");
        b.set_weights(vec![2.0, 2.0, 2.0]).unwrap();

        let merged = (&a + &b).unwrap();
        assert_eq!(merged.title(), "gly + other");
        assert_eq!(merged.num_confs(), 5);
        assert_eq!(merged.weights(false).unwrap(), vec![2.0, 2.0, 2.0]);
        assert_eq!(merged.reference(false), a.reference(false));

        let mut lone = Ensemble::new("lone");
        lone.add_coordset(vec![p(0.0, 0.0, 0.0)]).unwrap();
        assert!(matches!(
            a.concat(&lone),
            Err(EnsembleError::AtomCountMismatch { .. })
        ));
    }

    #[test]
    fn msfs_and_rmsfs_measure_spread_about_mean() {
        let mut ensemble = Ensemble::new("e");
        ensemble
            .add_coordsets(vec![
                vec![p(0.0, 0.0, 0.0), p(5.0, 5.0, 5.0)],
                vec![p(2.0, 0.0, 0.0), p(5.0, 5.0, 5.0)],
            ])
            .unwrap();
        let msfs = ensemble.msfs().unwrap();
        assert!((msfs[0] - 1.0).abs() < 1e-12);
        assert!(msfs[1].abs() < 1e-12);
        assert_eq!(ensemble.rmsfs().unwrap()[0], 1.0);
        assert!(Ensemble::new("e").msfs().is_none());
    }

    #[test]
    fn deviations_and_rmsds_are_relative_to_reference() {
        let ensemble = ensemble_with_sets(3);
        let deviations = ensemble.deviations().unwrap();
        assert_eq!(deviations.len(), 3);
        assert_eq!(deviations[2][0], Vector3::new(2.0, 0.0, 0.0));

        let rmsds = ensemble.rmsds().unwrap();
        assert!(rmsds[0].abs() < 1e-12);
        assert!((rmsds[1] - 1.0).abs() < 1e-12);
        assert!((rmsds[2] - 2.0).abs() < 1e-12);
        assert!((ensemble.rmsd_between(1, 2).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn deviations_need_reference_and_conformations() {
        let mut ensemble = Ensemble::new("e");
        assert!(ensemble.deviations().is_none());
        ensemble.add_coordset(three_atom_set(0.0)).unwrap();
        assert!(ensemble.deviations().is_none());
        assert!(ensemble.rmsds().is_none());
    }
}
