use super::ensemble::{Coords, Ensemble};
use crate::core::utils::geometry;
use nalgebra::Vector3;
use std::fmt;

/// A view of a single coordinate set of an [`Ensemble`].
///
/// Conformations are cheap to create and borrow their ensemble, so they
/// always reflect its current selection and weights.
#[derive(Debug, Clone, Copy)]
pub struct Conformation<'a> {
    ensemble: &'a Ensemble,
    index: usize,
}

impl<'a> Conformation<'a> {
    pub(crate) fn new(ensemble: &'a Ensemble, index: usize) -> Self {
        Self { ensemble, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn ensemble(&self) -> &'a Ensemble {
        self.ensemble
    }

    pub fn title(&self) -> String {
        format!("{} conformation {}", self.ensemble.title(), self.index)
    }

    pub fn coords(&self, selected: bool) -> Coords {
        let all = &self.ensemble.raw_coordsets()[self.index];
        match (self.ensemble.selection(), selected) {
            (Some(selection), true) => selection.gather(all),
            _ => all.clone(),
        }
    }

    pub fn weights(&self, selected: bool) -> Option<Vec<f64>> {
        self.ensemble.weights(selected)
    }

    /// Deviations of the selected atoms from the ensemble reference.
    pub fn deviations(&self) -> Option<Vec<Vector3<f64>>> {
        let reference = self.ensemble.reference(true)?;
        Some(
            self.coords(true)
                .iter()
                .zip(&reference)
                .map(|(p, r)| p - r)
                .collect(),
        )
    }

    /// Weighted RMSD of the selected atoms from the ensemble reference.
    pub fn rmsd(&self) -> Option<f64> {
        let reference = self.ensemble.reference(true)?;
        let weights = self.ensemble.weights(true);
        geometry::rmsd(&reference, &self.coords(true), weights.as_deref())
    }
}

impl fmt::Display for Conformation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Conformation {} from {}",
            self.index,
            self.ensemble.title()
        )
    }
}
