use super::DynamicsError;
use nalgebra::{DVector, Vector3};

/// A single collective-motion vector with its variance.
#[derive(Debug, Clone, PartialEq)]
pub struct Mode {
    index: usize,
    variance: f64,
    vector: DVector<f64>,
}

impl Mode {
    /// Creates a mode; the vector is normalized to unit length.
    pub fn new(index: usize, variance: f64, vector: DVector<f64>) -> Result<Self, DynamicsError> {
        if vector.is_empty() || vector.len() % 3 != 0 {
            return Err(DynamicsError::InvalidVectorLength(vector.len()));
        }
        let norm = vector.norm();
        let vector = if norm > 0.0 { vector / norm } else { vector };
        Ok(Self {
            index,
            variance,
            vector,
        })
    }

    /// Zero-based position of the mode in the set it was computed in.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn variance(&self) -> f64 {
        self.variance
    }

    pub fn vector(&self) -> &DVector<f64> {
        &self.vector
    }

    pub fn n_atoms(&self) -> usize {
        self.vector.len() / 3
    }

    /// The vector reshaped to one displacement per atom.
    pub fn array_nx3(&self) -> Vec<Vector3<f64>> {
        self.vector
            .as_slice()
            .chunks_exact(3)
            .map(|c| Vector3::new(c[0], c[1], c[2]))
            .collect()
    }

    /// Per-atom square fluctuations along this mode, `variance * |v_i|^2`.
    pub fn sq_flucts(&self) -> Vec<f64> {
        self.array_nx3()
            .iter()
            .map(|v| v.norm_squared() * self.variance)
            .collect()
    }
}

/// An ordered set of modes sharing the same atoms.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeSet {
    title: String,
    modes: Vec<Mode>,
    total_variance: f64,
    n_atoms: usize,
}

impl ModeSet {
    /// `total_variance` is the trace of the covariance the modes came from,
    /// which may exceed the sum of the kept variances.
    pub fn new(title: &str, modes: Vec<Mode>, total_variance: f64) -> Result<Self, DynamicsError> {
        let first = modes.first().ok_or(DynamicsError::EmptyModeSet)?;
        let n_atoms = first.n_atoms();
        if let Some(bad) = modes.iter().find(|m| m.n_atoms() != n_atoms) {
            return Err(DynamicsError::DimensionMismatch {
                expected: n_atoms * 3,
                found: bad.vector.len(),
            });
        }
        Ok(Self {
            title: title.to_string(),
            modes,
            total_variance,
            n_atoms,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    pub fn total_variance(&self) -> f64 {
        self.total_variance
    }

    pub fn get(&self, index: usize) -> Option<&Mode> {
        self.modes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mode> {
        self.modes.iter()
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    pub fn variances(&self) -> Vec<f64> {
        self.modes.iter().map(Mode::variance).collect()
    }

    /// A new set with the modes at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> Result<ModeSet, DynamicsError> {
        let modes = indices
            .iter()
            .map(|&index| {
                self.modes
                    .get(index)
                    .cloned()
                    .ok_or(DynamicsError::ModeIndexOutOfRange {
                        index,
                        len: self.modes.len(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        ModeSet::new(&self.title, modes, self.total_variance)
    }
}

impl<'a> IntoIterator for &'a ModeSet {
    type Item = &'a Mode;
    type IntoIter = std::slice::Iter<'a, Mode>;

    fn into_iter(self) -> Self::IntoIter {
        self.modes.iter()
    }
}
