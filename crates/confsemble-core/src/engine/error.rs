use crate::core::dynamics::DynamicsError;
use crate::core::models::ensemble::EnsembleError;
use crate::core::models::selection::SelectionError;
use crate::core::models::topology::TopologyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Reference coordinates are not set")]
    NoReference,

    #[error("Ensemble has no conformations")]
    NoConformations,

    #[error("Atom selection failed: {0}")]
    Selection(#[from] SelectionError),

    #[error("Dimension mismatch: expected {expected}, found {found}")]
    Dimension { expected: usize, found: usize },

    #[error(
        "Iterative superposition did not converge after {iterations} iterations (last RMSD change {last_change:.4e} A)"
    )]
    Convergence { iterations: usize, last_change: f64 },

    #[error("Atom records are required for {0}")]
    MissingTopology(&'static str),

    #[error("Mass weighting failed: {0}")]
    Weighting(#[from] TopologyError),

    #[error("Mode analysis failed: {0}")]
    Dynamics(#[from] DynamicsError),

    #[error("Invalid ensemble: {0}")]
    Ensemble(EnsembleError),

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl From<EnsembleError> for EngineError {
    fn from(err: EnsembleError) -> Self {
        match err {
            EnsembleError::NoReference => EngineError::NoReference,
            EnsembleError::NoConformations => EngineError::NoConformations,
            EnsembleError::Selection(e) => EngineError::Selection(e),
            EnsembleError::AtomCountMismatch { expected, found } => {
                EngineError::Dimension { expected, found }
            }
            other => EngineError::Ensemble(other),
        }
    }
}
