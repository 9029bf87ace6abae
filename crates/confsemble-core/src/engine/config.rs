use crate::core::models::selection::AtomSelection;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SuperpositionMethod {
    /// One Kabsch fit of every conformation onto the reference.
    Single,
    /// Repeated fits onto the mean structure until the mean moves by no
    /// more than `rmsd_threshold`.
    Iterative {
        rmsd_threshold: f64,
        max_iterations: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Weighting {
    #[default]
    Uniform,
    /// Atomic masses from the element of each atom.
    Mass,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuperpositionConfig {
    pub method: SuperpositionMethod,
    pub weighting: Weighting,
    pub selection: AtomSelection,
}

#[derive(Default)]
pub struct SuperpositionConfigBuilder {
    method: Option<SuperpositionMethod>,
    weighting: Option<Weighting>,
    selection: Option<AtomSelection>,
}

impl SuperpositionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: SuperpositionMethod) -> Self {
        self.method = Some(method);
        self
    }
    pub fn weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = Some(weighting);
        self
    }
    pub fn selection(mut self, selection: AtomSelection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn build(self) -> Result<SuperpositionConfig, ConfigError> {
        let method = self
            .method
            .ok_or(ConfigError::MissingParameter("method"))?;
        if let SuperpositionMethod::Iterative {
            rmsd_threshold,
            max_iterations,
        } = method
        {
            if !rmsd_threshold.is_finite() || rmsd_threshold < 0.0 {
                return Err(ConfigError::InvalidValue {
                    parameter: "rmsd_threshold",
                    reason: format!("must be a non-negative number, got {}", rmsd_threshold),
                });
            }
            if max_iterations == 0 {
                return Err(ConfigError::InvalidValue {
                    parameter: "max_iterations",
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(SuperpositionConfig {
            method,
            weighting: self
                .weighting
                .ok_or(ConfigError::MissingParameter("weighting"))?,
            selection: self.selection.unwrap_or_default(),
        })
    }
}

/// Quantities an analysis computes beyond the per-conformation RMSDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnalysisOutput {
    Rmsf,
    Modes,
    CrossCorrelations,
}

impl AnalysisOutput {
    pub fn all() -> BTreeSet<AnalysisOutput> {
        [
            AnalysisOutput::Rmsf,
            AnalysisOutput::Modes,
            AnalysisOutput::CrossCorrelations,
        ]
        .into_iter()
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// `None` analyzes the conformations as given.
    pub superposition: Option<SuperpositionConfig>,
    /// Atoms to analyze when no superposition is configured; otherwise the
    /// superposition selection applies.
    pub selection: AtomSelection,
    pub pairwise_rmsd: bool,
    /// Number of principal components to keep; `0` keeps all non-trivial ones.
    pub num_modes: usize,
    pub outputs: BTreeSet<AnalysisOutput>,
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    superposition: Option<SuperpositionConfig>,
    selection: Option<AtomSelection>,
    pairwise_rmsd: Option<bool>,
    num_modes: Option<usize>,
    outputs: Option<BTreeSet<AnalysisOutput>>,
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn superposition(mut self, config: SuperpositionConfig) -> Self {
        self.superposition = Some(config);
        self
    }
    pub fn selection(mut self, selection: AtomSelection) -> Self {
        self.selection = Some(selection);
        self
    }
    pub fn pairwise_rmsd(mut self, enabled: bool) -> Self {
        self.pairwise_rmsd = Some(enabled);
        self
    }
    pub fn num_modes(mut self, n: usize) -> Self {
        self.num_modes = Some(n);
        self
    }
    pub fn outputs(mut self, outputs: BTreeSet<AnalysisOutput>) -> Self {
        self.outputs = Some(outputs);
        self
    }

    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let outputs = self.outputs.unwrap_or_else(AnalysisOutput::all);
        if outputs.contains(&AnalysisOutput::CrossCorrelations)
            && !outputs.contains(&AnalysisOutput::Modes)
        {
            return Err(ConfigError::InvalidValue {
                parameter: "outputs",
                reason: "cross-correlations require modes".to_string(),
            });
        }
        Ok(AnalysisConfig {
            superposition: self.superposition,
            selection: self.selection.unwrap_or_default(),
            pairwise_rmsd: self.pairwise_rmsd.unwrap_or(false),
            num_modes: self
                .num_modes
                .ok_or(ConfigError::MissingParameter("num_modes"))?,
            outputs,
        })
    }
}
