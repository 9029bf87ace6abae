use crate::cli::{AnalyzeArgs, SuperposeArgs};
use crate::error::{CliError, Result};
use confsemble::core::models::selection::AtomSelection;
use confsemble::engine::config::{self as core_config, AnalysisOutput, SuperpositionMethod, Weighting};
use confsemble::engine::tasks::iterpose::{DEFAULT_MAX_ITERATIONS, DEFAULT_RMSD_THRESHOLD};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

const DEFAULT_NUM_MODES: usize = 20;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", tag = "type")]
enum PartialSelection {
    All,
    Calpha,
    Backbone,
    Heavy,
    Chain {
        id: char,
    },
    Names {
        names: Vec<String>,
    },
    Residues {
        chain: Option<char>,
        start: isize,
        end: isize,
    },
    Expression {
        expr: String,
    },
}

impl PartialSelection {
    fn resolve(self) -> Result<AtomSelection> {
        Ok(match self {
            PartialSelection::All => AtomSelection::All,
            PartialSelection::Calpha => AtomSelection::CalphaOnly,
            PartialSelection::Backbone => AtomSelection::Backbone,
            PartialSelection::Heavy => AtomSelection::Heavy,
            PartialSelection::Chain { id } => AtomSelection::Chain(id),
            PartialSelection::Names { names } => AtomSelection::Names(names),
            PartialSelection::Residues { chain, start, end } => AtomSelection::Residues {
                chain_id: chain,
                start,
                end,
            },
            PartialSelection::Expression { expr } => parse_selection(&expr)?,
        })
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
enum PartialMethod {
    Single,
    Iterative,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
enum PartialWeighting {
    Uniform,
    Mass,
}

impl From<PartialWeighting> for Weighting {
    fn from(p: PartialWeighting) -> Self {
        match p {
            PartialWeighting::Uniform => Weighting::Uniform,
            PartialWeighting::Mass => Weighting::Mass,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
enum PartialOutput {
    Rmsf,
    Modes,
    CrossCorrelations,
}

impl From<PartialOutput> for AnalysisOutput {
    fn from(p: PartialOutput) -> Self {
        match p {
            PartialOutput::Rmsf => AnalysisOutput::Rmsf,
            PartialOutput::Modes => AnalysisOutput::Modes,
            PartialOutput::CrossCorrelations => AnalysisOutput::CrossCorrelations,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSuperpositionConfig {
    method: Option<PartialMethod>,
    #[serde(rename = "rmsd-threshold")]
    rmsd_threshold: Option<f64>,
    #[serde(rename = "max-iterations")]
    max_iterations: Option<usize>,
    weighting: Option<PartialWeighting>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialAnalysisConfig {
    #[serde(rename = "num-modes")]
    num_modes: Option<usize>,
    #[serde(rename = "pairwise-rmsd")]
    pairwise_rmsd: Option<bool>,
    superpose: Option<bool>,
    outputs: Option<Vec<PartialOutput>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    selection: Option<PartialSelection>,
    superposition: Option<PartialSuperpositionConfig>,
    analysis: Option<PartialAnalysisConfig>,
}

/// Command-line values that take precedence over the superposition section.
struct SuperpositionOverrides {
    iterative: bool,
    rmsd_threshold: Option<f64>,
    max_iterations: Option<usize>,
    mass_weighted: bool,
}

fn parse_selection(expr: &str) -> Result<AtomSelection> {
    expr.parse::<AtomSelection>()
        .map_err(|e| CliError::Argument(e.to_string()))
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_superpose(mut self, args: &SuperposeArgs) -> Result<core_config::SuperpositionConfig> {
        self.apply_set_values(&args.set_values)?;
        let selection = self.merge_selection(args.select.as_deref())?;
        self.merge_superposition(
            selection,
            SuperpositionOverrides {
                iterative: args.iterative,
                rmsd_threshold: args.rmsd_threshold,
                max_iterations: args.max_iterations,
                mass_weighted: args.mass_weighted,
            },
            PartialMethod::Single,
        )
    }

    pub fn merge_analyze(mut self, args: &AnalyzeArgs) -> Result<core_config::AnalysisConfig> {
        self.apply_set_values(&args.set_values)?;
        let analysis = self.analysis.take().unwrap_or_default();
        let selection = self.merge_selection(args.select.as_deref())?;

        let mut builder = core_config::AnalysisConfigBuilder::new()
            .selection(selection.clone())
            .num_modes(args.modes.or(analysis.num_modes).unwrap_or(DEFAULT_NUM_MODES))
            .pairwise_rmsd(args.pairwise || analysis.pairwise_rmsd.unwrap_or(false));

        if let Some(outputs) = analysis.outputs {
            builder = builder.outputs(outputs.into_iter().map(Into::into).collect::<BTreeSet<_>>());
        }

        if !args.no_superpose && analysis.superpose.unwrap_or(true) {
            let superposition = self.merge_superposition(
                selection,
                SuperpositionOverrides {
                    iterative: false,
                    rmsd_threshold: None,
                    max_iterations: None,
                    mass_weighted: false,
                },
                PartialMethod::Iterative,
            )?;
            builder = builder.superposition(superposition);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn merge_selection(&mut self, select: Option<&str>) -> Result<AtomSelection> {
        match (select, self.selection.take()) {
            (Some(expr), _) => parse_selection(expr),
            (None, Some(partial)) => partial.resolve(),
            (None, None) => Ok(AtomSelection::All),
        }
    }

    fn merge_superposition(
        &mut self,
        selection: AtomSelection,
        overrides: SuperpositionOverrides,
        default_method: PartialMethod,
    ) -> Result<core_config::SuperpositionConfig> {
        let file = self.superposition.take().unwrap_or_default();

        let method = if overrides.iterative {
            PartialMethod::Iterative
        } else {
            file.method.unwrap_or(default_method)
        };
        let method = match method {
            PartialMethod::Single => SuperpositionMethod::Single,
            PartialMethod::Iterative => SuperpositionMethod::Iterative {
                rmsd_threshold: overrides
                    .rmsd_threshold
                    .or(file.rmsd_threshold)
                    .unwrap_or(DEFAULT_RMSD_THRESHOLD),
                max_iterations: overrides
                    .max_iterations
                    .or(file.max_iterations)
                    .unwrap_or(DEFAULT_MAX_ITERATIONS),
            },
        };

        let weighting = if overrides.mass_weighted {
            Weighting::Mass
        } else {
            file.weighting.map(Into::into).unwrap_or_default()
        };

        core_config::SuperpositionConfigBuilder::new()
            .method(method)
            .weighting(weighting)
            .selection(selection)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "selection" => {
                    self.selection = Some(PartialSelection::Expression {
                        expr: value_str.to_string(),
                    });
                }
                "superposition.method" => {
                    let method = match value_str {
                        "single" => PartialMethod::Single,
                        "iterative" => PartialMethod::Iterative,
                        _ => {
                            return Err(CliError::Config(format!(
                                "Invalid value for {}: {} (expected 'single' or 'iterative')",
                                key, value_str
                            )));
                        }
                    };
                    self.superposition.get_or_insert_with(Default::default).method = Some(method);
                }
                "superposition.rmsd-threshold" => {
                    self.superposition
                        .get_or_insert_with(Default::default)
                        .rmsd_threshold = Some(parse_value(key, value_str, "float")?);
                }
                "superposition.max-iterations" => {
                    self.superposition
                        .get_or_insert_with(Default::default)
                        .max_iterations = Some(parse_value(key, value_str, "integer")?);
                }
                "superposition.weighting" => {
                    let weighting = match value_str {
                        "uniform" => PartialWeighting::Uniform,
                        "mass" => PartialWeighting::Mass,
                        _ => {
                            return Err(CliError::Config(format!(
                                "Invalid value for {}: {} (expected 'uniform' or 'mass')",
                                key, value_str
                            )));
                        }
                    };
                    self.superposition
                        .get_or_insert_with(Default::default)
                        .weighting = Some(weighting);
                }
                "analysis.num-modes" => {
                    self.analysis.get_or_insert_with(Default::default).num_modes =
                        Some(parse_value(key, value_str, "integer")?);
                }
                "analysis.pairwise-rmsd" => {
                    self.analysis
                        .get_or_insert_with(Default::default)
                        .pairwise_rmsd = Some(parse_value(key, value_str, "boolean")?);
                }
                "analysis.superpose" => {
                    self.analysis.get_or_insert_with(Default::default).superpose =
                        Some(parse_value(key, value_str, "boolean")?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}
