use super::superpose::{self, SuperpositionReport};
use crate::core::dynamics::analysis;
use crate::core::dynamics::mode::ModeSet;
use crate::core::dynamics::pca::Pca;
use crate::core::models::ensemble::Ensemble;
use crate::engine::config::{AnalysisConfig, AnalysisOutput};
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::tasks;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// The analyzed ensemble, superposed when the configuration asked for it.
    pub ensemble: Ensemble,
    pub superposition: Option<SuperpositionReport>,
    pub rmsds: Vec<f64>,
    pub rmsfs: Option<Vec<f64>>,
    pub pairwise: Option<Vec<Vec<f64>>>,
    pub modes: Option<ModeSet>,
    pub cross_correlations: Option<Vec<Vec<f64>>>,
}

#[instrument(skip_all, name = "analysis_workflow", fields(title = ensemble.title()))]
pub fn run(
    mut ensemble: Ensemble,
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Result<AnalysisResult, EngineError> {
    if ensemble.reference(false).is_none() {
        return Err(EngineError::NoReference);
    }
    if ensemble.is_empty() {
        return Err(EngineError::NoConformations);
    }
    info!(summary = %ensemble.summary(), "Starting ensemble analysis.");

    // === Phase 1: Superposition (optional) ===
    let superposition = match &config.superposition {
        Some(superposition_config) => {
            Some(superpose::run(&mut ensemble, superposition_config, reporter)?)
        }
        None => {
            ensemble.select(&config.selection)?;
            None
        }
    };

    // === Phase 2: Per-conformation and per-atom statistics ===
    let (rmsds, rmsfs) = reporter.phase("Statistics", || {
        let rmsds = ensemble.rmsds().ok_or(EngineError::NoConformations)?;
        let rmsfs = if config.outputs.contains(&AnalysisOutput::Rmsf) {
            Some(ensemble.rmsfs().ok_or(EngineError::NoConformations)?)
        } else {
            None
        };
        Ok::<_, EngineError>((rmsds, rmsfs))
    })?;

    // === Phase 3: Pairwise RMSD (optional) ===
    let pairwise = if config.pairwise_rmsd {
        Some(reporter.phase("Pairwise RMSD", || {
            tasks::pairwise_rmsd::run(&ensemble, reporter)
        })?)
    } else {
        None
    };

    // === Phase 4: Principal component analysis ===
    let modes = if config.outputs.contains(&AnalysisOutput::Modes) {
        let modes = reporter.phase("Principal Component Analysis", || {
            Pca::build(&ensemble, config.num_modes).map(Pca::into_modes)
        })?;
        info!(
            modes = modes.len(),
            total_variance = modes.total_variance(),
            "Principal components calculated."
        );
        Some(modes)
    } else {
        None
    };

    let cross_correlations = match &modes {
        Some(modes) if config.outputs.contains(&AnalysisOutput::CrossCorrelations) => {
            Some(analysis::cross_correlations(modes))
        }
        Some(_) => None,
        None => {
            if config.outputs.contains(&AnalysisOutput::CrossCorrelations) {
                warn!("Cross-correlations skipped: no modes were calculated.");
            }
            None
        }
    };

    info!("Analysis complete.");
    Ok(AnalysisResult {
        ensemble,
        superposition,
        rmsds,
        rmsfs,
        pairwise,
        modes,
        cross_correlations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dynamics::DynamicsError;
    use crate::core::models::selection::AtomSelection;
    use crate::engine::config::{
        AnalysisConfigBuilder, SuperpositionConfigBuilder, SuperpositionMethod, Weighting,
    };
    use nalgebra::{Point3, Rotation3, Vector3};
    use std::collections::BTreeSet;

    fn ensemble() -> Ensemble {
        let base = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.5, 0.0, 0.0),
            Point3::new(1.5, 1.5, 0.0),
            Point3::new(0.0, 1.5, 0.0),
            Point3::new(0.7, 0.7, 1.2),
        ];
        let mut ensemble = Ensemble::new("flexible");
        ensemble.set_reference(base.to_vec()).unwrap();
        for k in 0..6 {
            let t = k as f64;
            let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), 0.3 * t);
            let shift = Vector3::new(t, -t, 0.5 * t);
            let bend = 0.2 * (t * 1.3).sin();
            let coords = base
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let local = if i == 4 {
                        p + Vector3::new(bend, 0.0, 0.0)
                    } else {
                        *p
                    };
                    rotation * local + shift
                })
                .collect();
            ensemble.add_coordset(coords).unwrap();
        }
        ensemble
    }

    fn superposed_config(num_modes: usize) -> AnalysisConfig {
        let superposition = SuperpositionConfigBuilder::new()
            .method(SuperpositionMethod::Iterative {
                rmsd_threshold: 1e-6,
                max_iterations: 100,
            })
            .weighting(Weighting::Uniform)
            .build()
            .unwrap();
        AnalysisConfigBuilder::new()
            .superposition(superposition)
            .pairwise_rmsd(true)
            .num_modes(num_modes)
            .build()
            .unwrap()
    }

    #[test]
    fn full_analysis_produces_every_output() {
        let result = run(ensemble(), &superposed_config(3), &ProgressReporter::new()).unwrap();

        assert!(result.superposition.is_some());
        assert_eq!(result.rmsds.len(), 6);
        assert_eq!(result.rmsfs.as_ref().unwrap().len(), 5);

        let pairwise = result.pairwise.unwrap();
        assert_eq!(pairwise.len(), 6);
        assert!((pairwise[1][2] - pairwise[2][1]).abs() < 1e-12);

        let modes = result.modes.unwrap();
        assert!(!modes.is_empty() && modes.len() <= 3);
        assert_eq!(modes.n_atoms(), 5);

        let cc = result.cross_correlations.unwrap();
        assert_eq!(cc.len(), 5);
        assert!((cc[4][4] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn superposition_removes_rigid_motion_from_fluctuations() {
        let result = run(ensemble(), &superposed_config(0), &ProgressReporter::new()).unwrap();
        let rmsfs = result.rmsfs.unwrap();
        let flexible = rmsfs[4];
        assert!(rmsfs[..4].iter().all(|r| *r < flexible));
        assert!(flexible < 0.3);
    }

    #[test]
    fn outputs_can_be_restricted() {
        let config = AnalysisConfigBuilder::new()
            .num_modes(2)
            .outputs(BTreeSet::new())
            .build()
            .unwrap();
        let result = run(ensemble(), &config, &ProgressReporter::new()).unwrap();

        assert!(result.superposition.is_none());
        assert!(result.rmsfs.is_none());
        assert!(result.pairwise.is_none());
        assert!(result.modes.is_none());
        assert_eq!(result.rmsds.len(), 6);
    }

    #[test]
    fn selection_applies_without_superposition() {
        let config = AnalysisConfigBuilder::new()
            .num_modes(0)
            .selection(AtomSelection::Indices(vec![0, 1, 4]))
            .build()
            .unwrap();
        let result = run(ensemble(), &config, &ProgressReporter::new()).unwrap();

        assert_eq!(result.ensemble.num_selected(), 3);
        assert_eq!(result.rmsfs.unwrap().len(), 3);
        assert_eq!(result.modes.unwrap().n_atoms(), 3);
    }

    #[test]
    fn modes_need_two_conformations() {
        let mut single = Ensemble::new("single");
        single.set_reference(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)]).unwrap();
        single.add_coordset(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)]).unwrap();

        let config = AnalysisConfigBuilder::new().num_modes(1).build().unwrap();
        let result = run(single, &config, &ProgressReporter::new());
        assert!(matches!(
            result,
            Err(EngineError::Dynamics(DynamicsError::TooFewConformations { found: 1 }))
        ));
    }

    #[test]
    fn missing_reference_is_reported() {
        let config = AnalysisConfigBuilder::new().num_modes(1).build().unwrap();
        assert!(matches!(
            run(Ensemble::new("empty"), &config, &ProgressReporter::new()),
            Err(EngineError::NoReference)
        ));
    }
}
