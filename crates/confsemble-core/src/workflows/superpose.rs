use crate::core::models::ensemble::Ensemble;
use crate::engine::config::{SuperpositionConfig, SuperpositionMethod, Weighting};
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::tasks;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct SuperpositionReport {
    /// Number of superposition rounds; always 1 for a single superposition.
    pub iterations: usize,
    pub rmsds_before: Vec<f64>,
    /// RMSDs from the final reference, which is the mean structure after
    /// iterative superposition.
    pub rmsds_after: Vec<f64>,
}

#[instrument(skip_all, name = "superposition_workflow", fields(title = ensemble.title()))]
pub fn run(
    ensemble: &mut Ensemble,
    config: &SuperpositionConfig,
    reporter: &ProgressReporter,
) -> Result<SuperpositionReport, EngineError> {
    let rmsds_before = reporter.phase("Preparation", || {
        prepare(ensemble, config)?;
        ensemble.rmsds().ok_or_else(|| missing_data(ensemble))
    })?;

    let iterations = match config.method {
        SuperpositionMethod::Single => {
            reporter.phase("Superposition", || tasks::superpose::run(ensemble, reporter))?;
            1
        }
        SuperpositionMethod::Iterative {
            rmsd_threshold,
            max_iterations,
        } => {
            tasks::iterpose::run(ensemble, rmsd_threshold, max_iterations, reporter)?.iterations
        }
    };

    let rmsds_after = ensemble.rmsds().ok_or_else(|| missing_data(ensemble))?;
    info!(
        iterations,
        max_rmsd = rmsds_after.iter().copied().fold(0.0, f64::max),
        "Superposition workflow complete."
    );
    Ok(SuperpositionReport {
        iterations,
        rmsds_before,
        rmsds_after,
    })
}

/// Applies the atom selection and the weighting scheme of `config`.
fn prepare(ensemble: &mut Ensemble, config: &SuperpositionConfig) -> Result<(), EngineError> {
    ensemble.select(&config.selection)?;
    info!(
        selection = %config.selection,
        selected = ensemble.num_selected(),
        atoms = ensemble.num_atoms(),
        "Applied atom selection."
    );

    match config.weighting {
        Weighting::Uniform => ensemble.clear_weights(),
        Weighting::Mass => {
            let masses = ensemble
                .topology()
                .ok_or(EngineError::MissingTopology("mass weighting"))?
                .masses()?;
            ensemble.set_weights(masses)?;
            info!("Using mass-weighted superposition.");
        }
    }
    Ok(())
}

fn missing_data(ensemble: &Ensemble) -> EngineError {
    if ensemble.reference(false).is_none() {
        EngineError::NoReference
    } else {
        EngineError::NoConformations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::selection::AtomSelection;
    use crate::core::models::topology::{AtomRecord, Topology};
    use crate::engine::config::SuperpositionConfigBuilder;
    use nalgebra::{Point3, Rotation3, Vector3};

    fn reference() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.5, 0.0, 0.0),
            Point3::new(1.5, 1.5, 0.0),
            Point3::new(0.0, 1.5, 1.0),
        ]
    }

    fn moved(angle: f64, shift: Vector3<f64>, wobble: f64) -> Vec<Point3<f64>> {
        let rotation = Rotation3::from_axis_angle(&Vector3::x_axis(), angle);
        reference()
            .iter()
            .enumerate()
            .map(|(i, p)| rotation * (p + Vector3::new(0.0, 0.0, wobble * i as f64)) + shift)
            .collect()
    }

    fn topology() -> Topology {
        let atoms = ["N", "CA", "C", "O"]
            .iter()
            .enumerate()
            .map(|(i, name)| AtomRecord::new(i + 1, name, "GLY", 'A', 1))
            .collect();
        Topology::from_atoms("peptide", atoms)
    }

    fn ensemble() -> Ensemble {
        Ensemble::from_topology(
            topology(),
            vec![
                reference(),
                moved(0.8, Vector3::new(2.0, 1.0, 0.0), 0.05),
                moved(-0.4, Vector3::new(-1.0, 3.0, 2.0), -0.05),
            ],
        )
        .unwrap()
    }

    fn config(method: SuperpositionMethod, weighting: Weighting) -> SuperpositionConfig {
        SuperpositionConfigBuilder::new()
            .method(method)
            .weighting(weighting)
            .build()
            .unwrap()
    }

    #[test]
    fn single_superposition_reduces_rmsds() {
        let mut ensemble = ensemble();
        let report = run(
            &mut ensemble,
            &config(SuperpositionMethod::Single, Weighting::Uniform),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.iterations, 1);
        assert_eq!(report.rmsds_before.len(), 3);
        assert!(report.rmsds_after[0] < 1e-9);
        for (before, after) in report.rmsds_before.iter().zip(&report.rmsds_after).skip(1) {
            assert!(after < before);
        }
    }

    #[test]
    fn iterative_superposition_reports_iterations() {
        let mut ensemble = ensemble();
        let method = SuperpositionMethod::Iterative {
            rmsd_threshold: 1e-6,
            max_iterations: 50,
        };
        let report = run(
            &mut ensemble,
            &config(method, Weighting::Uniform),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert!(report.iterations >= 1);
        assert!(report.rmsds_after.iter().all(|r| *r < 0.5));
    }

    #[test]
    fn mass_weighting_sets_weights_from_elements() {
        let mut ensemble = ensemble();
        run(
            &mut ensemble,
            &config(SuperpositionMethod::Single, Weighting::Mass),
            &ProgressReporter::new(),
        )
        .unwrap();
        let weights = ensemble.weights(false).unwrap();
        assert!(weights[0] > 13.0 && weights[0] < 15.0);
        assert!(weights[1] > 11.0 && weights[1] < 13.0);
    }

    #[test]
    fn mass_weighting_needs_topology() {
        let mut ensemble = Ensemble::new("bare");
        ensemble.set_reference(reference()).unwrap();
        ensemble.add_coordset(reference()).unwrap();
        let result = run(
            &mut ensemble,
            &config(SuperpositionMethod::Single, Weighting::Mass),
            &ProgressReporter::new(),
        );
        assert!(matches!(result, Err(EngineError::MissingTopology(_))));
    }

    #[test]
    fn selection_is_applied_before_fitting() {
        let mut ensemble = ensemble();
        let config = SuperpositionConfigBuilder::new()
            .method(SuperpositionMethod::Single)
            .weighting(Weighting::Uniform)
            .selection(AtomSelection::CalphaOnly)
            .build()
            .unwrap();
        let report = run(&mut ensemble, &config, &ProgressReporter::new()).unwrap();

        assert_eq!(ensemble.num_selected(), 1);
        assert!(report.rmsds_after.iter().all(|r| *r < 1e-9));
        let ca = ensemble.coordset(1, false).unwrap()[1];
        assert!((ca - reference()[1]).norm() < 1e-9);
    }
}
