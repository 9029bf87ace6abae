use super::{mean, read_ensemble, write_ensemble};
use crate::cli::AnalyzeArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use confsemble::engine::progress::ProgressReporter;
use confsemble::report::{Matrix, Series, export, plots};
use confsemble::workflows;
use confsemble::workflows::analyze::AnalysisResult;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let partial_config = PartialConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_analyze(&args)?;

    let (ensemble, metadata) = read_ensemble(&args.input)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Analyzing {} conformations...", ensemble.num_confs());
    let result = workflows::analyze::run(ensemble, &config, &reporter)?;

    if let Some(superposition) = &result.superposition {
        println!(
            "Superposition: mean RMSD {:.3} A -> {:.3} A ({} iteration(s)).",
            mean(&superposition.rmsds_before),
            mean(&superposition.rmsds_after),
            superposition.iterations
        );
    }

    fs::create_dir_all(&args.output)?;
    let written = write_tables(&result, &args.output)?;

    let pdb_path = args.output.join("superposed.pdb");
    write_ensemble(&result.ensemble, &metadata, &pdb_path)?;

    println!(
        "✓ Wrote {} table(s) and the ensemble to: {}",
        written.len(),
        args.output.display()
    );
    Ok(())
}

/// Writes every table the analysis produced and returns the paths written.
fn write_tables(result: &AnalysisResult, dir: &Path) -> Result<Vec<PathBuf>> {
    let title = result.ensemble.title();
    let mut series: Vec<(&str, Series)> = vec![("rmsd.csv", plots::rmsd_series(title, &result.rmsds))];
    let mut matrices: Vec<(&str, Matrix)> = Vec::new();

    if let Some(rmsfs) = &result.rmsfs {
        series.push(("rmsf.csv", plots::rmsf_series(title, rmsfs)));
    }
    if let Some(modes) = &result.modes {
        series.push(("fract_vars.csv", plots::fract_vars(modes)));
        series.push(("cumul_fract_vars.csv", plots::cumul_fract_vars(modes)));
        series.push(("sq_flucts.csv", plots::sq_flucts(modes)));
        series.push(("projection.csv", plots::projection(&result.ensemble, modes, false)?));
    }
    if let Some(cc) = &result.cross_correlations {
        matrices.push(("cross_corr.csv", plots::cross_corr_matrix(title, cc.clone())));
    }
    if let Some(pairwise) = &result.pairwise {
        matrices.push((
            "pairwise_rmsd.csv",
            plots::pairwise_rmsd_matrix(title, pairwise.clone()),
        ));
    }

    let mut written = Vec::new();
    for (name, table) in series {
        let path = dir.join(name);
        export::write_series_csv_to_path(&table, &path)?;
        written.push(path);
    }
    for (name, table) in matrices {
        let path = dir.join(name);
        export::write_matrix_csv_to_path(&table, &path)?;
        written.push(path);
    }
    for path in &written {
        info!("Wrote {:?}", path);
    }
    Ok(written)
}
