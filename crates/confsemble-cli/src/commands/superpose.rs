use super::{mean, read_ensemble, write_ensemble};
use crate::cli::SuperposeArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use confsemble::engine::progress::ProgressReporter;
use confsemble::workflows;
use tracing::info;

pub fn run(args: SuperposeArgs) -> Result<()> {
    let partial_config = PartialConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_superpose(&args)?;

    let (mut ensemble, metadata) = read_ensemble(&args.input)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Superposing {} conformations...", ensemble.num_confs());
    let report = workflows::superpose::run(&mut ensemble, &config, &reporter)?;

    println!(
        "Mean RMSD: {:.3} A before, {:.3} A after ({} iteration(s)).",
        mean(&report.rmsds_before),
        mean(&report.rmsds_after),
        report.iterations
    );

    write_ensemble(&ensemble, &metadata, &args.output)?;
    println!("✓ Superposed ensemble written to: {}", args.output.display());
    Ok(())
}
