pub mod plates;
pub mod spheres;

use crate::cli::SweepArgs;
use crate::config::SweepConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use dnacc::engine::progress::ProgressReporter;
use dnacc::workflows::plates::EvaluationResult;
use dnacc::workflows::sweep;
use tracing::info;

/// Loads the sweep description and evaluates the plate model at every separation.
fn evaluate(args: &SweepArgs) -> Result<(SweepConfig, Vec<EvaluationResult>)> {
    let config = SweepConfig::load(args)?;
    info!(
        tether_types = config.tethers.len(),
        separations = config.separations.len(),
        "Loaded sweep description from {:?}.",
        &args.config
    );
    let model = config.build_model()?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let results = sweep::run(&model, &config.separations, &reporter)?;
    Ok((config, results))
}
