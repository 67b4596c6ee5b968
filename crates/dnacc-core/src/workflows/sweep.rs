use crate::engine::error::ModelError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::workflows::plates::{EvaluationResult, PlatesMeanField};
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Evaluates `model` at every separation, returning results in input order.
///
/// The first failing separation aborts the sweep. Separations that used more than half of the
/// solver's iteration budget are reported as [`Progress::Message`].
#[instrument(skip_all, name = "sweep_workflow", fields(separations = separations.len()))]
pub fn run(
    model: &PlatesMeanField,
    separations: &[f64],
    reporter: &ProgressReporter,
) -> Result<Vec<EvaluationResult>, ModelError> {
    info!("Evaluating {} separations.", separations.len());
    reporter.report(Progress::SweepStart {
        total_separations: separations.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = separations.iter();

    #[cfg(feature = "parallel")]
    let iterator = separations.par_iter();

    let budget = model.solver_config().max_iterations;
    let results = iterator
        .map(|&h| -> Result<EvaluationResult, ModelError> {
            let result = model.at(h)?;
            if result.iterations() > budget / 2 {
                reporter.report(Progress::Message(format!(
                    "h = {}: equilibrium needed {} of {} iterations",
                    h,
                    result.iterations(),
                    budget
                )));
            }
            reporter.report(Progress::SeparationDone { separation: h });
            Ok(result)
        })
        .collect::<Result<Vec<_>, _>>()?;

    reporter.report(Progress::SweepFinish);
    let iterations: usize = results.iter().map(EvaluationResult::iterations).sum();
    info!(total_iterations = iterations, "Sweep finished.");
    Ok(results)
}

/// `count` evenly spaced values from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    if i == count - 1 {
                        stop
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}
