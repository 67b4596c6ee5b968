use crate::cli::SpheresArgs;
use crate::error::{CliError, Result};
use crate::utils::output::{self, BLURRED_SPHERES_COLUMNS, SPHERES_COLUMNS};
use dnacc::core::derjaguin::{GaussianBlur, calc_spheres_potential};
use dnacc::workflows::plates::EvaluationResult;
use std::fs::File;
use std::io::BufWriter;
use tracing::{info, warn};

pub fn run(args: SpheresArgs) -> Result<()> {
    if !(args.radius > 0.0 && args.radius.is_finite()) {
        return Err(CliError::Argument(format!(
            "Sphere radius must be positive and finite, got {}",
            args.radius
        )));
    }
    let blur = args
        .blurred_output
        .as_ref()
        .map(|_| GaussianBlur::new(args.blur_width, args.blur_kernel_size))
        .transpose()
        .map_err(|e| CliError::Argument(e.to_string()))?;

    let (config, results) = super::evaluate(&args.sweep)?;
    let h = &config.separations;
    let unit = config.length_unit;
    if h.last().is_some_and(|&max_h| args.radius < 10.0 * max_h) {
        warn!(
            "Sphere radius {} is not much larger than the widest separation; the Derjaguin approximation may be poor.",
            args.radius
        );
    }

    let sphere_curve = |plate: fn(&EvaluationResult) -> f64| {
        let plate: Vec<f64> = results.iter().map(plate).collect();
        calc_spheres_potential(h, &plate, args.radius)
    };
    let rep = sphere_curve(EvaluationResult::rep_free_energy_density)?;
    let att = sphere_curve(EvaluationResult::att_free_energy_density)?;
    let total = sphere_curve(EvaluationResult::free_energy_density)?;

    info!("Writing {} rows to {:?}", h.len(), &args.sweep.output);
    let rows = (0..h.len()).map(|k| [h[k] / unit, rep[k], att[k], total[k]]);
    output::write_table(
        BufWriter::new(File::create(&args.sweep.output)?),
        &SPHERES_COLUMNS,
        rows,
    )?;

    println!(
        "✓ Sphere potentials (R = {}) for {} separations written to: {}",
        args.radius,
        h.len(),
        args.sweep.output.display()
    );

    if let (Some(blur), Some(path)) = (blur, &args.blurred_output) {
        let grid = blur.resampled_separations(h);
        let blurred_rep = blur.apply(h, &rep)?;
        let blurred_total = blur.apply(h, &total)?;
        info!(
            width = blur.width(),
            "Writing {} blurred rows to {:?}",
            grid.len(),
            path
        );
        let rows = (0..grid.len()).map(|k| {
            [
                grid[k] / unit,
                blurred_rep[k],
                blurred_total[k] - blurred_rep[k],
                blurred_total[k],
            ]
        });
        output::write_table(
            BufWriter::new(File::create(path)?),
            &BLURRED_SPHERES_COLUMNS,
            rows,
        )?;
        println!(
            "✓ Blurred sphere potentials (width = {}) written to: {}",
            blur.width(),
            path.display()
        );
    }
    Ok(())
}
