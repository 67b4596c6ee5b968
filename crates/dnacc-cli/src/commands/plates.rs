use crate::cli::PlatesArgs;
use crate::error::Result;
use crate::utils::output::{self, PLATES_COLUMNS};
use std::fs::File;
use std::io::BufWriter;
use tracing::info;

pub fn run(args: PlatesArgs) -> Result<()> {
    let (config, results) = super::evaluate(&args.sweep)?;
    let unit = config.length_unit;
    let area = unit * unit;

    info!("Writing {} rows to {:?}", results.len(), &args.sweep.output);
    let rows = results.iter().map(|r| {
        [
            r.separation() / unit,
            r.rep_free_energy_density() * area,
            r.att_free_energy_density() * area,
            r.free_energy_density() * area,
        ]
    });
    output::write_table(
        BufWriter::new(File::create(&args.sweep.output)?),
        &PLATES_COLUMNS,
        rows,
    )?;

    println!(
        "✓ Plate free energies for {} separations written to: {}",
        results.len(),
        args.sweep.output.display()
    );
    Ok(())
}
