use clap::{Args, Parser, Subcommand};
use dnacc::core::derjaguin::GaussianBlur;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "DNACC contributors",
    version,
    about = "DNACC CLI - Mean-field free energies of DNA-coated plates and spheres.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to evaluate separations in parallel.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tabulate the free energy per unit area between two plates.
    Plates(PlatesArgs),
    /// Tabulate the interaction between two identical spheres via the Derjaguin approximation.
    Spheres(SpheresArgs),
}

/// Arguments shared by every sweep command.
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Path to the sweep description in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Path for the tab-separated output table.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: --set solver.damping=0.8
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

/// Arguments for the `plates` subcommand.
#[derive(Args, Debug)]
pub struct PlatesArgs {
    #[command(flatten)]
    pub sweep: SweepArgs,
}

/// Arguments for the `spheres` subcommand.
#[derive(Args, Debug)]
pub struct SpheresArgs {
    #[command(flatten)]
    pub sweep: SweepArgs,

    /// Sphere radius, in the same length unit as the separations.
    #[arg(short = 'R', long, required = true, value_name = "FLOAT")]
    pub radius: f64,

    /// Also write the sphere potentials blurred by a Gaussian to this path.
    #[arg(long, value_name = "PATH")]
    pub blurred_output: Option<PathBuf>,

    /// Standard deviation of the blur, in the same length unit as the separations.
    #[arg(long, default_value_t = GaussianBlur::DEFAULT_WIDTH, value_name = "FLOAT")]
    pub blur_width: f64,

    /// Number of points in the blur kernel (odd).
    #[arg(long, default_value_t = GaussianBlur::DEFAULT_KERNEL_SIZE, value_name = "NUM")]
    pub blur_kernel_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_spheres_command_with_global_flags() {
        let cli = Cli::try_parse_from([
            "dnacc", "-vv", "-j", "4", "spheres", "-c", "sweep.toml", "-o", "out.tsv", "-R",
            "500", "--set", "solver.damping=0.8", "--set", "separations.count=10",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.threads, Some(4));
        let Commands::Spheres(args) = cli.command else {
            panic!("expected spheres command");
        };
        assert_eq!(args.radius, 500.0);
        assert_eq!(args.sweep.config, PathBuf::from("sweep.toml"));
        assert_eq!(
            args.sweep.set_values,
            ["solver.damping=0.8", "separations.count=10"]
        );
    }

    #[test]
    fn blur_options_default_to_three_unit_width() {
        let cli = Cli::try_parse_from([
            "dnacc", "spheres", "-c", "a.toml", "-o", "b.tsv", "-R", "550",
            "--blurred-output", "blurred.tsv",
        ])
        .unwrap();
        let Commands::Spheres(args) = cli.command else {
            panic!("expected spheres command");
        };
        assert_eq!(args.blurred_output, Some(PathBuf::from("blurred.tsv")));
        assert_eq!(args.blur_width, 3.0);
        assert_eq!(args.blur_kernel_size, 201);
    }

    #[test]
    fn spheres_command_requires_radius() {
        assert!(Cli::try_parse_from(["dnacc", "spheres", "-c", "a.toml", "-o", "b.tsv"]).is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(
            Cli::try_parse_from(["dnacc", "-q", "-v", "plates", "-c", "a.toml", "-o", "b.tsv"])
                .is_err()
        );
    }
}
