use crate::cli::SweepArgs;
use crate::error::{CliError, Result};
use dnacc::core::models::tether::{Plate, TetherParams};
use dnacc::core::statistics::gaussian::GaussianChains;
use dnacc::core::statistics::rods::RigidRods;
use dnacc::core::statistics::tabulated::TabulatedStatistics;
use dnacc::core::statistics::{REFERENCE_CONCENTRATION_PER_NM3, TetherStatistics};
use dnacc::engine::config::SolverConfig;
use dnacc::engine::error::ModelError;
use dnacc::workflows::plates::PlatesMeanField;
use dnacc::workflows::sweep::linspace;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const DEFAULT_LENGTH_SCALE: f64 = 1.0;
const DEFAULT_LENGTH_UNIT: f64 = 1.0;
const DEFAULT_TABLE_DELIMITER: char = '\t';

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialStatisticsConfig {
    model: Option<String>,
    reference_concentration: Option<f64>,
    persistence_length: Option<f64>,
    bridge_table: Option<PathBuf>,
    loop_table: Option<PathBuf>,
    exclusion_table: Option<PathBuf>,
    length_scale: Option<f64>,
    exclusion_length_scale: Option<f64>,
    delimiter: Option<char>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSolverConfig {
    tolerance: Option<f64>,
    max_iterations: Option<usize>,
    damping: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSeparations {
    start: Option<f64>,
    stop: Option<f64>,
    count: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialOutputConfig {
    length_unit: Option<f64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileTether {
    plate: String,
    sticky_end: String,
    sigma: Option<f64>,
    length: Option<f64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileBinding {
    sticky_ends: [String; 2],
    beta_delta_g0: f64,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialSweepConfig {
    statistics: Option<PartialStatisticsConfig>,
    solver: Option<PartialSolverConfig>,
    separations: Option<PartialSeparations>,
    output: Option<PartialOutputConfig>,
    tether_prototype: Option<TetherParams>,
    #[serde(default)]
    tethers: Vec<FileTether>,
    #[serde(default)]
    bindings: Vec<FileBinding>,
}

/// Which binding statistics the sweep uses, with table paths already resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum StatisticsChoice {
    RigidRods {
        reference_concentration: f64,
    },
    GaussianChains {
        persistence_length: f64,
        reference_concentration: f64,
    },
    Tabulated {
        bridge_table: PathBuf,
        loop_table: PathBuf,
        exclusion_table: PathBuf,
        length_scale: f64,
        exclusion_length_scale: f64,
        delimiter: u8,
    },
}

impl StatisticsChoice {
    pub fn build(&self) -> Result<Arc<dyn TetherStatistics>> {
        let statistics: Arc<dyn TetherStatistics> = match self {
            StatisticsChoice::RigidRods {
                reference_concentration,
            } => Arc::new(RigidRods::with_reference_concentration(
                *reference_concentration,
            )),
            StatisticsChoice::GaussianChains {
                persistence_length,
                reference_concentration,
            } => Arc::new(
                GaussianChains::new(*persistence_length)
                    .with_reference_concentration(*reference_concentration),
            ),
            StatisticsChoice::Tabulated {
                bridge_table,
                loop_table,
                exclusion_table,
                length_scale,
                exclusion_length_scale,
                delimiter,
            } => Arc::new(
                TabulatedStatistics::load(
                    bridge_table,
                    loop_table,
                    exclusion_table,
                    *length_scale,
                    *exclusion_length_scale,
                    *delimiter,
                )
                .map_err(ModelError::from)?,
            ),
        };
        Ok(statistics)
    }
}

#[derive(Debug, Clone)]
pub struct TetherSpec {
    pub plate: Plate,
    pub sticky_end: String,
    pub params: TetherParams,
}

#[derive(Debug, Clone)]
pub struct BindingSpec {
    pub sticky_ends: (String, String),
    pub beta_delta_g0: f64,
}

/// A fully merged sweep description.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub statistics: StatisticsChoice,
    pub solver: SolverConfig,
    pub separations: Vec<f64>,
    /// Output tables report separations in this unit and plate free energies per unit².
    pub length_unit: f64,
    pub prototype: Option<TetherParams>,
    pub tethers: Vec<TetherSpec>,
    pub bindings: Vec<BindingSpec>,
}

impl SweepConfig {
    /// Reads `args.config`, applies the `--set` overrides and fills in defaults.
    pub fn load(args: &SweepArgs) -> Result<Self> {
        let base_dir = args
            .config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        PartialSweepConfig::from_file(&args.config)?.merge_with_cli(&args.set_values, &base_dir)
    }

    /// Builds the mean-field model this sweep evaluates.
    pub fn build_model(&self) -> Result<PlatesMeanField> {
        let mut model = PlatesMeanField::with_statistics(self.statistics.build()?)
            .with_solver_config(self.solver);
        if let Some(prototype) = self.prototype {
            let defaults = *model.tether_type_prototype();
            model.set_tether_type_prototype(prototype.or(&defaults));
        }
        for tether in &self.tethers {
            model.add_tether_type_with(tether.plate, tether.sticky_end.clone(), tether.params)?;
        }
        for binding in &self.bindings {
            let (a, b) = &binding.sticky_ends;
            model
                .beta_delta_g0_mut()
                .set(a, b, binding.beta_delta_g0)
                .map_err(ModelError::from)?;
        }
        Ok(model)
    }
}

impl PartialSweepConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading sweep description from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn merge_with_cli(
        mut self,
        set_values: &[String],
        base_dir: &Path,
    ) -> Result<SweepConfig> {
        self.apply_set_values(set_values)?;

        let statistics =
            Self::merge_statistics(self.statistics.take().unwrap_or_default(), base_dir)?;
        let solver = Self::merge_solver(self.solver.take().unwrap_or_default())?;
        let separations = Self::merge_separations(self.separations.take().unwrap_or_default())?;
        let length_unit = self
            .output
            .take()
            .and_then(|o| o.length_unit)
            .unwrap_or(DEFAULT_LENGTH_UNIT);
        if !(length_unit > 0.0 && length_unit.is_finite()) {
            return Err(CliError::Config(format!(
                "`output.length-unit` must be positive, got {}",
                length_unit
            )));
        }

        if self.tethers.is_empty() {
            return Err(CliError::Config(
                "At least one `[[tethers]]` entry is required.".to_string(),
            ));
        }
        let tethers = self
            .tethers
            .into_iter()
            .map(|t| -> Result<TetherSpec> {
                Ok(TetherSpec {
                    plate: t.plate.parse::<Plate>().map_err(ModelError::from)?,
                    sticky_end: t.sticky_end,
                    params: TetherParams {
                        sigma: t.sigma,
                        length: t.length,
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let bindings = self
            .bindings
            .into_iter()
            .map(|b| {
                let [first, second] = b.sticky_ends;
                BindingSpec {
                    sticky_ends: (first, second),
                    beta_delta_g0: b.beta_delta_g0,
                }
            })
            .collect();

        Ok(SweepConfig {
            statistics,
            solver,
            separations,
            length_unit,
            prototype: self.tether_prototype,
            tethers,
            bindings,
        })
    }

    fn merge_statistics(
        partial: PartialStatisticsConfig,
        base_dir: &Path,
    ) -> Result<StatisticsChoice> {
        let reference_concentration = partial
            .reference_concentration
            .unwrap_or(REFERENCE_CONCENTRATION_PER_NM3);
        if !(reference_concentration > 0.0 && reference_concentration.is_finite()) {
            return Err(CliError::Config(format!(
                "`statistics.reference-concentration` must be positive, got {}",
                reference_concentration
            )));
        }

        match partial.model.as_deref().unwrap_or("rigid-rods") {
            "rigid-rods" => Ok(StatisticsChoice::RigidRods {
                reference_concentration,
            }),
            "gaussian-chains" => {
                let persistence_length = partial.persistence_length.ok_or_else(|| {
                    CliError::Config(
                        "`gaussian-chains` statistics require `persistence-length`".to_string(),
                    )
                })?;
                if !(persistence_length > 0.0 && persistence_length.is_finite()) {
                    return Err(CliError::Config(format!(
                        "`statistics.persistence-length` must be positive, got {}",
                        persistence_length
                    )));
                }
                Ok(StatisticsChoice::GaussianChains {
                    persistence_length,
                    reference_concentration,
                })
            }
            "tabulated" => {
                let resolve = |path: Option<PathBuf>, key: &str| -> Result<PathBuf> {
                    let path = path.ok_or_else(|| {
                        CliError::Config(format!("`tabulated` statistics require `{}`", key))
                    })?;
                    Ok(if path.is_absolute() {
                        path
                    } else {
                        base_dir.join(path)
                    })
                };
                let delimiter = partial.delimiter.unwrap_or(DEFAULT_TABLE_DELIMITER);
                let delimiter = u8::try_from(delimiter).map_err(|_| {
                    CliError::Config(format!(
                        "`statistics.delimiter` must be a single-byte character, got {:?}",
                        delimiter
                    ))
                })?;
                let length_scale = partial.length_scale.unwrap_or(DEFAULT_LENGTH_SCALE);
                Ok(StatisticsChoice::Tabulated {
                    bridge_table: resolve(partial.bridge_table, "bridge-table")?,
                    loop_table: resolve(partial.loop_table, "loop-table")?,
                    exclusion_table: resolve(partial.exclusion_table, "exclusion-table")?,
                    length_scale,
                    exclusion_length_scale: partial.exclusion_length_scale.unwrap_or(length_scale),
                    delimiter,
                })
            }
            other => Err(CliError::Config(format!(
                "Unknown statistics model '{}'. Expected 'rigid-rods', 'gaussian-chains' or 'tabulated'.",
                other
            ))),
        }
    }

    fn merge_solver(partial: PartialSolverConfig) -> Result<SolverConfig> {
        let mut builder = SolverConfig::builder();
        if let Some(tolerance) = partial.tolerance {
            builder = builder.tolerance(tolerance);
        }
        if let Some(max_iterations) = partial.max_iterations {
            builder = builder.max_iterations(max_iterations);
        }
        if let Some(damping) = partial.damping {
            builder = builder.damping(damping);
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn merge_separations(partial: PartialSeparations) -> Result<Vec<f64>> {
        let require = |value: Option<f64>, key: &str| {
            value.ok_or_else(|| CliError::Config(format!("`separations.{}` is required.", key)))
        };
        let start = require(partial.start, "start")?;
        let stop = require(partial.stop, "stop")?;
        let count = partial
            .count
            .ok_or_else(|| CliError::Config("`separations.count` is required.".to_string()))?;

        if count == 0 {
            return Err(CliError::Config(
                "`separations.count` must be at least 1.".to_string(),
            ));
        }
        if !(start > 0.0 && start.is_finite() && stop.is_finite()) {
            return Err(CliError::Config(format!(
                "Separations must be positive and finite, got start = {} and stop = {}",
                start, stop
            )));
        }
        if count > 1 && stop <= start {
            return Err(CliError::Config(format!(
                "`separations.stop` ({}) must exceed `separations.start` ({})",
                stop, start
            )));
        }
        Ok(linspace(start, stop, count))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;
            let key = key.trim();
            let value_str = value_str.trim();
            let float = || -> Result<f64> {
                value_str.parse().map_err(|_| {
                    CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
                })
            };
            let integer = || -> Result<usize> {
                value_str.parse().map_err(|_| {
                    CliError::Config(format!("Invalid integer value for {}: {}", key, value_str))
                })
            };

            match key {
                "solver.tolerance" => {
                    self.solver.get_or_insert_with(Default::default).tolerance = Some(float()?);
                }
                "solver.max-iterations" => {
                    self.solver
                        .get_or_insert_with(Default::default)
                        .max_iterations = Some(integer()?);
                }
                "solver.damping" => {
                    self.solver.get_or_insert_with(Default::default).damping = Some(float()?);
                }
                "separations.start" => {
                    self.separations.get_or_insert_with(Default::default).start = Some(float()?);
                }
                "separations.stop" => {
                    self.separations.get_or_insert_with(Default::default).stop = Some(float()?);
                }
                "separations.count" => {
                    self.separations.get_or_insert_with(Default::default).count = Some(integer()?);
                }
                "output.length-unit" => {
                    self.output.get_or_insert_with(Default::default).length_unit = Some(float()?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MINIMAL: &str = r#"
        [separations]
        start = 1.0
        stop = 40.0
        count = 40

        [[tethers]]
        plate = "lower"
        sticky-end = "alpha"
        sigma = 0.01

        [[tethers]]
        plate = "upper"
        sticky-end = "alphap"
        sigma = 0.01
        length = 15.0

        [[bindings]]
        sticky-ends = ["alpha", "alphap"]
        beta-delta-g0 = -5.0
    "#;

    fn merge(content: &str, set_values: &[&str]) -> Result<SweepConfig> {
        let set_values: Vec<String> = set_values.iter().map(|s| s.to_string()).collect();
        PartialSweepConfig::from_toml(content)
            .unwrap()
            .merge_with_cli(&set_values, Path::new("/data/sweeps"))
    }

    #[test]
    fn minimal_file_is_merged_with_defaults() {
        let config = merge(MINIMAL, &[]).unwrap();
        assert_eq!(
            config.statistics,
            StatisticsChoice::RigidRods {
                reference_concentration: REFERENCE_CONCENTRATION_PER_NM3
            }
        );
        assert_eq!(config.solver, SolverConfig::default());
        assert_eq!(config.separations.len(), 40);
        assert_eq!(config.separations[0], 1.0);
        assert_eq!(config.separations[39], 40.0);
        assert_eq!(config.tethers.len(), 2);
        assert_eq!(config.tethers[1].plate, Plate::Upper);
        assert_eq!(config.tethers[1].params.length, Some(15.0));
        assert_eq!(config.tethers[0].params.length, None);
        assert_eq!(config.bindings[0].sticky_ends.0, "alpha");
        assert_eq!(config.length_unit, 1.0);
    }

    #[test]
    fn length_unit_comes_from_file_or_set_values() {
        let content = format!("[output]\nlength-unit = 20.0\n{MINIMAL}");
        assert_eq!(merge(&content, &[]).unwrap().length_unit, 20.0);
        assert_eq!(
            merge(&content, &["output.length-unit=5"]).unwrap().length_unit,
            5.0
        );
        assert!(matches!(
            merge(MINIMAL, &["output.length-unit=0"]),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn set_values_override_file_and_defaults() {
        let config = merge(
            MINIMAL,
            &[
                "solver.damping=0.8",
                "solver.max-iterations = 200",
                "separations.count=5",
                "separations.stop=5.0",
            ],
        )
        .unwrap();
        assert_eq!(config.solver.damping, 0.8);
        assert_eq!(config.solver.max_iterations, 200);
        assert_eq!(config.separations, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        for bad in ["solver.damping", "solver.damping=high", "solver.unknown=1"] {
            assert!(
                matches!(merge(MINIMAL, &[bad]), Err(CliError::Config(_))),
                "{bad} should be rejected"
            );
        }
        assert!(matches!(
            merge(MINIMAL, &["solver.damping=1.5"]),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn separations_must_be_complete_and_increasing() {
        let without = MINIMAL.replace("count = 40", "");
        assert!(matches!(merge(&without, &[]), Err(CliError::Config(_))));
        assert!(matches!(
            merge(MINIMAL, &["separations.stop=0.5"]),
            Err(CliError::Config(_))
        ));
        assert!(matches!(
            merge(MINIMAL, &["separations.start=-1"]),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn unknown_keys_and_bad_plates_are_rejected() {
        assert!(PartialSweepConfig::from_toml("[solver]\nspeed = 3").is_err());
        let bad_plate = MINIMAL.replace("\"upper\"", "\"middle\"");
        assert!(matches!(
            merge(&bad_plate, &[]),
            Err(CliError::Model(ModelError::InvalidPlateLabel(_)))
        ));
    }

    #[test]
    fn gaussian_chains_require_persistence_length() {
        let content = format!("[statistics]\nmodel = \"gaussian-chains\"\n{MINIMAL}");
        assert!(matches!(merge(&content, &[]), Err(CliError::Config(_))));

        let content = format!(
            "[statistics]\nmodel = \"gaussian-chains\"\npersistence-length = 1.5\n{MINIMAL}"
        );
        assert_eq!(
            merge(&content, &[]).unwrap().statistics,
            StatisticsChoice::GaussianChains {
                persistence_length: 1.5,
                reference_concentration: REFERENCE_CONCENTRATION_PER_NM3
            }
        );
    }

    #[test]
    fn table_paths_resolve_against_the_config_directory() {
        let content = format!(
            r#"
            [statistics]
            model = "tabulated"
            bridge-table = "interN.dat"
            loop-table = "/abs/intraN.dat"
            exclusion-table = "exclN.dat"
            length-scale = 2.0
            delimiter = ","
            {MINIMAL}"#
        );
        let StatisticsChoice::Tabulated {
            bridge_table,
            loop_table,
            exclusion_length_scale,
            delimiter,
            ..
        } = merge(&content, &[]).unwrap().statistics
        else {
            panic!("expected tabulated statistics");
        };
        assert_eq!(bridge_table, PathBuf::from("/data/sweeps/interN.dat"));
        assert_eq!(loop_table, PathBuf::from("/abs/intraN.dat"));
        assert_eq!(exclusion_length_scale, 2.0);
        assert_eq!(delimiter, b',');
    }

    #[test]
    fn load_reads_file_and_builds_model() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweep.toml");
        let content = format!("[tether-prototype]\nlength = 10.0\n{MINIMAL}");
        fs::write(&path, content).unwrap();
        let args = SweepArgs {
            config: path,
            output: dir.path().join("out.tsv"),
            set_values: vec![],
        };

        let config = SweepConfig::load(&args).unwrap();
        let model = config.build_model().unwrap();

        let lengths: Vec<f64> = model.tether_types().map(|(_, t)| t.length()).collect();
        assert_eq!(lengths, vec![10.0, 15.0]);
        assert_eq!(model.beta_delta_g0().get("alphap", "alpha"), Some(-5.0));
        assert!(model.at(5.0).is_ok());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            PartialSweepConfig::from_file(&dir.path().join("missing.toml")),
            Err(CliError::Io(_))
        ));
    }
}
