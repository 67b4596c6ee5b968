use thiserror::Error;

pub const DEFAULT_TOLERANCE: f64 = 1e-10;
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;
pub const DEFAULT_DAMPING: f64 = 0.5;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value {value} for parameter '{name}': {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

/// Controls the fixed-point iteration of the equilibrium solver.
///
/// `damping` is the weight of the previous free densities in a geometric mix with the
/// mass-action update; `0` means plain substitution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    pub tolerance: f64,
    pub max_iterations: usize,
    pub damping: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            damping: DEFAULT_DAMPING,
        }
    }
}

impl SolverConfig {
    pub fn builder() -> SolverConfigBuilder {
        SolverConfigBuilder::new()
    }
}

#[derive(Default)]
pub struct SolverConfigBuilder {
    tolerance: Option<f64>,
    max_iterations: Option<usize>,
    damping: Option<f64>,
}

impl SolverConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }
    pub fn damping(mut self, damping: f64) -> Self {
        self.damping = Some(damping);
        self
    }

    pub fn build(self) -> Result<SolverConfig, ConfigError> {
        let tolerance = self.tolerance.unwrap_or(DEFAULT_TOLERANCE);
        if !(tolerance > 0.0 && tolerance.is_finite()) {
            return Err(ConfigError::InvalidParameter {
                name: "tolerance",
                value: tolerance,
                reason: "must be positive and finite",
            });
        }
        let max_iterations = self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS);
        if max_iterations == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_iterations",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        let damping = self.damping.unwrap_or(DEFAULT_DAMPING);
        if !(0.0..1.0).contains(&damping) {
            return Err(ConfigError::InvalidParameter {
                name: "damping",
                value: damping,
                reason: "must lie in [0, 1)",
            });
        }
        Ok(SolverConfig {
            tolerance,
            max_iterations,
            damping,
        })
    }
}
