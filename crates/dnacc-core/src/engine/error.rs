use crate::core::models::energies::InvalidFreeEnergy;
use crate::core::models::ids::TetherTypeId;
use crate::core::models::tether::ParsePlateError;
use crate::core::statistics::StatisticsError;
use thiserror::Error;

/// Broad classes of model failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    ConvergenceFailure,
    Configuration,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid plate separation: {0}")]
    InvalidSeparation(f64),

    #[error("Invalid areal density {value} for tether type with sticky end '{sticky_end}'")]
    InvalidDensity { sticky_end: String, value: f64 },

    #[error("Invalid contour length {value} for tether type with sticky end '{sticky_end}'")]
    InvalidLength { sticky_end: String, value: f64 },

    #[error(transparent)]
    InvalidPlateLabel(#[from] ParsePlateError),

    #[error(transparent)]
    InvalidFreeEnergy(#[from] InvalidFreeEnergy),

    #[error("Missing required tether parameter '{0}' and no prototype default is set")]
    MissingParameter(&'static str),

    #[error("Unknown tether type: {0:?}")]
    UnknownTetherType(TetherTypeId),

    #[error(
        "Binding statistics returned an invalid {quantity} weight (ln w = {value}) at h = {separation}"
    )]
    InvalidStatistics {
        quantity: &'static str,
        value: f64,
        separation: f64,
    },

    #[error("Binding statistics error: {source}")]
    Statistics {
        #[from]
        source: StatisticsError,
    },

    #[error(
        "Equilibrium solver failed to converge after {iterations} iterations (max relative change {residual:e})"
    )]
    Convergence { iterations: usize, residual: f64 },

    #[error("No tether types are registered")]
    NoTetherTypes,

    #[error("No binding free energy configured for sticky ends '{a}' and '{b}', which can bridge")]
    MissingFreeEnergy { a: String, b: String },
}

impl ModelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::Convergence { .. } => ErrorKind::ConvergenceFailure,
            ModelError::NoTetherTypes | ModelError::MissingFreeEnergy { .. } => {
                ErrorKind::Configuration
            }
            ModelError::Statistics {
                source: StatisticsError::InvalidSeparation(_),
            } => ErrorKind::InvalidInput,
            ModelError::Statistics { .. } => ErrorKind::Configuration,
            _ => ErrorKind::InvalidInput,
        }
    }
}
