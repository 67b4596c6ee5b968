//! # Polymer Statistics Module
//!
//! Pluggable Boltzmann weights used by the equilibrium solver.
//!
//! ## Overview
//!
//! The solver never looks at polymer physics directly. It asks a [`TetherStatistics`]
//! provider three questions about the current geometry:
//!
//! - How likely is a **bridge** between a tether on one plate and a tether on the other?
//! - How likely is a **loop** between two tethers grafted on the same plate?
//! - What fraction of a free tether's configurations survive the **exclusion** imposed by the
//!   opposing plate?
//!
//! Bridge and loop weights are areal (length²): configurational weights in length⁻¹ divided by
//! a reference concentration, so that multiplying by `exp(-βΔG₀)` yields a binding constant
//! for areal densities.
//!
//! ## Key Components
//!
//! - [`rods`] - Freely hinged rigid rods (the default)
//! - [`gaussian`] - Ideal Gaussian chains between absorbing plates
//! - [`tabulated`] - Linear interpolation of empirical tables

pub mod gaussian;
pub mod rods;
pub mod tabulated;

use crate::core::models::tether::TetherType;
use thiserror::Error;

/// 1 mol/L expressed in nm⁻³.
pub const REFERENCE_CONCENTRATION_PER_NM3: f64 = 0.602_214_076;

/// The geometric state handed to every statistics query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateGeometry {
    pub separation: f64,
}

impl PlateGeometry {
    pub fn new(separation: f64) -> Self {
        Self { separation }
    }
}

#[derive(Debug, Error)]
pub enum StatisticsError {
    #[error("Invalid plate separation: {0}")]
    InvalidSeparation(f64),

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },

    #[error("Invalid table: {0}")]
    InvalidTable(String),
}

/// Supplies the Boltzmann weights of the tether configurations the mean-field model needs.
pub trait TetherStatistics: Send + Sync {
    /// Weight of one bridge between `i` and `j`, grafted on opposite plates.
    fn boltz_binding_bridge(&self, system: &PlateGeometry, i: &TetherType, j: &TetherType) -> f64;

    /// Weight of one loop between `i` and `j`, grafted on the same plate.
    fn boltz_binding_loop(&self, system: &PlateGeometry, i: &TetherType, j: &TetherType) -> f64;

    /// Fraction of an unbound tether's configurations compatible with the opposing plate.
    fn boltz_exclusion(&self, system: &PlateGeometry, i: &TetherType) -> f64;

    /// Natural log of [`boltz_binding_bridge`](Self::boltz_binding_bridge); `-∞` when no
    /// bridge is possible.
    ///
    /// Providers whose weights underflow in narrow gaps override the three `ln_*` methods so
    /// that ratios such as `w / (e_i e_j)` stay finite.
    fn ln_boltz_binding_bridge(
        &self,
        system: &PlateGeometry,
        i: &TetherType,
        j: &TetherType,
    ) -> f64 {
        self.boltz_binding_bridge(system, i, j).ln()
    }

    fn ln_boltz_binding_loop(&self, system: &PlateGeometry, i: &TetherType, j: &TetherType) -> f64 {
        self.boltz_binding_loop(system, i, j).ln()
    }

    fn ln_boltz_exclusion(&self, system: &PlateGeometry, i: &TetherType) -> f64 {
        self.boltz_exclusion(system, i).ln()
    }

    fn check_system(&self, system: &PlateGeometry) -> Result<(), StatisticsError> {
        check_separation(system.separation)
    }
}

pub(crate) fn check_separation(separation: f64) -> Result<(), StatisticsError> {
    if separation > 0.0 && separation.is_finite() {
        Ok(())
    } else {
        Err(StatisticsError::InvalidSeparation(separation))
    }
}
