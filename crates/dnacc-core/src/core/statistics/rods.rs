use super::{PlateGeometry, REFERENCE_CONCENTRATION_PER_NM3, TetherStatistics};
use crate::core::models::tether::TetherType;

/// Tethers modelled as rigid rods on a free hinge, their ends spread uniformly over a
/// hemisphere of radius equal to the contour length.
///
/// Integrating over lateral graft positions, a rod end's height is uniform on `[0, L]`, which
/// gives closed forms for every weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidRods {
    pub reference_concentration: f64,
}

impl Default for RigidRods {
    fn default() -> Self {
        Self {
            reference_concentration: REFERENCE_CONCENTRATION_PER_NM3,
        }
    }
}

impl RigidRods {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_concentration(reference_concentration: f64) -> Self {
        Self {
            reference_concentration,
        }
    }
}

impl TetherStatistics for RigidRods {
    fn boltz_binding_bridge(&self, system: &PlateGeometry, i: &TetherType, j: &TetherType) -> f64 {
        let h = system.separation;
        let overlap = (i.length.min(h) - (h - j.length).max(0.0)).max(0.0);
        overlap / (i.length * j.length * self.reference_concentration)
    }

    fn boltz_binding_loop(&self, system: &PlateGeometry, i: &TetherType, j: &TetherType) -> f64 {
        let overlap = i.length.min(j.length).min(system.separation);
        overlap / (i.length * j.length * self.reference_concentration)
    }

    fn boltz_exclusion(&self, system: &PlateGeometry, i: &TetherType) -> f64 {
        (system.separation / i.length).min(1.0)
    }
}
