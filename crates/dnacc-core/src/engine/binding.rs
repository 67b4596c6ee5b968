use crate::core::models::energies::BindingFreeEnergies;
use crate::core::models::ids::{TetherPair, TetherTypeId};
use crate::core::models::tether::TetherType;
use crate::core::statistics::{PlateGeometry, TetherStatistics};
use crate::engine::error::ModelError;
use nalgebra::DVector;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Bridge,
    Loop,
}

/// A pair of tether types that can bind at the current separation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindingPair {
    pub pair: TetherPair,
    pub kind: BindingKind,
    /// Index of the first partner in [`BindingProblem::ids`].
    pub first: usize,
    /// Index of the second partner; equal to `first` for homotypic pairs.
    pub second: usize,
    /// Areal binding constant: bound density = `constant · f_first · f_second`.
    ///
    /// Homotypic pairs carry half the binding constant, each bond consuming two tethers.
    pub constant: f64,
}

impl BindingPair {
    pub fn is_homotypic(&self) -> bool {
        self.first == self.second
    }
}

/// Everything the equilibrium solver needs at one separation.
#[derive(Debug, Clone)]
pub struct BindingProblem {
    pub separation: f64,
    pub ids: Vec<TetherTypeId>,
    pub sigmas: DVector<f64>,
    /// `ln e_i`, always finite and at most zero.
    pub ln_exclusions: DVector<f64>,
    pub pairs: Vec<BindingPair>,
}

/// Collects the binding pairs eligible at `geometry` and their binding constants
/// `K = exp(-βΔG₀) · w / (e_i e_j)`, with `w` the bridge or loop weight and `e` the exclusion
/// factors of the two partners. The constant is assembled from logarithms, so providers may
/// report weights far below `f64::MIN_POSITIVE`.
///
/// Cross-plate pairs whose bridge weight is positive must have a free energy configured.
/// Same-plate pairs loop only when the table has an entry for them.
pub fn assemble(
    tethers: &[(TetherTypeId, &TetherType)],
    energies: &BindingFreeEnergies,
    statistics: &dyn TetherStatistics,
    geometry: &PlateGeometry,
) -> Result<BindingProblem, ModelError> {
    let h = geometry.separation;
    let ln_exclusions = tethers
        .iter()
        .map(|(_, tether)| {
            let ln_e = statistics.ln_boltz_exclusion(geometry, tether);
            if ln_e.is_finite() && ln_e <= 0.0 {
                Ok(ln_e)
            } else {
                Err(ModelError::InvalidStatistics {
                    quantity: "exclusion",
                    value: ln_e,
                    separation: h,
                })
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut pairs = Vec::new();
    for (a, (id_a, tether_a)) in tethers.iter().enumerate() {
        for (b, (id_b, tether_b)) in tethers.iter().enumerate().skip(a) {
            let (kind, ln_weight, beta_delta_g0) = if tether_a.plate != tether_b.plate {
                let ln_weight = checked_ln_weight(
                    statistics.ln_boltz_binding_bridge(geometry, tether_a, tether_b),
                    "bridge",
                    h,
                )?;
                if ln_weight == f64::NEG_INFINITY {
                    continue;
                }
                let g = energies
                    .get(&tether_a.sticky_end, &tether_b.sticky_end)
                    .ok_or_else(|| ModelError::MissingFreeEnergy {
                        a: tether_a.sticky_end.clone(),
                        b: tether_b.sticky_end.clone(),
                    })?;
                (BindingKind::Bridge, ln_weight, g)
            } else {
                let Some(g) = energies.get(&tether_a.sticky_end, &tether_b.sticky_end) else {
                    continue;
                };
                let ln_weight = checked_ln_weight(
                    statistics.ln_boltz_binding_loop(geometry, tether_a, tether_b),
                    "loop",
                    h,
                )?;
                (BindingKind::Loop, ln_weight, g)
            };

            let ln_constant = -beta_delta_g0 + ln_weight - ln_exclusions[a] - ln_exclusions[b];
            let mut constant = ln_constant.exp();
            if a == b {
                constant *= 0.5;
            }
            if constant == 0.0 {
                continue;
            }
            trace!(?kind, first = a, second = b, constant, "Eligible binding pair.");
            pairs.push(BindingPair {
                pair: TetherPair::new(*id_a, *id_b),
                kind,
                first: a,
                second: b,
                constant,
            });
        }
    }

    Ok(BindingProblem {
        separation: h,
        ids: tethers.iter().map(|(id, _)| *id).collect(),
        sigmas: DVector::from_iterator(tethers.len(), tethers.iter().map(|(_, t)| t.sigma)),
        ln_exclusions: DVector::from_vec(ln_exclusions),
        pairs,
    })
}

/// Accepts any weight in `[0, ∞)`, i.e. a log in `[-∞, ∞)`.
fn checked_ln_weight(
    ln_weight: f64,
    quantity: &'static str,
    separation: f64,
) -> Result<f64, ModelError> {
    if ln_weight.is_nan() || ln_weight == f64::INFINITY {
        Err(ModelError::InvalidStatistics {
            quantity,
            value: ln_weight,
            separation,
        })
    } else {
        Ok(ln_weight)
    }
}
