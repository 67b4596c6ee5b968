use crate::engine::binding::BindingProblem;
use crate::engine::config::SolverConfig;
use crate::engine::error::ModelError;
use nalgebra::DVector;
use tracing::{debug, instrument, trace, warn};

/// Self-consistent free and bound areal densities at one separation.
#[derive(Debug, Clone, PartialEq)]
pub struct Equilibrium {
    /// Free (unbound) density of each tether type, indexed like [`BindingProblem::ids`].
    pub free: DVector<f64>,
    /// Bound density of each pair, indexed like [`BindingProblem::pairs`].
    pub bound: DVector<f64>,
    pub iterations: usize,
}

/// Free energy per unit area in kT, relative to all tethers free and unconfined.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FreeEnergy {
    pub attractive: f64,
    pub repulsive: f64,
}

impl FreeEnergy {
    #[inline]
    pub fn total(&self) -> f64 {
        self.attractive + self.repulsive
    }
}

/// Solves the mass-action equations `x_p = K_p f_a f_b`, `σ_i = f_i + Σ_p n_{p,i} x_p` by
/// fixed-point iteration.
///
/// Each sweep first derives the bound densities from the current free densities, checks the
/// largest relative change of any bound density against the tolerance, then updates the free
/// densities from mass balance, mixing geometrically with the previous values according to
/// the damping.
#[instrument(level = "debug", skip_all, fields(h = problem.separation, types = problem.ids.len(), pairs = problem.pairs.len()))]
pub fn solve(problem: &BindingProblem, config: &SolverConfig) -> Result<Equilibrium, ModelError> {
    let n = problem.sigmas.len();
    let m = problem.pairs.len();
    let mut free = problem.sigmas.clone();
    let mut bound = DVector::<f64>::zeros(m);
    let mut residual = f64::INFINITY;

    for iteration in 1..=config.max_iterations {
        let next_bound = DVector::from_iterator(
            m,
            problem
                .pairs
                .iter()
                .map(|p| p.constant * free[p.first] * free[p.second]),
        );
        if next_bound.iter().any(|x| !x.is_finite()) {
            return Err(ModelError::Convergence {
                iterations: iteration,
                residual: f64::INFINITY,
            });
        }
        residual = max_relative_change(&bound, &next_bound);
        bound = next_bound;
        trace!(iteration, residual, "Fixed-point sweep.");

        if residual <= config.tolerance {
            if iteration > config.max_iterations / 2 {
                warn!(
                    "Equilibrium at h = {} needed {} of {} allowed iterations.",
                    problem.separation, iteration, config.max_iterations
                );
            }
            debug!("Converged after {} iterations.", iteration);
            return Ok(Equilibrium {
                free,
                bound,
                iterations: iteration,
            });
        }

        let mut load = DVector::<f64>::zeros(n);
        for p in &problem.pairs {
            if p.is_homotypic() {
                load[p.first] += 2.0 * p.constant * free[p.first];
            } else {
                load[p.first] += p.constant * free[p.second];
                load[p.second] += p.constant * free[p.first];
            }
        }
        for i in 0..n {
            let sigma = problem.sigmas[i];
            if sigma == 0.0 {
                free[i] = 0.0;
                continue;
            }
            let target = sigma / (1.0 + load[i]);
            free[i] = if config.damping == 0.0 {
                target
            } else {
                free[i].powf(config.damping) * target.powf(1.0 - config.damping)
            };
        }
    }

    Err(ModelError::Convergence {
        iterations: config.max_iterations,
        residual,
    })
}

fn max_relative_change(old: &DVector<f64>, new: &DVector<f64>) -> f64 {
    old.iter()
        .zip(new.iter())
        .map(|(&o, &n)| {
            let change = (n - o).abs();
            if n > 0.0 { change / n } else { change }
        })
        .fold(0.0, f64::max)
}

/// Evaluates the mean-field free energy of a solved problem.
///
/// The attractive part is
/// `Σ_i [f_i ln(f_i/σ_i) − f_i + σ_i] + Σ_p x_p [ln(x_p / (K_p σ_a σ_b)) − 1]`, which vanishes
/// when every tether is free; the repulsive part is `−Σ_i σ_i ln e_i`. Terms of tether types
/// with zero density, and of pairs with zero bound density, are zero.
pub fn free_energy(problem: &BindingProblem, equilibrium: &Equilibrium) -> FreeEnergy {
    let ln_free_fraction = |i: usize| -> f64 {
        let sigma = problem.sigmas[i];
        let f = equilibrium.free[i];
        if sigma > 0.0 && f > 0.0 { (f / sigma).ln() } else { 0.0 }
    };

    let mut attractive = 0.0;
    for i in 0..problem.sigmas.len() {
        let sigma = problem.sigmas[i];
        if sigma == 0.0 {
            continue;
        }
        let f = equilibrium.free[i];
        attractive += f * ln_free_fraction(i) - f + sigma;
    }
    for (p, &x) in problem.pairs.iter().zip(equilibrium.bound.iter()) {
        if x > 0.0 {
            // x / (K σ_a σ_b) = (f_a/σ_a)(f_b/σ_b) at equilibrium.
            attractive += x * (ln_free_fraction(p.first) + ln_free_fraction(p.second) - 1.0);
        }
    }

    // `+ 0.0` turns the `-0.0` of unconfined tethers into `0.0`.
    let repulsive = problem
        .sigmas
        .iter()
        .zip(problem.ln_exclusions.iter())
        .filter(|(sigma, _)| **sigma > 0.0)
        .map(|(sigma, ln_e)| -sigma * ln_e)
        .sum::<f64>()
        + 0.0;

    FreeEnergy {
        attractive,
        repulsive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::{TetherPair, TetherTypeId};
    use crate::engine::binding::{BindingKind, BindingPair};
    use slotmap::SlotMap;

    fn two_type_problem(sigma_a: f64, sigma_b: f64, constant: f64) -> BindingProblem {
        let mut keys: SlotMap<TetherTypeId, ()> = SlotMap::with_key();
        let (a, b) = (keys.insert(()), keys.insert(()));
        BindingProblem {
            separation: 1.0,
            ids: vec![a, b],
            sigmas: DVector::from_vec(vec![sigma_a, sigma_b]),
            ln_exclusions: DVector::from_vec(vec![0.0, 0.0]),
            pairs: vec![BindingPair {
                pair: TetherPair::new(a, b),
                kind: BindingKind::Bridge,
                first: 0,
                second: 1,
                constant,
            }],
        }
    }

    /// Exact bound density of a single bridge pair: root of `x = K (σa − x)(σb − x)`.
    fn exact_bound(sigma_a: f64, sigma_b: f64, k: f64) -> f64 {
        let b = sigma_a + sigma_b + 1.0 / k;
        (b - (b * b - 4.0 * sigma_a * sigma_b).sqrt()) / 2.0
    }

    #[test]
    fn single_pair_matches_closed_form() {
        let problem = two_type_problem(0.01, 0.02, 300.0);
        let eq = solve(&problem, &SolverConfig::default()).unwrap();
        let expected = exact_bound(0.01, 0.02, 300.0);
        assert!((eq.bound[0] - expected).abs() < 1e-9 * expected);
        assert!((eq.free[0] - (0.01 - expected)).abs() < 1e-9 * 0.01);
        assert!((eq.free[1] - (0.02 - expected)).abs() < 1e-9 * 0.02);
    }

    #[test]
    fn attractive_free_energy_matches_per_tether_formula() {
        // For bridges only, the attractive term equals Σ σ_i [ln p_i + (1 − p_i)/2].
        let problem = two_type_problem(0.01, 0.015, 500.0);
        let eq = solve(&problem, &SolverConfig::default()).unwrap();
        let energy = free_energy(&problem, &eq);
        let expected: f64 = (0..2)
            .map(|i| {
                let sigma = problem.sigmas[i];
                let p = eq.free[i] / sigma;
                sigma * (p.ln() + 0.5 * (1.0 - p))
            })
            .sum();
        assert!((energy.attractive - expected).abs() < 1e-7 * expected.abs());
        assert!(energy.attractive < 0.0);
        assert_eq!(energy.repulsive, 0.0);
        assert!(energy.repulsive.is_sign_positive());
    }

    #[test]
    fn zero_density_type_contributes_nothing_and_produces_no_nan() {
        let problem = two_type_problem(0.0, 0.02, 300.0);
        let eq = solve(&problem, &SolverConfig::default()).unwrap();
        assert_eq!(eq.free[0], 0.0);
        assert_eq!(eq.bound[0], 0.0);
        assert_eq!(eq.free[1], 0.02);
        let energy = free_energy(&problem, &eq);
        assert_eq!(energy.attractive, 0.0);
        assert!(energy.total().is_finite());
    }

    #[test]
    fn no_pairs_converges_immediately_to_free_tethers() {
        let mut problem = two_type_problem(0.01, 0.01, 1.0);
        problem.pairs.clear();
        let eq = solve(&problem, &SolverConfig::default()).unwrap();
        assert_eq!(eq.iterations, 1);
        assert_eq!(free_energy(&problem, &eq).total(), 0.0);
    }

    #[test]
    fn repulsive_term_counts_confined_tethers() {
        let mut problem = two_type_problem(0.01, 0.03, 1.0);
        problem.pairs.clear();
        problem.ln_exclusions = DVector::from_vec(vec![0.5_f64.ln(), 0.25_f64.ln()]);
        let eq = solve(&problem, &SolverConfig::default()).unwrap();
        let energy = free_energy(&problem, &eq);
        let expected = -0.01 * 0.5_f64.ln() - 0.03 * 0.25_f64.ln();
        assert!((energy.repulsive - expected).abs() < 1e-15);
    }

    #[test]
    fn homotypic_loops_consume_two_tethers_per_bond() {
        let mut keys: SlotMap<TetherTypeId, ()> = SlotMap::with_key();
        let a = keys.insert(());
        let k = 400.0;
        let sigma = 0.01;
        let problem = BindingProblem {
            separation: 1.0,
            ids: vec![a],
            sigmas: DVector::from_vec(vec![sigma]),
            ln_exclusions: DVector::from_vec(vec![0.0]),
            pairs: vec![BindingPair {
                pair: TetherPair::new(a, a),
                kind: BindingKind::Loop,
                first: 0,
                second: 0,
                constant: 0.5 * k,
            }],
        };
        let eq = solve(&problem, &SolverConfig::default()).unwrap();
        // σ = f + K f²  ⇒  f = (−1 + √(1 + 4Kσ)) / 2K.
        let f = (-1.0 + (1.0 + 4.0 * k * sigma).sqrt()) / (2.0 * k);
        assert!((eq.free[0] - f).abs() < 1e-8 * f);
        assert!((eq.free[0] + 2.0 * eq.bound[0] - sigma).abs() < 1e-8 * sigma);
        let energy = free_energy(&problem, &eq);
        let p = f / sigma;
        let expected = sigma * (p.ln() + 0.5 * (1.0 - p));
        assert!((energy.attractive - expected).abs() < 1e-7 * expected.abs());
    }

    #[test]
    fn undamped_iteration_with_huge_binding_constant_fails_fast() {
        let problem = two_type_problem(0.01, 0.01, 1e16);
        let config = SolverConfig::builder()
            .damping(0.0)
            .max_iterations(50)
            .build()
            .unwrap();
        match solve(&problem, &config) {
            Err(ModelError::Convergence { iterations, .. }) => assert_eq!(iterations, 50),
            other => panic!("expected convergence failure, got {other:?}"),
        }
    }

    #[test]
    fn damped_iteration_handles_huge_binding_constant() {
        let problem = two_type_problem(0.01, 0.01, 1e16);
        let eq = solve(&problem, &SolverConfig::default()).unwrap();
        // Symmetric densities: f (1 + K f) = σ.
        let k: f64 = 1e16;
        let f = (-1.0 + (1.0 + 4.0 * k * 0.01).sqrt()) / (2.0 * k);
        assert!((eq.free[0] - f).abs() < 1e-8 * f);
        assert!((eq.free[0] + eq.bound[0] - 0.01).abs() < 1e-12);
        assert!(eq.bound[0] <= 0.01);
    }

    #[test]
    fn non_finite_binding_constant_is_reported_as_convergence_failure() {
        let problem = two_type_problem(0.01, 0.01, f64::INFINITY);
        assert!(matches!(
            solve(&problem, &SolverConfig::default()),
            Err(ModelError::Convergence { .. })
        ));
    }
}
