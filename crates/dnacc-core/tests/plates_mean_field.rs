use dnacc::core::derjaguin::calc_spheres_potential;
use dnacc::core::models::ids::TetherTypeId;
use dnacc::core::models::tether::Plate;
use dnacc::core::statistics::gaussian::GaussianChains;
use dnacc::core::statistics::rods::RigidRods;
use dnacc::engine::config::SolverConfig;
use dnacc::engine::error::{ErrorKind, ModelError};
use dnacc::engine::progress::ProgressReporter;
use dnacc::workflows::plates::PlatesMeanField;
use dnacc::workflows::sweep;
use std::sync::Arc;

const SIGMA: f64 = 0.01;

fn complementary_plates(beta_delta_g0: f64) -> (PlatesMeanField, TetherTypeId, TetherTypeId) {
    let mut model = PlatesMeanField::new();
    let alpha = model
        .add_tether_type(Plate::Lower, "alpha", Some(SIGMA))
        .unwrap();
    let alphap = model
        .add_tether_type(Plate::Upper, "alphap", Some(SIGMA))
        .unwrap();
    model
        .beta_delta_g0_mut()
        .set("alpha", "alphap", beta_delta_g0)
        .unwrap();
    (model, alpha, alphap)
}

#[test]
fn binding_free_energy_magnitude_decreases_as_plates_separate() {
    let (model, alpha, alphap) = complementary_plates(-5.0);
    let separations = sweep::linspace(1.0, 40.0, 40);

    let results = sweep::run(&model, &separations, &ProgressReporter::new()).unwrap();

    // Checked on the attractive part: the steric term dominates below h ≈ 19, so the total
    // changes sign there and its magnitude first falls to zero and then rises again.
    assert!(results[17].free_energy_density() > 0.0);
    assert!(results[18].free_energy_density() < 0.0);

    for pair in results.windows(2) {
        let (near, far) = (&pair[0], &pair[1]);
        assert!(
            far.att_free_energy_density().abs() <= near.att_free_energy_density().abs() + 1e-12,
            "|F_att| grew from h = {} to h = {}",
            near.separation(),
            far.separation()
        );
    }
    for result in &results {
        assert!(result.free_energy_density().is_finite());
        let bound = result.sigma_bound(alpha, alphap);
        assert!(bound >= 0.0 && bound <= SIGMA);
    }
    assert_eq!(results[39].sigma_bound(alpha, alphap), 0.0);
}

#[test]
fn widely_separated_plates_are_fully_free() {
    let (model, alpha, alphap) = complementary_plates(-5.0);
    let result = model.at(45.0).unwrap();
    assert_eq!(result.sigma_bound(alpha, alphap), 0.0);
    assert_eq!(result.sigma_free(alpha), Some(SIGMA));
    assert_eq!(result.free_energy_density(), 0.0);
}

#[test]
fn evaluations_are_deterministic() {
    let (model, _, _) = complementary_plates(-7.0);
    for h in [2.0, 11.5, 25.0] {
        assert_eq!(model.at(h).unwrap(), model.at(h).unwrap());
    }
}

#[test]
fn swapping_plates_leaves_the_free_energy_unchanged() {
    let (model, _, _) = complementary_plates(-5.0);
    let mut swapped = PlatesMeanField::new();
    swapped
        .add_tether_type(Plate::Upper, "alpha", Some(SIGMA))
        .unwrap();
    swapped
        .add_tether_type(Plate::Lower, "alphap", Some(SIGMA))
        .unwrap();
    swapped
        .beta_delta_g0_mut()
        .set("alphap", "alpha", -5.0)
        .unwrap();

    assert_eq!(
        model.beta_delta_g0().get("alpha", "alphap"),
        swapped.beta_delta_g0().get("alphap", "alpha")
    );
    for h in [3.0, 15.0, 30.0] {
        let a = model.at(h).unwrap().free_energy_density();
        let b = swapped.at(h).unwrap().free_energy_density();
        assert!((a - b).abs() <= 1e-12 * a.abs().max(1e-12));
    }
}

#[test]
fn sphere_potential_vanishes_where_the_plate_potential_does() {
    let (model, _, _) = complementary_plates(-5.0);
    let separations = sweep::linspace(1.0, 45.0, 45);
    let results = sweep::run(&model, &separations, &ProgressReporter::new()).unwrap();
    let plate: Vec<f64> = results.iter().map(|r| r.free_energy_density()).collect();

    let sphere = calc_spheres_potential(&separations, &plate, 500.0).unwrap();

    for (h, w) in separations.iter().zip(&sphere) {
        if *h >= 40.0 {
            assert_eq!(*w, 0.0, "W({h}) should vanish");
        }
    }
    // Only bridging acts between 20 and 40 nm.
    assert!(sphere[38] < 0.0);
}

#[test]
fn undamped_solver_fails_for_very_strong_binding() {
    let (mut model, _, _) = complementary_plates(-40.0);
    let strict = SolverConfig::builder()
        .damping(0.0)
        .max_iterations(50)
        .build()
        .unwrap();
    model.set_solver_config(strict);

    let err = model.at(10.0).unwrap_err();
    assert!(matches!(err, ModelError::Convergence { iterations: 50, .. }));
    assert_eq!(err.kind(), ErrorKind::ConvergenceFailure);

    model.set_solver_config(SolverConfig::default());
    let result = model.at(10.0).unwrap();
    assert!(result.att_free_energy_density() < 0.0);
}

#[test]
fn gaussian_chains_bind_and_release() {
    let (model, alpha, alphap) = complementary_plates(-8.0);
    let model = {
        let mut model = model;
        model.set_statistics(Arc::new(GaussianChains::new(1.0)));
        model
    };

    let near = model.at(5.0).unwrap();
    assert!(near.sigma_bound(alpha, alphap) > 0.0);
    assert!(near.sigma_bound(alpha, alphap) <= SIGMA);
    assert!(near.rep_free_energy_density() > 0.0);

    let far = model.at(200.0).unwrap();
    assert!(far.free_energy_density().abs() < 1e-12);
}

#[test]
fn gaussian_chains_handle_gaps_much_narrower_than_the_chains() {
    let (mut model, alpha, alphap) = complementary_plates(-5.0);
    model.set_statistics(Arc::new(GaussianChains::new(1.0)));

    for h in [1.1, 1.0, 0.3, 1e-3] {
        let result = model.at(h).unwrap();
        let bound = result.sigma_bound(alpha, alphap);
        assert!(bound > 0.0 && bound <= SIGMA, "h = {h}");
        assert!(result.rep_free_energy_density() > 0.0, "h = {h}");
        assert!(result.free_energy_density().is_finite(), "h = {h}");
    }

    let separations = sweep::linspace(1.0, 40.0, 40);
    let results = sweep::run(&model, &separations, &ProgressReporter::new()).unwrap();
    assert_eq!(results.len(), 40);
}

/// Lower plate: `alpha` bridges to `beta` and loops with `gamma`. Upper plate: `beta` and the
/// self-complementary `delta`, which loops with itself.
fn competing_system(loop_energy: f64) -> (PlatesMeanField, [TetherTypeId; 4]) {
    let mut model = PlatesMeanField::with_statistics(Arc::new(RigidRods::new()));
    let alpha = model
        .add_tether_type(Plate::Lower, "alpha", Some(0.02))
        .unwrap();
    let beta = model
        .add_tether_type(Plate::Upper, "beta", Some(0.005))
        .unwrap();
    let gamma = model
        .add_tether_type(Plate::Lower, "gamma", Some(0.01))
        .unwrap();
    let delta = model
        .add_tether_type(Plate::Upper, "delta", Some(0.008))
        .unwrap();

    let energies = model.beta_delta_g0_mut();
    energies.set("alpha", "beta", -6.0).unwrap();
    energies.set("alpha", "gamma", loop_energy).unwrap();
    energies.set("delta", "delta", -3.0).unwrap();
    for (a, b) in [("beta", "gamma"), ("alpha", "delta"), ("gamma", "delta")] {
        energies.set(a, b, f64::INFINITY).unwrap();
    }
    (model, [alpha, beta, gamma, delta])
}

#[test]
fn bridges_and_loops_share_tethers_consistently() {
    let (model, ids) = competing_system(-4.0);
    let [alpha, beta, gamma, delta] = ids;
    let sigmas = [0.02, 0.005, 0.01, 0.008];

    let result = model.at(10.0).unwrap();

    assert_eq!(result.bound_pairs().len(), 3);
    assert!(result.sigma_bound(alpha, beta) > 0.0);
    assert!(result.sigma_bound(alpha, gamma) > 0.0);
    assert!(result.sigma_bound(delta, delta) > 0.0);
    assert_eq!(result.sigma_bound(beta, gamma), 0.0);

    for (pair, &x) in result.bound_pairs() {
        let limit = [pair.first(), pair.second()]
            .iter()
            .map(|id| sigmas[ids.iter().position(|i| i == id).unwrap()])
            .fold(f64::INFINITY, f64::min);
        let per_bond = if pair.is_homotypic() { 2.0 } else { 1.0 };
        assert!(x >= 0.0 && per_bond * x <= limit, "{pair:?} bound {x}");
    }

    for (id, sigma) in ids.iter().zip(sigmas) {
        let bound: f64 = result
            .bound_pairs()
            .iter()
            .filter(|(pair, _)| pair.contains(*id))
            .map(|(pair, x)| if pair.is_homotypic() { 2.0 * x } else { *x })
            .sum();
        let free = result.sigma_free(*id).unwrap();
        assert!(free > 0.0);
        assert!(
            (free + bound - sigma).abs() <= 1e-7 * sigma,
            "mass balance of {id:?}: {free} + {bound} != {sigma}"
        );
    }
}

#[test]
fn loops_compete_with_bridges_for_the_same_tethers() {
    let (with_loops, [alpha, beta, ..]) = competing_system(-4.0);
    let (without_loops, [alpha_2, beta_2, ..]) = competing_system(f64::INFINITY);

    let competing = with_loops.at(10.0).unwrap();
    let alone = without_loops.at(10.0).unwrap();

    assert!(competing.sigma_bound(alpha, beta) < alone.sigma_bound(alpha_2, beta_2));
    assert!(competing.sigma_free(alpha).unwrap() < alone.sigma_free(alpha_2).unwrap());
}
