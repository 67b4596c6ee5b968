use crate::core::models::energies::BindingFreeEnergies;
use crate::core::models::ids::{TetherPair, TetherTypeId};
use crate::core::models::tether::{DEFAULT_TETHER_LENGTH, Plate, TetherParams, TetherType};
use crate::core::statistics::rods::RigidRods;
use crate::core::statistics::{PlateGeometry, StatisticsError, TetherStatistics};
use crate::engine::binding;
use crate::engine::config::SolverConfig;
use crate::engine::equilibrium;
use crate::engine::error::ModelError;
use slotmap::SlotMap;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Thermodynamics of one separation, in kT per unit area.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    separation: f64,
    free_energy_density: f64,
    rep_free_energy_density: f64,
    att_free_energy_density: f64,
    sigma_bound: BTreeMap<TetherPair, f64>,
    sigma_free: BTreeMap<TetherTypeId, f64>,
    iterations: usize,
}

impl EvaluationResult {
    pub fn separation(&self) -> f64 {
        self.separation
    }

    /// Total free energy per unit area, zero when all tethers are free and unconfined.
    pub fn free_energy_density(&self) -> f64 {
        self.free_energy_density
    }

    /// Excluded-volume contribution: the confinement of tethers by the opposing plate.
    pub fn rep_free_energy_density(&self) -> f64 {
        self.rep_free_energy_density
    }

    /// Binding contribution.
    pub fn att_free_energy_density(&self) -> f64 {
        self.att_free_energy_density
    }

    /// Bound areal density of the pair `{a, b}`; zero for pairs that cannot bind.
    pub fn sigma_bound(&self, a: TetherTypeId, b: TetherTypeId) -> f64 {
        self.sigma_bound
            .get(&TetherPair::new(a, b))
            .copied()
            .unwrap_or(0.0)
    }

    /// Bound areal densities of every pair eligible at this separation.
    pub fn bound_pairs(&self) -> &BTreeMap<TetherPair, f64> {
        &self.sigma_bound
    }

    /// Free areal density of tether type `id`, or `None` if it was not registered.
    pub fn sigma_free(&self, id: TetherTypeId) -> Option<f64> {
        self.sigma_free.get(&id).copied()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// Mean-field model of two parallel plates grafted with DNA tethers.
pub struct PlatesMeanField {
    tethers: SlotMap<TetherTypeId, TetherType>,
    energies: BindingFreeEnergies,
    prototype: TetherParams,
    statistics: Arc<dyn TetherStatistics>,
    solver: SolverConfig,
}

impl Default for PlatesMeanField {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PlatesMeanField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatesMeanField")
            .field("tethers", &self.tethers)
            .field("energies", &self.energies)
            .field("prototype", &self.prototype)
            .field("solver", &self.solver)
            .finish_non_exhaustive()
    }
}

impl PlatesMeanField {
    /// A model with no tether types, rigid-rod statistics and default solver settings.
    pub fn new() -> Self {
        Self::with_statistics(Arc::new(RigidRods::new()))
    }

    pub fn with_statistics(statistics: Arc<dyn TetherStatistics>) -> Self {
        Self {
            tethers: SlotMap::with_key(),
            energies: BindingFreeEnergies::new(),
            prototype: TetherParams::new().length(DEFAULT_TETHER_LENGTH),
            statistics,
            solver: SolverConfig::default(),
        }
    }

    pub fn set_statistics(&mut self, statistics: Arc<dyn TetherStatistics>) {
        self.statistics = statistics;
    }

    pub fn statistics(&self) -> &Arc<dyn TetherStatistics> {
        &self.statistics
    }

    pub fn with_solver_config(mut self, config: SolverConfig) -> Self {
        self.solver = config;
        self
    }

    pub fn set_solver_config(&mut self, config: SolverConfig) {
        self.solver = config;
    }

    pub fn solver_config(&self) -> &SolverConfig {
        &self.solver
    }

    /// Defaults used for the parameters that [`add_tether_type_with`](Self::add_tether_type_with)
    /// calls leave out. Already registered tether types are not affected.
    pub fn set_tether_type_prototype(&mut self, prototype: TetherParams) {
        self.prototype = prototype;
    }

    pub fn tether_type_prototype(&self) -> &TetherParams {
        &self.prototype
    }

    /// Registers a tether type with the prototype's contour length.
    pub fn add_tether_type(
        &mut self,
        plate: Plate,
        sticky_end: impl Into<String>,
        sigma: Option<f64>,
    ) -> Result<TetherTypeId, ModelError> {
        let params = TetherParams {
            sigma,
            length: None,
        };
        self.add_tether_type_with(plate, sticky_end, params)
    }

    pub fn add_tether_type_with(
        &mut self,
        plate: Plate,
        sticky_end: impl Into<String>,
        params: TetherParams,
    ) -> Result<TetherTypeId, ModelError> {
        let sticky_end = sticky_end.into();
        let params = params.or(&self.prototype);
        let sigma = params.sigma.ok_or(ModelError::MissingParameter("sigma"))?;
        let length = params.length.ok_or(ModelError::MissingParameter("length"))?;
        check_density(&sticky_end, sigma)?;
        if !(length > 0.0 && length.is_finite()) {
            return Err(ModelError::InvalidLength {
                sticky_end,
                value: length,
            });
        }
        debug!(%plate, sticky_end = %sticky_end, sigma, length, "Registered tether type.");
        Ok(self
            .tethers
            .insert(TetherType::new(plate, sticky_end, sigma, length)))
    }

    pub fn tether_type(&self, id: TetherTypeId) -> Option<&TetherType> {
        self.tethers.get(id)
    }

    /// Registered tether types in registration order.
    pub fn tether_types(&self) -> impl Iterator<Item = (TetherTypeId, &TetherType)> {
        self.tethers.iter()
    }

    pub fn set_sigma(&mut self, id: TetherTypeId, sigma: f64) -> Result<(), ModelError> {
        let tether = self
            .tethers
            .get_mut(id)
            .ok_or(ModelError::UnknownTetherType(id))?;
        check_density(&tether.sticky_end, sigma)?;
        tether.sigma = sigma;
        Ok(())
    }

    pub fn beta_delta_g0(&self) -> &BindingFreeEnergies {
        &self.energies
    }

    pub fn beta_delta_g0_mut(&mut self) -> &mut BindingFreeEnergies {
        &mut self.energies
    }

    /// Solves the binding equilibrium at plate separation `h`.
    #[instrument(level = "debug", skip(self), fields(types = self.tethers.len()))]
    pub fn at(&self, h: f64) -> Result<EvaluationResult, ModelError> {
        let geometry = PlateGeometry::new(h);
        self.statistics
            .check_system(&geometry)
            .map_err(|e| match e {
                StatisticsError::InvalidSeparation(h) => ModelError::InvalidSeparation(h),
                other => other.into(),
            })?;
        if self.tethers.is_empty() {
            return Err(ModelError::NoTetherTypes);
        }

        let tethers: Vec<_> = self.tethers.iter().collect();
        let problem = binding::assemble(
            &tethers,
            &self.energies,
            self.statistics.as_ref(),
            &geometry,
        )?;
        let eq = equilibrium::solve(&problem, &self.solver)?;
        let energy = equilibrium::free_energy(&problem, &eq);

        Ok(EvaluationResult {
            separation: h,
            free_energy_density: energy.total(),
            rep_free_energy_density: energy.repulsive,
            att_free_energy_density: energy.attractive,
            sigma_bound: problem
                .pairs
                .iter()
                .zip(eq.bound.iter())
                .map(|(p, &x)| (p.pair, x))
                .collect(),
            sigma_free: problem
                .ids
                .iter()
                .zip(eq.free.iter())
                .map(|(&id, &f)| (id, f))
                .collect(),
            iterations: eq.iterations,
        })
    }
}

fn check_density(sticky_end: &str, sigma: f64) -> Result<(), ModelError> {
    if sigma >= 0.0 && sigma.is_finite() {
        Ok(())
    } else {
        Err(ModelError::InvalidDensity {
            sticky_end: sticky_end.to_string(),
            value: sigma,
        })
    }
}
