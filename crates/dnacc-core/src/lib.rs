//! # DNACC Core Library
//!
//! Mean-field free energies of surfaces coated with tethered sticky-end linkers, such as
//! DNA-coated colloids, and their conversion into sphere-sphere potentials.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (tether types, the binding free-energy
//!   table), the pluggable polymer statistics that weigh bridges, loops and steric exclusion,
//!   and the Derjaguin transform.
//!
//! - **[`engine`]: The Logic Core.** The self-consistent equilibrium solver that partitions
//!   tethers into free, bridged and looped states, together with its configuration, error
//!   taxonomy and progress reporting.
//!
//! - **[`workflows`]: The Public API.** [`workflows::plates::PlatesMeanField`] owns the tether
//!   registry and free-energy table and answers `at(h)` queries; [`workflows::sweep`] evaluates
//!   whole separation curves.
//!
//! ## Units
//!
//! The library is unit-agnostic except for the reference concentration used by the built-in
//! statistics, which defaults to 1 M expressed in nm⁻³. Lengths are therefore nanometers and
//! densities nm⁻² unless a provider is configured otherwise. Free energies are in units of kT.
//!
//! ```ignore
//! use dnacc::core::models::tether::Plate;
//! use dnacc::workflows::plates::PlatesMeanField;
//!
//! let mut plates = PlatesMeanField::new();
//! let alpha = plates.add_tether_type(Plate::Lower, "alpha", Some(0.01))?;
//! let alpha_p = plates.add_tether_type(Plate::Upper, "alphap", Some(0.01))?;
//! plates.beta_delta_g0_mut().set("alpha", "alphap", -5.0)?;
//!
//! let result = plates.at(10.0)?;
//! println!("{} {}", result.free_energy_density(), result.sigma_bound(alpha, alpha_p));
//! ```

pub mod core;
pub mod engine;
pub mod workflows;
