//! # Core Models Module
//!
//! Data structures describing the tethered linkers and their binding energetics.
//!
//! ## Key Components
//!
//! - [`ids`] - Opaque identifiers handed out by the tether registry
//! - [`tether`] - Plates, tether types and the parameters used to create them
//! - [`energies`] - The symmetric table of binding free energies between sticky ends
//!
//! ```ignore
//! use dnacc::core::models::energies::BindingFreeEnergies;
//!
//! let mut table = BindingFreeEnergies::new();
//! table.set("alpha", "alphap", -5.0)?;
//! assert_eq!(table.get("alphap", "alpha"), Some(-5.0));
//! ```

pub mod energies;
pub mod ids;
pub mod tether;
