//! # Core Module
//!
//! Fundamental building blocks of the mean-field model of tether-mediated surface
//! interactions.
//!
//! ## Architecture
//!
//! - **Models** ([`models`]) - Tether types, their identifiers and the binding free-energy table
//! - **Polymer Statistics** ([`statistics`]) - Pluggable Boltzmann weights for bridges, loops
//!   and steric exclusion (rigid rods, Gaussian chains, tabulated data)
//! - **Derjaguin Transform** ([`derjaguin`]) - Plate potentials to sphere potentials
//!
//! Everything in this layer is free of hidden state: the same inputs always give the same
//! outputs, so results can be cached by callers without coordination.

pub mod derjaguin;
pub mod models;
pub mod statistics;
