//! # Engine Module
//!
//! The self-consistent mean-field equilibrium of tethered sticky ends.
//!
//! ## Overview
//!
//! For a fixed plate separation the engine turns tether types, binding free energies and
//! polymer statistics into a list of binding pairs with areal binding constants
//! ([`binding`]), then solves the mass-action equations for the free and bound densities by
//! damped fixed-point iteration and evaluates the free energy ([`equilibrium`]).
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Tolerance, iteration budget and damping of the solver
//! - **Pair Assembly** ([`binding`]) - Eligible bridges and loops with their binding constants
//! - **Equilibrium** ([`equilibrium`]) - Fixed-point solver and free-energy evaluation
//! - **Progress Monitoring** ([`progress`]) - Callbacks for long separation sweeps
//! - **Error Handling** ([`error`]) - Invalid input, convergence and configuration failures

pub mod binding;
pub mod config;
pub mod equilibrium;
pub mod error;
pub mod progress;
