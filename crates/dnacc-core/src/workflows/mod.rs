//! # Workflows Module
//!
//! High-level entry points for evaluating DNA-coated plates.
//!
//! ## Overview
//!
//! [`plates::PlatesMeanField`] owns the tether-type registry, the binding free-energy table,
//! the statistics provider and the solver settings. Each call to
//! [`plates::PlatesMeanField::at`] assembles the binding problem for one separation, solves it
//! and returns an immutable [`plates::EvaluationResult`]; configuration is never touched while
//! evaluating, so a model can be shared between threads.
//!
//! ## Architecture
//!
//! - **Plates** ([`plates`]) - The mean-field model and its per-separation results.
//! - **Sweep** ([`sweep`]) - Evaluation over a list of separations with progress reporting,
//!   parallelised with rayon when the `parallel` feature is enabled.

pub mod plates;
pub mod sweep;
