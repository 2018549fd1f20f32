//! Core types and numerics for the FaIR reduced-complexity climate model.
//!
//! This crate holds the pieces shared by the physical components and the model
//! driver: the error type, ensemble containers, parameter sets (and the
//! quantities derived from them), the root-solver context used by the carbon
//! cycle feedback, and the Gaussian smoother applied to inverted series.

pub mod config;
pub mod ensemble;
pub mod errors;
pub mod parameters;
pub mod smoothing;
pub mod solver;
pub mod timeseries;
