//! Model construction and execution.
//!
//! [`ModelBuilder`] collects the driver, forcing, parameter sets and options,
//! validates them and produces a [`Model`]. [`Model::run`] integrates every
//! ensemble member and assembles the outputs.

mod builder;
mod member;
mod runtime;

pub use builder::ModelBuilder;
pub use runtime::Model;
