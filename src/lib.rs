//! FaIR: a multi-box impulse-response reduced-complexity climate model.
//!
//! A run integrates an ensemble of `(scenario, parameter_set)` members over an
//! annual time axis. The [`OperatingMode`] selects the driver and whether the
//! carbon and thermal recurrences run forward or are inverted:
//!
//! ```no_run
//! use fair::{ModelBuilder, OperatingMode, OutputVariable};
//!
//! let emissions: Vec<f64> = (0..100).map(|x| 10.0 * (x as f64 / 50.0).min(1.0)).collect();
//! let output = ModelBuilder::new()
//!     .with_mode(OperatingMode::EmissionsDriven)
//!     .with_driver(emissions)
//!     .build()?
//!     .run()?;
//! let temperature = output.squeezed(OutputVariable::Temperature);
//! # Ok::<(), fair::FAIRError>(())
//! ```
//!
//! Series recovered by inversion are Gaussian smoothed by default, which
//! trades exactness for suppressed noise; see [`ModelConfig`].

pub mod mode;
pub mod model;
pub mod output;
pub mod restart;

pub use fair_components;
pub use fair_core;

pub use fair_core::config::ModelConfig;
pub use fair_core::ensemble::{Driver, EnsembleShape, OtherForcing};
pub use fair_core::errors::{FAIRError, FAIRResult};
pub use fair_core::parameters::{ParameterSet, ParameterSets};
pub use mode::{Direction, OperatingMode};
pub use model::{Model, ModelBuilder};
pub use output::{CarbonDiagnostics, ModelOutput, OutputVariable};
pub use restart::RestartState;
