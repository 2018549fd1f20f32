//! Model configuration.
//!
//! Numerical settings that are independent of the physical parameter sets.

use crate::errors::FAIRResult;
use crate::solver::SolverConfig;
use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Standard deviation (in steps) of the default inverse-smoothing kernel.
pub const DEFAULT_SMOOTHING_SIGMA: FloatValue = 2.0;

/// Numerical configuration of a model run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Standard deviation (in steps) of the Gaussian filter applied to series
    /// recovered by inversion (emissions in `emissions_back`, forcing in
    /// `forcing_back`).
    ///
    /// The filter is lossy. A value of zero disables it and returns the raw
    /// algebraic inversion.
    /// Default: 2.0
    pub inverse_smoothing_sigma: FloatValue,

    /// Settings of the per-step time-scale factor solve.
    pub solver: SolverConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            inverse_smoothing_sigma: DEFAULT_SMOOTHING_SIGMA,
            solver: SolverConfig::default(),
        }
    }
}

impl ModelConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml(text: &str) -> FAIRResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Configuration that returns unsmoothed inversions.
    pub fn without_smoothing() -> Self {
        Self {
            inverse_smoothing_sigma: 0.0,
            ..Self::default()
        }
    }
}
