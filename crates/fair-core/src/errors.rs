use crate::solver::SolveError;
use crate::timeseries::FloatValue;
use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum FAIRError {
    #[error("{0}")]
    Error(String),
    #[error("Shape mismatch for {variable}: expected {expected}, got {actual}")]
    ShapeMismatch {
        variable: String,
        expected: String,
        actual: String,
    },
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("Unknown operating mode '{0}'. Expected one of emissions_driven, emissions_back, forcing_driven or forcing_back")]
    UnknownMode(String),
    #[error("Time-scale factor solve failed for scenario {scenario}, parameter set {parameter_set} at timestep {timestep}")]
    TimeScaleSolve {
        scenario: usize,
        parameter_set: usize,
        timestep: usize,
        #[source]
        source: SolveError,
    },
    #[error("Ill-conditioned {quantity} inversion: divisor {divisor:e} is too close to zero")]
    IllConditionedInversion {
        quantity: String,
        divisor: FloatValue,
    },
    #[error("Non-finite {variable} for scenario {scenario}, parameter set {parameter_set} at timestep {timestep}")]
    NonFinite {
        variable: String,
        scenario: usize,
        parameter_set: usize,
        timestep: usize,
    },
    #[error("Could not parse configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Convenience type for `Result<T, FAIRError>`.
pub type FAIRResult<T> = Result<T, FAIRError>;

impl FAIRError {
    pub fn shape_mismatch(
        variable: &str,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        FAIRError::ShapeMismatch {
            variable: variable.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn invalid_parameter(name: &str, reason: impl ToString) -> Self {
        FAIRError::InvalidParameter {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}
