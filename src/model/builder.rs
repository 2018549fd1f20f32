//! Model builder.

use fair_core::config::ModelConfig;
use fair_core::ensemble::{Driver, EnsembleShape, OtherForcing};
use fair_core::errors::{FAIRError, FAIRResult};
use fair_core::parameters::ParameterSets;

use super::member::Physics;
use super::runtime::Model;
use crate::mode::{Direction, OperatingMode};
use crate::restart::RestartState;

/// Build a model run.
///
/// Every input is validated by [`ModelBuilder::build`], so that a run either
/// fails before any integration starts or only on numerical grounds.
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    mode: OperatingMode,
    driver: Option<Driver>,
    other_forcing: OtherForcing,
    parameter_sets: ParameterSets,
    restart: Option<RestartState>,
    capture_restart: bool,
    config: ModelConfig,
}

impl ModelBuilder {
    /// Create a new model builder.
    ///
    /// Defaults to `emissions_driven` with the reference parameter set, no
    /// other forcing and the default numerical configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(&mut self, mode: OperatingMode) -> &mut Self {
        self.mode = mode;
        self
    }

    /// The driving series. Its meaning depends on the mode.
    pub fn with_driver(&mut self, driver: impl Into<Driver>) -> &mut Self {
        self.driver = Some(driver.into());
        self
    }

    /// Forcing from agents other than CO2, added in the carbon-active modes.
    pub fn with_other_forcing(&mut self, other_forcing: impl Into<OtherForcing>) -> &mut Self {
        self.other_forcing = other_forcing.into();
        self
    }

    pub fn with_parameter_sets(&mut self, parameter_sets: impl Into<ParameterSets>) -> &mut Self {
        self.parameter_sets = parameter_sets.into();
        self
    }

    /// Continue from the state captured at the end of an earlier run.
    pub fn with_restart(&mut self, restart: RestartState) -> &mut Self {
        self.restart = Some(restart);
        self
    }

    /// Capture a [`RestartState`] in the output.
    pub fn with_restart_output(&mut self, capture: bool) -> &mut Self {
        self.capture_restart = capture;
        self
    }

    pub fn with_config(&mut self, config: ModelConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Validate the inputs and build the model.
    pub fn build(&self) -> FAIRResult<Model> {
        let driver = self
            .driver
            .clone()
            .ok_or_else(|| FAIRError::Error("No driver series supplied".to_string()))?;
        driver.validate()?;

        if self.parameter_sets.is_empty() {
            return Err(FAIRError::Error("No parameter sets supplied".to_string()));
        }

        let shape = EnsembleShape::new(
            driver.n_scenarios(),
            self.parameter_sets.len(),
            driver.n_timesteps(),
        );
        self.other_forcing
            .validate(shape.scenarios, shape.timesteps)?;

        let physics = self
            .parameter_sets
            .iter()
            .map(|parameters| {
                parameters.validate()?;
                let physics = Physics::from_parameter_set(parameters)?;
                if self.mode.carbon() == Some(Direction::Inverse) {
                    physics.carbon_cycle.check_invertible()?;
                }
                if self.mode.thermal() == Direction::Inverse {
                    physics.thermal_response.check_invertible()?;
                }
                Ok(physics)
            })
            .collect::<FAIRResult<Vec<_>>>()?;

        if let Some(restart) = &self.restart {
            restart.validate(&shape)?;
        }

        Ok(Model::new(
            self.mode,
            driver,
            self.other_forcing.clone(),
            physics,
            self.restart.clone(),
            self.capture_restart,
            self.config,
            shape,
        ))
    }
}
