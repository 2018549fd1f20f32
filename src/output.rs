//! Results of a model run.

use crate::mode::OperatingMode;
use crate::restart::RestartState;
use fair_core::ensemble::EnsembleShape;
use fair_core::timeseries::FloatValue;
use ndarray::{Array3, ArrayD};
use serde::{Deserialize, Serialize};

/// Series returned by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputVariable {
    Concentration,
    Emissions,
    Forcing,
    Temperature,
}

/// Per-step carbon cycle diagnostics.
///
/// Present for the carbon-active modes. The feedback is first evaluated at
/// step 1, so step 0 of `iirf` and `time_scale_factor` holds zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonDiagnostics {
    /// Capped integrated impulse response target.
    /// unit: yr
    pub iirf: Array3<FloatValue>,
    /// Scale factor applied to the carbon pool time constants.
    pub time_scale_factor: Array3<FloatValue>,
    /// unit: GtC
    pub cumulative_uptake: Array3<FloatValue>,
    /// Total forcing computed from the concentrations.
    /// unit: W / m^2
    pub forcing: Array3<FloatValue>,
}

/// Output of a model run.
///
/// All series are indexed `(scenario, parameter_set, time)`; use
/// [`ModelOutput::squeezed`] to drop singleton ensemble axes. Which series are
/// present depends on the mode:
///
/// | mode               | series                       |
/// |--------------------|------------------------------|
/// | `emissions_driven` | concentration, temperature   |
/// | `emissions_back`   | emissions, temperature       |
/// | `forcing_driven`   | temperature                  |
/// | `forcing_back`     | forcing                      |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub mode: OperatingMode,
    pub shape: EnsembleShape,
    /// Atmospheric CO2 concentration.
    /// unit: ppm
    pub concentration: Option<Array3<FloatValue>>,
    /// Emissions recovered from prescribed concentrations, smoothed.
    /// unit: GtC / yr
    pub emissions: Option<Array3<FloatValue>>,
    /// Forcing recovered from prescribed temperatures, smoothed.
    /// unit: W / m^2
    pub forcing: Option<Array3<FloatValue>>,
    /// Global mean temperature anomaly.
    /// unit: K
    pub temperature: Option<Array3<FloatValue>>,
    pub carbon_diagnostics: Option<CarbonDiagnostics>,
    /// Present when requested from the builder.
    pub restart: Option<RestartState>,
}

impl ModelOutput {
    pub fn get(&self, variable: OutputVariable) -> Option<&Array3<FloatValue>> {
        match variable {
            OutputVariable::Concentration => self.concentration.as_ref(),
            OutputVariable::Emissions => self.emissions.as_ref(),
            OutputVariable::Forcing => self.forcing.as_ref(),
            OutputVariable::Temperature => self.temperature.as_ref(),
        }
    }

    /// A series with singleton ensemble axes removed.
    pub fn squeezed(&self, variable: OutputVariable) -> Option<ArrayD<FloatValue>> {
        self.get(variable).map(|values| self.shape.squeeze(values))
    }
}
