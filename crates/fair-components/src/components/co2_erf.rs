//! CO2 Effective Radiative Forcing component
//!
//! This component calculates the effective radiative forcing (ERF) from CO2 concentrations
//! using the standard logarithmic relationship.

use fair_core::parameters::ParameterSet;
use fair_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters for the CO2 ERF component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CO2ERFParameters {
    /// ERF due to a doubling of atmospheric CO2 concentrations
    /// unit: W / m^2
    pub erf_2xco2: FloatValue,
    /// Pre-industrial atmospheric CO2 concentration
    /// unit: ppm
    pub conc_pi: FloatValue,
}

impl From<&ParameterSet> for CO2ERFParameters {
    fn from(parameters: &ParameterSet) -> Self {
        Self {
            erf_2xco2: parameters.erf_2xco2,
            conc_pi: parameters.conc_pi,
        }
    }
}

/// CO2 effective radiative forcing (ERF) calculations
///
/// Computes ERF using the standard logarithmic relationship:
/// $$ ERF = \frac{ERF_{2xCO2}}{\log(2)} \cdot \log\left(\frac{\Delta C + C_0}{C_0}\right) + F_{other} $$
///
/// Where:
/// - $ERF_{2xCO2}$ is the ERF for a doubling of CO2
/// - $\Delta C$ is the concentration anomaly above pre-industrial
/// - $C_0$ is the pre-industrial CO2 concentration
/// - $F_{other}$ is forcing from other agents, supplied externally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CO2ERF {
    parameters: CO2ERFParameters,
}

impl CO2ERF {
    /// Create a new CO2ERF component from parameters
    pub fn from_parameters(parameters: CO2ERFParameters) -> Self {
        Self { parameters }
    }

    /// Calculate CO2 ERF from the concentration anomaly above pre-industrial
    pub fn calculate_erf(&self, concentration_anomaly: FloatValue) -> FloatValue {
        let p = &self.parameters;
        p.erf_2xco2 / 2.0_f64.ln() * ((concentration_anomaly + p.conc_pi) / p.conc_pi).ln()
    }

    /// Total forcing: CO2 ERF plus forcing from other agents
    pub fn total_forcing(
        &self,
        concentration_anomaly: FloatValue,
        other_forcing: FloatValue,
    ) -> FloatValue {
        self.calculate_erf(concentration_anomaly) + other_forcing
    }

    pub fn conc_pi(&self) -> FloatValue {
        self.parameters.conc_pi
    }
}
