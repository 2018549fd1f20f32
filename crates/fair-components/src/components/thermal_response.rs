//! Two-box thermal response component
//!
//! Global mean temperature is the sum of a fast and a slow box. Each box relaxes
//! towards $q_j F$ with time constant $d_j$; over a unit step with forcing
//! interpolated linearly between the ends of the step:
//!
//! $$ T_j(t) = T_j(t-1) e^{-1/d_j} + \frac{q_j}{2} \left(F(t-1) + F(t)\right) \left(1 - e^{-1/d_j}\right) $$
//!
//! The sensitivities $q_j$ are derived from ECS and TCR (see
//! [`fair_core::parameters::ThermalCoefficients`]). Running the recurrence
//! backwards recovers the forcing that produces a prescribed temperature.

use super::check_divisor;
use fair_core::errors::FAIRResult;
use fair_core::parameters::{ParameterSet, N_THERMAL_BOXES};
use fair_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Temperature anomaly held in each box.
/// unit: K
pub type ThermalPools = [FloatValue; N_THERMAL_BOXES];

/// Temperature anomaly of a set of boxes.
pub fn temperature(pools: &ThermalPools) -> FloatValue {
    pools.iter().sum()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalResponse {
    /// Box time constants.
    /// unit: yr
    timescales: [FloatValue; N_THERMAL_BOXES],
    /// Box sensitivities.
    /// unit: K / (W / m^2)
    q: [FloatValue; N_THERMAL_BOXES],
    /// $e^{-1/d_j}$
    persistence: [FloatValue; N_THERMAL_BOXES],
    /// $q_j (1 - e^{-1/d_j})$
    gain: [FloatValue; N_THERMAL_BOXES],
}

impl ThermalResponse {
    pub fn new(timescales: [FloatValue; N_THERMAL_BOXES], q: [FloatValue; N_THERMAL_BOXES]) -> Self {
        let persistence = timescales.map(|d| (-1.0 / d).exp());
        let gain = std::array::from_fn(|j| q[j] * -(-1.0 / timescales[j]).exp_m1());
        Self {
            timescales,
            q,
            persistence,
            gain,
        }
    }

    /// Derive the box sensitivities from a parameter set.
    pub fn from_parameter_set(parameters: &ParameterSet) -> FAIRResult<Self> {
        let coefficients = parameters.thermal_response()?;
        Ok(Self::new(parameters.thermal_timescales, coefficients.q))
    }

    pub fn timescales(&self) -> &[FloatValue; N_THERMAL_BOXES] {
        &self.timescales
    }

    pub fn q(&self) -> &[FloatValue; N_THERMAL_BOXES] {
        &self.q
    }

    /// Temperature reached after indefinitely holding a constant forcing.
    pub fn equilibrium_temperature(&self, forcing: FloatValue) -> FloatValue {
        forcing * self.q.iter().sum::<FloatValue>()
    }

    /// Relax the boxes over one step without forcing.
    pub fn decay(&self, pools: &ThermalPools) -> ThermalPools {
        std::array::from_fn(|j| pools[j] * self.persistence[j])
    }

    /// Add the response to forcing over one step to decayed boxes.
    pub fn add_forcing(
        &self,
        decayed: &ThermalPools,
        forcing_previous: FloatValue,
        forcing: FloatValue,
    ) -> ThermalPools {
        std::array::from_fn(|j| decayed[j] + 0.5 * self.gain[j] * (forcing_previous + forcing))
    }

    /// Advance the boxes by one step.
    pub fn step_forward(
        &self,
        pools: &ThermalPools,
        forcing_previous: FloatValue,
        forcing: FloatValue,
    ) -> ThermalPools {
        self.add_forcing(&self.decay(pools), forcing_previous, forcing)
    }

    /// Forcing that brings the decayed boxes to the prescribed temperature.
    ///
    /// Divides by [`ThermalResponse::inversion_divisor`], which must have been
    /// checked with [`ThermalResponse::check_invertible`].
    pub fn invert_forcing(
        &self,
        decayed: &ThermalPools,
        temperature_target: FloatValue,
        forcing_previous: FloatValue,
    ) -> FloatValue {
        let divisor = self.inversion_divisor();
        let forcing =
            (temperature_target - temperature(decayed) - divisor * forcing_previous) / divisor;
        trace!(temperature_target, forcing, "recovered forcing");
        forcing
    }

    /// $\frac{1}{2} \sum_j q_j (1 - e^{-1/d_j})$
    pub fn inversion_divisor(&self) -> FloatValue {
        0.5 * self.gain.iter().sum::<FloatValue>()
    }

    /// Check that forcing can be recovered from temperatures.
    pub fn check_invertible(&self) -> FAIRResult<()> {
        check_divisor("thermal response", self.inversion_divisor())
    }
}
