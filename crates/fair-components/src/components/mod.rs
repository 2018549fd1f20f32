mod carbon_cycle;
mod co2_erf;
mod thermal_response;

pub use carbon_cycle::{
    concentration, CarbonCycle, CarbonCycleParameters, CarbonPools, IirfCurve,
};
pub use co2_erf::{CO2ERFParameters, CO2ERF};
pub use thermal_response::{temperature, ThermalPools, ThermalResponse};

use fair_core::errors::{FAIRError, FAIRResult};
use fair_core::timeseries::FloatValue;

/// Smallest magnitude accepted for the divisor of an inverse recurrence.
pub const INVERSION_EPSILON: FloatValue = 1e-10;

fn check_divisor(quantity: &str, divisor: FloatValue) -> FAIRResult<()> {
    if divisor.is_finite() && divisor.abs() >= INVERSION_EPSILON {
        Ok(())
    } else {
        Err(FAIRError::IllConditionedInversion {
            quantity: quantity.to_string(),
            divisor,
        })
    }
}
