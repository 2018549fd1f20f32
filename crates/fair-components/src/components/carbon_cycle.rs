//! Carbon cycle component
//!
//! A four-pool impulse-response carbon cycle with a state-dependent lifetime.
//!
//! Emitted carbon is split between pools by the partition fractions and each
//! pool decays with its own time constant. The time constants of all pools are
//! scaled by a common factor $\alpha$, chosen every step so that the integrated
//! impulse response (iIRF) over `t_iirf` years matches a target that grows with
//! cumulative uptake and temperature:
//!
//! $$ iIRF = \min\left(r_0 + r_C C_{uptake} + r_T T,\; iIRF_{max}\right) $$
//!
//! $$ \alpha \sum_i a_i b_i \left(1 - e^{-t_{iirf} / (\alpha b_i)}\right) = iIRF $$
//!
//! The pools are advanced with exact exponential decay and a trapezoidal source:
//!
//! $$ R_i(t) = R_i(t-1) e^{-1 / (\alpha b_i)} + \frac{a_i}{2 c} \left(E(t-1) + E(t)\right) $$
//!
//! The same recurrence can be run backwards to recover the emissions that
//! produce a prescribed concentration.

use super::check_divisor;
use fair_core::errors::FAIRResult;
use fair_core::parameters::{ParameterSet, N_CARBON_POOLS};
use fair_core::solver::{IncreasingFunction, SolveError, Solution, SolverContext};
use fair_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Carbon held in each pool, as a concentration anomaly.
/// unit: ppm
pub type CarbonPools = [FloatValue; N_CARBON_POOLS];

/// Concentration anomaly above pre-industrial held by a set of pools.
pub fn concentration(pools: &CarbonPools) -> FloatValue {
    pools.iter().sum()
}

/// Parameters for the carbon cycle component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonCycleParameters {
    /// Fraction of emissions entering each pool.
    pub partition_fractions: [FloatValue; N_CARBON_POOLS],
    /// Nominal pool time constants.
    /// unit: yr
    pub carbon_timescales: [FloatValue; N_CARBON_POOLS],
    /// iIRF horizon.
    /// unit: yr
    pub t_iirf: FloatValue,
    /// Pre-industrial iIRF.
    /// unit: yr
    pub r0: FloatValue,
    /// iIRF sensitivity to cumulative uptake.
    /// unit: yr / GtC
    pub rc: FloatValue,
    /// iIRF sensitivity to temperature.
    /// unit: yr / K
    pub rt: FloatValue,
    /// iIRF cap.
    /// unit: yr
    pub iirf_max: FloatValue,
    /// unit: GtC / ppm
    pub gtc_per_ppm: FloatValue,
}

impl From<&ParameterSet> for CarbonCycleParameters {
    fn from(parameters: &ParameterSet) -> Self {
        Self {
            partition_fractions: parameters.partition_fractions,
            carbon_timescales: parameters.carbon_timescales,
            t_iirf: parameters.t_iirf,
            r0: parameters.r0,
            rc: parameters.rc,
            rt: parameters.rt,
            iirf_max: parameters.iirf_max,
            gtc_per_ppm: parameters.gtc_per_ppm,
        }
    }
}

/// The iIRF achieved by scaling the pool time constants by `alpha`.
pub struct IirfCurve<'a> {
    parameters: &'a CarbonCycleParameters,
}

impl IncreasingFunction for IirfCurve<'_> {
    fn value(&self, alpha: FloatValue) -> FloatValue {
        let p = self.parameters;
        p.partition_fractions
            .iter()
            .zip(p.carbon_timescales.iter())
            .map(|(a, b)| {
                let scaled = b * alpha;
                // 1 - exp(-u), without cancellation for long-lived pools
                a * scaled * -(-p.t_iirf / scaled).exp_m1()
            })
            .sum()
    }

    fn limits(&self) -> (FloatValue, FloatValue) {
        let partition_sum: FloatValue = self.parameters.partition_fractions.iter().sum();
        (0.0, self.parameters.t_iirf * partition_sum)
    }
}

/// Four-pool carbon cycle with iIRF feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonCycle {
    parameters: CarbonCycleParameters,
}

impl CarbonCycle {
    /// Create a new carbon cycle component from parameters
    pub fn from_parameters(parameters: CarbonCycleParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &CarbonCycleParameters {
        &self.parameters
    }

    /// Capped iIRF target given the state at the end of the previous step.
    pub fn iirf(&self, cumulative_uptake: FloatValue, temperature: FloatValue) -> FloatValue {
        let p = &self.parameters;
        let iirf = p.rc * cumulative_uptake + p.rt * temperature + p.r0;
        if iirf > p.iirf_max {
            p.iirf_max
        } else {
            iirf
        }
    }

    pub fn iirf_curve(&self) -> IirfCurve<'_> {
        IirfCurve {
            parameters: &self.parameters,
        }
    }

    /// Solve for the time-scale factor that reproduces `iirf`.
    pub fn time_scale_factor(
        &self,
        iirf: FloatValue,
        context: &SolverContext,
    ) -> Result<Solution, SolveError> {
        context.solve(&self.iirf_curve(), iirf)
    }

    /// Pools at the first step of a run starting from equilibrium.
    pub fn initial_pools(&self, emissions: FloatValue) -> CarbonPools {
        let p = &self.parameters;
        p.partition_fractions
            .map(|a| a * emissions / p.gtc_per_ppm * 0.5)
    }

    /// Emissions at the first step that give the prescribed concentration anomaly.
    ///
    /// Inverse of [`CarbonCycle::initial_pools`].
    pub fn initial_emissions(&self, concentration: FloatValue) -> FloatValue {
        self.parameters.gtc_per_ppm * concentration / self.inversion_divisor()
    }

    /// Decay the pools over one step with time constants scaled by `alpha`.
    pub fn decay(&self, pools: &CarbonPools, alpha: FloatValue) -> CarbonPools {
        let b = &self.parameters.carbon_timescales;
        std::array::from_fn(|i| pools[i] * (-1.0 / (b[i] * alpha)).exp())
    }

    /// Add the trapezoidal emissions source to decayed pools.
    pub fn add_emissions(
        &self,
        decayed: &CarbonPools,
        emissions_previous: FloatValue,
        emissions: FloatValue,
    ) -> CarbonPools {
        let p = &self.parameters;
        std::array::from_fn(|i| {
            decayed[i]
                + 0.5 * p.partition_fractions[i] * (emissions_previous + emissions) / p.gtc_per_ppm
        })
    }

    /// Advance the pools by one step.
    pub fn step_forward(
        &self,
        pools: &CarbonPools,
        alpha: FloatValue,
        emissions_previous: FloatValue,
        emissions: FloatValue,
    ) -> CarbonPools {
        self.add_emissions(&self.decay(pools, alpha), emissions_previous, emissions)
    }

    /// Emissions that bring the decayed pools to the prescribed concentration anomaly.
    ///
    /// Divides by [`CarbonCycle::inversion_divisor`], which must have been checked
    /// with [`CarbonCycle::check_invertible`].
    pub fn invert_emissions(
        &self,
        decayed: &CarbonPools,
        concentration_anomaly: FloatValue,
        emissions_previous: FloatValue,
    ) -> FloatValue {
        let divisor = self.inversion_divisor();
        let emissions = (self.parameters.gtc_per_ppm
            * (concentration_anomaly - concentration(decayed))
            - divisor * emissions_previous)
            / divisor;
        trace!(concentration_anomaly, emissions, "recovered emissions");
        emissions
    }

    /// Instantaneous source coefficient, $\frac{1}{2} \sum_i a_i$.
    pub fn inversion_divisor(&self) -> FloatValue {
        0.5 * self.parameters.partition_fractions.iter().sum::<FloatValue>()
    }

    /// Check that emissions can be recovered from concentrations.
    pub fn check_invertible(&self) -> FAIRResult<()> {
        check_divisor("carbon cycle", self.inversion_divisor())
    }

    /// Cumulative uptake after a step, by mass balance.
    ///
    /// Everything emitted that did not stay in the atmosphere was taken up.
    pub fn cumulative_uptake(
        &self,
        cumulative_uptake_previous: FloatValue,
        emissions: FloatValue,
        concentration_previous: FloatValue,
        concentration: FloatValue,
    ) -> FloatValue {
        cumulative_uptake_previous + emissions
            - (concentration - concentration_previous) * self.parameters.gtc_per_ppm
    }
}
