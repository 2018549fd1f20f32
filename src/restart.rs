//! Restart snapshots.
//!
//! A snapshot captures the state at the last step of a run so that a later run
//! can continue the trajectory. The continuing run's driver must start at the
//! step the snapshot was taken at: its first value overlaps the last value of
//! the previous run.

use fair_components::components::{CarbonPools, ThermalPools};
use fair_core::ensemble::EnsembleShape;
use fair_core::errors::{FAIRError, FAIRResult};
use fair_core::parameters::{N_CARBON_POOLS, N_THERMAL_BOXES};
use fair_core::timeseries::FloatValue;
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

/// State of every ensemble member at the final step of a run.
///
/// All arrays lead with the `(scenario, parameter_set)` axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestartState {
    /// Carbon held in each pool as a concentration anomaly, `(scenario, parameter_set, pool)`.
    /// unit: ppm
    pub carbon_pools: Array3<FloatValue>,
    /// Temperature of each thermal box, `(scenario, parameter_set, box)`.
    /// unit: K
    pub thermal_pools: Array3<FloatValue>,
    /// unit: GtC
    pub cumulative_uptake: Array2<FloatValue>,
    /// Emissions at the final step, before any smoothing.
    /// unit: GtC / yr
    pub emissions: Array2<FloatValue>,
    /// Forcing at the final step, before any smoothing.
    /// unit: W / m^2
    pub forcing: Array2<FloatValue>,
    /// Time-scale factor of the final step, used to warm-start the next solve.
    /// Zero when the carbon cycle was not run.
    pub time_scale_factor: Array2<FloatValue>,
}

/// State of a single ensemble member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MemberState {
    pub carbon_pools: CarbonPools,
    pub thermal_pools: ThermalPools,
    pub cumulative_uptake: FloatValue,
    pub emissions: FloatValue,
    pub forcing: FloatValue,
    pub time_scale_factor: FloatValue,
}

impl RestartState {
    /// Check that the snapshot matches the ensemble of a run.
    pub fn validate(&self, shape: &EnsembleShape) -> FAIRResult<()> {
        let members = [shape.scenarios, shape.parameter_sets];
        let check = |variable: &str, actual: &[usize], trailing: Option<usize>| {
            let mut expected = members.to_vec();
            expected.extend(trailing);
            if actual != expected.as_slice() {
                return Err(FAIRError::shape_mismatch(
                    &format!("restart {}", variable),
                    format!("{:?}", expected),
                    format!("{:?}", actual),
                ));
            }
            Ok(())
        };

        check("carbon_pools", self.carbon_pools.shape(), Some(N_CARBON_POOLS))?;
        check("thermal_pools", self.thermal_pools.shape(), Some(N_THERMAL_BOXES))?;
        check("cumulative_uptake", self.cumulative_uptake.shape(), None)?;
        check("emissions", self.emissions.shape(), None)?;
        check("forcing", self.forcing.shape(), None)?;
        check("time_scale_factor", self.time_scale_factor.shape(), None)?;
        Ok(())
    }

    /// The state of one member. Indices must have been validated.
    pub(crate) fn member(&self, scenario: usize, parameter_set: usize) -> MemberState {
        let (s, p) = (scenario, parameter_set);
        MemberState {
            carbon_pools: std::array::from_fn(|i| self.carbon_pools[[s, p, i]]),
            thermal_pools: std::array::from_fn(|j| self.thermal_pools[[s, p, j]]),
            cumulative_uptake: self.cumulative_uptake[[s, p]],
            emissions: self.emissions[[s, p]],
            forcing: self.forcing[[s, p]],
            time_scale_factor: self.time_scale_factor[[s, p]],
        }
    }

    /// Collect member states laid out in scenario-major order.
    pub(crate) fn from_members(shape: &EnsembleShape, members: &[MemberState]) -> Self {
        let (n_s, n_p) = (shape.scenarios, shape.parameter_sets);
        let at = |s: usize, p: usize| &members[s * n_p + p];
        Self {
            carbon_pools: Array3::from_shape_fn((n_s, n_p, N_CARBON_POOLS), |(s, p, i)| {
                at(s, p).carbon_pools[i]
            }),
            thermal_pools: Array3::from_shape_fn((n_s, n_p, N_THERMAL_BOXES), |(s, p, j)| {
                at(s, p).thermal_pools[j]
            }),
            cumulative_uptake: Array2::from_shape_fn((n_s, n_p), |(s, p)| {
                at(s, p).cumulative_uptake
            }),
            emissions: Array2::from_shape_fn((n_s, n_p), |(s, p)| at(s, p).emissions),
            forcing: Array2::from_shape_fn((n_s, n_p), |(s, p)| at(s, p).forcing),
            time_scale_factor: Array2::from_shape_fn((n_s, n_p), |(s, p)| {
                at(s, p).time_scale_factor
            }),
        }
    }
}
