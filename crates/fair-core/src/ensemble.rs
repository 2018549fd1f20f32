//! Ensemble containers.
//!
//! A run evaluates every scenario against every parameter set. Series carried
//! between the caller and the model are therefore indexed
//! `(scenario, parameter_set, time)`, with [`EnsembleShape`] describing the extent
//! of each axis. Singleton ensemble axes are kept in the arrays and only dropped
//! when the caller asks for it via [`EnsembleShape::squeeze`].

use crate::errors::{FAIRError, FAIRResult};
use crate::timeseries::{FloatValue, Timestep};
use ndarray::{Array, Array1, Array2, ArrayD, ArrayView1, Axis, Dimension};
use serde::{Deserialize, Serialize};

/// Driving series for each scenario, indexed `(scenario, time)`.
///
/// The meaning of the values depends on the operating mode: emissions,
/// atmospheric concentration, effective radiative forcing or temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    values: Array2<FloatValue>,
}

impl Driver {
    /// A single scenario.
    pub fn single(values: Array1<FloatValue>) -> Self {
        Self {
            values: values.insert_axis(Axis(0)),
        }
    }

    /// Several scenarios stacked along the first axis.
    pub fn stacked(values: Array2<FloatValue>) -> Self {
        Self { values }
    }

    pub fn n_scenarios(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_timesteps(&self) -> usize {
        self.values.ncols()
    }

    /// The series of one scenario.
    pub fn scenario(&self, scenario: usize) -> ArrayView1<'_, FloatValue> {
        self.values.row(scenario)
    }

    pub fn values(&self) -> &Array2<FloatValue> {
        &self.values
    }

    /// Check that the driver has at least one scenario and one timestep.
    pub fn validate(&self) -> FAIRResult<()> {
        if self.n_scenarios() == 0 || self.n_timesteps() == 0 {
            return Err(FAIRError::shape_mismatch(
                "driver",
                "at least one scenario and one timestep",
                format!("{:?}", self.values.shape()),
            ));
        }
        Ok(())
    }
}

impl From<Array1<FloatValue>> for Driver {
    fn from(values: Array1<FloatValue>) -> Self {
        Self::single(values)
    }
}

impl From<Array2<FloatValue>> for Driver {
    fn from(values: Array2<FloatValue>) -> Self {
        Self::stacked(values)
    }
}

impl From<Vec<FloatValue>> for Driver {
    fn from(values: Vec<FloatValue>) -> Self {
        Self::single(Array1::from(values))
    }
}

/// Additive forcing from agents other than CO2.
///
/// Added to the CO2 forcing at every step of the carbon-active modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OtherForcing {
    /// The same value at every step of every scenario.
    Constant(FloatValue),
    /// One series shared by all scenarios.
    Series(Array1<FloatValue>),
    /// One series per scenario, indexed `(scenario, time)`.
    PerScenario(Array2<FloatValue>),
}

impl Default for OtherForcing {
    fn default() -> Self {
        OtherForcing::Constant(0.0)
    }
}

impl OtherForcing {
    /// Check that this forcing broadcasts against a driver of the given extent.
    pub fn validate(&self, n_scenarios: usize, n_timesteps: usize) -> FAIRResult<()> {
        match self {
            OtherForcing::Constant(_) => Ok(()),
            OtherForcing::Series(values) => {
                if values.len() != n_timesteps {
                    return Err(FAIRError::shape_mismatch(
                        "other forcing",
                        format!("[{}]", n_timesteps),
                        format!("{:?}", values.shape()),
                    ));
                }
                Ok(())
            }
            OtherForcing::PerScenario(values) => {
                let rows_ok = values.nrows() == n_scenarios || values.nrows() == 1;
                if !rows_ok || values.ncols() != n_timesteps {
                    return Err(FAIRError::shape_mismatch(
                        "other forcing",
                        format!("[{} or 1, {}]", n_scenarios, n_timesteps),
                        format!("{:?}", values.shape()),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Value for a scenario at a timestep.
    ///
    /// Indices must lie within the extent passed to [`OtherForcing::validate`].
    pub fn at(&self, scenario: usize, timestep: Timestep) -> FloatValue {
        match self {
            OtherForcing::Constant(value) => *value,
            OtherForcing::Series(values) => values[timestep],
            OtherForcing::PerScenario(values) => {
                let row = if values.nrows() == 1 { 0 } else { scenario };
                values[[row, timestep]]
            }
        }
    }
}

impl From<FloatValue> for OtherForcing {
    fn from(value: FloatValue) -> Self {
        OtherForcing::Constant(value)
    }
}

impl From<Array1<FloatValue>> for OtherForcing {
    fn from(values: Array1<FloatValue>) -> Self {
        OtherForcing::Series(values)
    }
}

impl From<Array2<FloatValue>> for OtherForcing {
    fn from(values: Array2<FloatValue>) -> Self {
        OtherForcing::PerScenario(values)
    }
}

/// Extent of the ensemble axes of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsembleShape {
    pub scenarios: usize,
    pub parameter_sets: usize,
    pub timesteps: usize,
}

impl EnsembleShape {
    pub fn new(scenarios: usize, parameter_sets: usize, timesteps: usize) -> Self {
        Self {
            scenarios,
            parameter_sets,
            timesteps,
        }
    }

    /// Number of independent `(scenario, parameter_set)` members.
    pub fn n_members(&self) -> usize {
        self.scenarios * self.parameter_sets
    }

    /// All members in scenario-major order.
    pub fn members(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.scenarios).flat_map(move |s| (0..self.parameter_sets).map(move |p| (s, p)))
    }

    /// Shape of the ensemble axes after dropping singletons.
    pub fn squeezed_dims(&self) -> Vec<usize> {
        [self.scenarios, self.parameter_sets]
            .into_iter()
            .filter(|&n| n != 1)
            .collect()
    }

    /// Drop the singleton ensemble axes of an array.
    ///
    /// The array must be laid out `(scenario, parameter_set, ...)`. The scenario
    /// axis is removed when there is one scenario and the parameter-set axis
    /// when there is one parameter set. Trailing axes (time, pools) are kept.
    pub fn squeeze<A: Clone, D: Dimension>(&self, values: &Array<A, D>) -> ArrayD<A> {
        debug_assert!(values.ndim() >= 2);
        debug_assert_eq!(values.shape()[0], self.scenarios);
        debug_assert_eq!(values.shape()[1], self.parameter_sets);

        let mut view = values.view().into_dyn();
        if self.parameter_sets == 1 {
            view = view.index_axis_move(Axis(1), 0);
        }
        if self.scenarios == 1 {
            view = view.index_axis_move(Axis(0), 0);
        }
        view.to_owned()
    }
}
