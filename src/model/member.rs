//! Time integration of a single ensemble member.
//!
//! Each `(scenario, parameter_set)` pair evolves independently. Within a member
//! every step depends on the fully resolved previous step, so the time loop is
//! strictly sequential:
//!
//! 1. carbon-active modes evaluate the capped iIRF from the previous cumulative
//!    uptake and temperature, solve for the time-scale factor, advance (or invert)
//!    the carbon pools, update cumulative uptake and compute the forcing;
//! 2. the thermal boxes are advanced from the forcing, or inverted to recover it.

use fair_components::components::{
    concentration, temperature, CarbonCycle, CarbonCycleParameters, CarbonPools, CO2ERFParameters,
    ThermalPools, ThermalResponse, CO2ERF,
};
use fair_core::ensemble::OtherForcing;
use fair_core::errors::{FAIRError, FAIRResult};
use fair_core::parameters::{ParameterSet, N_CARBON_POOLS, N_THERMAL_BOXES};
use fair_core::solver::{SolverConfig, SolverContext};
use fair_core::timeseries::{FloatValue, Timestep};
use ndarray::ArrayView1;

use crate::mode::{Direction, OperatingMode};
use crate::restart::MemberState;

/// The components of one parameter set.
#[derive(Debug, Clone)]
pub(crate) struct Physics {
    pub carbon_cycle: CarbonCycle,
    pub co2_erf: CO2ERF,
    pub thermal_response: ThermalResponse,
}

impl Physics {
    pub fn from_parameter_set(parameters: &ParameterSet) -> FAIRResult<Self> {
        Ok(Self {
            carbon_cycle: CarbonCycle::from_parameters(CarbonCycleParameters::from(parameters)),
            co2_erf: CO2ERF::from_parameters(CO2ERFParameters::from(parameters)),
            thermal_response: ThermalResponse::from_parameter_set(parameters)?,
        })
    }
}

/// Everything needed to integrate one member.
pub(crate) struct MemberInputs<'a> {
    pub mode: OperatingMode,
    pub scenario: usize,
    pub parameter_set: usize,
    pub driver: ArrayView1<'a, FloatValue>,
    pub other_forcing: &'a OtherForcing,
    pub physics: &'a Physics,
    pub restart: Option<MemberState>,
    pub solver: SolverConfig,
}

/// Unsmoothed trajectories of one member.
#[derive(Debug, Clone)]
pub(crate) struct Trajectory {
    /// Concentration anomaly above pre-industrial.
    pub concentration: Vec<FloatValue>,
    pub emissions: Vec<FloatValue>,
    pub forcing: Vec<FloatValue>,
    pub temperature: Vec<FloatValue>,
    pub iirf: Vec<FloatValue>,
    pub time_scale_factor: Vec<FloatValue>,
    pub cumulative_uptake: Vec<FloatValue>,
    pub final_state: MemberState,
}

impl Trajectory {
    fn zeros(n: usize) -> Self {
        Self {
            concentration: vec![0.0; n],
            emissions: vec![0.0; n],
            forcing: vec![0.0; n],
            temperature: vec![0.0; n],
            iirf: vec![0.0; n],
            time_scale_factor: vec![0.0; n],
            cumulative_uptake: vec![0.0; n],
            final_state: MemberState {
                carbon_pools: [0.0; N_CARBON_POOLS],
                thermal_pools: [0.0; N_THERMAL_BOXES],
                cumulative_uptake: 0.0,
                emissions: 0.0,
                forcing: 0.0,
                time_scale_factor: 0.0,
            },
        }
    }
}

impl MemberInputs<'_> {
    fn ensure_finite(&self, variable: &str, value: FloatValue, timestep: Timestep) -> FAIRResult<()> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(FAIRError::NonFinite {
                variable: variable.to_string(),
                scenario: self.scenario,
                parameter_set: self.parameter_set,
                timestep,
            })
        }
    }

    fn ensure_step_finite(&self, trajectory: &Trajectory, x: Timestep) -> FAIRResult<()> {
        self.ensure_finite("concentration", trajectory.concentration[x], x)?;
        self.ensure_finite("emissions", trajectory.emissions[x], x)?;
        self.ensure_finite("forcing", trajectory.forcing[x], x)?;
        self.ensure_finite("temperature", trajectory.temperature[x], x)
    }

    /// Integrate the member over the whole driver.
    pub fn integrate(&self) -> FAIRResult<Trajectory> {
        let n = self.driver.len();
        let carbon = self.mode.carbon();
        let thermal = self.mode.thermal();
        let Physics {
            carbon_cycle,
            co2_erf,
            thermal_response,
        } = self.physics;

        let mut out = Trajectory::zeros(n);
        let driven = match self.mode {
            OperatingMode::EmissionsDriven => &mut out.emissions,
            OperatingMode::EmissionsBack => &mut out.concentration,
            OperatingMode::ForcingDriven => &mut out.forcing,
            OperatingMode::ForcingBack => &mut out.temperature,
        };
        driven
            .iter_mut()
            .zip(self.driver.iter())
            .for_each(|(target, value)| *target = *value);
        if self.mode == OperatingMode::EmissionsBack {
            // Pools hold the anomaly above pre-industrial
            let conc_pi = co2_erf.conc_pi();
            out.concentration.iter_mut().for_each(|c| *c -= conc_pi);
        }

        let mut carbon_pools: CarbonPools = [0.0; N_CARBON_POOLS];
        let mut thermal_pools: ThermalPools = [0.0; N_THERMAL_BOXES];
        let mut context = SolverContext::new(self.solver);

        match self.restart {
            Some(state) => {
                carbon_pools = state.carbon_pools;
                thermal_pools = state.thermal_pools;
                out.cumulative_uptake[0] = state.cumulative_uptake;
                context = context.with_seed(state.time_scale_factor);

                match carbon {
                    Some(Direction::Forward) => out.concentration[0] = concentration(&carbon_pools),
                    Some(Direction::Inverse) => out.emissions[0] = state.emissions,
                    None => {}
                }
                if thermal == Direction::Forward {
                    out.temperature[0] = temperature(&thermal_pools);
                } else {
                    out.forcing[0] = state.forcing;
                }
            }
            None => {
                if let Some(direction) = carbon {
                    // Start from equilibrium: the first step's emissions have
                    // been half-way admitted to the pools.
                    if direction == Direction::Inverse {
                        out.emissions[0] = carbon_cycle.initial_emissions(out.concentration[0]);
                    }
                    carbon_pools = carbon_cycle.initial_pools(out.emissions[0]);
                    if direction == Direction::Forward {
                        out.concentration[0] = concentration(&carbon_pools);
                    }
                    out.cumulative_uptake[0] = out.emissions[0];
                }
            }
        }

        if carbon.is_some() {
            out.forcing[0] = co2_erf.total_forcing(
                out.concentration[0],
                self.other_forcing.at(self.scenario, 0),
            );
        }
        self.ensure_step_finite(&out, 0)?;

        for x in 1..n {
            if let Some(direction) = carbon {
                let iirf = carbon_cycle.iirf(out.cumulative_uptake[x - 1], out.temperature[x - 1]);
                let solution = carbon_cycle
                    .time_scale_factor(iirf, &context)
                    .map_err(|source| FAIRError::TimeScaleSolve {
                        scenario: self.scenario,
                        parameter_set: self.parameter_set,
                        timestep: x,
                        source,
                    })?;
                context = context.with_seed(solution.root);
                out.iirf[x] = iirf;
                out.time_scale_factor[x] = solution.root;

                let decayed = carbon_cycle.decay(&carbon_pools, solution.root);
                if direction == Direction::Inverse {
                    out.emissions[x] = carbon_cycle.invert_emissions(
                        &decayed,
                        out.concentration[x],
                        out.emissions[x - 1],
                    );
                }
                carbon_pools =
                    carbon_cycle.add_emissions(&decayed, out.emissions[x - 1], out.emissions[x]);
                if direction == Direction::Forward {
                    out.concentration[x] = concentration(&carbon_pools);
                }

                out.cumulative_uptake[x] = carbon_cycle.cumulative_uptake(
                    out.cumulative_uptake[x - 1],
                    out.emissions[x],
                    out.concentration[x - 1],
                    out.concentration[x],
                );
                out.forcing[x] = co2_erf.total_forcing(
                    out.concentration[x],
                    self.other_forcing.at(self.scenario, x),
                );
            }

            match thermal {
                Direction::Forward => {
                    thermal_pools =
                        thermal_response.step_forward(&thermal_pools, out.forcing[x - 1], out.forcing[x]);
                    out.temperature[x] = temperature(&thermal_pools);
                }
                Direction::Inverse => {
                    let decayed = thermal_response.decay(&thermal_pools);
                    out.forcing[x] =
                        thermal_response.invert_forcing(&decayed, out.temperature[x], out.forcing[x - 1]);
                    thermal_pools =
                        thermal_response.add_forcing(&decayed, out.forcing[x - 1], out.forcing[x]);
                }
            }

            self.ensure_step_finite(&out, x)?;
        }

        let last = n - 1;
        out.final_state = MemberState {
            carbon_pools,
            thermal_pools,
            cumulative_uptake: out.cumulative_uptake[last],
            emissions: out.emissions[last],
            forcing: out.forcing[last],
            time_scale_factor: context.seed().unwrap_or(0.0),
        };
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array1;

    fn physics() -> Physics {
        Physics::from_parameter_set(&ParameterSet::reference()).unwrap()
    }

    fn integrate(mode: OperatingMode, driver: &Array1<FloatValue>) -> FAIRResult<Trajectory> {
        let physics = physics();
        let other_forcing = OtherForcing::default();
        MemberInputs {
            mode,
            scenario: 0,
            parameter_set: 0,
            driver: driver.view(),
            other_forcing: &other_forcing,
            physics: &physics,
            restart: None,
            solver: SolverConfig::default(),
        }
        .integrate()
    }

    #[test]
    fn zero_emissions_stay_at_preindustrial() {
        let driver = Array1::zeros(50);
        let out = integrate(OperatingMode::EmissionsDriven, &driver).unwrap();

        for x in 0..50 {
            assert_eq!(out.concentration[x], 0.0);
            assert_eq!(out.forcing[x], 0.0);
            assert_eq!(out.temperature[x], 0.0);
        }
        // With nothing taken up, the iIRF stays at r0
        assert_relative_eq!(out.iirf[10], 35.0);
    }

    #[test]
    fn emissions_inversion_is_exact_without_smoothing() {
        let emissions = Array1::from_shape_fn(80, |x| 2.0 + 0.15 * x as FloatValue);
        let forward = integrate(OperatingMode::EmissionsDriven, &emissions).unwrap();

        let concentrations = Array1::from(forward.concentration.clone()) + 278.0;
        let inverse = integrate(OperatingMode::EmissionsBack, &concentrations).unwrap();

        for x in 0..80 {
            assert_relative_eq!(inverse.emissions[x], emissions[x], epsilon = 1e-6);
            assert_relative_eq!(inverse.temperature[x], forward.temperature[x], epsilon = 1e-9);
            assert_relative_eq!(
                inverse.cumulative_uptake[x],
                forward.cumulative_uptake[x],
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn forcing_inversion_is_exact_from_zero() {
        let forcing = Array1::from_shape_fn(60, |x| 0.04 * x as FloatValue);
        let forward = integrate(OperatingMode::ForcingDriven, &forcing).unwrap();

        let temperatures = Array1::from(forward.temperature.clone());
        let inverse = integrate(OperatingMode::ForcingBack, &temperatures).unwrap();

        for x in 0..60 {
            assert_relative_eq!(inverse.forcing[x], forcing[x], epsilon = 1e-8);
        }
    }

    #[test]
    fn forcing_modes_skip_the_carbon_cycle() {
        let forcing = Array1::from_elem(10, 1.0);
        let out = integrate(OperatingMode::ForcingDriven, &forcing).unwrap();

        assert!(out.iirf.iter().all(|&v| v == 0.0));
        assert!(out.concentration.iter().all(|&v| v == 0.0));
        assert_eq!(out.final_state.time_scale_factor, 0.0);
    }

    #[test]
    fn non_finite_driver_is_reported() {
        let mut emissions = Array1::from_elem(10, 1.0);
        emissions[4] = FloatValue::NAN;
        let err = integrate(OperatingMode::EmissionsDriven, &emissions).unwrap_err();

        match err {
            FAIRError::NonFinite { timestep, .. } => assert_eq!(timestep, 4),
            other => panic!("Expected NonFinite, got {:?}", other),
        }
    }

    #[test]
    fn iirf_above_attainable_range_fails_the_solve() {
        // The cap is above t_iirf * sum(a), so a large enough uptake makes the
        // target unreachable.
        let parameters = ParameterSet {
            iirf_max: 150.0,
            rc: 1.0,
            ..ParameterSet::reference()
        };
        let physics = Physics::from_parameter_set(&parameters).unwrap();
        let other_forcing = OtherForcing::default();
        let emissions = Array1::from_elem(20, 100.0);

        let err = MemberInputs {
            mode: OperatingMode::EmissionsDriven,
            scenario: 0,
            parameter_set: 0,
            driver: emissions.view(),
            other_forcing: &other_forcing,
            physics: &physics,
            restart: None,
            solver: SolverConfig::default(),
        }
        .integrate()
        .unwrap_err();

        assert!(matches!(err, FAIRError::TimeScaleSolve { .. }));
    }
}
