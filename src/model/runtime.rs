//! Running a built model over its ensemble.

use fair_core::config::ModelConfig;
use fair_core::ensemble::{Driver, EnsembleShape, OtherForcing};
use fair_core::errors::FAIRResult;
use fair_core::smoothing::gaussian_filter1d;
use fair_core::timeseries::FloatValue;
use ndarray::{Array3, ArrayView1, Axis};
use rayon::prelude::*;
use tracing::debug;

use super::member::{MemberInputs, Physics, Trajectory};
use crate::mode::OperatingMode;
use crate::output::{CarbonDiagnostics, ModelOutput};
use crate::restart::RestartState;

/// A validated model run.
///
/// Created by [`crate::ModelBuilder::build`]. Running the model does not
/// mutate it, so the same model can be run repeatedly.
#[derive(Debug, Clone)]
pub struct Model {
    mode: OperatingMode,
    driver: Driver,
    other_forcing: OtherForcing,
    /// One entry per parameter set
    physics: Vec<Physics>,
    restart: Option<RestartState>,
    capture_restart: bool,
    config: ModelConfig,
    shape: EnsembleShape,
}

impl Model {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        mode: OperatingMode,
        driver: Driver,
        other_forcing: OtherForcing,
        physics: Vec<Physics>,
        restart: Option<RestartState>,
        capture_restart: bool,
        config: ModelConfig,
        shape: EnsembleShape,
    ) -> Self {
        Self {
            mode,
            driver,
            other_forcing,
            physics,
            restart,
            capture_restart,
            config,
            shape,
        }
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn shape(&self) -> &EnsembleShape {
        &self.shape
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn integrate_member(&self, scenario: usize, parameter_set: usize) -> FAIRResult<Trajectory> {
        let mut trajectory = MemberInputs {
            mode: self.mode,
            scenario,
            parameter_set,
            driver: self.driver.scenario(scenario),
            other_forcing: &self.other_forcing,
            physics: &self.physics[parameter_set],
            restart: self
                .restart
                .as_ref()
                .map(|restart| restart.member(scenario, parameter_set)),
            solver: self.config.solver,
        }
        .integrate()?;

        // The restart snapshot was taken from the raw inversion
        let sigma = self.config.inverse_smoothing_sigma;
        match self.mode {
            OperatingMode::EmissionsBack => {
                trajectory.emissions = smooth(&trajectory.emissions, sigma);
            }
            OperatingMode::ForcingBack => {
                trajectory.forcing = smooth(&trajectory.forcing, sigma);
            }
            _ => {}
        }
        Ok(trajectory)
    }

    /// Integrate every ensemble member.
    ///
    /// Members are independent and are integrated in parallel. The first
    /// failure aborts the run and no partial output is returned.
    pub fn run(&self) -> FAIRResult<ModelOutput> {
        debug!(
            mode = self.mode.name(),
            scenarios = self.shape.scenarios,
            parameter_sets = self.shape.parameter_sets,
            timesteps = self.shape.timesteps,
            "Running model"
        );

        let members: Vec<(usize, usize)> = self.shape.members().collect();
        let trajectories = members
            .par_iter()
            .map(|&(s, p)| self.integrate_member(s, p))
            .collect::<FAIRResult<Vec<_>>>()?;

        Ok(self.assemble(&trajectories))
    }

    fn assemble(&self, trajectories: &[Trajectory]) -> ModelOutput {
        let shape = self.shape;

        let concentration = (self.mode == OperatingMode::EmissionsDriven).then(|| {
            let mut concentration = stack(&shape, trajectories, |t| &t.concentration);
            for (p, physics) in self.physics.iter().enumerate() {
                let conc_pi = physics.co2_erf.conc_pi();
                concentration
                    .index_axis_mut(Axis(1), p)
                    .mapv_inplace(|c| c + conc_pi);
            }
            concentration
        });
        let emissions = (self.mode == OperatingMode::EmissionsBack)
            .then(|| stack(&shape, trajectories, |t| &t.emissions));
        let forcing = (self.mode == OperatingMode::ForcingBack)
            .then(|| stack(&shape, trajectories, |t| &t.forcing));
        let temperature = (self.mode != OperatingMode::ForcingBack)
            .then(|| stack(&shape, trajectories, |t| &t.temperature));

        let carbon_diagnostics = self.mode.carbon().map(|_| CarbonDiagnostics {
            iirf: stack(&shape, trajectories, |t| &t.iirf),
            time_scale_factor: stack(&shape, trajectories, |t| &t.time_scale_factor),
            cumulative_uptake: stack(&shape, trajectories, |t| &t.cumulative_uptake),
            forcing: stack(&shape, trajectories, |t| &t.forcing),
        });

        let restart = self.capture_restart.then(|| {
            let states: Vec<_> = trajectories.iter().map(|t| t.final_state).collect();
            RestartState::from_members(&shape, &states)
        });

        ModelOutput {
            mode: self.mode,
            shape,
            concentration,
            emissions,
            forcing,
            temperature,
            carbon_diagnostics,
            restart,
        }
    }
}

/// Lay member series out as `(scenario, parameter_set, time)`.
fn stack<F>(shape: &EnsembleShape, trajectories: &[Trajectory], series: F) -> Array3<FloatValue>
where
    F: Fn(&Trajectory) -> &Vec<FloatValue>,
{
    Array3::from_shape_fn(
        (shape.scenarios, shape.parameter_sets, shape.timesteps),
        |(s, p, x)| series(&trajectories[s * shape.parameter_sets + p])[x],
    )
}

fn smooth(values: &[FloatValue], sigma: FloatValue) -> Vec<FloatValue> {
    gaussian_filter1d(ArrayView1::from(values), sigma).to_vec()
}
