//! Continuing runs from restart snapshots.
//!
//! A run of `N` steps split into two runs that share the boundary step must
//! reproduce the single run.

use approx::assert_relative_eq;
use fair::{
    FAIRError, ModelBuilder, ModelConfig, ModelOutput, OperatingMode, OutputVariable,
    RestartState,
};
use ndarray::{s, Array1, ArrayD};

const N: usize = 90;
const SPLIT: usize = 40;

fn run(
    mode: OperatingMode,
    driver: Array1<f64>,
    restart: Option<RestartState>,
) -> ModelOutput {
    let mut builder = ModelBuilder::new();
    builder
        .with_mode(mode)
        .with_driver(driver)
        .with_config(ModelConfig::without_smoothing())
        .with_restart_output(true);
    if let Some(restart) = restart {
        builder.with_restart(restart);
    }
    builder.build().unwrap().run().unwrap()
}

fn assert_continues(full: &ArrayD<f64>, second: &ArrayD<f64>) {
    for x in 0..N - SPLIT {
        assert_relative_eq!(second[[x]], full[[SPLIT + x]], max_relative = 1e-10, epsilon = 1e-12);
    }
}

fn check_chain(mode: OperatingMode, driver: Array1<f64>, variables: &[OutputVariable]) {
    let full = run(mode, driver.clone(), None);
    let first = run(mode, driver.slice(s![..=SPLIT]).to_owned(), None);
    let second = run(mode, driver.slice(s![SPLIT..]).to_owned(), first.restart);

    for &variable in variables {
        assert_continues(
            &full.squeezed(variable).unwrap(),
            &second.squeezed(variable).unwrap(),
        );
    }
}

#[test]
fn test_emissions_driven_chain() {
    let emissions = Array1::from_shape_fn(N, |x| 5.0 + 3.0 * (x as f64 / 15.0).sin());
    check_chain(
        OperatingMode::EmissionsDriven,
        emissions,
        &[OutputVariable::Concentration, OutputVariable::Temperature],
    );
}

#[test]
fn test_emissions_back_chain() {
    let concentration = Array1::from_shape_fn(N, |x| 278.0 + 0.03 * (x * x) as f64);
    check_chain(
        OperatingMode::EmissionsBack,
        concentration,
        &[OutputVariable::Emissions, OutputVariable::Temperature],
    );
}

#[test]
fn test_forcing_driven_chain() {
    let forcing = Array1::from_shape_fn(N, |x| 0.04 * x as f64);
    check_chain(OperatingMode::ForcingDriven, forcing, &[OutputVariable::Temperature]);
}

#[test]
fn test_forcing_back_chain() {
    let temperature = Array1::from_shape_fn(N, |x| 0.015 * x as f64);
    check_chain(OperatingMode::ForcingBack, temperature, &[OutputVariable::Forcing]);
}

/// The carbon diagnostics continue too, including the time-scale factor.
#[test]
fn test_diagnostics_continue() {
    let emissions = Array1::from_elem(N, 8.0);
    let full = run(OperatingMode::EmissionsDriven, emissions.clone(), None);
    let first = run(
        OperatingMode::EmissionsDriven,
        emissions.slice(s![..=SPLIT]).to_owned(),
        None,
    );

    let restart = first.restart.clone().unwrap();
    let full_alpha = full.carbon_diagnostics.unwrap().time_scale_factor;
    assert_eq!(restart.time_scale_factor[[0, 0]], full_alpha[[0, 0, SPLIT]]);

    let second = run(
        OperatingMode::EmissionsDriven,
        emissions.slice(s![SPLIT..]).to_owned(),
        first.restart,
    );
    let second_alpha = second.carbon_diagnostics.unwrap().time_scale_factor;
    for x in 1..N - SPLIT {
        assert_relative_eq!(second_alpha[[0, 0, x]], full_alpha[[0, 0, SPLIT + x]], max_relative = 1e-10);
    }
}

/// Snapshots survive serialisation.
#[test]
fn test_snapshot_serialises() {
    let output = run(OperatingMode::EmissionsDriven, Array1::from_elem(20, 4.0), None);
    let restart = output.restart.unwrap();

    let text = serde_json::to_string(&restart).unwrap();
    let decoded: RestartState = serde_json::from_str(&text).unwrap();

    for (a, b) in decoded.carbon_pools.iter().zip(restart.carbon_pools.iter()) {
        assert_relative_eq!(*a, *b, max_relative = 1e-15);
    }
    assert_eq!(decoded.thermal_pools.shape(), &[1, 1, 2]);
}

/// Without carbon cycle there is no time-scale factor to carry over.
#[test]
fn test_forcing_mode_snapshot_has_no_time_scale_factor() {
    let output = run(OperatingMode::ForcingDriven, Array1::from_elem(20, 1.0), None);
    let restart = output.restart.unwrap();
    assert_eq!(restart.time_scale_factor[[0, 0]], 0.0);
    assert_eq!(restart.carbon_pools.iter().sum::<f64>(), 0.0);
}

#[test]
fn test_snapshot_must_match_ensemble() {
    let output = run(OperatingMode::EmissionsDriven, Array1::from_elem(20, 4.0), None);
    let restart = output.restart.unwrap();

    let err = ModelBuilder::new()
        .with_driver(ndarray::Array2::zeros((2, 20)))
        .with_restart(restart)
        .build()
        .unwrap_err();
    assert!(matches!(err, FAIRError::ShapeMismatch { .. }));
}

/// Snapshots are only captured on request.
#[test]
fn test_snapshot_not_captured_by_default() {
    let output = ModelBuilder::new()
        .with_driver(Array1::from_elem(20, 4.0))
        .build()
        .unwrap()
        .run()
        .unwrap();
    assert!(output.restart.is_none());
}
