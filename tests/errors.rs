//! Failure modes of complete runs.

use fair::fair_core::solver::{SolveError, SolverConfig};
use fair::{FAIRError, ModelBuilder, ModelConfig, OperatingMode, ParameterSet, ParameterSets};
use ndarray::Array1;

#[test]
fn test_unknown_mode_is_rejected() {
    let err = "emissions_forward".parse::<OperatingMode>().unwrap_err();
    match err {
        FAIRError::UnknownMode(name) => assert_eq!(name, "emissions_forward"),
        other => panic!("Expected UnknownMode, got {:?}", other),
    }

    for mode in OperatingMode::ALL {
        assert_eq!(mode.to_string().parse::<OperatingMode>().unwrap(), mode);
    }
}

/// An iteration budget that cannot be met reports where the solve failed.
#[test]
fn test_non_convergence_is_fatal() {
    let config = ModelConfig {
        solver: SolverConfig {
            max_iters: 1,
            ..SolverConfig::default()
        },
        ..ModelConfig::default()
    };
    let err = ModelBuilder::new()
        .with_driver(Array1::from_elem(10, 10.0))
        .with_config(config)
        .build()
        .unwrap()
        .run()
        .unwrap_err();

    match err {
        FAIRError::TimeScaleSolve {
            scenario,
            parameter_set,
            timestep,
            source,
        } => {
            assert_eq!((scenario, parameter_set, timestep), (0, 0, 1));
            assert!(matches!(source, SolveError::MaxIters { iters: 1, .. }));
        }
        other => panic!("Expected TimeScaleSolve, got {:?}", other),
    }
}

/// The failing member is identified within an ensemble.
#[test]
fn test_failing_member_is_identified() {
    let sets = ParameterSets::new(vec![
        ParameterSet::reference(),
        ParameterSet {
            rc: 0.5,
            iirf_max: 200.0,
            ..ParameterSet::reference()
        },
    ]);
    let err = ModelBuilder::new()
        .with_driver(Array1::from_elem(100, 10.0))
        .with_parameter_sets(sets)
        .build()
        .unwrap()
        .run()
        .unwrap_err();

    match err {
        FAIRError::TimeScaleSolve {
            parameter_set,
            source,
            ..
        } => {
            assert_eq!(parameter_set, 1);
            assert!(matches!(source, SolveError::TargetOutOfRange { .. }));
        }
        other => panic!("Expected TimeScaleSolve, got {:?}", other),
    }
}

#[test]
fn test_non_finite_driver_is_fatal() {
    let mut temperature = Array1::from_elem(10, 0.5);
    temperature[3] = f64::INFINITY;

    let err = ModelBuilder::new()
        .with_mode(OperatingMode::ForcingBack)
        .with_driver(temperature)
        .build()
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, FAIRError::NonFinite { timestep: 3, .. }));
}

#[test]
fn test_config_and_parameters_from_toml() {
    let config = ModelConfig::from_toml(
        r#"
        inverse_smoothing_sigma = 0.0

        [solver]
        max_iters = 50
        "#,
    )
    .unwrap();
    let sets = ParameterSets::from_toml(
        r#"
        [[parameter_set]]
        ecs = 3.0

        [[parameter_set]]
        tcr = 1.5
        "#,
    )
    .unwrap();
    assert_eq!(sets.len(), 2);

    let output = ModelBuilder::new()
        .with_mode(OperatingMode::EmissionsBack)
        .with_driver(Array1::from_shape_fn(30, |x| 278.0 + x as f64))
        .with_parameter_sets(sets)
        .with_config(config)
        .build()
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(output.emissions.unwrap().shape(), &[1, 2, 30]);
}

#[test]
fn test_config_round_trips_through_toml() {
    let config = ModelConfig {
        inverse_smoothing_sigma: 1.5,
        solver: SolverConfig {
            max_iters: 60,
            ..SolverConfig::default()
        },
    };

    let text = toml::to_string(&config).unwrap();
    assert_eq!(ModelConfig::from_toml(&text).unwrap(), config);
}
