//! Conservation and stability properties of complete runs.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use fair::{ModelBuilder, OperatingMode, ParameterSet};
use is_close::is_close;
use ndarray::Array1;

mod carbon_mass_balance {
    use super::*;

    /// Everything emitted either stays in the atmosphere or is taken up.
    #[test]
    fn test_cumulative_uptake_balances_emissions() {
        let emissions =
            Array1::from_shape_fn(150, |x| 10.0 * (x as f64 / 40.0).sin().abs() + 1.0);
        let parameters = ParameterSet::reference();

        let output = ModelBuilder::new()
            .with_driver(emissions.clone())
            .build()
            .unwrap()
            .run()
            .unwrap();
        let concentration = output.concentration.unwrap();
        let uptake = output.carbon_diagnostics.unwrap().cumulative_uptake;

        for x in 1..150 {
            let lhs = uptake[[0, 0, x]] - uptake[[0, 0, x - 1]];
            let rhs = emissions[x]
                - parameters.gtc_per_ppm * (concentration[[0, 0, x]] - concentration[[0, 0, x - 1]]);
            assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-9);
        }
        assert_eq!(uptake[[0, 0, 0]], emissions[0]);
    }

    /// The same balance holds when the emissions are recovered.
    #[test]
    fn test_mass_balance_in_inverse_mode() {
        let concentration = Array1::from_shape_fn(100, |x| 278.0 + 0.02 * (x * x) as f64);
        let parameters = ParameterSet::reference();

        let output = ModelBuilder::new()
            .with_mode(OperatingMode::EmissionsBack)
            .with_driver(concentration.clone())
            .with_config(fair::ModelConfig::without_smoothing())
            .build()
            .unwrap()
            .run()
            .unwrap();
        let emissions = output.emissions.unwrap();
        let uptake = output.carbon_diagnostics.unwrap().cumulative_uptake;

        for x in 1..100 {
            let lhs = uptake[[0, 0, x]] - uptake[[0, 0, x - 1]];
            let rhs = emissions[[0, 0, x]]
                - parameters.gtc_per_ppm * (concentration[x] - concentration[x - 1]);
            assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-9);
        }
    }
}

mod feedback {
    use super::*;

    /// The iIRF never exceeds its cap, and sustained emissions reach it.
    #[test]
    fn test_iirf_is_capped() {
        let parameters = ParameterSet {
            iirf_max: 50.0,
            ..ParameterSet::reference()
        };
        let output = ModelBuilder::new()
            .with_driver(Array1::from_elem(200, 20.0))
            .with_parameter_sets(parameters)
            .build()
            .unwrap()
            .run()
            .unwrap();
        let diagnostics = output.carbon_diagnostics.unwrap();

        assert!(diagnostics.iirf.iter().all(|&v| v <= 50.0));
        assert!(is_close!(diagnostics.iirf[[0, 0, 199]], 50.0));
        // Once capped, the time-scale factor stops changing
        assert_relative_eq!(
            diagnostics.time_scale_factor[[0, 0, 199]],
            diagnostics.time_scale_factor[[0, 0, 198]]
        );
    }

    /// More uptake weakens the sinks, so the time-scale factor grows.
    #[test]
    fn test_time_scale_factor_grows_with_uptake() {
        let output = ModelBuilder::new()
            .with_driver(Array1::from_elem(100, 10.0))
            .build()
            .unwrap()
            .run()
            .unwrap();
        let alpha = output.carbon_diagnostics.unwrap().time_scale_factor;

        assert_eq!(alpha[[0, 0, 0]], 0.0);
        for x in 2..100 {
            assert!(alpha[[0, 0, x]] > alpha[[0, 0, x - 1]]);
        }
    }
}

mod stability {
    use super::*;

    /// Zero drivers hold every mode at pre-industrial.
    #[test]
    fn test_unperturbed_runs_stay_at_equilibrium() {
        let drivers = [
            (OperatingMode::EmissionsDriven, 0.0),
            (OperatingMode::EmissionsBack, 278.0),
            (OperatingMode::ForcingDriven, 0.0),
            (OperatingMode::ForcingBack, 0.0),
        ];

        for (mode, value) in drivers {
            let output = ModelBuilder::new()
                .with_mode(mode)
                .with_driver(Array1::from_elem(60, value))
                .build()
                .unwrap()
                .run()
                .unwrap();

            for series in [&output.emissions, &output.forcing, &output.temperature] {
                if let Some(series) = series {
                    assert!(series.iter().all(|&v| v.abs() < 1e-12), "{}", mode);
                }
            }
            if let Some(concentration) = &output.concentration {
                assert!(concentration.iter().all(|&v| v == 278.0));
            }
        }
    }

    /// A single emissions pulse raises concentrations, which then decay
    /// without returning to pre-industrial.
    #[test]
    fn test_pulse_decays_but_persists() {
        let mut emissions = Array1::zeros(300);
        emissions[10] = 100.0;

        let output = ModelBuilder::new()
            .with_driver(emissions)
            .build()
            .unwrap()
            .run()
            .unwrap();
        let concentration = output.concentration.unwrap();
        let temperature = output.temperature.unwrap();

        let peak = concentration[[0, 0, 11]];
        assert!(peak > 278.0 + 20.0);
        for x in 12..300 {
            assert!(concentration[[0, 0, x]] < concentration[[0, 0, x - 1]]);
            assert!(concentration[[0, 0, x]] > 278.0);
        }
        assert!(temperature[[0, 0, 299]] > 0.0);
    }

    /// A unit pulse in the first step enters through the equilibrium pool seed:
    /// half of it is in the atmosphere at step 0, the rest arrives at step 1.
    #[test]
    fn test_unit_pulse_at_start() {
        let mut emissions = Array1::zeros(500);
        emissions[0] = 1.0;
        let parameters = ParameterSet::reference();

        let output = ModelBuilder::new()
            .with_driver(emissions)
            .build()
            .unwrap()
            .run()
            .unwrap();
        let concentration = output.concentration.unwrap();

        let seeded = 0.5 / parameters.gtc_per_ppm;
        assert_relative_eq!(concentration[[0, 0, 0]], 278.0 + seeded, epsilon = 1e-12);
        assert!(concentration[[0, 0, 1]] > concentration[[0, 0, 0]]);
        for x in 2..500 {
            assert!(concentration[[0, 0, x]] < concentration[[0, 0, x - 1]]);
            assert!(concentration[[0, 0, x]] > 278.0);
        }
    }
}
