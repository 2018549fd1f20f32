//! FaIR parameter sets
//!
//! A parameter set fully describes one configuration of the carbon cycle,
//! forcing law and thermal response. A run may evaluate several parameter sets
//! at once; they form the parameter-set axis of the ensemble.
//!
//! Parameter sets can be exchanged as a flat vector of [`N_PARAMETERS`] values
//! in the order given by [`PARAMETER_NAMES`], or as TOML tables.

use crate::errors::{FAIRError, FAIRResult};
use crate::timeseries::FloatValue;
use nalgebra::{Matrix2, Vector2};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Number of carbon pools.
pub const N_CARBON_POOLS: usize = 4;

/// Number of thermal response boxes.
pub const N_THERMAL_BOXES: usize = 2;

/// Length of the flat parameter vector.
pub const N_PARAMETERS: usize = 20;

/// Names of the entries of the flat parameter vector, in order.
pub const PARAMETER_NAMES: [&str; N_PARAMETERS] = [
    "ecs",
    "tcr",
    "d0",
    "d1",
    "a0",
    "a1",
    "a2",
    "a3",
    "b0",
    "b1",
    "b2",
    "b3",
    "t_iirf",
    "r0",
    "rc",
    "rt",
    "f2x",
    "pre_industrial_concentration",
    "c",
    "iirf_max",
];

/// Horizon (years) of the TCR definition: the warming at the time of CO2
/// doubling under a 1%/yr increase.
const TCR_HORIZON: FloatValue = 70.0;

/// Tolerance on the sum of the partition fractions.
const PARTITION_SUM_TOLERANCE: FloatValue = 1e-6;

/// Parameters for the carbon cycle, forcing and thermal response.
///
/// Missing fields in serialised input take their reference value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    /// Equilibrium climate sensitivity.
    /// unit: K
    pub ecs: FloatValue,
    /// Transient climate response.
    /// unit: K
    pub tcr: FloatValue,
    /// Time constants of the fast and slow thermal boxes.
    /// unit: yr
    pub thermal_timescales: [FloatValue; N_THERMAL_BOXES],
    /// Fraction of emitted carbon entering each carbon pool.
    ///
    /// These should sum to 1 for mass-conserving results. This is not enforced:
    /// a warning is logged when they do not.
    pub partition_fractions: [FloatValue; N_CARBON_POOLS],
    /// Nominal e-folding time constants of the carbon pools.
    /// unit: yr
    pub carbon_timescales: [FloatValue; N_CARBON_POOLS],
    /// Horizon over which the integrated impulse response is defined.
    /// unit: yr
    pub t_iirf: FloatValue,
    /// Pre-industrial integrated impulse response.
    /// unit: yr
    pub r0: FloatValue,
    /// Sensitivity of the integrated impulse response to cumulative uptake.
    /// unit: yr / GtC
    pub rc: FloatValue,
    /// Sensitivity of the integrated impulse response to temperature.
    /// unit: yr / K
    pub rt: FloatValue,
    /// ERF due to a doubling of atmospheric CO2 concentrations.
    /// unit: W / m^2
    pub erf_2xco2: FloatValue,
    /// Pre-industrial atmospheric CO2 concentration.
    /// unit: ppm
    pub conc_pi: FloatValue,
    /// Conversion factor from atmospheric carbon mass to concentration.
    /// unit: GtC / ppm
    pub gtc_per_ppm: FloatValue,
    /// Cap on the integrated impulse response.
    /// unit: yr
    pub iirf_max: FloatValue,
}

impl ParameterSet {
    /// The reference FaIR configuration.
    pub fn reference() -> Self {
        Self {
            ecs: 2.5,
            tcr: 1.75,
            thermal_timescales: [4.1, 239.0],
            partition_fractions: [0.2173, 0.2240, 0.2824, 0.2763],
            carbon_timescales: [1000000.0, 394.4, 36.54, 4.304],
            t_iirf: 100.0,
            r0: 35.0,
            rc: 0.02,
            rt: 4.5,
            erf_2xco2: 3.74,
            conc_pi: 278.0,
            gtc_per_ppm: 2.123,
            iirf_max: 97.0,
        }
    }

    /// Build a parameter set from a flat vector ordered as [`PARAMETER_NAMES`].
    pub fn from_slice(values: &[FloatValue]) -> FAIRResult<Self> {
        if values.len() != N_PARAMETERS {
            return Err(FAIRError::shape_mismatch(
                "parameter set",
                format!("[{}]", N_PARAMETERS),
                format!("[{}]", values.len()),
            ));
        }
        let v = values;
        Ok(Self {
            ecs: v[0],
            tcr: v[1],
            thermal_timescales: [v[2], v[3]],
            partition_fractions: [v[4], v[5], v[6], v[7]],
            carbon_timescales: [v[8], v[9], v[10], v[11]],
            t_iirf: v[12],
            r0: v[13],
            rc: v[14],
            rt: v[15],
            erf_2xco2: v[16],
            conc_pi: v[17],
            gtc_per_ppm: v[18],
            iirf_max: v[19],
        })
    }

    /// Flatten into a vector ordered as [`PARAMETER_NAMES`].
    pub fn to_array(&self) -> [FloatValue; N_PARAMETERS] {
        let [d0, d1] = self.thermal_timescales;
        let [a0, a1, a2, a3] = self.partition_fractions;
        let [b0, b1, b2, b3] = self.carbon_timescales;
        [
            self.ecs,
            self.tcr,
            d0,
            d1,
            a0,
            a1,
            a2,
            a3,
            b0,
            b1,
            b2,
            b3,
            self.t_iirf,
            self.r0,
            self.rc,
            self.rt,
            self.erf_2xco2,
            self.conc_pi,
            self.gtc_per_ppm,
            self.iirf_max,
        ]
    }

    /// Check that the parameters describe a usable configuration.
    ///
    /// Partition fractions that do not sum to 1 are accepted with a warning.
    pub fn validate(&self) -> FAIRResult<()> {
        for (name, value) in PARAMETER_NAMES.iter().zip(self.to_array()) {
            if !value.is_finite() {
                return Err(FAIRError::invalid_parameter(name, "must be finite"));
            }
        }

        let positive = [
            ("d0", self.thermal_timescales[0]),
            ("d1", self.thermal_timescales[1]),
            ("b0", self.carbon_timescales[0]),
            ("b1", self.carbon_timescales[1]),
            ("b2", self.carbon_timescales[2]),
            ("b3", self.carbon_timescales[3]),
            ("t_iirf", self.t_iirf),
            ("pre_industrial_concentration", self.conc_pi),
            ("c", self.gtc_per_ppm),
            ("iirf_max", self.iirf_max),
        ];
        for (name, value) in positive {
            if value <= 0.0 {
                return Err(FAIRError::invalid_parameter(
                    name,
                    format!("must be strictly positive, got {}", value),
                ));
            }
        }

        if self.erf_2xco2 == 0.0 {
            return Err(FAIRError::invalid_parameter("f2x", "must be non-zero"));
        }

        let partition_sum: FloatValue = self.partition_fractions.iter().sum();
        if (partition_sum - 1.0).abs() > PARTITION_SUM_TOLERANCE {
            warn!(
                partition_sum,
                "Carbon partition fractions do not sum to 1; results will not conserve mass"
            );
        }

        Ok(())
    }

    /// Derive the per-box thermal response coefficients.
    pub fn thermal_response(&self) -> FAIRResult<ThermalCoefficients> {
        ThermalCoefficients::derive(self)
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::reference()
    }
}

/// Per-box thermal coefficients derived from the climate sensitivities.
///
/// For each box with time constant $d_j$:
///
/// $$ k_j = 1 - \frac{d_j}{70} \left(1 - e^{-70 / d_j}\right) $$
///
/// and the sensitivities $q_j$ solve
///
/// $$ F_{2x} (q_0 + q_1) = ECS, \quad F_{2x} (k_0 q_0 + k_1 q_1) = TCR $$
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalCoefficients {
    /// Nonlinearity correction of each box.
    pub k: [FloatValue; N_THERMAL_BOXES],
    /// Temperature response per unit forcing of each box.
    /// unit: K / (W / m^2)
    pub q: [FloatValue; N_THERMAL_BOXES],
}

impl ThermalCoefficients {
    pub fn derive(parameters: &ParameterSet) -> FAIRResult<Self> {
        let d = parameters.thermal_timescales;
        if d.iter().any(|&dj| !(dj > 0.0)) {
            return Err(FAIRError::invalid_parameter(
                "d",
                format!("thermal time constants must be strictly positive, got {:?}", d),
            ));
        }

        let k = d.map(|dj| 1.0 - (dj / TCR_HORIZON) * (1.0 - (-TCR_HORIZON / dj).exp()));
        if (k[0] - k[1]).abs() < 1e-12 {
            return Err(FAIRError::invalid_parameter(
                "d",
                "thermal boxes are indistinguishable; TCR and ECS cannot be apportioned",
            ));
        }

        let f2x = parameters.erf_2xco2;
        let system = Matrix2::new(f2x, f2x, f2x * k[0], f2x * k[1]);
        let rhs = Vector2::new(parameters.ecs, parameters.tcr);
        let q = system.lu().solve(&rhs).ok_or_else(|| {
            FAIRError::invalid_parameter("d", "singular thermal sensitivity system")
        })?;

        Ok(Self {
            k,
            q: [q[0], q[1]],
        })
    }
}

/// The parameter-set axis of an ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSets {
    #[serde(rename = "parameter_set")]
    sets: Vec<ParameterSet>,
}

impl ParameterSets {
    pub fn new(sets: Vec<ParameterSet>) -> Self {
        Self { sets }
    }

    pub fn single(set: ParameterSet) -> Self {
        Self { sets: vec![set] }
    }

    /// Parameter sets stacked as rows of an `n x 20` array.
    pub fn from_array2(values: &Array2<FloatValue>) -> FAIRResult<Self> {
        if values.ncols() != N_PARAMETERS {
            return Err(FAIRError::shape_mismatch(
                "parameter sets",
                format!("[n, {}]", N_PARAMETERS),
                format!("{:?}", values.shape()),
            ));
        }
        let sets = values
            .rows()
            .into_iter()
            .map(|row| ParameterSet::from_slice(&row.to_vec()))
            .collect::<FAIRResult<Vec<_>>>()?;
        Ok(Self { sets })
    }

    /// Read `[[parameter_set]]` tables.
    pub fn from_toml(text: &str) -> FAIRResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ParameterSet> {
        self.sets.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterSet> {
        self.sets.iter()
    }
}

impl From<ParameterSet> for ParameterSets {
    fn from(set: ParameterSet) -> Self {
        Self::single(set)
    }
}

impl From<Vec<ParameterSet>> for ParameterSets {
    fn from(sets: Vec<ParameterSet>) -> Self {
        Self::new(sets)
    }
}

impl Default for ParameterSets {
    fn default() -> Self {
        Self::single(ParameterSet::reference())
    }
}
