//! Operating modes.
//!
//! A mode says which quantity drives the run and, from that, in which
//! direction the carbon and thermal recurrences are integrated. The carbon
//! cycle is skipped entirely when the driver is forcing or temperature.

use fair_core::errors::FAIRError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction in which a recurrence is integrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Advance the state from a known source term.
    Forward,
    /// Recover the source term from the prescribed state.
    Inverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Emissions drive concentration, forcing and temperature.
    #[default]
    EmissionsDriven,
    /// Prescribed concentrations; emissions are recovered.
    EmissionsBack,
    /// Prescribed forcing drives temperature.
    ForcingDriven,
    /// Prescribed temperature; forcing is recovered.
    ForcingBack,
}

impl OperatingMode {
    pub const ALL: [OperatingMode; 4] = [
        OperatingMode::EmissionsDriven,
        OperatingMode::EmissionsBack,
        OperatingMode::ForcingDriven,
        OperatingMode::ForcingBack,
    ];

    /// Direction of the carbon cycle, or `None` when it is not run.
    pub fn carbon(&self) -> Option<Direction> {
        match self {
            OperatingMode::EmissionsDriven => Some(Direction::Forward),
            OperatingMode::EmissionsBack => Some(Direction::Inverse),
            OperatingMode::ForcingDriven | OperatingMode::ForcingBack => None,
        }
    }

    /// Direction of the thermal response.
    pub fn thermal(&self) -> Direction {
        match self {
            OperatingMode::ForcingBack => Direction::Inverse,
            _ => Direction::Forward,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OperatingMode::EmissionsDriven => "emissions_driven",
            OperatingMode::EmissionsBack => "emissions_back",
            OperatingMode::ForcingDriven => "forcing_driven",
            OperatingMode::ForcingBack => "forcing_back",
        }
    }
}

impl FromStr for OperatingMode {
    type Err = FAIRError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperatingMode::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| FAIRError::UnknownMode(s.to_string()))
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
