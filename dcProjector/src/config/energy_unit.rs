// Energy unit module - the unit tags an energy amount may carry in a parameter file
use std::fmt;
use serde::{Deserialize, Serialize};

/// Units an energy amount can be supplied in. PJ is canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnergyUnit {
    /// Power in MW, assumed sustained for a full year
    Megawatts,
    MegawattHours,
    TerawattHours,
    Petajoules,
}

impl EnergyUnit {
    pub const ALL: [EnergyUnit; 4] = [
        EnergyUnit::Petajoules,
        EnergyUnit::Megawatts,
        EnergyUnit::MegawattHours,
        EnergyUnit::TerawattHours,
    ];

    /// Suffix used on parameter keys, e.g. `additional_energy_mw`
    pub fn key_suffix(&self) -> &'static str {
        match self {
            EnergyUnit::Megawatts => "mw",
            EnergyUnit::MegawattHours => "mwh",
            EnergyUnit::TerawattHours => "twh",
            EnergyUnit::Petajoules => "pj",
        }
    }
}

impl fmt::Display for EnergyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EnergyUnit::Megawatts => "MW",
            EnergyUnit::MegawattHours => "MWh",
            EnergyUnit::TerawattHours => "TWh",
            EnergyUnit::Petajoules => "PJ",
        };
        write!(f, "{}", label)
    }
}
