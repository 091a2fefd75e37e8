//! Atmospheric species with tabulated molar masses.

use mf_core::{MfError, Quantity, Unit};

/// Species whose molar mass is tabulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Species {
    /// Dry air (mean molar mass)
    Dry,
    /// Ozone (O₃)
    O3,
    /// Water vapour (H₂O)
    H2O,
    /// Carbon dioxide (CO₂)
    CO2,
    /// Carbon monoxide (CO)
    CO,
    /// Methane (CH₄)
    CH4,
    /// Nitrous oxide (N₂O)
    N2O,
    /// Atomic oxygen
    O,
    /// Atomic nitrogen
    N,
}

impl Species {
    pub const ALL: [Species; 9] = [
        Species::Dry,
        Species::O3,
        Species::H2O,
        Species::CO2,
        Species::CO,
        Species::CH4,
        Species::N2O,
        Species::O,
        Species::N,
    ];

    /// Lower-case code used in column names (`h2o`, `co2`, ...).
    pub fn key(&self) -> &'static str {
        match self {
            Species::Dry => "dry",
            Species::O3 => "o3",
            Species::H2O => "h2o",
            Species::CO2 => "co2",
            Species::CO => "co",
            Species::CH4 => "ch4",
            Species::N2O => "n2o",
            Species::O => "o",
            Species::N => "n",
        }
    }

    /// Molar mass in g/mol.
    pub fn molar_mass_g_per_mol(&self) -> f64 {
        match self {
            Species::Dry => 28.9645,
            Species::O3 => 47.99820,
            Species::H2O => 18.0153,
            Species::CO2 => 44.0095,
            Species::CO => 28.0101,
            Species::CH4 => 16.0425,
            Species::N2O => 44.01280,
            Species::O => 15.99940,
            Species::N => 14.00670,
        }
    }

    pub fn molar_mass(&self) -> Quantity {
        Quantity::new(self.molar_mass_g_per_mol(), Unit::g_per_mol())
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Species {
    type Err = MfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DRY" | "AIR" | "DRY AIR" => Ok(Species::Dry),
            "O3" | "OZONE" => Ok(Species::O3),
            "H2O" | "WATER" | "VAPOR" | "VAPOUR" => Ok(Species::H2O),
            "CO2" | "CARBON DIOXIDE" => Ok(Species::CO2),
            "CO" | "CARBON MONOXIDE" => Ok(Species::CO),
            "CH4" | "METHANE" => Ok(Species::CH4),
            "N2O" | "NITROUS OXIDE" => Ok(Species::N2O),
            "O" | "OXYGEN" => Ok(Species::O),
            "N" | "NITROGEN" => Ok(Species::N),
            _ => Err(MfError::InvalidArg {
                what: format!("unknown species '{}'", s.trim()),
            }),
        }
    }
}
