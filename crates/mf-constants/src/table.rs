//! Named physical constants as runtime quantities.
//!
//! The table is built once per process and never mutated.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use mf_core::{Dimension, MfError, MfResult, Quantity, Unit};

use crate::species::Species;

pub const R_UNIVERSAL: f64 = 8.3144621;
pub const CP_DRY: f64 = 1.0035;
pub const CP_H2O: f64 = 4.1813;
pub const GRAVITY: f64 = 9.80665;
pub const OMEGA: f64 = 7.29212e-5;
pub const EARTH_RADIUS: f64 = 6_378_140.0;
pub const STANDARD_PRESSURE: f64 = 101_325.0;
pub const STANDARD_TEMPERATURE: f64 = 288.15;
pub const TEMPERATURE_LAPSE_RATE: f64 = -0.0065;
pub const EARTH_ATMOSPHERE_MOLAR_MASS: f64 = 28.9644;
pub const AVOGADRO: f64 = 6.022140857e23;
pub const VON_KARMAN: f64 = 0.4;

fn j_per_mol_k() -> Unit {
    let dim = Dimension::new([1, 2, -2, 0, -1, -1, 0]);
    Unit::new("J/(mol*K)", dim, 1.0, 0.0)
}

fn j_per_g_k() -> Unit {
    let dim = Dimension::SPECIFIC_HEAT;
    Unit::new("J/(g*K)", dim, 1e3, 0.0)
}

/// Immutable lookup of constants by name.
#[derive(Debug)]
pub struct ConstantsTable {
    entries: BTreeMap<String, Quantity>,
}

static TABLE: LazyLock<ConstantsTable> = LazyLock::new(ConstantsTable::build);

/// The process-wide constants table.
pub fn constants() -> &'static ConstantsTable {
    &TABLE
}

impl ConstantsTable {
    fn build() -> Self {
        let mut entries = BTreeMap::new();
        let mut put = |name: String, q: Quantity| {
            entries.insert(name, q);
        };

        for s in Species::ALL {
            put(format!("molar_mass_{}", s.key()), s.molar_mass());
            put(
                format!("R_spec_{}", s.key()),
                Quantity::new(R_UNIVERSAL / s.molar_mass_g_per_mol(), j_per_g_k()),
            );
        }
        put("R".into(), Quantity::new(R_UNIVERSAL, j_per_mol_k()));
        put("cp_dry".into(), Quantity::new(CP_DRY, j_per_g_k()));
        put("cp_h2o".into(), Quantity::new(CP_H2O, j_per_g_k()));
        put(
            "gravity".into(),
            Quantity::new(
                GRAVITY,
                Unit::new("m/s^2", Dimension::new([0, 1, -2, 0, 0, 0, 0]), 1.0, 0.0),
            ),
        );
        put(
            "omega".into(),
            Quantity::new(OMEGA, Unit::new("1/s", Dimension::new([0, 0, -1, 0, 0, 0, 0]), 1.0, 0.0)),
        );
        put("earth_radius".into(), Quantity::new(EARTH_RADIUS, Unit::meter()));
        put(
            "standard_pressure".into(),
            Quantity::new(STANDARD_PRESSURE, Unit::new("Pa", Dimension::PRESSURE, 1.0, 0.0)),
        );
        put(
            "standard_temperature".into(),
            Quantity::new(STANDARD_TEMPERATURE, Unit::kelvin()),
        );
        put(
            "temperature_lapse_rate".into(),
            Quantity::new(
                TEMPERATURE_LAPSE_RATE,
                Unit::new("K/m", Dimension::new([0, -1, 0, 0, 1, 0, 0]), 1.0, 0.0),
            ),
        );
        put(
            "earth_atmosphere_molar_mass".into(),
            Quantity::new(EARTH_ATMOSPHERE_MOLAR_MASS, Unit::g_per_mol()),
        );
        put(
            "mole".into(),
            Quantity::new(AVOGADRO, Unit::new("1/mol", Dimension::new([0, 0, 0, 0, 0, -1, 0]), 1.0, 0.0)),
        );
        put("kappa".into(), Quantity::dimensionless(VON_KARMAN));

        Self { entries }
    }

    pub fn get(&self, name: &str) -> MfResult<&Quantity> {
        self.entries.get(name).ok_or_else(|| MfError::InvalidArg {
            what: format!("unknown constant '{name}'"),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Quantity)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn molar_mass(&self, species: Species) -> Quantity {
        species.molar_mass()
    }

    /// Universal gas constant over a species' molar mass.
    pub fn specific_gas_constant(&self, species: Species) -> Quantity {
        Quantity::new(R_UNIVERSAL / species.molar_mass_g_per_mol(), j_per_g_k())
    }
}

/// Latent heat of vaporization of water, `2501 - 2.37 (θ - 273.15 K)` in J/g.
pub fn latent_heat_water(theta: &Quantity) -> MfResult<Quantity> {
    let kelvin = theta.value_in(&Unit::kelvin())?;
    let unit = Unit::new("J/g", Dimension::new([0, 2, -2, 0, 0, 0, 0]), 1e3, 0.0);
    Ok(Quantity::new(2501.0 - 2.37 * (kelvin - 273.15), unit))
}
