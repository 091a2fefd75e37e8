// mf-constants/src/typed.rs

//! Constants as typed `uom` quantities (SI, f64).
//!
//! The flux code bridges these into runtime quantities with
//! `Quantity::from_uom`.

use uom::si::f64::{Acceleration, MolarHeatCapacity, MolarMass, SpecificHeatCapacity};

use crate::species::Species;
use crate::table::{CP_DRY, GRAVITY, R_UNIVERSAL};

#[inline]
pub fn molar_mass(species: Species) -> MolarMass {
    use uom::si::molar_mass::gram_per_mole;
    MolarMass::new::<gram_per_mole>(species.molar_mass_g_per_mol())
}

#[inline]
pub fn gas_constant() -> MolarHeatCapacity {
    use uom::si::molar_heat_capacity::joule_per_kelvin_mole;
    MolarHeatCapacity::new::<joule_per_kelvin_mole>(R_UNIVERSAL)
}

#[inline]
pub fn specific_gas_constant(species: Species) -> SpecificHeatCapacity {
    use uom::si::specific_heat_capacity::joule_per_kilogram_kelvin;
    let per_gram = R_UNIVERSAL / species.molar_mass_g_per_mol();
    SpecificHeatCapacity::new::<joule_per_kilogram_kelvin>(per_gram * 1e3)
}

#[inline]
pub fn cp_dry() -> SpecificHeatCapacity {
    use uom::si::specific_heat_capacity::joule_per_kilogram_kelvin;
    SpecificHeatCapacity::new::<joule_per_kilogram_kelvin>(CP_DRY * 1e3)
}

#[inline]
pub fn gravity() -> Acceleration {
    use uom::si::acceleration::meter_per_second_squared;
    Acceleration::new::<meter_per_second_squared>(GRAVITY)
}
