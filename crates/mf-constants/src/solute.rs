use mf_core::{MfError, MfResult, Quantity, Unit};

use crate::species::Species;

/// A trace gas carried through the flux pipeline.
///
/// The code is stored lowercase and used in column names (`mrho_co2`, `F_co2`).
#[derive(Debug, Clone, PartialEq)]
pub struct Solute {
    code: String,
    molar_mass: Quantity,
}

impl Solute {
    /// A tabulated species, looked up by code.
    pub fn from_code(code: &str) -> MfResult<Self> {
        let species: Species = code.parse()?;
        Ok(Self::from_species(species))
    }

    pub fn from_species(species: Species) -> Self {
        Self {
            code: species.key().to_string(),
            molar_mass: species.molar_mass(),
        }
    }

    /// An untabulated gas with a caller-supplied molar mass.
    pub fn custom(code: impl Into<String>, molar_mass: Quantity) -> MfResult<Self> {
        let code = code.into().trim().to_lowercase();
        if code.is_empty() {
            return Err(MfError::InvalidArg {
                what: "solute code must not be empty".into(),
            });
        }
        if !molar_mass.unit.is_compatible(&Unit::g_per_mol()) {
            return Err(MfError::IncompatibleUnits {
                from: molar_mass.unit.symbol().to_string(),
                to: "g/mol".into(),
            });
        }
        mf_core::ensure_finite(molar_mass.value, "solute molar mass")?;
        Ok(Self { code, molar_mass })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn molar_mass(&self) -> &Quantity {
        &self.molar_mass
    }

    pub fn is_water(&self) -> bool {
        self.code == Species::H2O.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabulated_and_custom_solutes() {
        let co2 = Solute::from_code("CO2").unwrap();
        assert_eq!(co2.code(), "co2");
        assert_eq!(co2.molar_mass().value, 44.0095);

        let so2 = Solute::custom("so2", Quantity::parse("64.066 g/mol").unwrap()).unwrap();
        assert_eq!(so2.code(), "so2");
        assert!(Solute::from_code("so2").is_err());
        assert!(Solute::custom("x", Quantity::parse("3 m").unwrap()).is_err());
    }

    #[test]
    fn custom_codes_are_lowercased() {
        let water = Solute::custom("H2O", Quantity::parse("18.0153 g/mol").unwrap()).unwrap();
        assert_eq!(water.code(), "h2o");
        assert!(water.is_water());

        let ch4 = Solute::custom(" CH4 ", Quantity::parse("16.04 g/mol").unwrap()).unwrap();
        assert_eq!(ch4.code(), "ch4");
        assert!(!ch4.is_water());
        assert!(Solute::custom("  ", Quantity::parse("16.04 g/mol").unwrap()).is_err());
    }
}
