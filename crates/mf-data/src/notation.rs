//! Semantic variable names mapped to dataset column names.
//!
//! A semantic name such as `virtual_temperature` or `co2_molar_density`
//! resolves to the literal column (`theta_v`, `mrho_co2`). Decorated names
//! append `_fluctuation`, `_mean` or `_star` and resolve through the
//! decoration templates (`theta_v'`, `theta_v_mean`, `theta_v_star`).
//! Per-solute names are built from `(code, SoluteVar)` pairs through column
//! templates containing `{solute}`.
//!
//! A [`Notation`] is built once, optionally with [`NotationOverrides`], and
//! is read-only afterwards.

use std::collections::BTreeMap;

use mf_core::{MfError, MfResult};
use serde::{Deserialize, Serialize};

const SOLUTE_PLACEHOLDER: &str = "{solute}";
const NAME_PLACEHOLDER: &str = "{}";

/// Non-solute variables, water vapour included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Var {
    Theta,
    ThetaV,
    ThetaS,
    ThetaP,
    Pressure,
    U,
    V,
    W,
    RhoAir,
    RhoDry,
    MrhoDry,
    RhoH2o,
    MrhoH2o,
    SpecificHumidity,
    RH2o,
    MrH2o,
    MomentumFlux,
    SensibleHeatFlux,
    VirtualSensibleHeatFlux,
    WaterVaporFlux,
    LatentHeatFlux,
    ObukhovLength,
    StabilityParameter,
}

impl Var {
    pub const ALL: [Var; 23] = [
        Var::Theta,
        Var::ThetaV,
        Var::ThetaS,
        Var::ThetaP,
        Var::Pressure,
        Var::U,
        Var::V,
        Var::W,
        Var::RhoAir,
        Var::RhoDry,
        Var::MrhoDry,
        Var::RhoH2o,
        Var::MrhoH2o,
        Var::SpecificHumidity,
        Var::RH2o,
        Var::MrH2o,
        Var::MomentumFlux,
        Var::SensibleHeatFlux,
        Var::VirtualSensibleHeatFlux,
        Var::WaterVaporFlux,
        Var::LatentHeatFlux,
        Var::ObukhovLength,
        Var::StabilityParameter,
    ];

    /// Temperatures that preprocessing brings to kelvin.
    pub const TEMPERATURES: [Var; 4] = [Var::Theta, Var::ThetaV, Var::ThetaS, Var::ThetaP];

    /// Semantic name.
    pub fn key(&self) -> &'static str {
        match self {
            Var::Theta => "thermodynamic_temperature",
            Var::ThetaV => "virtual_temperature",
            Var::ThetaS => "sonic_temperature",
            Var::ThetaP => "potential_temperature",
            Var::Pressure => "pressure",
            Var::U => "u",
            Var::V => "v",
            Var::W => "w",
            Var::RhoAir => "density",
            Var::RhoDry => "dry_air_density",
            Var::MrhoDry => "dry_air_molar_density",
            Var::RhoH2o => "h2o_mass_density",
            Var::MrhoH2o => "h2o_molar_density",
            Var::SpecificHumidity => "specific_humidity",
            Var::RH2o => "h2o_mass_mixing_ratio",
            Var::MrH2o => "h2o_molar_mixing_ratio",
            Var::MomentumFlux => "momentum_flux",
            Var::SensibleHeatFlux => "sensible_heat_flux",
            Var::VirtualSensibleHeatFlux => "virtual_sensible_heat_flux",
            Var::WaterVaporFlux => "water_vapor_flux",
            Var::LatentHeatFlux => "latent_heat_flux",
            Var::ObukhovLength => "obukhov_length",
            Var::StabilityParameter => "stability_parameter",
        }
    }

    /// Column name in the default registry.
    pub fn default_column(&self) -> &'static str {
        match self {
            Var::Theta => "theta",
            Var::ThetaV => "theta_v",
            Var::ThetaS => "theta_s",
            Var::ThetaP => "theta_p",
            Var::Pressure => "p",
            Var::U => "u",
            Var::V => "v",
            Var::W => "w",
            Var::RhoAir => "rho_air",
            Var::RhoDry => "rho_dry",
            Var::MrhoDry => "mrho_dry",
            Var::RhoH2o => "rho_h2o",
            Var::MrhoH2o => "mrho_h2o",
            Var::SpecificHumidity => "q",
            Var::RH2o => "r_h2o",
            Var::MrH2o => "mr_h2o",
            Var::MomentumFlux => "tau",
            Var::SensibleHeatFlux => "H",
            Var::VirtualSensibleHeatFlux => "Hv",
            Var::WaterVaporFlux => "E",
            Var::LatentHeatFlux => "LE",
            Var::ObukhovLength => "Lo",
            Var::StabilityParameter => "zeta",
        }
    }
}

/// Per-solute variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoluteVar {
    MassDensity,
    MolarDensity,
    MassConcentration,
    MassMixingRatio,
    MolarMixingRatio,
    Flux,
}

impl SoluteVar {
    pub const ALL: [SoluteVar; 6] = [
        SoluteVar::MassDensity,
        SoluteVar::MolarDensity,
        SoluteVar::MassConcentration,
        SoluteVar::MassMixingRatio,
        SoluteVar::MolarMixingRatio,
        SoluteVar::Flux,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SoluteVar::MassDensity => "mass_density",
            SoluteVar::MolarDensity => "molar_density",
            SoluteVar::MassConcentration => "mass_concentration",
            SoluteVar::MassMixingRatio => "mass_mixing_ratio",
            SoluteVar::MolarMixingRatio => "molar_mixing_ratio",
            SoluteVar::Flux => "flux",
        }
    }

    pub fn default_template(&self) -> &'static str {
        match self {
            SoluteVar::MassDensity => "rho_{solute}",
            SoluteVar::MolarDensity => "mrho_{solute}",
            SoluteVar::MassConcentration => "conc_{solute}",
            SoluteVar::MassMixingRatio => "r_{solute}",
            SoluteVar::MolarMixingRatio => "mr_{solute}",
            SoluteVar::Flux => "F_{solute}",
        }
    }
}

/// Name decorations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    Fluctuation,
    Mean,
    Star,
}

impl Decoration {
    const ALL: [Decoration; 3] = [Decoration::Fluctuation, Decoration::Mean, Decoration::Star];

    fn suffix(&self) -> &'static str {
        match self {
            Decoration::Fluctuation => "_fluctuation",
            Decoration::Mean => "_mean",
            Decoration::Star => "_star",
        }
    }
}

/// Replacements applied on top of the default registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotationOverrides {
    /// Semantic name to column name.
    pub names: BTreeMap<String, String>,
    /// Column templates containing `{solute}`.
    pub solute_templates: BTreeMap<SoluteVar, String>,
    /// Decoration templates containing `{}`.
    pub fluctuation: Option<String>,
    pub mean: Option<String>,
    pub star: Option<String>,
}

/// Read-only semantic name registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Notation {
    names: BTreeMap<String, String>,
    solute_templates: BTreeMap<SoluteVar, String>,
    fluctuation: String,
    mean: String,
    star: String,
}

impl Default for Notation {
    fn default() -> Self {
        let mut names: BTreeMap<String, String> = Var::ALL
            .iter()
            .map(|v| (v.key().to_string(), v.default_column().to_string()))
            .collect();
        // water vapour aliases under the solute naming scheme
        names.insert("h2o_mass_concentration".into(), "q".into());
        names.insert("h2o_flux".into(), "E".into());
        names.insert("friction_velocity".into(), "u_star".into());

        Self {
            names,
            solute_templates: SoluteVar::ALL
                .iter()
                .map(|sv| (*sv, sv.default_template().to_string()))
                .collect(),
            fluctuation: "{}'".into(),
            mean: "{}_mean".into(),
            star: "{}_star".into(),
        }
    }
}

impl Notation {
    pub fn with_overrides(overrides: &NotationOverrides) -> MfResult<Self> {
        let mut notation = Self::default();
        for (semantic, column) in &overrides.names {
            if column.trim().is_empty() {
                return Err(MfError::Config {
                    what: format!("notation '{semantic}' maps to an empty column name"),
                });
            }
            notation.names.insert(semantic.clone(), column.clone());
        }
        for (sv, template) in &overrides.solute_templates {
            if !template.contains(SOLUTE_PLACEHOLDER) {
                return Err(MfError::Config {
                    what: format!("solute template '{template}' lacks {SOLUTE_PLACEHOLDER}"),
                });
            }
            notation.solute_templates.insert(*sv, template.clone());
        }
        let decorations = [
            (&overrides.fluctuation, &mut notation.fluctuation),
            (&overrides.mean, &mut notation.mean),
            (&overrides.star, &mut notation.star),
        ];
        for (given, slot) in decorations {
            if let Some(template) = given {
                if !template.contains(NAME_PLACEHOLDER) {
                    return Err(MfError::Config {
                        what: format!("decoration template '{template}' lacks {NAME_PLACEHOLDER}"),
                    });
                }
                *slot = template.clone();
            }
        }
        Ok(notation)
    }

    fn decoration_template(&self, d: Decoration) -> &str {
        match d {
            Decoration::Fluctuation => &self.fluctuation,
            Decoration::Mean => &self.mean,
            Decoration::Star => &self.star,
        }
    }

    pub fn decorate(&self, column: &str, d: Decoration) -> String {
        self.decoration_template(d).replace(NAME_PLACEHOLDER, column)
    }

    /// Column name of a semantic identifier.
    pub fn resolve(&self, semantic: &str) -> MfResult<String> {
        if let Some(col) = self.names.get(semantic) {
            return Ok(col.clone());
        }
        for d in Decoration::ALL {
            if let Some(base) = semantic.strip_suffix(d.suffix())
                && let Some(col) = self.resolve_base(base)
            {
                return Ok(self.decorate(&col, d));
            }
        }
        self.resolve_base(semantic)
            .ok_or_else(|| MfError::UndefinedNotation {
                name: semantic.to_string(),
            })
    }

    fn resolve_base(&self, semantic: &str) -> Option<String> {
        if let Some(col) = self.names.get(semantic) {
            return Some(col.clone());
        }
        SoluteVar::ALL.iter().find_map(|sv| {
            let code = semantic.strip_suffix(sv.key())?.strip_suffix('_')?;
            (!code.is_empty() && !code.contains(char::is_whitespace))
                .then(|| self.solute_column(code, *sv))
        })
    }

    /// Substitute `solute` into a semantic template such as
    /// `"{solute}_molar_density"` and resolve the result.
    pub fn template(&self, semantic_template: &str, solute: &str) -> MfResult<String> {
        if !semantic_template.contains(SOLUTE_PLACEHOLDER) {
            return Err(MfError::InvalidArg {
                what: format!("template '{semantic_template}' lacks {SOLUTE_PLACEHOLDER}"),
            });
        }
        self.resolve(&semantic_template.replace(SOLUTE_PLACEHOLDER, solute))
    }

    pub fn var(&self, v: Var) -> &str {
        self.names
            .get(v.key())
            .map(String::as_str)
            .unwrap_or(v.default_column())
    }

    pub fn fluctuation(&self, v: Var) -> String {
        self.decorate(self.var(v), Decoration::Fluctuation)
    }

    pub fn mean(&self, v: Var) -> String {
        self.decorate(self.var(v), Decoration::Mean)
    }

    pub fn star(&self, v: Var) -> String {
        self.decorate(self.var(v), Decoration::Star)
    }

    /// Friction velocity column (`u_star`).
    pub fn friction_velocity(&self) -> String {
        self.names
            .get("friction_velocity")
            .cloned()
            .unwrap_or_else(|| self.star(Var::U))
    }

    fn solute_column(&self, code: &str, sv: SoluteVar) -> String {
        let template = self
            .solute_templates
            .get(&sv)
            .map(String::as_str)
            .unwrap_or(sv.default_template());
        template.replace(SOLUTE_PLACEHOLDER, code)
    }

    /// Column for a solute variable; explicit names win over templates.
    pub fn solute(&self, code: &str, sv: SoluteVar) -> String {
        let semantic = format!("{code}_{}", sv.key());
        self.names
            .get(&semantic)
            .cloned()
            .unwrap_or_else(|| self.solute_column(code, sv))
    }

    pub fn solute_fluctuation(&self, code: &str, sv: SoluteVar) -> String {
        self.decorate(&self.solute(code, sv), Decoration::Fluctuation)
    }

    pub fn solute_star(&self, code: &str, sv: SoluteVar) -> String {
        self.decorate(&self.solute(code, sv), Decoration::Star)
    }

    pub fn solute_mean(&self, code: &str, sv: SoluteVar) -> String {
        self.decorate(&self.solute(code, sv), Decoration::Mean)
    }

    /// Flux column of a solute (`F_co2`).
    pub fn flux_of(&self, code: &str) -> String {
        self.solute(code, SoluteVar::Flux)
    }

    /// Every plain and decorated semantic identifier of the registry.
    pub fn identifiers(&self) -> Vec<String> {
        let mut out = Vec::new();
        for name in self.names.keys() {
            out.push(name.clone());
            for d in Decoration::ALL {
                out.push(format!("{name}{}", d.suffix()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_resolves_standard_names() {
        let n = Notation::default();
        assert_eq!(n.resolve("virtual_temperature").unwrap(), "theta_v");
        assert_eq!(n.resolve("density").unwrap(), "rho_air");
        assert_eq!(n.resolve("virtual_temperature_fluctuation").unwrap(), "theta_v'");
        assert_eq!(n.resolve("u_star").unwrap(), "u_star");
        assert_eq!(n.resolve("friction_velocity").unwrap(), "u_star");
        assert_eq!(n.resolve("latent_heat_flux").unwrap(), "LE");
        assert_eq!(n.var(Var::SpecificHumidity), "q");
        assert_eq!(n.fluctuation(Var::W), "w'");
        assert_eq!(n.mean(Var::Theta), "theta_mean");
        assert_eq!(n.star(Var::ThetaV), "theta_v_star");
        assert!(n.identifiers().len() >= 80);
    }

    #[test]
    fn undefined_names_are_errors() {
        let n = Notation::default();
        assert_eq!(
            n.resolve("vorticity").unwrap_err(),
            MfError::UndefinedNotation {
                name: "vorticity".into()
            }
        );
    }

    #[test]
    fn solute_templates_substitute_codes() {
        let n = Notation::default();
        assert_eq!(n.template("{solute}_molar_density", "co2").unwrap(), "mrho_co2");
        assert_eq!(n.solute("ch4", SoluteVar::MassDensity), "rho_ch4");
        assert_eq!(n.solute_fluctuation("co2", SoluteVar::MolarDensity), "mrho_co2'");
        assert_eq!(n.solute_star("co2", SoluteVar::MassConcentration), "conc_co2_star");
        assert_eq!(n.flux_of("co2"), "F_co2");
        assert_eq!(n.resolve("co2_molar_density_fluctuation").unwrap(), "mrho_co2'");
        assert!(n.template("co2_flux", "co2").is_err());
    }

    #[test]
    fn water_vapour_uses_explicit_names() {
        let n = Notation::default();
        assert_eq!(n.solute("h2o", SoluteVar::MolarDensity), "mrho_h2o");
        assert_eq!(n.solute("h2o", SoluteVar::MassConcentration), "q");
        assert_eq!(n.flux_of("h2o"), "E");
        assert_eq!(n.template("{solute}_mass_concentration", "h2o").unwrap(), "q");
    }

    #[test]
    fn overrides_replace_names_and_templates() {
        let overrides = NotationOverrides {
            names: [("virtual_temperature".to_string(), "Tv".to_string())].into(),
            solute_templates: [(SoluteVar::MolarDensity, "c_{solute}".to_string())].into(),
            fluctuation: Some("{}_p".into()),
            ..Default::default()
        };
        let n = Notation::with_overrides(&overrides).unwrap();
        assert_eq!(n.var(Var::ThetaV), "Tv");
        assert_eq!(n.fluctuation(Var::ThetaV), "Tv_p");
        assert_eq!(n.solute("co2", SoluteVar::MolarDensity), "c_co2");
        // explicit h2o entry is unaffected by the template
        assert_eq!(n.solute("h2o", SoluteVar::MolarDensity), "mrho_h2o");
    }

    #[test]
    fn malformed_overrides_are_rejected() {
        let bad_template = NotationOverrides {
            solute_templates: [(SoluteVar::Flux, "F".to_string())].into(),
            ..Default::default()
        };
        assert!(matches!(
            Notation::with_overrides(&bad_template),
            Err(MfError::Config { .. })
        ));
        let bad_decoration = NotationOverrides {
            star: Some("star".into()),
            ..Default::default()
        };
        assert!(Notation::with_overrides(&bad_decoration).is_err());
    }

    proptest::proptest! {
        #[test]
        fn decorated_solute_names_resolve_like_accessors(code in "[a-z][a-z0-9]{0,5}", idx in 0usize..6) {
            let n = Notation::default();
            let sv = SoluteVar::ALL[idx];
            let plain = n.resolve(&format!("{code}_{}", sv.key())).unwrap();
            proptest::prop_assert_eq!(plain, n.solute(&code, sv));
            let fluct = n.resolve(&format!("{code}_{}_fluctuation", sv.key())).unwrap();
            proptest::prop_assert_eq!(fluct, n.solute_fluctuation(&code, sv));
        }
    }
}
