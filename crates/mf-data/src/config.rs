//! Analysis configuration file format and validation.

use std::collections::HashSet;
use std::path::Path;

use mf_constants::Solute;
use mf_core::{MfError, MfResult, Quantity, Series};
use serde::{Deserialize, Serialize};

use crate::error::DataResult;
use crate::notation::{Notation, NotationOverrides};
use crate::site::SiteConfig;

/// A solute entry: a tabulated code (`co2`) or a custom gas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SoluteDef {
    Code(String),
    Custom { code: String, molar_mass: Quantity },
}

impl SoluteDef {
    pub fn code(&self) -> &str {
        match self {
            SoluteDef::Code(code) | SoluteDef::Custom { code, .. } => code,
        }
    }

    pub fn to_solute(&self) -> MfResult<Solute> {
        match self {
            SoluteDef::Code(code) => Solute::from_code(code),
            SoluteDef::Custom { code, molar_mass } => Solute::custom(code.clone(), molar_mass.clone()),
        }
    }
}

/// Options of the derived-quantity step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessOptions {
    /// Moist-air density from `p / (R_dry θv)` (the default) instead of from θ.
    pub rho_air_from_theta_v: bool,
    /// Derive θ from θv or θs when it is absent.
    pub expand_temperature: bool,
    /// Compute moist-air density from column means.
    pub use_means: bool,
    /// Thermodynamic temperature used when the dataset has none.
    #[serde(skip)]
    pub theta_aux: Option<Series>,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            rho_air_from_theta_v: true,
            expand_temperature: false,
            use_means: false,
            theta_aux: None,
        }
    }
}

/// Options of the flux step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluxOptions {
    pub apply_wpl: bool,
    pub compute_turbulent_scales: bool,
    /// Recompute θ' from θv' even when a θ' column exists.
    pub theta_fluct_from_theta_v: bool,
}

impl Default for FluxOptions {
    fn default() -> Self {
        Self {
            apply_wpl: true,
            compute_turbulent_scales: false,
            theta_fluct_from_theta_v: true,
        }
    }
}

/// How the trend is removed before fluctuations are taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detrend {
    /// Subtract the window mean.
    #[default]
    Block,
    /// Subtract a least-squares line over the row index.
    Linear,
}

/// Everything one analysis run needs besides the data itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub solutes: Vec<SoluteDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<SiteConfig>,
    pub notation: NotationOverrides,
    pub preprocess: PreprocessOptions,
    pub fluxes: FluxOptions,
    pub detrend: Detrend,
    /// Rotate wind so that mean v and mean w vanish.
    pub rotate: bool,
    /// Rows per averaging window; the whole dataset when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_rows: Option<usize>,
}

impl AnalysisConfig {
    pub fn solutes(&self) -> MfResult<Vec<Solute>> {
        self.solutes.iter().map(SoluteDef::to_solute).collect()
    }

    pub fn notation(&self) -> MfResult<Notation> {
        Notation::with_overrides(&self.notation)
    }

    pub fn validate(&self) -> MfResult<()> {
        let mut seen = HashSet::new();
        for def in &self.solutes {
            if !seen.insert(def.code().to_lowercase()) {
                return Err(MfError::Config {
                    what: format!("solute '{}' listed twice", def.code()),
                });
            }
            def.to_solute()?;
        }
        if let Some(site) = &self.site {
            site.validate()?;
        }
        if self.fluxes.compute_turbulent_scales && self.site.is_none() {
            return Err(MfError::Config {
                what: "turbulent scales require a site configuration".into(),
            });
        }
        if let Some(rows) = self.window_rows
            && rows < 2
        {
            return Err(MfError::Config {
                what: format!("window_rows must be at least 2, got {rows}"),
            });
        }
        self.notation()?;
        Ok(())
    }
}

pub fn from_yaml_str(content: &str) -> DataResult<AnalysisConfig> {
    let config: AnalysisConfig = serde_yaml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn load_yaml(path: &Path) -> DataResult<AnalysisConfig> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn save_yaml(path: &Path, config: &AnalysisConfig) -> DataResult<()> {
    config.validate()?;
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_wpl_and_theta_v_density() {
        let config = AnalysisConfig::default();
        assert!(config.fluxes.apply_wpl);
        assert!(!config.fluxes.compute_turbulent_scales);
        assert!(config.fluxes.theta_fluct_from_theta_v);
        assert!(!config.rotate);
        assert!(config.preprocess.rho_air_from_theta_v);
        assert!(!config.preprocess.expand_temperature);
        config.validate().unwrap();
    }

    #[test]
    fn duplicate_solutes_are_rejected() {
        let config = AnalysisConfig {
            solutes: vec![SoluteDef::Code("co2".into()), SoluteDef::Code("CO2".into())],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MfError::Config { .. })));
    }

    #[test]
    fn scales_need_a_site() {
        let mut config = AnalysisConfig::default();
        config.fluxes.compute_turbulent_scales = true;
        assert!(config.validate().is_err());
        config.site = Some(SiteConfig::new(3.0, 0.3));
        config.validate().unwrap();
    }
}
