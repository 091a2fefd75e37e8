//! A configured analysis over one dataset.

use mf_constants::Solute;
use mf_data::{AnalysisConfig, Dataset, Notation, UnitMap};
use tracing::info;

use crate::error::FluxResult;
use crate::preprocess::preprocess;
use crate::rotation::rotate_wind;
use crate::table::FluxTable;
use crate::windows::{WindowSettings, eddy_covariance_windows};

/// Validated configuration with the notation and solutes resolved once.
#[derive(Debug, Clone)]
pub struct Analysis {
    config: AnalysisConfig,
    notation: Notation,
    solutes: Vec<Solute>,
}

impl Analysis {
    pub fn new(config: AnalysisConfig) -> FluxResult<Self> {
        config.validate()?;
        let notation = config.notation()?;
        let solutes = config.solutes()?;
        Ok(Self {
            config,
            notation,
            solutes,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn notation(&self) -> &Notation {
        &self.notation
    }

    pub fn solutes(&self) -> &[Solute] {
        &self.solutes
    }

    fn settings(&self) -> WindowSettings<'_> {
        WindowSettings {
            notation: &self.notation,
            solutes: &self.solutes,
            preprocess: &self.config.preprocess,
            fluxes: &self.config.fluxes,
            site: self.config.site.as_ref(),
            detrend: self.config.detrend,
            rotate: self.config.rotate,
        }
    }

    /// Optional rotation followed by the derived-quantity step over the whole dataset.
    pub fn preprocess_only(&self, dataset: &Dataset, units: &UnitMap) -> FluxResult<(Dataset, UnitMap)> {
        let out = if self.config.rotate {
            let (ds, u, angles) = rotate_wind(dataset, units, &self.notation)?;
            info!(alpha = angles.alpha, beta = angles.beta, "rotated wind");
            preprocess(&ds, &u, &self.notation, &self.solutes, &self.config.preprocess)?
        } else {
            preprocess(dataset, units, &self.notation, &self.solutes, &self.config.preprocess)?
        };
        Ok(out)
    }

    /// One flux row per averaging window.
    pub fn run(&self, dataset: &Dataset, units: &UnitMap) -> FluxResult<FluxTable> {
        let window_rows = self.config.window_rows.unwrap_or(dataset.len());
        eddy_covariance_windows(dataset, units, window_rows, &self.settings())
    }
}
