use mf_core::{MfError, MfResult, Quantity, Unit};
use serde::{Deserialize, Serialize};

/// Measurement site geometry.
///
/// Heights are length quantities (`"10 m"`). When not given, the
/// displacement height defaults to 2/3 of the canopy height and the
/// roughness length to 1/10 of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub measurement_height: Quantity,
    pub canopy_height: Quantity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displacement_height: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roughness_length: Option<Quantity>,
}

impl SiteConfig {
    /// Site from heights in meters, with default displacement and roughness.
    pub fn new(measurement_height_m: f64, canopy_height_m: f64) -> Self {
        Self {
            measurement_height: Quantity::new(measurement_height_m, Unit::meter()),
            canopy_height: Quantity::new(canopy_height_m, Unit::meter()),
            displacement_height: None,
            roughness_length: None,
        }
    }

    fn meters(q: &Quantity, what: &str) -> MfResult<f64> {
        q.value_in(&Unit::meter()).map_err(|_| MfError::Config {
            what: format!("{what} must be a length, got '{}'", q.unit),
        })
    }

    pub fn measurement_height_m(&self) -> MfResult<f64> {
        Self::meters(&self.measurement_height, "measurement_height")
    }

    pub fn canopy_height_m(&self) -> MfResult<f64> {
        Self::meters(&self.canopy_height, "canopy_height")
    }

    pub fn displacement_height_m(&self) -> MfResult<f64> {
        match &self.displacement_height {
            Some(d) => Self::meters(d, "displacement_height"),
            None => Ok(self.canopy_height_m()? * 2.0 / 3.0),
        }
    }

    pub fn roughness_length_m(&self) -> MfResult<f64> {
        match &self.roughness_length {
            Some(z0) => Self::meters(z0, "roughness_length"),
            None => Ok(self.canopy_height_m()? / 10.0),
        }
    }

    /// Height above the displacement plane, `z - d`.
    pub fn effective_height(&self) -> MfResult<Quantity> {
        Ok(Quantity::new(
            self.measurement_height_m()? - self.displacement_height_m()?,
            Unit::meter(),
        ))
    }

    pub fn validate(&self) -> MfResult<()> {
        let z = self.measurement_height_m()?;
        let hc = self.canopy_height_m()?;
        let d = self.displacement_height_m()?;
        let z0 = self.roughness_length_m()?;
        for (name, v) in [("measurement_height", z), ("canopy_height", hc), ("roughness_length", z0)] {
            if !v.is_finite() || v < 0.0 {
                return Err(MfError::Config {
                    what: format!("{name} must be a finite non-negative length, got {v}"),
                });
            }
        }
        if z <= d {
            return Err(MfError::Config {
                what: format!("measurement height {z} m is not above displacement height {d} m"),
            });
        }
        Ok(())
    }
}
