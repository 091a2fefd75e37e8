//! Webb-Pearman-Leuning density correction.
//!
//! Open-path gas analyzers see density changes caused by heat and water
//! vapour transport as well as true gas exchange. The correction adds the
//! density-fluctuation terms back:
//!
//! ```text
//! E = (1 + r_v) [E_raw + ρ̄_v cov(θ', w') / θ̄]
//! F = F_raw + ρ̄_c (1 + r_v) cov(θ', w') / θ̄ + r_c E_raw
//! ```
//!
//! with `ρ̄` molar densities and `r` molar mixing ratios against dry air.

use mf_core::{MfError, MfResult, Quantity};

use crate::frame::Frame;

/// Shared inputs of the heat-transport term.
#[derive(Debug, Clone)]
pub struct WplTerms {
    /// Mean water vapour molar mixing ratio.
    pub r_v: f64,
    /// `cov(θ', w')`
    pub cov_theta_w: Quantity,
    /// Mean thermodynamic temperature, absolute scale.
    pub theta_mean: Quantity,
}

impl WplTerms {
    pub fn new(r_v: f64, cov_theta_w: Quantity, theta_mean: Quantity) -> MfResult<Self> {
        if !theta_mean.unit.is_absolute_temperature() {
            return Err(MfError::mismatch("WPL correction", theta_mean.unit.symbol(), "K"));
        }
        Ok(Self {
            r_v,
            cov_theta_w,
            theta_mean,
        })
    }

    /// `ρ̄ cov(θ', w') / θ̄`
    fn heat_term(&self, mean_density: &Quantity) -> MfResult<Quantity> {
        mean_density.mul(&self.cov_theta_w)?.div(&self.theta_mean)
    }

    /// Corrected water vapour flux.
    pub fn water_vapor_flux(&self, e_raw: &Quantity, mrho_h2o_mean: &Quantity) -> MfResult<Quantity> {
        let corrected = e_raw.add(&self.heat_term(mrho_h2o_mean)?)?;
        Ok(corrected.scale(1.0 + self.r_v))
    }

    /// Corrected flux of a trace gas.
    pub fn solute_flux(
        &self,
        f_raw: &Quantity,
        solute_mean: &Quantity,
        r_solute: f64,
        e_raw: &Quantity,
    ) -> MfResult<Quantity> {
        let heat = self.heat_term(solute_mean)?.scale(1.0 + self.r_v);
        f_raw.add(&heat)?.add(&e_raw.scale(r_solute))
    }
}

/// Mean molar mixing ratio against dry air: from the ratio column when
/// present, else from mean molar densities.
pub(crate) fn mean_mixing_ratio(f: &Frame, ratio: &str, molar_density: &str, dry_molar_density: &str) -> MfResult<f64> {
    if f.usable(ratio) {
        return f.mean(ratio)?.to_dimensionless();
    }
    let missing = f.missing([molar_density, dry_molar_density]);
    if !missing.is_empty() {
        let mut names = vec![ratio.to_string()];
        names.extend(missing);
        return Err(MfError::MissingQuantity { names });
    }
    f.mean(molar_density)?
        .div(&f.mean(dry_molar_density)?)?
        .to_dimensionless()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_core::{Tolerances, Unit, nearly_equal};

    fn q(text: &str) -> Quantity {
        Quantity::parse(text).unwrap()
    }

    #[test]
    fn dry_air_limit_adds_density_term_only() {
        let terms = WplTerms::new(0.0, q("0.1 K*m/s"), q("300 K")).unwrap();
        let e_raw = q("0.002 mol/(m^2*s)");
        let e = terms.water_vapor_flux(&e_raw, &q("0.6 mol/m^3")).unwrap();
        let e = e.convert(&Unit::mol_per_m2_s()).unwrap();
        let expected = 0.002 + 0.6 * 0.1 / 300.0;
        assert!(nearly_equal(e.value, expected, Tolerances::default()));
    }

    #[test]
    fn moist_air_scales_by_one_plus_r_v() {
        let terms = WplTerms::new(0.02, q("0.1 K*m/s"), q("300 K")).unwrap();
        let e = terms
            .water_vapor_flux(&q("2 mmol/(m^2*s)"), &q("600 mmol/m^3"))
            .unwrap()
            .convert(&Unit::mol_per_m2_s())
            .unwrap();
        let expected = 1.02 * (0.002 + 0.6 * 0.1 / 300.0);
        assert!(nearly_equal(e.value, expected, Tolerances::default()));
    }

    #[test]
    fn solute_flux_closed_form() {
        let terms = WplTerms::new(0.015, q("0.12 K*m/s"), q("295 K")).unwrap();
        let f = terms
            .solute_flux(
                &q("-10 umol/(m^2*s)"),
                &q("16 mmol/m^3"),
                400e-6,
                &q("3 mmol/(m^2*s)"),
            )
            .unwrap()
            .convert(&Unit::mol_per_m2_s())
            .unwrap();
        let expected = -10e-6 + 16e-3 * 1.015 * 0.12 / 295.0 + 400e-6 * 3e-3;
        assert!(nearly_equal(f.value, expected, Tolerances { abs: 1e-15, rel: 1e-9 }));
    }

    #[test]
    fn celsius_mean_temperature_is_rejected() {
        let err = WplTerms::new(0.0, q("0.1 K*m/s"), q("25 degC")).unwrap_err();
        assert!(matches!(err, MfError::UnitMismatch { .. }));
    }
}
