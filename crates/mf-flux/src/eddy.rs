//! Eddy-covariance fluxes for one averaging window.
//!
//! Input is a pre-processed window that already carries fluctuation
//! columns. Momentum flux is always computed; the heat, water vapour and
//! latent heat fluxes are computed when their fluctuation columns exist.
//! Every configured solute needs its molar density fluctuation.

use mf_constants::{Solute, Species, latent_heat_water, typed};
use mf_core::{MfError, MfResult, Quantity, Series, Unit};
use mf_data::{Dataset, FluxOptions, Notation, SiteConfig, SoluteVar, UnitMap, Var};
use tracing::{debug, info};

use crate::covariance::CovarianceMatrix;
use crate::frame::{Frame, require};
use crate::preprocess::VIRTUAL_TEMPERATURE_COEFF;
use crate::scales::{friction_velocity, obukhov_length, scale_of, stability_parameter};
use crate::table::FluxRow;
use crate::wpl::{WplTerms, mean_mixing_ratio};

/// Column names one flux computation reads.
struct Columns {
    u: String,
    w: String,
    theta_v: String,
    theta: String,
    mrho_h2o: String,
    rho_h2o: String,
    q: String,
    theta_v_mean_src: String,
    theta_mean_src: String,
    q_mean_src: String,
    rho_air: String,
    mrho_h2o_mean_src: String,
    mr_h2o: String,
    mrho_dry: String,
}

impl Columns {
    fn resolve(n: &Notation) -> Self {
        Self {
            u: n.fluctuation(Var::U),
            w: n.fluctuation(Var::W),
            theta_v: n.fluctuation(Var::ThetaV),
            theta: n.fluctuation(Var::Theta),
            mrho_h2o: n.fluctuation(Var::MrhoH2o),
            rho_h2o: n.fluctuation(Var::RhoH2o),
            q: n.fluctuation(Var::SpecificHumidity),
            theta_v_mean_src: n.var(Var::ThetaV).to_string(),
            theta_mean_src: n.var(Var::Theta).to_string(),
            q_mean_src: n.var(Var::SpecificHumidity).to_string(),
            rho_air: n.var(Var::RhoAir).to_string(),
            mrho_h2o_mean_src: n.var(Var::MrhoH2o).to_string(),
            mr_h2o: n.var(Var::MrH2o).to_string(),
            mrho_dry: n.var(Var::MrhoDry).to_string(),
        }
    }
}

/// Per-solute column names.
struct SoluteColumns<'a> {
    solute: &'a Solute,
    fluct: String,
    molar: String,
    mixing: String,
}

pub fn eddy_covariance(
    dataset: &Dataset,
    units: &UnitMap,
    options: &FluxOptions,
    site: Option<&SiteConfig>,
    notation: &Notation,
    solutes: &[Solute],
) -> MfResult<(FluxRow, UnitMap)> {
    if options.compute_turbulent_scales && site.is_none() {
        return Err(MfError::Config {
            what: "turbulent scales requested without a site configuration".into(),
        });
    }

    let mut f = Frame::new(dataset, units);
    let c = Columns::resolve(notation);
    let sol: Vec<SoluteColumns> = solutes
        .iter()
        .filter(|s| !s.is_water())
        .map(|s| SoluteColumns {
            solute: s,
            fluct: notation.solute_fluctuation(s.code(), SoluteVar::MolarDensity),
            molar: notation.solute(s.code(), SoluteVar::MolarDensity),
            mixing: notation.solute(s.code(), SoluteVar::MolarMixingRatio),
        })
        .collect();

    // gather every missing input before computing anything
    let mut missing = f.missing([c.u.as_str(), c.w.as_str(), c.rho_air.as_str()]);
    for s in &sol {
        missing.extend(f.missing([s.fluct.as_str()]));
    }
    let derive_theta = f.usable(&c.theta_v) && (options.theta_fluct_from_theta_v || !f.usable(&c.theta));
    if derive_theta {
        missing.extend(f.missing([c.theta_mean_src.as_str(), c.q.as_str(), c.q_mean_src.as_str()]));
    }
    let has_theta_fluct = derive_theta || f.usable(&c.theta);
    let has_e = f.usable(&c.mrho_h2o);
    let has_le = f.usable(&c.rho_h2o) || options.apply_wpl;
    if has_le {
        missing.extend(f.missing([c.theta_mean_src.as_str()]));
    }
    if options.apply_wpl {
        missing.extend(f.missing([c.mrho_h2o.as_str(), c.mrho_h2o_mean_src.as_str()]));
        if !has_theta_fluct {
            missing.push(c.theta.clone());
        }
        let ratio_available = f.usable(&c.mr_h2o) || f.usable(&c.mrho_dry);
        for s in &sol {
            missing.extend(f.missing([s.molar.as_str()]));
            if !f.usable(&s.mixing) && !f.usable(&c.mrho_dry) {
                missing.push(s.mixing.clone());
            }
        }
        if !ratio_available {
            missing.extend([c.mr_h2o.clone(), c.mrho_dry.clone()]);
        }
    }
    require(missing)?;

    if derive_theta {
        let theta_fluct = theta_fluctuation(&f, &c)?;
        f.put(&c.theta, theta_fluct)?;
    }

    let mut cov_cols = vec![c.u.clone(), c.w.clone()];
    for col in [&c.theta_v, &c.mrho_h2o, &c.rho_h2o, &c.theta] {
        if f.usable(col) {
            cov_cols.push(col.clone());
        }
    }
    cov_cols.extend(sol.iter().map(|s| s.fluct.clone()));
    let mut cov = CovarianceMatrix::from_columns(&f.ds, &f.units, &cov_cols)?;
    debug!(columns = ?cov.names(), "covariance matrix");

    let rho_air = f.mean(&c.rho_air)?;
    let cp = Quantity::from_uom(typed::cp_dry());
    let theta_mean = if has_le {
        Some(f.mean(&c.theta_mean_src)?)
    } else {
        None
    };

    let mut row = FluxRow::new();

    let tau = rho_air.mul(&cov.get(&c.u, &c.w)?)?.scale(-1.0);
    row.push(notation.var(Var::MomentumFlux), tau.convert(&Unit::newton_per_m2())?);

    if cov.contains(&c.theta) {
        let h = rho_air.mul(&cp)?.mul(&cov.get(&c.theta, &c.w)?)?;
        row.push(notation.var(Var::SensibleHeatFlux), h.convert(&Unit::watt_per_m2())?);
    }
    if cov.contains(&c.theta_v) {
        let hv = rho_air.mul(&cp)?.mul(&cov.get(&c.theta_v, &c.w)?)?;
        row.push(
            notation.var(Var::VirtualSensibleHeatFlux),
            hv.convert(&Unit::watt_per_m2())?,
        );
    }

    let e_raw = if has_e {
        Some(cov.get(&c.mrho_h2o, &c.w)?)
    } else {
        None
    };
    let lambda = match &theta_mean {
        Some(t) => Some(latent_heat_water(t)?),
        None => None,
    };
    let mut e_out = e_raw.clone();
    let mut le_out = match (&lambda, cov.contains(&c.rho_h2o)) {
        (Some(l), true) => Some(l.mul(&cov.get(&c.rho_h2o, &c.w)?)?),
        _ => None,
    };
    let mut solute_fluxes: Vec<Quantity> = sol
        .iter()
        .map(|s| cov.get(&s.fluct, &c.w))
        .collect::<MfResult<_>>()?;

    if options.apply_wpl {
        info!("applying WPL correction");
        let (Some(e_raw), Some(theta_mean), Some(lambda)) = (&e_raw, &theta_mean, &lambda) else {
            return Err(MfError::missing(c.mrho_h2o.clone()));
        };
        let r_v = mean_mixing_ratio(&f, &c.mr_h2o, &c.mrho_h2o_mean_src, &c.mrho_dry)?;
        let terms = WplTerms::new(r_v, cov.get(&c.theta, &c.w)?, theta_mean.clone())?;
        debug!(r_v, "water vapour mixing ratio");

        let e = terms.water_vapor_flux(e_raw, &f.mean(&c.mrho_h2o_mean_src)?)?;
        le_out = Some(lambda.mul(&e)?.mul(&Species::H2O.molar_mass())?);
        cov.set(&c.mrho_h2o, &c.w, &e)?;

        for (s, flux) in sol.iter().zip(solute_fluxes.iter_mut()) {
            let r_s = mean_mixing_ratio(&f, &s.mixing, &s.molar, &c.mrho_dry)?;
            let corrected = terms.solute_flux(flux, &f.mean(&s.molar)?, r_s, e_raw)?;
            cov.set(&s.fluct, &c.w, &corrected)?;
            *flux = corrected;
        }
        e_out = Some(e);
    }

    if let Some(e) = &e_out {
        row.push(notation.var(Var::WaterVaporFlux), e.convert(&Unit::mol_per_m2_s())?);
    }
    if let Some(le) = &le_out {
        row.push(notation.var(Var::LatentHeatFlux), le.convert(&Unit::watt_per_m2())?);
    }
    for (s, flux) in sol.iter().zip(&solute_fluxes) {
        row.push(notation.flux_of(s.solute.code()), flux.convert(&Unit::mol_per_m2_s())?);
    }

    if let (true, Some(site)) = (options.compute_turbulent_scales, site) {
        turbulent_scales(&mut row, &f, &cov, &c, &sol, &rho_air, site, notation)?;
    }

    let units = row.units();
    Ok((row, units))
}

/// `θ' = (θv' - 0.61 θ̄ q') / (1 + 0.61 q̄)`
fn theta_fluctuation(f: &Frame, c: &Columns) -> MfResult<Series> {
    let theta_v = f.series(&c.theta_v)?;
    let theta_mean = f.mean(&c.theta_mean_src)?;
    if !theta_v.unit.is_absolute_temperature() || !theta_mean.unit.is_absolute_temperature() {
        return Err(MfError::mismatch(
            "thermodynamic temperature fluctuation",
            theta_v.unit.symbol(),
            theta_mean.unit.symbol(),
        ));
    }
    let theta_mean = theta_mean.value_in(&theta_v.unit)?;
    let q_fluct = f.series(&c.q)?.to_dimensionless()?;
    let q_mean = f.mean(&c.q_mean_src)?.to_dimensionless()?;
    let k = VIRTUAL_TEMPERATURE_COEFF;
    let values = theta_v
        .values
        .iter()
        .zip(&q_fluct)
        .map(|(tv, q)| (tv - k * theta_mean * q) / (1.0 + k * q_mean))
        .collect();
    debug!("theta' derived from theta_v'");
    Ok(Series::new(values, theta_v.unit))
}

#[allow(clippy::too_many_arguments)]
fn turbulent_scales(
    row: &mut FluxRow,
    f: &Frame,
    cov: &CovarianceMatrix,
    c: &Columns,
    sol: &[SoluteColumns],
    rho_air: &Quantity,
    site: &SiteConfig,
    notation: &Notation,
) -> MfResult<()> {
    info!("computing turbulent scales");
    let u_star = friction_velocity(&cov.get(&c.u, &c.w)?)?;
    row.push(notation.friction_velocity(), u_star.clone());

    if cov.contains(&c.theta_v) {
        let name = notation.star(Var::ThetaV);
        let tv_star = scale_of(&cov.get(&c.theta_v, &c.w)?, &u_star, &name)?;
        row.push(name, tv_star.convert(&Unit::kelvin())?);
    }
    if cov.contains(&c.theta) {
        let name = notation.star(Var::Theta);
        let t_star = scale_of(&cov.get(&c.theta, &c.w)?, &u_star, &name)?;
        row.push(name, t_star.convert(&Unit::kelvin())?);
    }
    if cov.contains(&c.mrho_h2o) {
        let name = notation.star(Var::MrhoH2o);
        let mrho_star = scale_of(&cov.get(&c.mrho_h2o, &c.w)?, &u_star, &name)?;
        let q_star = mrho_star
            .mul(&Species::H2O.molar_mass())?
            .div(rho_air)?
            .convert(&Unit::g_per_g())?;
        row.push(name, mrho_star.convert(&Unit::mol_per_m3())?);
        row.push(notation.star(Var::SpecificHumidity), q_star);
    }
    for s in sol {
        let code = s.solute.code();
        let name = notation.solute_star(code, SoluteVar::MolarDensity);
        let mrho_star = scale_of(&cov.get(&s.fluct, &c.w)?, &u_star, &name)?;
        let conc_star = mrho_star
            .mul(s.solute.molar_mass())?
            .div(rho_air)?
            .convert(&Unit::g_per_g())?;
        row.push(name, mrho_star.convert(&Unit::mol_per_m3())?);
        row.push(notation.solute_star(code, SoluteVar::MassConcentration), conc_star);
    }

    if cov.contains(&c.theta_v) && f.usable(&c.theta_v_mean_src) {
        let theta_v_mean = f.mean(&c.theta_v_mean_src)?;
        let lo = obukhov_length(&u_star, &theta_v_mean, &cov.get(&c.theta_v, &c.w)?)?;
        let zeta = stability_parameter(&site.effective_height()?, &lo)?;
        row.push(notation.var(Var::ObukhovLength), lo);
        row.push(notation.var(Var::StabilityParameter), zeta);
    } else {
        debug!("virtual temperature unavailable, skipping Obukhov length");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_core::{Tolerances, nearly_equal};

    const N: usize = 200;

    fn wave() -> Vec<f64> {
        (0..N)
            .map(|i| (2.0 * std::f64::consts::PI * i as f64 / N as f64).sin())
            .collect()
    }

    fn sample_variance(x: &[f64]) -> f64 {
        let mean = x.iter().sum::<f64>() / x.len() as f64;
        x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (x.len() as f64 - 1.0)
    }

    fn dry_window() -> (Dataset, UnitMap) {
        let w = wave();
        let ds = Dataset::from_columns(vec![
            ("u'", w.iter().map(|v| -0.5 * v).collect()),
            ("w'", w.clone()),
            ("theta'", w.iter().map(|v| 0.2 * v).collect()),
            ("rho_air", vec![1.2; N]),
        ])
        .unwrap();
        let units = UnitMap::parse_pairs([("u'", "m/s"), ("w'", "m/s"), ("theta'", "K"), ("rho_air", "kg/m^3")]).unwrap();
        (ds, units)
    }

    fn no_wpl() -> FluxOptions {
        FluxOptions {
            apply_wpl: false,
            ..FluxOptions::default()
        }
    }

    #[test]
    fn momentum_and_sensible_heat_from_covariances() {
        let (ds, units) = dry_window();
        let (row, out_units) = eddy_covariance(&ds, &units, &no_wpl(), None, &Notation::default(), &[]).unwrap();
        let var_w = sample_variance(&wave());

        let tau = row.value("tau").unwrap();
        assert!(nearly_equal(tau, 1.2 * 0.5 * var_w, Tolerances::default()));
        assert!(tau > 0.0);
        let h = row.value("H").unwrap();
        assert!(nearly_equal(h, 1.2 * 1003.5 * 0.2 * var_w, Tolerances::default()));

        assert_eq!(out_units.unit("tau").unwrap(), &Unit::newton_per_m2());
        assert_eq!(out_units.unit("H").unwrap(), &Unit::watt_per_m2());
        assert!(row.get("E").is_none());
    }

    #[test]
    fn momentum_flux_opposes_positive_covariance() {
        let (mut ds, units) = dry_window();
        let w = wave();
        ds.insert("u'", w.iter().map(|v| 0.3 * v).collect()).unwrap();
        let (row, _) = eddy_covariance(&ds, &units, &no_wpl(), None, &Notation::default(), &[]).unwrap();
        let c = 0.3 * sample_variance(&w);
        assert!(nearly_equal(row.value("tau").unwrap(), -1.2 * c, Tolerances::default()));
    }

    #[test]
    fn missing_density_is_reported_by_name() {
        let (mut ds, units) = dry_window();
        ds.remove("rho_air");
        let err = eddy_covariance(&ds, &units, &no_wpl(), None, &Notation::default(), &[]).unwrap_err();
        assert_eq!(
            err,
            MfError::MissingQuantity {
                names: vec!["rho_air".into()]
            }
        );
    }

    #[test]
    fn solute_without_fluctuation_is_missing() {
        let (ds, units) = dry_window();
        let co2 = Solute::from_code("co2").unwrap();
        let err = eddy_covariance(&ds, &units, &no_wpl(), None, &Notation::default(), &[co2]).unwrap_err();
        assert!(matches!(err, MfError::MissingQuantity { names } if names == vec!["mrho_co2'".to_string()]));
    }

    #[test]
    fn wpl_without_water_inputs_lists_them() {
        let (ds, units) = dry_window();
        let err = eddy_covariance(&ds, &units, &FluxOptions::default(), None, &Notation::default(), &[]).unwrap_err();
        let MfError::MissingQuantity { names } = err else {
            panic!("expected missing quantities, got {err:?}");
        };
        for name in ["theta", "mrho_h2o'", "mrho_h2o", "mr_h2o", "mrho_dry"] {
            assert!(names.iter().any(|n| n == name), "{name} not in {names:?}");
        }
    }

    #[test]
    fn scales_without_site_is_a_config_error() {
        let (ds, units) = dry_window();
        let options = FluxOptions {
            compute_turbulent_scales: true,
            ..no_wpl()
        };
        let err = eddy_covariance(&ds, &units, &options, None, &Notation::default(), &[]).unwrap_err();
        assert!(matches!(err, MfError::Config { .. }));
    }

    #[test]
    fn theta_fluctuation_needs_absolute_temperature() {
        let w = wave();
        let ds = Dataset::from_columns(vec![
            ("u'", w.iter().map(|v| -0.5 * v).collect()),
            ("w'", w.clone()),
            ("theta_v'", w.iter().map(|v| 0.2 * v).collect()),
            ("theta", vec![25.0; N]),
            ("q'", vec![0.0; N]),
            ("q", vec![0.01; N]),
            ("rho_air", vec![1.2; N]),
        ])
        .unwrap();
        let units = UnitMap::parse_pairs([
            ("u'", "m/s"),
            ("w'", "m/s"),
            ("theta_v'", "K"),
            ("theta", "degC"),
            ("q'", "g/g"),
            ("q", "g/g"),
            ("rho_air", "kg/m^3"),
        ])
        .unwrap();
        let err = eddy_covariance(&ds, &units, &no_wpl(), None, &Notation::default(), &[]).unwrap_err();
        assert!(matches!(err, MfError::UnitMismatch { .. }));
    }

    #[test]
    fn dry_theta_fluctuation_equals_virtual() {
        let w = wave();
        let ds = Dataset::from_columns(vec![
            ("u'", w.iter().map(|v| -0.5 * v).collect()),
            ("w'", w.clone()),
            ("theta_v'", w.iter().map(|v| 0.2 * v).collect()),
            ("theta_v", vec![300.0; N]),
            ("theta", vec![300.0; N]),
            ("q'", vec![0.0; N]),
            ("q", vec![0.0; N]),
            ("rho_air", vec![1.2; N]),
        ])
        .unwrap();
        let units = UnitMap::parse_pairs([
            ("u'", "m/s"),
            ("w'", "m/s"),
            ("theta_v'", "K"),
            ("theta_v", "K"),
            ("theta", "K"),
            ("q'", "g/g"),
            ("q", "g/g"),
            ("rho_air", "kg/m^3"),
        ])
        .unwrap();
        let options = FluxOptions {
            compute_turbulent_scales: true,
            ..no_wpl()
        };
        let site = SiteConfig::new(10.0, 3.0);
        let (row, _) = eddy_covariance(&ds, &units, &options, Some(&site), &Notation::default(), &[]).unwrap();
        let h = row.value("H").unwrap();
        let hv = row.value("Hv").unwrap();
        assert!(nearly_equal(h, hv, Tolerances::default()));

        let u_star = row.value("u_star").unwrap();
        let var_w = sample_variance(&w);
        assert!(nearly_equal(u_star, (0.5 * var_w).sqrt(), Tolerances::default()));
        let lo = row.value("Lo").unwrap();
        assert!(lo < 0.0);
        let zeta = row.value("zeta").unwrap();
        assert!(nearly_equal(zeta, 8.0 / lo, Tolerances::default()));
    }
}
