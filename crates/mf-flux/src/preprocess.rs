//! Derived thermodynamic quantities.
//!
//! [`preprocess`] adds the columns the flux step needs: water vapour mass
//! and molar densities, moist and dry air densities, specific humidity,
//! mixing ratios and, per solute, the same family of derived columns.
//! Steps run in a fixed order and each one is skipped when its output
//! column already exists, so running it on its own output changes nothing.

use mf_constants::{Solute, Species, typed};
use mf_core::{MfError, MfResult, Quantity, Series, Unit};
use mf_data::{Dataset, Notation, PreprocessOptions, SoluteVar, UnitMap, Var};
use tracing::{debug, info};

use crate::frame::{Frame, require};

/// `θ ≈ θv / (1 + 0.61 q)`
pub const VIRTUAL_TEMPERATURE_COEFF: f64 = 0.61;
/// `θ ≈ θs / (1 + 0.51 q)`
pub const SONIC_TEMPERATURE_COEFF: f64 = 0.51;

pub fn preprocess(
    dataset: &Dataset,
    units: &UnitMap,
    notation: &Notation,
    solutes: &[Solute],
    options: &PreprocessOptions,
) -> MfResult<(Dataset, UnitMap)> {
    info!(rows = dataset.len(), columns = dataset.n_columns(), "pre-processing");
    let mut f = Frame::new(dataset, units);
    let m_h2o = Species::H2O.molar_mass();
    let m_dry = Species::Dry.molar_mass();

    let rho_h2o = notation.var(Var::RhoH2o);
    let mrho_h2o = notation.var(Var::MrhoH2o);
    let rho_air = notation.var(Var::RhoAir);
    let rho_dry = notation.var(Var::RhoDry);
    let mrho_dry = notation.var(Var::MrhoDry);
    let q = notation.var(Var::SpecificHumidity);
    let r_h2o = notation.var(Var::RH2o);
    let mr_h2o = notation.var(Var::MrH2o);

    // temperatures to kelvin
    for v in Var::TEMPERATURES {
        let col = notation.var(v);
        if f.has(col) {
            let unit = f.units.unit(col)?;
            if *unit != Unit::kelvin() {
                debug!(column = col, from = %unit, "converting to kelvin");
            }
            f.normalize(col, &Unit::kelvin())?;
        }
    }

    mass_and_molar_density(&mut f, rho_h2o, mrho_h2o, &m_h2o)?;

    if !f.has(rho_air) {
        let rho = moist_air_density(&f, notation, options)?;
        f.put(rho_air, rho)?;
    }

    if !f.has(rho_dry) {
        require(f.missing([rho_air, rho_h2o]))?;
        debug!("rho_dry = rho_air - rho_h2o");
        let s = f.series(rho_air)?.sub(&f.series(rho_h2o)?)?;
        f.put(rho_dry, s)?;
    }

    if !f.has(mrho_dry) {
        require(f.missing([rho_dry]))?;
        debug!("mrho_dry = rho_dry / M_dry");
        let s = f.series(rho_dry)?.div_scalar(&m_dry)?;
        f.put(mrho_dry, s)?;
    }

    derive_ratio(&mut f, q, rho_h2o, rho_air)?;
    derive_ratio(&mut f, r_h2o, rho_h2o, rho_dry)?;
    derive_ratio(&mut f, mr_h2o, mrho_h2o, mrho_dry)?;

    f.normalize(mr_h2o, &Unit::mol_per_mol())?;
    f.normalize(mrho_dry, &Unit::mol_per_m3())?;

    let theta = notation.var(Var::Theta);
    if !f.has(theta) {
        if options.expand_temperature {
            expand_temperature(&mut f, notation)?;
        } else {
            debug!("thermodynamic temperature absent and expansion disabled");
        }
    }

    for solute in solutes {
        if solute.is_water() {
            debug!("water vapour is handled natively, skipping solute entry");
            continue;
        }
        solute_columns(&mut f, notation, solute)?;
    }

    info!(columns = f.ds.n_columns(), "pre-processing complete");
    Ok(f.into_parts())
}

/// Fill whichever of mass or molar density is absent from the other.
fn mass_and_molar_density(f: &mut Frame, mass: &str, molar: &str, molar_mass: &Quantity) -> MfResult<()> {
    match (f.has(mass), f.has(molar)) {
        (true, true) => Ok(()),
        (false, true) => {
            debug!(column = mass, "mass density = molar density * M");
            let s = f.series(molar)?.mul_scalar(molar_mass)?;
            f.put(mass, s)
        }
        (true, false) => {
            debug!(column = molar, "molar density = mass density / M");
            let s = f.series(mass)?.div_scalar(molar_mass)?;
            f.put(molar, s)
        }
        (false, false) => Err(MfError::MissingQuantity {
            names: vec![mass.to_string(), molar.to_string()],
        }),
    }
}

fn derive_ratio(f: &mut Frame, out: &str, num: &str, den: &str) -> MfResult<()> {
    if f.has(out) {
        return Ok(());
    }
    require(f.missing([num, den]))?;
    debug!(column = out, "{out} = {num} / {den}");
    let s = f.series(num)?.div(&f.series(den)?)?;
    f.put(out, s)
}

/// Moist-air density in kg/m³, from θv or from θ as configured.
fn moist_air_density(f: &Frame, notation: &Notation, options: &PreprocessOptions) -> MfResult<Series> {
    let p = notation.var(Var::Pressure);
    let theta_v = notation.var(Var::ThetaV);
    let theta = notation.var(Var::Theta);
    let rho_h2o = notation.var(Var::RhoH2o);
    let r_dry = Quantity::from_uom(typed::specific_gas_constant(Species::Dry));
    let kg_m3 = Unit::kg_per_m3();
    let len = f.ds.len();

    if options.rho_air_from_theta_v {
        info!("rho_air = p / (R_dry * theta_v)");
        require(f.missing([p, theta_v]))?;
        let (p, tv) = (f.series(p)?, f.series(theta_v)?);
        if options.use_means {
            let rho = p.mean()?.div(&tv.mean()?.mul(&r_dry)?)?.convert(&kg_m3)?;
            return Ok(Series::broadcast(&rho, len));
        }
        return p.div(&tv.mul_scalar(&r_dry)?)?.convert(&kg_m3);
    }

    info!("rho_air = p / (R_dry * theta) - rho_h2o * (R_h2o / R_dry - 1)");
    let theta_series = match &options.theta_aux {
        Some(aux) => {
            debug!("using auxiliary thermodynamic temperature");
            if aux.len() != len {
                return Err(MfError::InvalidArg {
                    what: format!("auxiliary theta has {} rows, dataset has {len}", aux.len()),
                });
            }
            require(f.missing([p, rho_h2o]))?;
            aux.convert(&Unit::kelvin())?
        }
        None => {
            require(f.missing([p, theta, rho_h2o]))?;
            f.series(theta)?
        }
    };
    if !theta_series.unit.is_absolute_temperature() {
        return Err(MfError::mismatch(
            "moist air density",
            theta_series.unit.symbol(),
            "K",
        ));
    }
    let r_h2o = Quantity::from_uom(typed::specific_gas_constant(Species::H2O));
    let excess = r_h2o.value_in(&r_dry.unit)? / r_dry.value - 1.0;
    let (p, rho_v) = (f.series(p)?, f.series(rho_h2o)?);

    if options.use_means {
        let dry_part = p.mean()?.div(&theta_series.mean()?.mul(&r_dry)?)?.convert(&kg_m3)?;
        let rho = dry_part.sub(&rho_v.mean()?.scale(excess))?;
        return Ok(Series::broadcast(&rho, len));
    }
    let dry_part = p.div(&theta_series.mul_scalar(&r_dry)?)?.convert(&kg_m3)?;
    dry_part.sub(&rho_v.map_values(|x| x * excess))
}

/// θ from θv, else from θs, using specific humidity.
fn expand_temperature(f: &mut Frame, notation: &Notation) -> MfResult<()> {
    let theta = notation.var(Var::Theta);
    let q = notation.var(Var::SpecificHumidity);
    let (source, coeff) = if f.has(notation.var(Var::ThetaV)) {
        (notation.var(Var::ThetaV), VIRTUAL_TEMPERATURE_COEFF)
    } else if f.has(notation.var(Var::ThetaS)) {
        (notation.var(Var::ThetaS), SONIC_TEMPERATURE_COEFF)
    } else {
        debug!("no virtual or sonic temperature to derive theta from");
        return Ok(());
    };
    debug!(source, coeff, "theta = source / (1 + coeff * q)");
    require(f.missing([source, q]))?;
    let q_values = f.series(q)?.to_dimensionless()?;
    let src = f.series(source)?;
    let values = src
        .values
        .iter()
        .zip(&q_values)
        .map(|(t, q)| t / (1.0 + coeff * q))
        .collect();
    f.put(theta, Series::new(values, src.unit))
}

fn solute_columns(f: &mut Frame, notation: &Notation, solute: &Solute) -> MfResult<()> {
    let code = solute.code();
    info!(solute = code, "deriving solute columns");
    let mass = notation.solute(code, SoluteVar::MassDensity);
    let molar = notation.solute(code, SoluteVar::MolarDensity);
    let conc = notation.solute(code, SoluteVar::MassConcentration);
    let r = notation.solute(code, SoluteVar::MassMixingRatio);
    let mr = notation.solute(code, SoluteVar::MolarMixingRatio);

    mass_and_molar_density(f, &mass, &molar, solute.molar_mass())?;
    derive_ratio(f, &conc, &mass, notation.var(Var::RhoAir))?;
    derive_ratio(f, &r, &mass, notation.var(Var::RhoDry))?;
    derive_ratio(f, &mr, &molar, notation.var(Var::MrhoDry))?;

    f.normalize(&mr, &Unit::mol_per_mol())?;
    f.normalize(&r, &Unit::g_per_g())?;
    f.normalize(&conc, &Unit::g_per_g())
}
