//! Turbulent fluctuations `x' = x - trend(x)`.

use mf_constants::Solute;
use mf_core::{MfResult, Series, nan_mean};
use mf_data::{Dataset, Detrend, Notation, SoluteVar, UnitMap, Var};
use tracing::debug;

use crate::frame::Frame;

/// Columns whose fluctuations the flux step reads.
pub fn default_fluctuation_columns(notation: &Notation, solutes: &[Solute]) -> Vec<String> {
    let vars = [
        Var::U,
        Var::V,
        Var::W,
        Var::Theta,
        Var::ThetaV,
        Var::ThetaS,
        Var::SpecificHumidity,
        Var::MrhoH2o,
        Var::RhoH2o,
    ];
    let mut cols: Vec<String> = vars.iter().map(|v| notation.var(*v).to_string()).collect();
    for solute in solutes.iter().filter(|s| !s.is_water()) {
        cols.push(notation.solute(solute.code(), SoluteVar::MolarDensity));
        cols.push(notation.solute(solute.code(), SoluteVar::MassDensity));
    }
    cols
}

/// Trend of a column sampled at equal spacing.
pub fn trend(values: &[f64], method: Detrend) -> Vec<f64> {
    match method {
        Detrend::Block => {
            let mean = nan_mean(values).unwrap_or(f64::NAN);
            vec![mean; values.len()]
        }
        Detrend::Linear => linear_trend(values),
    }
}

/// Least-squares line over the row index, NaN rows ignored.
fn linear_trend(values: &[f64]) -> Vec<f64> {
    let pts: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .map(|(i, v)| (i as f64, *v))
        .collect();
    let n = pts.len() as f64;
    if pts.len() < 2 {
        return trend(values, Detrend::Block);
    }
    let mx = pts.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pts.iter().map(|p| p.1).sum::<f64>() / n;
    let sxy: f64 = pts.iter().map(|(x, y)| (x - mx) * (y - my)).sum();
    let sxx: f64 = pts.iter().map(|(x, _)| (x - mx).powi(2)).sum();
    let slope = sxy / sxx;
    (0..values.len())
        .map(|i| my + slope * (i as f64 - mx))
        .collect()
}

/// Add a fluctuation column for each of `columns` present in the dataset.
///
/// The fluctuation keeps the unit of its source column.
pub fn add_fluctuations(
    dataset: &Dataset,
    units: &UnitMap,
    notation: &Notation,
    columns: &[String],
    method: Detrend,
) -> MfResult<(Dataset, UnitMap)> {
    let mut f = Frame::new(dataset, units);
    for col in columns {
        if !f.has(col) {
            continue;
        }
        let series = f.series(col)?;
        let trend = trend(&series.values, method);
        let values = series.values.iter().zip(&trend).map(|(x, t)| x - t).collect();
        let name = notation.decorate(col, mf_data::Decoration::Fluctuation);
        debug!(column = %name, ?method, "fluctuation");
        f.put(&name, Series::new(values, series.unit))?;
    }
    Ok(f.into_parts())
}
