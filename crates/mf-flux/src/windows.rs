//! Fixed-length averaging windows and the per-window batch.

use std::ops::Range;

use mf_constants::Solute;
use mf_core::{MfError, MfResult, Series};
use mf_data::{Dataset, Detrend, FluxOptions, Notation, PreprocessOptions, SiteConfig, UnitMap};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::eddy::eddy_covariance;
use crate::error::{FluxError, FluxResult};
use crate::fluctuations::{add_fluctuations, default_fluctuation_columns};
use crate::preprocess::preprocess;
use crate::rotation::rotate_wind;
use crate::table::{FluxRow, FluxTable};

/// Consecutive row ranges of `window_rows` each.
///
/// A trailing remainder becomes its own window when it holds at least two
/// rows and is dropped otherwise.
pub fn split_windows(len: usize, window_rows: usize) -> Vec<Range<usize>> {
    let step = window_rows.max(2);
    let mut out: Vec<Range<usize>> = (0..len / step).map(|i| i * step..(i + 1) * step).collect();
    let tail = len % step;
    if tail >= 2 {
        out.push(len - tail..len);
    }
    out
}

/// Everything a window run reads; shared across worker threads.
#[derive(Debug, Clone, Copy)]
pub struct WindowSettings<'a> {
    pub notation: &'a Notation,
    pub solutes: &'a [Solute],
    pub preprocess: &'a PreprocessOptions,
    pub fluxes: &'a FluxOptions,
    pub site: Option<&'a SiteConfig>,
    pub detrend: Detrend,
    pub rotate: bool,
}

/// Rotation, derived quantities, fluctuations and fluxes for one window.
pub fn process_window(dataset: &Dataset, units: &UnitMap, settings: &WindowSettings) -> MfResult<FluxRow> {
    let rotated;
    let (ds, units) = if settings.rotate {
        rotated = rotate_wind(dataset, units, settings.notation)?;
        (&rotated.0, &rotated.1)
    } else {
        (dataset, units)
    };
    let (ds, units) = preprocess(ds, units, settings.notation, settings.solutes, settings.preprocess)?;
    let columns = default_fluctuation_columns(settings.notation, settings.solutes);
    let (ds, units) = add_fluctuations(&ds, &units, settings.notation, &columns, settings.detrend)?;
    let (row, _) = eddy_covariance(
        &ds,
        &units,
        settings.fluxes,
        settings.site,
        settings.notation,
        settings.solutes,
    )?;
    Ok(row)
}

/// Restricts the auxiliary temperature to the window's rows.
fn window_options(options: &PreprocessOptions, range: &Range<usize>) -> PreprocessOptions {
    let mut out = options.clone();
    if let Some(aux) = &options.theta_aux {
        let end = range.end.min(aux.len());
        let start = range.start.min(end);
        out.theta_aux = Some(Series::new(aux.values[start..end].to_vec(), aux.unit.clone()));
    }
    out
}

/// Runs every window in parallel and keeps window order.
///
/// Datasets with fewer than two rows are rejected, since no covariance
/// exists for them. On failure the error of the lowest failing window is
/// returned.
pub fn eddy_covariance_windows(
    dataset: &Dataset,
    units: &UnitMap,
    window_rows: usize,
    settings: &WindowSettings,
) -> FluxResult<FluxTable> {
    if dataset.len() < 2 {
        return Err(MfError::InvalidArg {
            what: format!("at least 2 rows required, dataset has {}", dataset.len()),
        }
        .into());
    }
    let ranges = split_windows(dataset.len(), window_rows);
    info!(windows = ranges.len(), window_rows, "processing windows");

    let results: Vec<MfResult<FluxRow>> = ranges
        .par_iter()
        .map(|range| {
            let window = dataset.slice(range.clone())?;
            let options = window_options(settings.preprocess, range);
            let local = WindowSettings {
                preprocess: &options,
                ..*settings
            };
            process_window(&window, units, &local)
        })
        .collect();

    let mut rows = Vec::with_capacity(results.len());
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(source) => {
                debug!(index, error = %source, "window failed");
                return Err(FluxError::Window { index, source });
            }
        }
    }
    Ok(FluxTable::from_rows(rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn remainder_window_needs_two_rows() {
        assert_eq!(split_windows(10, 4), vec![0..4, 4..8, 8..10]);
        assert_eq!(split_windows(9, 4), vec![0..4, 4..8]);
        assert!(split_windows(1, 4).is_empty());
    }

    proptest! {
        #[test]
        fn windows_are_contiguous(len in 0usize..500, rows in 2usize..50) {
            let windows = split_windows(len, rows);
            let mut start = 0;
            for w in &windows {
                prop_assert_eq!(w.start, start);
                prop_assert!(w.len() >= 2 && w.len() <= rows);
                start = w.end;
            }
            prop_assert!(len - start < 2);
        }
    }
}
