//! Owned working copy of a dataset and its units.

use mf_core::{MfError, MfResult, Quantity, Series, Unit};
use mf_data::{Dataset, UnitMap};

#[derive(Debug, Clone)]
pub(crate) struct Frame {
    pub ds: Dataset,
    pub units: UnitMap,
}

impl Frame {
    pub fn new(ds: &Dataset, units: &UnitMap) -> Self {
        Self {
            ds: ds.clone(),
            units: units.clone(),
        }
    }

    pub fn has(&self, col: &str) -> bool {
        self.ds.contains(col)
    }

    /// Present with a unit.
    pub fn usable(&self, col: &str) -> bool {
        self.ds.contains(col) && self.units.contains(col)
    }

    pub fn series(&self, col: &str) -> MfResult<Series> {
        self.ds.series(&self.units, col)
    }

    pub fn mean(&self, col: &str) -> MfResult<Quantity> {
        self.series(col)?.mean()
    }

    pub fn put(&mut self, col: &str, series: Series) -> MfResult<()> {
        self.ds.insert_series(&mut self.units, col, series)
    }

    /// Convert a present column to `to` unless it is already there.
    pub fn normalize(&mut self, col: &str, to: &Unit) -> MfResult<()> {
        if !self.has(col) {
            return Ok(());
        }
        let series = self.series(col)?;
        if series.unit == *to {
            return Ok(());
        }
        self.put(col, series.convert(to)?)
    }

    /// Names among `cols` lacking a column or a unit.
    pub fn missing<'a>(&self, cols: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        cols.into_iter()
            .filter(|c| !self.usable(c))
            .map(str::to_string)
            .collect()
    }

    pub fn into_parts(self) -> (Dataset, UnitMap) {
        (self.ds, self.units)
    }
}

/// `Ok` when nothing is missing, else one error naming every column.
pub(crate) fn require(mut missing: Vec<String>) -> MfResult<()> {
    if missing.is_empty() {
        return Ok(());
    }
    let mut seen = std::collections::HashSet::new();
    missing.retain(|name| seen.insert(name.clone()));
    Err(MfError::MissingQuantity { names: missing })
}
