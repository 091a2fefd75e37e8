use mf_core::{MfError, MfResult, Quantity};
use mf_data::{Dataset, UnitMap};

/// One averaging window's fluxes and scales, in output order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FluxRow {
    entries: Vec<(String, Quantity)>,
}

impl FluxRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: Quantity) {
        self.entries.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Quantity> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, q)| q)
    }

    /// Magnitude of `name` in its row unit.
    pub fn value(&self, name: &str) -> MfResult<f64> {
        self.get(name)
            .map(|q| q.value)
            .ok_or_else(|| MfError::missing(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Quantity)> {
        self.entries.iter().map(|(n, q)| (n.as_str(), q))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn units(&self) -> UnitMap {
        self.entries
            .iter()
            .map(|(n, q)| (n.clone(), q.unit.clone()))
            .collect()
    }
}

/// One row per window; all rows share the column set and units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FluxTable {
    names: Vec<String>,
    units: UnitMap,
    rows: Vec<Vec<f64>>,
}

impl FluxTable {
    pub fn from_rows(rows: Vec<FluxRow>) -> MfResult<Self> {
        let Some(first) = rows.first() else {
            return Ok(Self::default());
        };
        let names: Vec<String> = first.names().map(str::to_string).collect();
        let units = first.units();
        let mut out = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            if row.len() != names.len() || !row.names().zip(&names).all(|(a, b)| a == b) {
                return Err(MfError::InvalidArg {
                    what: format!("window {index} produced a different set of columns"),
                });
            }
            let values = row
                .iter()
                .map(|(name, q)| q.value_in(units.unit(name)?))
                .collect::<MfResult<Vec<f64>>>()?;
            out.push(values);
        }
        Ok(Self {
            names,
            units,
            rows: out,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn units(&self) -> &UnitMap {
        &self.units
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column view for writing with the units CSV writer.
    pub fn to_dataset(&self) -> MfResult<Dataset> {
        let columns: Vec<(String, Vec<f64>)> = self
            .names
            .iter()
            .enumerate()
            .map(|(j, name)| (name.clone(), self.rows.iter().map(|r| r[j]).collect()))
            .collect();
        Dataset::from_columns(columns)
    }
}
