//! Column tables and their unit side table.

use std::collections::BTreeMap;
use std::ops::Range;

use mf_core::{MfError, MfResult, Series, Unit};

/// Ordered named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<(String, Vec<f64>)>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<f64>)>) -> MfResult<Self> {
        let mut ds = Self::new();
        for (name, values) in columns {
            ds.insert(name, values)?;
        }
        Ok(ds)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |(_, v)| v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Add a column, or replace one with the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> MfResult<()> {
        let name = name.into();
        if !self.columns.is_empty() && values.len() != self.len() {
            return Err(MfError::InvalidArg {
                what: format!(
                    "column '{name}' has {} rows, dataset has {}",
                    values.len(),
                    self.len()
                ),
            });
        }
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = values,
            None => self.columns.push((name, values)),
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|(n, _)| n == name)?;
        Some(self.columns.remove(idx).1)
    }

    /// Rows `range` of every column.
    pub fn slice(&self, range: Range<usize>) -> MfResult<Dataset> {
        if range.start > range.end || range.end > self.len() {
            return Err(MfError::InvalidArg {
                what: format!("row range {range:?} outside 0..{}", self.len()),
            });
        }
        Ok(Dataset {
            columns: self
                .columns
                .iter()
                .map(|(n, v)| (n.clone(), v[range.clone()].to_vec()))
                .collect(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// A column together with its unit.
    pub fn series(&self, units: &UnitMap, name: &str) -> MfResult<Series> {
        let values = self.column(name).ok_or_else(|| MfError::missing(name))?;
        let unit = units.unit(name)?;
        Ok(Series::new(values.to_vec(), unit.clone()))
    }

    /// Store a series under `name`, recording its unit.
    pub fn insert_series(&mut self, units: &mut UnitMap, name: &str, series: Series) -> MfResult<()> {
        self.insert(name, series.values)?;
        units.insert(name, series.unit);
        Ok(())
    }
}

/// Column name to unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitMap(BTreeMap<String, Unit>);

impl UnitMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Unit> {
        self.0.get(name)
    }

    /// The unit of `name`; a column without one is a missing quantity.
    pub fn unit(&self, name: &str) -> MfResult<&Unit> {
        self.0.get(name).ok_or_else(|| MfError::missing(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, unit: Unit) -> Option<Unit> {
        self.0.insert(name.into(), unit)
    }

    pub fn remove(&mut self, name: &str) -> Option<Unit> {
        self.0.remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Unit)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse `(column, unit expression)` pairs.
    pub fn parse_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> MfResult<Self> {
        let mut map = Self::new();
        for (name, unit) in pairs {
            map.insert(name, Unit::parse(unit)?);
        }
        Ok(map)
    }
}

impl FromIterator<(String, Unit)> for UnitMap {
    fn from_iter<T: IntoIterator<Item = (String, Unit)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_and_checks_length() {
        let mut ds = Dataset::from_columns(vec![("u", vec![1.0, 2.0]), ("w", vec![0.1, 0.2])]).unwrap();
        assert_eq!(ds.len(), 2);
        ds.insert("u", vec![3.0, 4.0]).unwrap();
        assert_eq!(ds.column("u"), Some(&[3.0, 4.0][..]));
        assert_eq!(ds.names().collect::<Vec<_>>(), ["u", "w"]);
        assert!(ds.insert("v", vec![1.0]).is_err());
    }

    #[test]
    fn series_requires_column_and_unit() {
        let ds = Dataset::from_columns(vec![("u", vec![1.0]), ("w", vec![0.0])]).unwrap();
        let units = UnitMap::parse_pairs([("u", "m/s")]).unwrap();
        assert!(ds.series(&units, "u").is_ok());
        assert_eq!(
            ds.series(&units, "w").unwrap_err(),
            MfError::missing("w")
        );
        assert_eq!(
            ds.series(&units, "p").unwrap_err(),
            MfError::missing("p")
        );
    }

    #[test]
    fn slice_takes_rows() {
        let ds = Dataset::from_columns(vec![("x", (0..10).map(f64::from).collect())]).unwrap();
        let part = ds.slice(2..5).unwrap();
        assert_eq!(part.column("x"), Some(&[2.0, 3.0, 4.0][..]));
        assert!(ds.slice(8..12).is_err());
    }
}
