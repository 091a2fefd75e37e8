//! Sample covariance matrix with per-entry units.

use mf_core::{MfError, MfResult, Quantity, Unit, nan_covariance};
use mf_data::{Dataset, UnitMap};
use nalgebra::DMatrix;

/// Symmetric covariance matrix over named columns.
///
/// Entries use the `n - 1` denominator. Rows where either column is NaN
/// are dropped pairwise. The unit of entry `(i, j)` is the product of the
/// two column units, so offset units (°C) cannot take part.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceMatrix {
    names: Vec<String>,
    units: Vec<Unit>,
    values: DMatrix<f64>,
}

impl CovarianceMatrix {
    pub fn from_columns(dataset: &Dataset, units: &UnitMap, names: &[String]) -> MfResult<Self> {
        let mut col_units = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match (dataset.column(name), units.get(name)) {
                (Some(_), Some(u)) => col_units.push(u.clone()),
                _ => missing.push(name.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(MfError::MissingQuantity { names: missing });
        }

        let k = names.len();
        for i in 0..k {
            for j in i..k {
                // rejects offset units
                col_units[i].mul(&col_units[j]).map_err(|_| {
                    MfError::mismatch(
                        format!("covariance of '{}' and '{}'", names[i], names[j]),
                        col_units[i].symbol(),
                        col_units[j].symbol(),
                    )
                })?;
            }
        }

        let columns: Vec<&[f64]> = names
            .iter()
            .filter_map(|n| dataset.column(n))
            .collect();
        let values = if columns.iter().any(|c| c.iter().any(|v| v.is_nan())) {
            pairwise(&columns)?
        } else {
            centered_product(&columns, dataset.len())?
        };

        Ok(Self {
            names: names.to_vec(),
            units: col_units,
            values,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index(name).is_some()
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn indices(&self, a: &str, b: &str) -> MfResult<(usize, usize)> {
        let missing: Vec<String> = [a, b]
            .iter()
            .filter(|n| self.index(n).is_none())
            .map(|n| n.to_string())
            .collect();
        match (self.index(a), self.index(b)) {
            (Some(i), Some(j)) => Ok((i, j)),
            _ => Err(MfError::MissingQuantity { names: missing }),
        }
    }

    pub fn entry_unit(&self, a: &str, b: &str) -> MfResult<Unit> {
        let (i, j) = self.indices(a, b)?;
        self.units[i].mul(&self.units[j])
    }

    pub fn get(&self, a: &str, b: &str) -> MfResult<Quantity> {
        let (i, j) = self.indices(a, b)?;
        Ok(Quantity::new(self.values[(i, j)], self.units[i].mul(&self.units[j])?))
    }

    /// Overwrite a symmetric pair of entries; `value` is converted to the entry unit.
    pub fn set(&mut self, a: &str, b: &str, value: &Quantity) -> MfResult<()> {
        let (i, j) = self.indices(a, b)?;
        let unit = self.units[i].mul(&self.units[j])?;
        let v = value.value_in(&unit)?;
        self.values[(i, j)] = v;
        self.values[(j, i)] = v;
        Ok(())
    }
}

fn too_short() -> MfError {
    MfError::InvalidArg {
        what: "covariance needs at least two complete samples".into(),
    }
}

/// `Xcᵀ Xc / (n - 1)` for NaN-free columns.
fn centered_product(columns: &[&[f64]], n: usize) -> MfResult<DMatrix<f64>> {
    if n < 2 {
        return Err(too_short());
    }
    let k = columns.len();
    let mut centered = DMatrix::<f64>::zeros(n, k);
    for (j, col) in columns.iter().enumerate() {
        let mean = col.iter().sum::<f64>() / n as f64;
        for (i, v) in col.iter().enumerate() {
            centered[(i, j)] = v - mean;
        }
    }
    Ok(centered.transpose() * &centered / (n as f64 - 1.0))
}

fn pairwise(columns: &[&[f64]]) -> MfResult<DMatrix<f64>> {
    let k = columns.len();
    let mut out = DMatrix::<f64>::zeros(k, k);
    for i in 0..k {
        for j in i..k {
            let c = nan_covariance(columns[i], columns[j]).ok_or_else(too_short)?;
            out[(i, j)] = c;
            out[(j, i)] = c;
        }
    }
    Ok(out)
}
