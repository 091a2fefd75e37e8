//! Floating-point helpers shared by the flux crates.
//!
//! Turbulence records routinely contain NaN gaps from dropped logger
//! samples; the statistics here skip them instead of propagating them.

use crate::MfError;

/// Scalar type of every column and quantity.
pub type Real = f64;

/// Absolute and relative tolerance used when comparing derived values.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

/// `|a - b| <= abs` or `|a - b| <= rel * max(|a|, |b|)`.
pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// Rejects NaN and infinities in configuration values.
pub fn ensure_finite(v: Real, what: &str) -> Result<Real, MfError> {
    if !v.is_finite() {
        return Err(MfError::NonFinite {
            what: what.to_string(),
            value: v,
        });
    }
    Ok(v)
}

/// Arithmetic mean ignoring NaN samples (datalogger gaps).
///
/// Returns `None` when no finite sample is left.
pub fn nan_mean(values: &[Real]) -> Option<Real> {
    let (sum, n) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0_usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { None } else { Some(sum / n as Real) }
}

/// Sample covariance (n - 1 denominator) over pairwise-complete observations.
pub fn nan_covariance(a: &[Real], b: &[Real]) -> Option<Real> {
    let pairs: Vec<(Real, Real)> = a
        .iter()
        .zip(b)
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(x, y)| (*x, *y))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as Real;
    let mean_a = pairs.iter().map(|p| p.0).sum::<Real>() / n;
    let mean_b = pairs.iter().map(|p| p.1).sum::<Real>() / n;
    let sum: Real = pairs
        .iter()
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum();
    Some(sum / (n - 1.0))
}
