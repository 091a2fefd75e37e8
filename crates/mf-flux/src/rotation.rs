//! Double rotation of the sonic wind components.
//!
//! The first rotation turns the horizontal axes about `w` so that the mean
//! `v` vanishes; the second tilts about the new `v` axis so that the mean
//! `w` vanishes as well.

use mf_core::{MfError, MfResult, nan_mean};
use mf_data::{Dataset, Notation, UnitMap, Var};
use nalgebra::{Rotation3, Vector3};
use tracing::debug;

use crate::frame::{Frame, require};

/// Angles applied by [`rotate_wind`], in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationAngles {
    /// Yaw about the vertical axis.
    pub alpha: f64,
    /// Pitch about the rotated cross-wind axis.
    pub beta: f64,
}

pub fn rotate_wind(
    dataset: &Dataset,
    units: &UnitMap,
    notation: &Notation,
) -> MfResult<(Dataset, UnitMap, RotationAngles)> {
    let mut f = Frame::new(dataset, units);
    let (u, v, w) = (notation.var(Var::U), notation.var(Var::V), notation.var(Var::W));
    require(f.missing([u, v, w]))?;

    let unit = f.units.unit(u)?.clone();
    f.normalize(v, &unit)?;
    f.normalize(w, &unit)?;

    let column = |name: &str| f.ds.column(name).ok_or_else(|| MfError::missing(name));
    let (us, vs, ws) = (column(u)?, column(v)?, column(w)?);
    let mean = |xs: &[f64]| nan_mean(xs).unwrap_or(0.0);

    let alpha = mean(vs).atan2(mean(us));
    let yaw = Rotation3::from_axis_angle(&Vector3::z_axis(), -alpha);
    let u1: Vec<f64> = us
        .iter()
        .zip(vs)
        .map(|(a, b)| (yaw * Vector3::new(*a, *b, 0.0)).x)
        .collect();
    let beta = mean(ws).atan2(mean(&u1));
    let r = Rotation3::from_axis_angle(&Vector3::y_axis(), beta) * yaw;
    debug!(alpha, beta, "wind rotation angles");

    let mut out = (Vec::with_capacity(us.len()), Vec::with_capacity(us.len()), Vec::with_capacity(us.len()));
    for ((a, b), c) in us.iter().zip(vs).zip(ws) {
        let rotated = r * Vector3::new(*a, *b, *c);
        out.0.push(rotated.x);
        out.1.push(rotated.y);
        out.2.push(rotated.z);
    }

    f.ds.insert(u, out.0)?;
    f.ds.insert(v, out.1)?;
    f.ds.insert(w, out.2)?;
    let (ds, units) = f.into_parts();
    Ok((ds, units, RotationAngles { alpha, beta }))
}
