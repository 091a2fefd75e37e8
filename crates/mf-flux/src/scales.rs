//! Turbulent scales from covariances.
//!
//! Every scale is checked for finiteness: a zero friction velocity or a
//! vanishing buoyancy flux fails the window instead of emitting inf or NaN.

use mf_constants::{VON_KARMAN, typed};
use mf_core::{MfResult, Quantity, Unit, ensure_finite};
use tracing::warn;

fn finite(q: Quantity, what: &str) -> MfResult<Quantity> {
    ensure_finite(q.value, what)?;
    Ok(q)
}

/// `u* = sqrt(-cov(u', w'))`, in m/s.
///
/// Counter-gradient windows (`cov(u', w') > 0`) use `sqrt(|cov|)`.
pub fn friction_velocity(cov_uw: &Quantity) -> MfResult<Quantity> {
    let magnitude = if cov_uw.value > 0.0 {
        warn!(cov_uw = cov_uw.value, "counter-gradient momentum flux, using |cov(u', w')|");
        cov_uw.clone()
    } else {
        cov_uw.scale(-1.0)
    };
    finite(magnitude.sqrt()?.convert(&Unit::meter_per_second())?, "friction velocity")
}

/// `x* = cov(x', w') / u*`; `what` names the scale in errors.
pub fn scale_of(cov_xw: &Quantity, u_star: &Quantity, what: &str) -> MfResult<Quantity> {
    finite(cov_xw.div(u_star)?, what)
}

/// `L = -u*³ θ̄v / (κ g cov(θv', w'))`, in m.
pub fn obukhov_length(u_star: &Quantity, theta_v_mean: &Quantity, cov_tv_w: &Quantity) -> MfResult<Quantity> {
    let g = Quantity::from_uom(typed::gravity());
    let numerator = u_star.powi(3)?.mul(theta_v_mean)?;
    let denominator = g.mul(cov_tv_w)?.scale(VON_KARMAN);
    let lo = numerator.div(&denominator)?.scale(-1.0).convert(&Unit::meter())?;
    finite(lo, "Obukhov length")
}

/// `ζ = (z - d) / L`
pub fn stability_parameter(effective_height: &Quantity, obukhov: &Quantity) -> MfResult<Quantity> {
    let zeta = effective_height
        .div(obukhov)?
        .convert(&Unit::dimensionless())?;
    finite(zeta, "stability parameter")
}
