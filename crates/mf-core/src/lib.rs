//! mf-core: stable foundation for microflux.
//!
//! Contains:
//! - units (runtime dimensions, scales and offsets + unit-expression parser)
//! - quantity (scalar `Quantity` and column `Series` with unit-checked arithmetic)
//! - numeric (Real + tolerances + NaN-aware statistics)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod quantity;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{MfError, MfResult};
pub use numeric::*;
pub use quantity::{Quantity, Series};
pub use units::{Dimension, Unit};
