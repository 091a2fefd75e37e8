//! mf-constants: physical constants for micrometeorology.
//!
//! Provides:
//! - Species with tabulated molar masses
//! - A process-wide named constants table ([`constants`])
//! - Typed `uom` accessors ([`typed`])
//! - Solutes (tabulated or custom) for per-gas flux columns

pub mod solute;
pub mod species;
pub mod table;
pub mod typed;

pub use solute::Solute;
pub use species::Species;
pub use table::{ConstantsTable, VON_KARMAN, constants, latent_heat_water};
