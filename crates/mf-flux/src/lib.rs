//! mf-flux: derived quantities and eddy-covariance fluxes for microflux.
//!
//! Contains:
//! - preprocess (moist/dry air densities, humidity, mixing ratios)
//! - fluctuations (detrending, `x'` columns)
//! - rotation (double rotation of the wind)
//! - covariance, wpl, scales, eddy (flux engine)
//! - windows, pipeline (per-window batch over a dataset)

pub mod covariance;
pub mod eddy;
pub mod error;
pub mod fluctuations;
mod frame;
pub mod pipeline;
pub mod preprocess;
pub mod rotation;
pub mod scales;
pub mod table;
pub mod windows;
pub mod wpl;

pub use covariance::CovarianceMatrix;
pub use eddy::eddy_covariance;
pub use error::{FluxError, FluxResult};
pub use fluctuations::{add_fluctuations, default_fluctuation_columns, trend};
pub use pipeline::Analysis;
pub use preprocess::preprocess;
pub use rotation::{RotationAngles, rotate_wind};
pub use table::{FluxRow, FluxTable};
pub use windows::{WindowSettings, eddy_covariance_windows, process_window, split_windows};
pub use wpl::WplTerms;
