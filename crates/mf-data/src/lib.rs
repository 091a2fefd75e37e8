//! mf-data: datasets, notation and configuration for microflux.
//!
//! Contains:
//! - dataset (ordered columns + column→unit map)
//! - notation (semantic names → column names, solute templates)
//! - site (measurement geometry)
//! - config (YAML analysis configuration)
//! - io (units CSV read/write)

pub mod config;
pub mod dataset;
pub mod error;
pub mod io;
pub mod notation;
pub mod site;

pub use config::{AnalysisConfig, Detrend, FluxOptions, PreprocessOptions, SoluteDef, load_yaml, save_yaml};
pub use dataset::{Dataset, UnitMap};
pub use error::{DataError, DataResult};
pub use io::{CsvConfig, load_units_csv, read_units_csv, save_units_csv, write_units_csv};
pub use notation::{Decoration, Notation, NotationOverrides, SoluteVar, Var};
pub use site::SiteConfig;
