//! Error type of the command-line front end.

use std::path::PathBuf;

use mf_core::MfError;
use mf_data::DataError;
use mf_flux::FluxError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Data(#[from] DataError),

    #[error("{0}")]
    Flux(#[from] FluxError),

    #[error("{0}")]
    Core(#[from] MfError),

    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        source: DataError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CliResult<T> = Result<T, CliError>;
