//! Error types for flux analysis.

use mf_core::MfError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluxError {
    #[error(transparent)]
    Core(#[from] MfError),

    #[error("Window {index} failed: {source}")]
    Window { index: usize, source: MfError },
}

pub type FluxResult<T> = Result<T, FluxError>;

impl FluxError {
    /// The underlying quantity or unit error.
    pub fn core(&self) -> &MfError {
        match self {
            FluxError::Core(e) | FluxError::Window { source: e, .. } => e,
        }
    }
}
