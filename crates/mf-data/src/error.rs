use mf_core::MfError;

pub type DataResult<T> = Result<T, DataError>;

#[derive(thiserror::Error, Debug)]
pub enum DataError {
    #[error(transparent)]
    Core(#[from] MfError),

    #[error("CSV layout error at line {line}: {what}")]
    Csv { line: u64, what: String },

    #[error("CSV error: {0}")]
    CsvFormat(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
