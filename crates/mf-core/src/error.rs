use thiserror::Error;

pub type MfResult<T> = Result<T, MfError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MfError {
    #[error("Missing quantity: {}", .names.join(", "))]
    MissingQuantity { names: Vec<String> },

    #[error("Incompatible units: cannot convert '{from}' to '{to}'")]
    IncompatibleUnits { from: String, to: String },

    #[error("Unit mismatch in {what}: '{left}' vs '{right}'")]
    UnitMismatch {
        what: String,
        left: String,
        right: String,
    },

    #[error("Undefined notation: {name}")]
    UndefinedNotation { name: String },

    #[error("Could not parse unit '{input}': {reason}")]
    UnitParse { input: String, reason: String },

    #[error("Configuration error: {what}")]
    Config { what: String },

    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: String, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },
}

impl MfError {
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingQuantity {
            names: vec![name.into()],
        }
    }

    pub fn mismatch(what: impl Into<String>, left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::UnitMismatch {
            what: what.into(),
            left: left.into(),
            right: right.into(),
        }
    }
}
