//! Common error types for MLF

use thiserror::Error;

/// Common result type for MLF operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the local predictors
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML configuration could not be parsed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Resource JSON could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input key matches no field name or id
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Input value cannot be coerced to the field's type
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Numeric field missing while missing numerics are not allowed
    #[error("Missing value for numeric field: {0}")]
    MissingNumeric(String),
}
