use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArboristError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Insufficient supply: {required}l required, {available}l available")]
    InsufficientSupply { required: f64, available: f64 },
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}
