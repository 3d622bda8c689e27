//! Common error types for viewcast

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for viewcast operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the prediction pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Duration token does not follow the ISO-8601 duration grammar
    #[error("Malformed duration: {0}")]
    MalformedDuration(String),

    /// Model artifact file does not exist
    #[error("Model artifact not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// Model artifact exists but could not be read or is structurally invalid
    #[error("Model artifact is corrupt: {0}")]
    ModelCorrupt(String),

    /// Required columns absent from an uploaded table
    #[error("Missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// Missing or unusable values in required columns
    #[error("Data quality error: {}", .issues.join("; "))]
    DataQuality { issues: Vec<String> },

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// URL or string yields no usable video identifier
    #[error("Malformed video identifier: {0}")]
    MalformedIdentifier(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Delimited text parse/write error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
