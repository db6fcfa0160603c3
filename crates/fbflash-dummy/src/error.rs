//! Error types for the dummy backend

use std::io;
use thiserror::Error;

/// Dummy backend errors
#[derive(Debug, Error)]
pub enum DummyError {
    /// Failed to read a board file
    #[error("Failed to read board file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Board file is not valid TOML
    #[error("Invalid board file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Size string could not be parsed
    #[error("Invalid size '{0}'")]
    InvalidSize(String),

    /// Partition geometry is inconsistent
    #[error("Invalid geometry for partition '{name}': {reason}")]
    InvalidGeometry { name: String, reason: &'static str },

    /// Two partitions share a name
    #[error("Duplicate partition name '{0}'")]
    DuplicatePartition(String),

    /// Missing required parameter
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Result type for dummy backend operations
pub type Result<T> = std::result::Result<T, DummyError>;
