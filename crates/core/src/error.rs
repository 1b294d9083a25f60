//! Error types for spillkv
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//! The map contract operations absorb these errors; the `try_*` variants
//! surface them.

use crate::config::ConfigError;
use std::io;
use thiserror::Error;

/// Result type alias for spillkv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for spillkv
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (missing file, permission, short write)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// On-disk content is not a snapshot this build can read
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Configuration rejected at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}
