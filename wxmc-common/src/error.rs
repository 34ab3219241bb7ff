//! Common error types for WXMC

use thiserror::Error;

use crate::dataset::DatasetError;
use crate::markov::ForecastError;

/// Common result type for WXMC operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the WXMC crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored JSON column could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transition model construction or prediction error
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    /// Uploaded dataset could not be read
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource already exists (e.g. duplicate email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing, unknown or expired credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
