//! Error types

use thiserror::Error;

/// Main error type for ReCaatinga
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn db(e: impl std::fmt::Display) -> Self {
        Error::Database(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
