//! Application error types for the editor core and export pipeline.
use thiserror::Error;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Document too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    /// A lazily loaded component (PDF engine, asset source) could not be obtained.
    #[error("Component unavailable: {0}")]
    Unavailable(String),

    #[error("Busy: {0}")]
    Busy(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Internal server error")]
    Internal,
}
