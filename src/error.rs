//! Error handling and custom error types
//!
//! Provides unified error handling across the service using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote media store could not complete the call.
    #[error("Media store error: {0}")]
    Storage(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Rejected input, raised before any remote call is made.
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
