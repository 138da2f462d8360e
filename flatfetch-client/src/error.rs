//! Client error types.

use thiserror::Error;

/// Error type for the request pipeline.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP transport error (timeout, connection failure, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid client configuration; fails fast at construction.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Request could not be assembled into a wire call.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Core model or extraction error.
    #[error("Core error: {0}")]
    Core(#[from] flatfetch_core::CoreError),
}
