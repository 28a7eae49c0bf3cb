//! API boundary error types.

use thiserror::Error;

/// Transport-level failure talking to the backend. Server-side rejections
/// (401, validation errors, …) are not errors at this level; they come back
/// inside [`crate::ApiResponse`].
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;
