//! Client-side boundary to the authentication backend.
//!
//! The backend wraps every payload in a `{status, data}` / `{status, error}`
//! envelope; this crate flattens that into [`ApiResponse`], which carries
//! the HTTP status, the envelope discriminator, and either the typed
//! payload or the error details. Transport and decoding failures are
//! `Err(ApiError)`; anything the server actually answered is `Ok`.
//!
//! [`AuthApi`] is the seam the store layer consumes; [`HttpAuthApi`] is the
//! reqwest-backed implementation.

mod api;
mod error;
mod http;
mod types;

pub use api::AuthApi;
pub use error::{ApiError, ApiResult};
pub use http::HttpAuthApi;
pub use types::*;
