//! Store layer sitting between the UI and the backend.
//!
//! The stores own the flow machines and drive them with events around
//! every network call: `LOADING` before the request goes out, `IDLE` on
//! every exit path, and a flow event only when the server actually said
//! yes. Failed verifications record an error message identifier in the
//! shared [`Session`] and leave the flow where it was.
//!
//! [`AuthStore`] covers login, signup, second factors, password reset and
//! session restore; [`SecurityStore`] covers the in-account security
//! flows (account deletion, TOTP configuration, TOTP disable/regenerate,
//! email update).

mod auth;
pub mod messages;
mod security;
mod session;

#[cfg(test)]
mod mock;

pub use auth::{AuthStore, SecondFactorKind, DEFAULT_MIN_EXEC_TIME};
pub use security::{SecurityStore, TotpSecret};
pub use session::Session;
