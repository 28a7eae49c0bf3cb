//! Message identifiers recorded in the error slots.
//!
//! These are not user-facing strings; the UI resolves them through its
//! localization catalog.

pub const NETWORK_ERROR: &str = "auth.networkError";
pub const INVALID_CREDENTIALS: &str = "auth.login.form.validation.invalidCreds";
pub const CONFLICTING_CREDENTIALS: &str = "auth.signup.form.validation.conflictingCreds";
pub const PASSWORD_VERIFY_ERROR: &str = "account.security.passwordVerifyForm.validation.passwordError";
