//! Shared session slots.

use auth_api::User;
use auth_machines::AuthFlowHooks;
use std::sync::Mutex;
use tracing::debug;

/// The authenticated user and the current auth error, shared between the
/// stores and wired into the auth flow machine as its side-effect hooks.
#[derive(Default)]
pub struct Session {
    user: Mutex<Option<User>>,
    auth_error: Mutex<Option<String>>,
}

impl Session {
    pub fn user(&self) -> Option<User> {
        self.user.lock().unwrap().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.lock().unwrap().is_some()
    }

    /// Message identifier of the last recorded auth error, if any.
    pub fn auth_error(&self) -> Option<String> {
        self.auth_error.lock().unwrap().clone()
    }

    pub(crate) fn set_user(&self, user: Option<User>) {
        *self.user.lock().unwrap() = user;
    }

    pub(crate) fn set_auth_error(&self, message: impl Into<String>) {
        *self.auth_error.lock().unwrap() = Some(message.into());
    }
}

impl AuthFlowHooks for Session {
    fn clear_auth_error(&self) {
        self.auth_error.lock().unwrap().take();
    }

    fn session_logout(&self) {
        debug!("dropping persisted user");
        self.user.lock().unwrap().take();
    }
}
