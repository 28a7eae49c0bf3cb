//! The authentication store.

use crate::messages;
use crate::session::Session;
use auth_api::{
    ApiErrorDetails, AuthApi, ChangePasswordBody, Credentials, PasswordResetBody, Platform,
    ResponseStatus, SendPasswordResetBody, SignupBody, UpdateUserBody, User, VerifyEmailBody,
};
use auth_machines::{AuthFlowDefinition, AuthFlowEvent, AuthFlowMachine, Navigator};
use flow_machine::Machine;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Floor on how long a form submission appears to take, so fast responses
/// do not make the loading state flicker.
pub const DEFAULT_MIN_EXEC_TIME: Duration = Duration::from_millis(1000);

/// Which second factor the login response asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondFactorKind {
    /// Authenticator app code.
    Totp,
    /// Code sent by email.
    Email,
}

/// Drives the auth flow machine around the backend calls.
///
/// Every operation returns whether the flow advanced; failure details land
/// in the shared [`Session`] error slot as message identifiers.
pub struct AuthStore<A: AuthApi> {
    api: Arc<A>,
    machine: AuthFlowMachine,
    session: Arc<Session>,
    /// Token from a successful password check, consumed by the second
    /// factor verification call.
    short_ttl_token: Mutex<Option<String>>,
    second_factor: Mutex<Option<SecondFactorKind>>,
    remaining_recovery_codes: Mutex<Option<u32>>,
    min_exec_time: Duration,
}

impl<A: AuthApi> AuthStore<A> {
    pub fn new(api: Arc<A>, navigator: Arc<dyn Navigator>) -> Self {
        Self::with_min_exec_time(api, navigator, DEFAULT_MIN_EXEC_TIME)
    }

    pub fn with_min_exec_time(
        api: Arc<A>,
        navigator: Arc<dyn Navigator>,
        min_exec_time: Duration,
    ) -> Self {
        let session = Arc::new(Session::default());
        let definition = AuthFlowDefinition::new(navigator, session.clone());
        Self {
            api,
            machine: Machine::new(definition),
            session,
            short_ttl_token: Mutex::new(None),
            second_factor: Mutex::new(None),
            remaining_recovery_codes: Mutex::new(None),
            min_exec_time,
        }
    }

    pub fn machine(&self) -> &AuthFlowMachine {
        &self.machine
    }

    pub fn session(&self) -> Arc<Session> {
        self.session.clone()
    }

    pub fn second_factor(&self) -> Option<SecondFactorKind> {
        *self.second_factor.lock().unwrap()
    }

    /// Unused recovery codes left after a recovery-code login.
    pub fn remaining_recovery_codes(&self) -> Option<u32> {
        *self.remaining_recovery_codes.lock().unwrap()
    }

    /// Check the credentials and move to the second factor the server
    /// asked for. The session cookie is not established yet; only the
    /// short-TTL token comes back here.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        let started = Instant::now();
        self.machine.send(&AuthFlowEvent::Loading);

        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let advanced = match self.api.login(&credentials).await {
            Ok(response) if response.ok() => {
                let outcome = response.outcome;
                if let Some(data) = response.data {
                    *self.short_ttl_token.lock().unwrap() = Some(data.token);
                }
                match outcome {
                    Some(ResponseStatus::TotpVerify) => {
                        *self.second_factor.lock().unwrap() = Some(SecondFactorKind::Totp);
                        self.machine.send(&AuthFlowEvent::TwoFaTotp);
                        true
                    }
                    Some(ResponseStatus::EmailVerify) => {
                        *self.second_factor.lock().unwrap() = Some(SecondFactorKind::Email);
                        self.machine.send(&AuthFlowEvent::EmailTotp);
                        true
                    }
                    _ => {
                        warn!(outcome = ?outcome, "unexpected login outcome");
                        self.session.set_auth_error(messages::NETWORK_ERROR);
                        false
                    }
                }
            }
            Ok(response) if response.is_unauthorized() => {
                debug!("login rejected: invalid credentials");
                self.session.set_auth_error(messages::INVALID_CREDENTIALS);
                false
            }
            Ok(response) => {
                self.record_api_error(response.error.as_ref());
                false
            }
            Err(error) => {
                warn!(error = %error, "login request failed");
                self.session.set_auth_error(messages::NETWORK_ERROR);
                false
            }
        };

        self.pad(started).await;
        self.machine.send(&AuthFlowEvent::Idle);
        advanced
    }

    pub async fn sign_up(&self, email: &str, password: &str, platform: Platform) -> bool {
        let started = Instant::now();
        self.machine.send(&AuthFlowEvent::Loading);

        let body = SignupBody {
            email: email.to_string(),
            password: password.to_string(),
            platform,
        };
        let advanced = match self.api.signup(&body).await {
            Ok(response) if response.ok() => {
                info!("signup accepted, awaiting email verification");
                self.machine.send(&AuthFlowEvent::VerifyEmail);
                true
            }
            Ok(response) if response.is_conflict() => {
                debug!("signup rejected: email already registered");
                self.session.set_auth_error(messages::CONFLICTING_CREDENTIALS);
                false
            }
            Ok(response) => {
                self.record_api_error(response.error.as_ref());
                false
            }
            Err(error) => {
                warn!(error = %error, "signup request failed");
                self.session.set_auth_error(messages::NETWORK_ERROR);
                false
            }
        };

        self.pad(started).await;
        self.machine.send(&AuthFlowEvent::Idle);
        advanced
    }

    /// Verify the authenticator-app code. On success the server sets the
    /// session cookie and the flow reaches `authenticated`.
    pub async fn verify_totp(&self, code: &str) -> bool {
        let Some(token) = self.short_ttl_token() else {
            warn!("TOTP verification without a pending login");
            return false;
        };

        let started = Instant::now();
        self.machine.send(&AuthFlowEvent::Loading);

        let advanced = match self.api.verify_totp(code, &token).await {
            Ok(response) if response.ok() => match response.data {
                Some(data) => {
                    self.finish_authentication(data.user).await;
                    true
                }
                None => false,
            },
            Ok(response) => {
                self.record_api_error(response.error.as_ref());
                false
            }
            Err(error) => {
                warn!(error = %error, "TOTP verification request failed");
                self.session.set_auth_error(messages::NETWORK_ERROR);
                false
            }
        };

        self.pad(started).await;
        self.machine.send(&AuthFlowEvent::Idle);
        advanced
    }

    /// Verify the emailed code; same contract as [`verify_totp`].
    ///
    /// [`verify_totp`]: Self::verify_totp
    pub async fn verify_totp_email(&self, code: &str) -> bool {
        let Some(token) = self.short_ttl_token() else {
            warn!("email code verification without a pending login");
            return false;
        };

        let started = Instant::now();
        self.machine.send(&AuthFlowEvent::Loading);

        let advanced = match self.api.verify_totp_email(code, &token).await {
            Ok(response) if response.ok() => match response.data {
                Some(data) => {
                    self.finish_authentication(data.user).await;
                    true
                }
                None => false,
            },
            Ok(response) => {
                self.record_api_error(response.error.as_ref());
                false
            }
            Err(error) => {
                warn!(error = %error, "email code verification request failed");
                self.session.set_auth_error(messages::NETWORK_ERROR);
                false
            }
        };

        self.pad(started).await;
        self.machine.send(&AuthFlowEvent::Idle);
        advanced
    }

    /// Log in with a recovery code instead of the second factor. The
    /// response message carries the number of unused codes left.
    pub async fn verify_recovery_code(&self, code: &str) -> bool {
        let Some(token) = self.short_ttl_token() else {
            warn!("recovery code verification without a pending login");
            return false;
        };

        let started = Instant::now();
        self.machine.send(&AuthFlowEvent::Loading);

        let advanced = match self.api.verify_recovery_code(code, &token).await {
            Ok(response) if response.ok() => match response.data {
                Some(data) => {
                    let remaining = data.message.trim().parse::<u32>().ok();
                    if remaining.is_none() {
                        warn!(message = %data.message, "unparseable remaining code count");
                    }
                    *self.remaining_recovery_codes.lock().unwrap() = remaining;
                    self.finish_authentication(data.user).await;
                    true
                }
                None => false,
            },
            Ok(response) => {
                self.record_api_error(response.error.as_ref());
                false
            }
            Err(error) => {
                warn!(error = %error, "recovery code request failed");
                self.session.set_auth_error(messages::NETWORK_ERROR);
                false
            }
        };

        self.pad(started).await;
        self.machine.send(&AuthFlowEvent::Idle);
        advanced
    }

    pub async fn send_password_reset(&self, email: &str, platform: Platform) -> bool {
        let started = Instant::now();
        self.machine.send(&AuthFlowEvent::Loading);

        let body = SendPasswordResetBody {
            email: email.to_string(),
            platform,
        };
        let sent = match self.api.send_password_reset(&body).await {
            Ok(response) if response.ok() => true,
            Ok(response) => {
                self.record_api_error(response.error.as_ref());
                false
            }
            Err(error) => {
                warn!(error = %error, "password reset email request failed");
                self.session.set_auth_error(messages::NETWORK_ERROR);
                false
            }
        };

        self.pad(started).await;
        self.machine.send(&AuthFlowEvent::Idle);
        sent
    }

    /// Consume the emailed reset token and return to the login screen.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> bool {
        let started = Instant::now();
        self.machine.send(&AuthFlowEvent::Loading);

        let body = PasswordResetBody {
            token: token.to_string(),
            new_password: new_password.to_string(),
        };
        let advanced = match self.api.reset_password(&body).await {
            Ok(response) if response.ok() => {
                info!("password reset completed");
                self.machine.send(&AuthFlowEvent::Login);
                true
            }
            Ok(response) => {
                self.record_api_error(response.error.as_ref());
                false
            }
            Err(error) => {
                warn!(error = %error, "password reset request failed");
                self.session.set_auth_error(messages::NETWORK_ERROR);
                false
            }
        };

        self.pad(started).await;
        self.machine.send(&AuthFlowEvent::Idle);
        advanced
    }

    /// Consume the email verification token from the deep link. The
    /// verification also establishes a session, so on success the user is
    /// fetched and the flow reaches `authenticated`.
    pub async fn verify_email(&self, token: &str) -> bool {
        let started = Instant::now();
        self.machine.send(&AuthFlowEvent::Loading);

        let body = VerifyEmailBody {
            token: token.to_string(),
        };
        let advanced = match self.api.verify_email(&body).await {
            Ok(response) if response.ok() => {
                match self.api.me().await {
                    Ok(me) if me.ok() => {
                        if let Some(user) = me.data {
                            self.finish_authentication(user).await;
                        }
                    }
                    Ok(_) => debug!("email verified but no session established"),
                    Err(error) => warn!(error = %error, "user fetch after verification failed"),
                }
                true
            }
            Ok(response) => {
                self.record_api_error(response.error.as_ref());
                false
            }
            Err(error) => {
                warn!(error = %error, "email verification request failed");
                self.session.set_auth_error(messages::NETWORK_ERROR);
                false
            }
        };

        self.pad(started).await;
        self.machine.send(&AuthFlowEvent::Idle);
        advanced
    }

    pub async fn resend_email_verification(&self, email: &str) -> bool {
        let started = Instant::now();
        self.machine.send(&AuthFlowEvent::Loading);

        let sent = match self.api.resend_email_verification(email).await {
            Ok(response) if response.ok() => true,
            Ok(response) => {
                self.record_api_error(response.error.as_ref());
                false
            }
            Err(error) => {
                warn!(error = %error, "resend verification request failed");
                self.session.set_auth_error(messages::NETWORK_ERROR);
                false
            }
        };

        self.pad(started).await;
        self.machine.send(&AuthFlowEvent::Idle);
        sent
    }

    /// Try to resume an existing session cookie at startup. No loading
    /// toggle here; nothing user-initiated is in flight.
    pub async fn restore_session(&self) -> bool {
        match self.api.me().await {
            Ok(response) if response.ok() => match response.data {
                Some(mut user) => {
                    self.refresh_csrf_token().await;
                    self.resolve_profile_picture(&mut user).await;
                    info!(user_id = %user.id, "session restored");
                    self.session.set_user(Some(user));
                    self.machine.send(&AuthFlowEvent::RestoreSession);
                    true
                }
                None => false,
            },
            Ok(_) => {
                debug!("no session to restore");
                false
            }
            Err(error) => {
                warn!(error = %error, "session restore request failed");
                false
            }
        }
    }

    /// End the session. Local state is dropped even when the server call
    /// fails; the cookie may already be gone.
    pub async fn logout(&self) -> bool {
        let result = self.api.logout().await;
        if let Err(error) = &result {
            warn!(error = %error, "logout request failed");
        }
        self.api.set_csrf_token(None);
        self.machine.send(&AuthFlowEvent::Logout);
        matches!(result, Ok(response) if response.ok())
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> bool {
        let started = Instant::now();
        self.machine.send(&AuthFlowEvent::Loading);

        let body = ChangePasswordBody {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        let changed = match self.api.change_password(&body).await {
            Ok(response) if response.ok() => true,
            Ok(response) if response.is_unauthorized() => {
                self.session.set_auth_error(messages::PASSWORD_VERIFY_ERROR);
                false
            }
            Ok(response) => {
                self.record_api_error(response.error.as_ref());
                false
            }
            Err(error) => {
                warn!(error = %error, "change password request failed");
                self.session.set_auth_error(messages::NETWORK_ERROR);
                false
            }
        };

        self.pad(started).await;
        self.machine.send(&AuthFlowEvent::Idle);
        changed
    }

    pub async fn update_profile(&self, body: UpdateUserBody) -> bool {
        let started = Instant::now();
        self.machine.send(&AuthFlowEvent::Loading);

        let updated = match self.api.update_profile(&body).await {
            Ok(response) if response.ok() => {
                if let Some(mut user) = response.data {
                    self.resolve_profile_picture(&mut user).await;
                    self.session.set_user(Some(user));
                }
                true
            }
            Ok(response) => {
                self.record_api_error(response.error.as_ref());
                false
            }
            Err(error) => {
                warn!(error = %error, "profile update request failed");
                self.session.set_auth_error(messages::NETWORK_ERROR);
                false
            }
        };

        self.pad(started).await;
        self.machine.send(&AuthFlowEvent::Idle);
        updated
    }

    /// Post-verification bookkeeping shared by all authentication paths:
    /// CSRF token, profile picture URL, user slot, then the flow event.
    async fn finish_authentication(&self, mut user: User) {
        self.refresh_csrf_token().await;
        self.resolve_profile_picture(&mut user).await;

        self.short_ttl_token.lock().unwrap().take();
        self.second_factor.lock().unwrap().take();

        info!(user_id = %user.id, "authentication completed");
        self.session.set_user(Some(user));
        self.machine.send(&AuthFlowEvent::authenticated(None));
    }

    async fn refresh_csrf_token(&self) {
        match self.api.get_csrf_token().await {
            Ok(response) => {
                if let Some(data) = response.data {
                    self.api.set_csrf_token(Some(data.token));
                }
            }
            Err(error) => warn!(error = %error, "CSRF token fetch failed"),
        }
    }

    /// Swap the stored profile picture filename for a fetchable URL.
    async fn resolve_profile_picture(&self, user: &mut User) {
        let Some(filename) = user.profile_picture.clone() else {
            return;
        };
        match self.api.get_user_file(&filename).await {
            Ok(response) => {
                if let Some(data) = response.data {
                    user.profile_picture = Some(data.url);
                }
            }
            Err(error) => warn!(error = %error, "profile picture fetch failed"),
        }
    }

    fn short_ttl_token(&self) -> Option<String> {
        self.short_ttl_token.lock().unwrap().clone()
    }

    fn record_api_error(&self, error: Option<&ApiErrorDetails>) {
        match error {
            Some(details) => {
                warn!(code = details.code, message = %details.message, "request rejected");
                self.session.set_auth_error(details.message.clone());
            }
            None => self.session.set_auth_error(messages::NETWORK_ERROR),
        }
    }

    async fn pad(&self, started: Instant) {
        let elapsed = started.elapsed();
        if elapsed < self.min_exec_time {
            sleep(self.min_exec_time - elapsed).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{rejected, sample_user, success, MockApi, RecordingNavigator, Scripted};
    use auth_api::{
        AuthenticationResponse, BasicResponse, GetCsrfTokenResponse, GetUserFileResponse,
        LoginResponse, SignupResponse, VerifyRecoveryCodeResponse,
    };
    use auth_machines::AuthFlowState;
    use flow_machine::FormState;

    fn store() -> (AuthStore<MockApi>, Arc<MockApi>, Arc<RecordingNavigator>) {
        let api = Arc::new(MockApi::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let store =
            AuthStore::with_min_exec_time(api.clone(), navigator.clone(), Duration::ZERO);
        (store, api, navigator)
    }

    fn script_login(api: &MockApi, outcome: ResponseStatus) {
        api.login.lock().unwrap().push_back(success(
            outcome,
            LoginResponse {
                message: "verify".into(),
                token: "short-ttl".into(),
            },
        ));
    }

    fn script_csrf(api: &MockApi) {
        api.get_csrf_token.lock().unwrap().push_back(success(
            ResponseStatus::Success,
            GetCsrfTokenResponse {
                token: "csrf-1".into(),
            },
        ));
    }

    #[tokio::test]
    async fn login_moves_to_app_totp() {
        let (store, api, _) = store();
        script_login(&api, ResponseStatus::TotpVerify);

        assert!(store.login("a@b.c", "pw").await);

        let snap = store.machine().snapshot();
        assert_eq!(snap.flow, AuthFlowState::TwoFaTotp);
        assert_eq!(snap.form, FormState::Idle);
        assert_eq!(store.second_factor(), Some(SecondFactorKind::Totp));
    }

    #[tokio::test]
    async fn login_moves_to_email_totp() {
        let (store, api, _) = store();
        script_login(&api, ResponseStatus::EmailVerify);

        assert!(store.login("a@b.c", "pw").await);
        assert_eq!(store.machine().snapshot().flow, AuthFlowState::EmailTotp);
        assert_eq!(store.second_factor(), Some(SecondFactorKind::Email));
    }

    #[tokio::test]
    async fn rejected_login_records_invalid_credentials() {
        let (store, api, _) = store();
        api.login
            .lock()
            .unwrap()
            .push_back(rejected(401, "invalid credentials"));

        assert!(!store.login("a@b.c", "wrong").await);

        let snap = store.machine().snapshot();
        assert_eq!(snap.flow, AuthFlowState::Login);
        assert_eq!(snap.form, FormState::Idle);
        assert_eq!(
            store.session().auth_error().as_deref(),
            Some(messages::INVALID_CREDENTIALS)
        );
    }

    #[tokio::test]
    async fn transport_failure_records_network_error() {
        let (store, api, _) = store();
        api.login.lock().unwrap().push_back(Scripted::Transport);

        assert!(!store.login("a@b.c", "pw").await);
        assert_eq!(
            store.session().auth_error().as_deref(),
            Some(messages::NETWORK_ERROR)
        );
        assert_eq!(store.machine().snapshot().form, FormState::Idle);
    }

    #[tokio::test]
    async fn full_two_factor_login() {
        let (store, api, navigator) = store();
        script_login(&api, ResponseStatus::TotpVerify);
        script_csrf(&api);
        api.verify_totp.lock().unwrap().push_back(success(
            ResponseStatus::Success,
            AuthenticationResponse {
                user: sample_user(),
                message: "welcome".into(),
            },
        ));

        assert!(store.login("a@b.c", "pw").await);
        assert!(store.verify_totp("123456").await);

        let snap = store.machine().snapshot();
        assert_eq!(snap.flow, AuthFlowState::Authenticated);
        assert_eq!(snap.form, FormState::Idle);
        assert!(store.session().is_authenticated());
        assert_eq!(store.second_factor(), None);
        // The short-TTL token reached the verification call and the CSRF
        // token was installed on the client.
        assert_eq!(api.tokens_seen.lock().unwrap().as_slice(), ["short-ttl"]);
        assert_eq!(api.csrf_token.lock().unwrap().as_deref(), Some("csrf-1"));
        assert_eq!(
            navigator.requests.lock().unwrap().last(),
            Some(&auth_machines::NavigationRequest::named(
                auth_machines::RouteName::Home
            ))
        );
    }

    #[tokio::test]
    async fn failed_totp_keeps_flow_and_records_error() {
        let (store, api, _) = store();
        script_login(&api, ResponseStatus::TotpVerify);
        api.verify_totp
            .lock()
            .unwrap()
            .push_back(rejected(401, "invalid code"));

        store.login("a@b.c", "pw").await;
        assert!(!store.verify_totp("000000").await);

        let snap = store.machine().snapshot();
        assert_eq!(snap.flow, AuthFlowState::TwoFaTotp);
        assert_eq!(snap.form, FormState::Idle);
        assert_eq!(store.session().auth_error().as_deref(), Some("invalid code"));
        assert!(!store.session().is_authenticated());
    }

    #[tokio::test]
    async fn totp_without_pending_login_is_refused() {
        let (store, _, _) = store();
        assert!(!store.verify_totp("123456").await);
        assert_eq!(store.machine().snapshot().flow, AuthFlowState::Login);
    }

    #[tokio::test]
    async fn profile_picture_is_resolved_to_a_url() {
        let (store, api, _) = store();
        script_login(&api, ResponseStatus::TotpVerify);
        script_csrf(&api);
        let mut user = sample_user();
        user.profile_picture = Some("avatar.png".into());
        api.verify_totp.lock().unwrap().push_back(success(
            ResponseStatus::Success,
            AuthenticationResponse {
                user,
                message: "welcome".into(),
            },
        ));
        api.get_user_file.lock().unwrap().push_back(success(
            ResponseStatus::Success,
            GetUserFileResponse {
                url: "https://cdn.example.test/avatar.png".into(),
            },
        ));

        store.login("a@b.c", "pw").await;
        store.verify_totp("123456").await;

        let stored = store.session().user().unwrap();
        assert_eq!(
            stored.profile_picture.as_deref(),
            Some("https://cdn.example.test/avatar.png")
        );
    }

    #[tokio::test]
    async fn recovery_code_login_parses_remaining_count() {
        let (store, api, _) = store();
        script_login(&api, ResponseStatus::TotpVerify);
        script_csrf(&api);
        api.verify_recovery_code.lock().unwrap().push_back(success(
            ResponseStatus::Success,
            VerifyRecoveryCodeResponse {
                user: sample_user(),
                message: "3".into(),
            },
        ));

        store.login("a@b.c", "pw").await;
        store.machine().send(&AuthFlowEvent::RecoveryCode);
        assert!(store.verify_recovery_code("abcd-efgh").await);

        assert_eq!(store.machine().snapshot().flow, AuthFlowState::Authenticated);
        assert_eq!(store.remaining_recovery_codes(), Some(3));
    }

    #[tokio::test]
    async fn signup_moves_to_email_verification() {
        let (store, api, _) = store();
        store.machine().send(&AuthFlowEvent::Signup);
        api.signup.lock().unwrap().push_back(success(
            ResponseStatus::Success,
            SignupResponse {
                message: "check your inbox".into(),
            },
        ));

        assert!(store.sign_up("a@b.c", "pw", Platform::Web).await);
        assert_eq!(store.machine().snapshot().flow, AuthFlowState::VerifyEmail);
    }

    #[tokio::test]
    async fn conflicting_signup_records_error() {
        let (store, api, _) = store();
        store.machine().send(&AuthFlowEvent::Signup);
        api.signup
            .lock()
            .unwrap()
            .push_back(rejected(409, "email taken"));

        assert!(!store.sign_up("a@b.c", "pw", Platform::Web).await);
        assert_eq!(store.machine().snapshot().flow, AuthFlowState::Signup);
        assert_eq!(
            store.session().auth_error().as_deref(),
            Some(messages::CONFLICTING_CREDENTIALS)
        );
    }

    #[tokio::test]
    async fn password_reset_returns_to_login() {
        let (store, api, _) = store();
        store
            .machine()
            .send(&AuthFlowEvent::reset_password(None));
        api.reset_password.lock().unwrap().push_back(success(
            ResponseStatus::Success,
            BasicResponse {
                message: "done".into(),
            },
        ));

        assert!(store.reset_password("reset-token", "new-pw").await);
        assert_eq!(store.machine().snapshot().flow, AuthFlowState::Login);
    }

    #[tokio::test]
    async fn restore_session_authenticates_directly() {
        let (store, api, _) = store();
        script_csrf(&api);
        api.me
            .lock()
            .unwrap()
            .push_back(success(ResponseStatus::Success, sample_user()));

        assert!(store.restore_session().await);
        assert_eq!(store.machine().snapshot().flow, AuthFlowState::Authenticated);
        assert!(store.session().is_authenticated());
    }

    #[tokio::test]
    async fn restore_session_without_cookie_stays_put() {
        let (store, api, _) = store();
        api.me
            .lock()
            .unwrap()
            .push_back(rejected(401, "no session"));

        assert!(!store.restore_session().await);
        assert_eq!(store.machine().snapshot().flow, AuthFlowState::Login);
        assert!(!store.session().is_authenticated());
    }

    #[tokio::test]
    async fn logout_clears_user_and_csrf_token() {
        let (store, api, _) = store();
        script_csrf(&api);
        api.me
            .lock()
            .unwrap()
            .push_back(success(ResponseStatus::Success, sample_user()));
        api.logout.lock().unwrap().push_back(success(
            ResponseStatus::Success,
            BasicResponse {
                message: "bye".into(),
            },
        ));

        store.restore_session().await;
        assert!(store.logout().await);

        assert_eq!(store.machine().snapshot().flow, AuthFlowState::Login);
        assert!(!store.session().is_authenticated());
        assert!(api.csrf_token.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_drops_local_state_even_when_request_fails() {
        let (store, api, _) = store();
        script_csrf(&api);
        api.me
            .lock()
            .unwrap()
            .push_back(success(ResponseStatus::Success, sample_user()));
        api.logout.lock().unwrap().push_back(Scripted::Transport);

        store.restore_session().await;
        assert!(!store.logout().await);
        assert!(!store.session().is_authenticated());
        assert_eq!(store.machine().snapshot().flow, AuthFlowState::Login);
    }

    #[test]
    fn configured_min_exec_time_flows_into_the_store() {
        let config = client_config::Config::default();
        let api = Arc::new(MockApi::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let store = AuthStore::with_min_exec_time(api, navigator, config.min_exec_time());
        assert_eq!(store.min_exec_time, Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn switching_screens_clears_the_error() {
        let (store, api, _) = store();
        api.login
            .lock()
            .unwrap()
            .push_back(rejected(401, "invalid credentials"));

        store.login("a@b.c", "wrong").await;
        assert!(store.session().auth_error().is_some());

        store.machine().send(&AuthFlowEvent::Signup);
        assert!(store.session().auth_error().is_none());
    }
}
