//! Scripted in-memory backend for store tests.
//!
//! Each API method pops its next scripted behavior from a queue; an empty
//! queue answers with a 500 so an unexpected call fails the assertion that
//! follows instead of hanging the flow.

use auth_api::*;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Mutex;

pub(crate) enum Scripted<T> {
    Respond(ApiResponse<T>),
    /// Simulate a transport-level failure (`Err` from the client).
    Transport,
}

pub(crate) fn success<T>(outcome: ResponseStatus, data: T) -> Scripted<T> {
    Scripted::Respond(ApiResponse::success(200, outcome, data))
}

pub(crate) fn rejected<T>(status: u16, message: &str) -> Scripted<T> {
    Scripted::Respond(ApiResponse::failure(
        status,
        ApiErrorDetails {
            code: status,
            message: message.into(),
            details: None,
        },
    ))
}

pub(crate) fn sample_user() -> User {
    User {
        id: "user-1".into(),
        email: "a@b.c".into(),
        profile_picture: None,
        username: Some("ab".into()),
        first_name: None,
        last_name: None,
        job_title: None,
        phone_number: None,
        last_login: Some(Utc::now()),
        is_active: true,
        totp_enabled: true,
        email_verified: Some(Utc::now()),
    }
}

fn transport_error() -> ApiError {
    match serde_json::from_str::<serde_json::Value>("") {
        Err(error) => ApiError::Json(error),
        Ok(_) => unreachable!("empty input never parses"),
    }
}

type Queue<T> = Mutex<VecDeque<Scripted<T>>>;

fn take<T>(queue: &Queue<T>) -> ApiResult<ApiResponse<T>> {
    match queue.lock().unwrap().pop_front() {
        Some(Scripted::Respond(response)) => Ok(response),
        Some(Scripted::Transport) => Err(transport_error()),
        None => Ok(ApiResponse::failure(
            500,
            ApiErrorDetails {
                code: 500,
                message: "unscripted call".into(),
                details: None,
            },
        )),
    }
}

#[derive(Default)]
pub(crate) struct MockApi {
    pub login: Queue<LoginResponse>,
    pub signup: Queue<SignupResponse>,
    pub verify_totp: Queue<AuthenticationResponse>,
    pub verify_totp_email: Queue<AuthenticationResponse>,
    pub verify_recovery_code: Queue<VerifyRecoveryCodeResponse>,
    pub send_password_reset: Queue<BasicResponse>,
    pub reset_password: Queue<BasicResponse>,
    pub verify_email: Queue<BasicResponse>,
    pub resend_email_verification: Queue<BasicResponse>,
    pub me: Queue<User>,
    pub logout: Queue<BasicResponse>,
    pub verify_password: Queue<VerifyPasswordResponse>,
    pub ask_for_totp: Queue<AskForTotpResponse>,
    pub setup_totp: Queue<SetupTotpResponse>,
    pub disable_totp: Queue<DisableTotpResponse>,
    pub regenerate_recovery_codes: Queue<RegenerateRecoveryCodesResponse>,
    pub change_password: Queue<BasicResponse>,
    pub update_profile: Queue<User>,
    pub delete_account: Queue<BasicResponse>,
    pub get_user_file: Queue<GetUserFileResponse>,
    pub get_csrf_token: Queue<GetCsrfTokenResponse>,

    /// Last CSRF token installed via [`AuthApi::set_csrf_token`].
    pub csrf_token: Mutex<Option<String>>,
    /// Short-TTL tokens passed to second-factor verification calls.
    pub tokens_seen: Mutex<Vec<String>>,
}

impl AuthApi for MockApi {
    fn set_csrf_token(&self, token: Option<String>) {
        *self.csrf_token.lock().unwrap() = token;
    }

    async fn login(&self, _credentials: &Credentials) -> ApiResult<ApiResponse<LoginResponse>> {
        take(&self.login)
    }

    async fn signup(&self, _body: &SignupBody) -> ApiResult<ApiResponse<SignupResponse>> {
        take(&self.signup)
    }

    async fn verify_totp(
        &self,
        _totp: &str,
        token: &str,
    ) -> ApiResult<ApiResponse<AuthenticationResponse>> {
        self.tokens_seen.lock().unwrap().push(token.to_string());
        take(&self.verify_totp)
    }

    async fn verify_totp_email(
        &self,
        _totp: &str,
        token: &str,
    ) -> ApiResult<ApiResponse<AuthenticationResponse>> {
        self.tokens_seen.lock().unwrap().push(token.to_string());
        take(&self.verify_totp_email)
    }

    async fn verify_recovery_code(
        &self,
        _code: &str,
        token: &str,
    ) -> ApiResult<ApiResponse<VerifyRecoveryCodeResponse>> {
        self.tokens_seen.lock().unwrap().push(token.to_string());
        take(&self.verify_recovery_code)
    }

    async fn send_password_reset(
        &self,
        _body: &SendPasswordResetBody,
    ) -> ApiResult<ApiResponse<BasicResponse>> {
        take(&self.send_password_reset)
    }

    async fn reset_password(
        &self,
        _body: &PasswordResetBody,
    ) -> ApiResult<ApiResponse<BasicResponse>> {
        take(&self.reset_password)
    }

    async fn verify_email(
        &self,
        _body: &VerifyEmailBody,
    ) -> ApiResult<ApiResponse<BasicResponse>> {
        take(&self.verify_email)
    }

    async fn resend_email_verification(
        &self,
        _email: &str,
    ) -> ApiResult<ApiResponse<BasicResponse>> {
        take(&self.resend_email_verification)
    }

    async fn me(&self) -> ApiResult<ApiResponse<User>> {
        take(&self.me)
    }

    async fn logout(&self) -> ApiResult<ApiResponse<BasicResponse>> {
        take(&self.logout)
    }

    async fn verify_password(
        &self,
        _password: &str,
    ) -> ApiResult<ApiResponse<VerifyPasswordResponse>> {
        take(&self.verify_password)
    }

    async fn ask_for_totp(&self) -> ApiResult<ApiResponse<AskForTotpResponse>> {
        take(&self.ask_for_totp)
    }

    async fn setup_totp(&self, _totp: &str) -> ApiResult<ApiResponse<SetupTotpResponse>> {
        take(&self.setup_totp)
    }

    async fn disable_totp(&self) -> ApiResult<ApiResponse<DisableTotpResponse>> {
        take(&self.disable_totp)
    }

    async fn regenerate_recovery_codes(
        &self,
    ) -> ApiResult<ApiResponse<RegenerateRecoveryCodesResponse>> {
        take(&self.regenerate_recovery_codes)
    }

    async fn change_password(
        &self,
        _body: &ChangePasswordBody,
    ) -> ApiResult<ApiResponse<BasicResponse>> {
        take(&self.change_password)
    }

    async fn update_profile(&self, _body: &UpdateUserBody) -> ApiResult<ApiResponse<User>> {
        take(&self.update_profile)
    }

    async fn delete_account(&self) -> ApiResult<ApiResponse<BasicResponse>> {
        take(&self.delete_account)
    }

    async fn get_user_file(
        &self,
        _filename: &str,
    ) -> ApiResult<ApiResponse<GetUserFileResponse>> {
        take(&self.get_user_file)
    }

    async fn get_csrf_token(&self) -> ApiResult<ApiResponse<GetCsrfTokenResponse>> {
        take(&self.get_csrf_token)
    }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    pub requests: Mutex<Vec<auth_machines::NavigationRequest>>,
}

impl auth_machines::Navigator for RecordingNavigator {
    fn navigate(&self, request: auth_machines::NavigationRequest) {
        self.requests.lock().unwrap().push(request);
    }
}
