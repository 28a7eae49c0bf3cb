//! The API seam consumed by the store layer.

use crate::error::ApiResult;
use crate::types::*;

/// Async interface to the authentication backend.
///
/// Implementations return `Err` only for transport/decoding failures;
/// anything the server answered, including rejections, comes back as an
/// [`ApiResponse`].
#[allow(async_fn_in_trait)]
pub trait AuthApi: Send + Sync {
    /// Remember the CSRF token to attach to subsequent mutating requests.
    fn set_csrf_token(&self, token: Option<String>);

    async fn login(&self, credentials: &Credentials)
        -> ApiResult<ApiResponse<LoginResponse>>;

    async fn signup(&self, body: &SignupBody) -> ApiResult<ApiResponse<SignupResponse>>;

    /// Verify an authenticator-app code against the short-TTL login token.
    async fn verify_totp(
        &self,
        totp: &str,
        token: &str,
    ) -> ApiResult<ApiResponse<AuthenticationResponse>>;

    /// Verify an emailed code against the short-TTL login token.
    async fn verify_totp_email(
        &self,
        totp: &str,
        token: &str,
    ) -> ApiResult<ApiResponse<AuthenticationResponse>>;

    async fn verify_recovery_code(
        &self,
        code: &str,
        token: &str,
    ) -> ApiResult<ApiResponse<VerifyRecoveryCodeResponse>>;

    async fn send_password_reset(
        &self,
        body: &SendPasswordResetBody,
    ) -> ApiResult<ApiResponse<BasicResponse>>;

    async fn reset_password(
        &self,
        body: &PasswordResetBody,
    ) -> ApiResult<ApiResponse<BasicResponse>>;

    async fn verify_email(&self, body: &VerifyEmailBody) -> ApiResult<ApiResponse<BasicResponse>>;

    async fn resend_email_verification(
        &self,
        email: &str,
    ) -> ApiResult<ApiResponse<BasicResponse>>;

    /// Fetch the currently authenticated user from the session cookie.
    async fn me(&self) -> ApiResult<ApiResponse<User>>;

    async fn logout(&self) -> ApiResult<ApiResponse<BasicResponse>>;

    async fn verify_password(
        &self,
        password: &str,
    ) -> ApiResult<ApiResponse<VerifyPasswordResponse>>;

    /// Request a fresh TOTP secret (QR code + otpauth URL) for setup.
    async fn ask_for_totp(&self) -> ApiResult<ApiResponse<AskForTotpResponse>>;

    async fn setup_totp(&self, totp: &str) -> ApiResult<ApiResponse<SetupTotpResponse>>;

    async fn disable_totp(&self) -> ApiResult<ApiResponse<DisableTotpResponse>>;

    async fn regenerate_recovery_codes(
        &self,
    ) -> ApiResult<ApiResponse<RegenerateRecoveryCodesResponse>>;

    async fn change_password(
        &self,
        body: &ChangePasswordBody,
    ) -> ApiResult<ApiResponse<BasicResponse>>;

    async fn update_profile(&self, body: &UpdateUserBody) -> ApiResult<ApiResponse<User>>;

    async fn delete_account(&self) -> ApiResult<ApiResponse<BasicResponse>>;

    async fn get_user_file(&self, filename: &str) -> ApiResult<ApiResponse<GetUserFileResponse>>;

    async fn get_csrf_token(&self) -> ApiResult<ApiResponse<GetCsrfTokenResponse>>;
}
