//! Request and response types for the authentication backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope discriminator sent by the backend on every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    TotpVerify,
    EmailVerify,
    Error,
}

/// Successful response envelope: `{status, data}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    pub status: ResponseStatus,
    pub data: T,
}

/// Error response envelope: `{status, error}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub status: ResponseStatus,
    pub error: ApiErrorDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetails {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Flattened view of one backend response: HTTP status, envelope
/// discriminator, and either the typed payload or the error details.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub outcome: Option<ResponseStatus>,
    pub data: Option<T>,
    pub error: Option<ApiErrorDetails>,
}

impl<T> ApiResponse<T> {
    pub fn success(status: u16, outcome: ResponseStatus, data: T) -> Self {
        Self {
            status,
            outcome: Some(outcome),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(status: u16, error: ApiErrorDetails) -> Self {
        Self {
            status,
            outcome: Some(ResponseStatus::Error),
            data: None,
            error: Some(error),
        }
    }

    /// Server answered with a payload and no error.
    pub fn ok(&self) -> bool {
        self.error.is_none() && self.data.is_some()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn is_conflict(&self) -> bool {
        self.status == 409
    }
}

/// The authenticated user object as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub totp_enabled: bool,
    /// Verification timestamp; `None` means the address is unverified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<DateTime<Utc>>,
}

/// Platform tag attached to signup / reset / profile requests so the
/// backend can tailor deep links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    Web,
    Linux,
    Macos,
    Windows,
    Ios,
    Android,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupBody {
    pub email: String,
    pub password: String,
    pub platform: Platform,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyTotpBody {
    pub totp: String,
    pub token: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyTotpEmailBody {
    pub totp: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRecoveryCodeBody {
    pub code: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendPasswordResetBody {
    pub email: String,
    pub platform: Platform,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetBody {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordBody {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPasswordBody {
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupTotpBody {
    pub totp: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailBody {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendEmailVerificationBody {
    pub email: String,
}

/// Profile update; all fields optional, the backend patches what is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub platform: Platform,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    /// Short-TTL token used for the second-factor verification call.
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationResponse {
    pub user: User,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPasswordResponse {
    pub message: String,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskForTotpResponse {
    pub qr_code: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupTotpResponse {
    pub message: String,
    pub totp_recovery_codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRecoveryCodeResponse {
    pub user: User,
    /// Number of unused recovery codes remaining, as a decimal string.
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegenerateRecoveryCodesResponse {
    pub message: String,
    pub totp_recovery_codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisableTotpResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserFileResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCsrfTokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_parses() {
        let raw = r#"{"status":"totp_verify","data":{"message":"ok","token":"short-ttl"}}"#;
        let envelope: SuccessEnvelope<LoginResponse> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.status, ResponseStatus::TotpVerify);
        assert_eq!(envelope.data.token, "short-ttl");
    }

    #[test]
    fn error_envelope_parses() {
        let raw = r#"{"status":"error","error":{"code":401,"message":"invalid credentials"}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.error.code, 401);
        assert_eq!(envelope.error.details, None);
    }

    #[test]
    fn user_optional_fields_default() {
        let raw = r#"{"id":"u1","email":"a@b.c","is_active":true,"totp_enabled":false}"#;
        let user: User = serde_json::from_str(raw).unwrap();
        assert_eq!(user.username, None);
        assert_eq!(user.email_verified, None);
    }

    #[test]
    fn update_body_skips_unset_fields() {
        let body = UpdateUserBody {
            username: Some("jo".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["username"], "jo");
        assert!(json.get("email").is_none());
        assert_eq!(json["platform"], "web");
    }

    #[test]
    fn response_status_checks() {
        let ok: ApiResponse<BasicResponse> = ApiResponse::success(
            200,
            ResponseStatus::Success,
            BasicResponse {
                message: "done".into(),
            },
        );
        assert!(ok.ok());

        let denied: ApiResponse<BasicResponse> = ApiResponse::failure(
            401,
            ApiErrorDetails {
                code: 401,
                message: "unauthorized".into(),
                details: None,
            },
        );
        assert!(!denied.ok());
        assert!(denied.is_unauthorized());
    }
}
