//! reqwest-backed implementation of [`AuthApi`].
//!
//! Sessions are cookie-based, so the client keeps a cookie store. Every
//! request carries an `X-REQUEST-ID`; mutating requests additionally carry
//! the CSRF token once the store has fetched one.

use crate::api::AuthApi;
use crate::error::ApiResult;
use crate::types::*;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Mutex;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

const CSRF_HEADER: &str = "X-CSRF-TOKEN";
const REQUEST_ID_HEADER: &str = "X-REQUEST-ID";

pub struct HttpAuthApi {
    client: Client,
    base_url: Url,
    platform: Platform,
    csrf_token: Mutex<Option<String>>,
}

impl HttpAuthApi {
    pub fn new(base_url: &str, platform: Platform) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)?;
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url,
            platform,
            csrf_token: Mutex::new(None),
        })
    }

    fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let url = self.base_url.join(path)?;
        let mut builder = self
            .client
            .request(method.clone(), url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

        if method != Method::GET {
            if let Some(token) = self.csrf_token.lock().unwrap().as_ref() {
                builder = builder.header(CSRF_HEADER, token);
            }
        }
        Ok(builder)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        builder: RequestBuilder,
    ) -> ApiResult<ApiResponse<T>> {
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(path = %path, status, "api response received");

        if let Ok(envelope) = serde_json::from_str::<SuccessEnvelope<T>>(&body) {
            if envelope.status != ResponseStatus::Error {
                return Ok(ApiResponse::success(status, envelope.status, envelope.data));
            }
        }

        let error = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => envelope.error,
            Err(_) => ApiErrorDetails {
                code: status,
                message: format!("HTTP {status}"),
                details: (!body.is_empty()).then_some(body),
            },
        };
        warn!(path = %path, status, error = %error.message, "api request rejected");
        Ok(ApiResponse::failure(status, error))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<ApiResponse<T>> {
        let builder = self.request(Method::GET, path)?;
        self.execute(path, builder).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<ApiResponse<T>> {
        let builder = self.request(Method::POST, path)?.json(body);
        self.execute(path, builder).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<ApiResponse<T>> {
        let builder = self.request(Method::POST, path)?;
        self.execute(path, builder).await
    }
}

impl AuthApi for HttpAuthApi {
    fn set_csrf_token(&self, token: Option<String>) {
        *self.csrf_token.lock().unwrap() = token;
    }

    async fn login(
        &self,
        credentials: &Credentials,
    ) -> ApiResult<ApiResponse<LoginResponse>> {
        self.post("/auth/login", credentials).await
    }

    async fn signup(&self, body: &SignupBody) -> ApiResult<ApiResponse<SignupResponse>> {
        self.post("/auth/signup", body).await
    }

    async fn verify_totp(
        &self,
        totp: &str,
        token: &str,
    ) -> ApiResult<ApiResponse<AuthenticationResponse>> {
        let body = VerifyTotpBody {
            totp: totp.to_string(),
            token: token.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        };
        self.post("/auth/verify-totp", &body).await
    }

    async fn verify_totp_email(
        &self,
        totp: &str,
        token: &str,
    ) -> ApiResult<ApiResponse<AuthenticationResponse>> {
        let body = VerifyTotpEmailBody {
            totp: totp.to_string(),
            token: token.to_string(),
        };
        self.post("/auth/verify-totp-email", &body).await
    }

    async fn verify_recovery_code(
        &self,
        code: &str,
        token: &str,
    ) -> ApiResult<ApiResponse<VerifyRecoveryCodeResponse>> {
        let body = VerifyRecoveryCodeBody {
            code: code.to_string(),
            token: token.to_string(),
        };
        self.post("/auth/verify-recovery-code", &body).await
    }

    async fn send_password_reset(
        &self,
        body: &SendPasswordResetBody,
    ) -> ApiResult<ApiResponse<BasicResponse>> {
        self.post("/auth/send-password-reset-email", body).await
    }

    async fn reset_password(
        &self,
        body: &PasswordResetBody,
    ) -> ApiResult<ApiResponse<BasicResponse>> {
        self.post("/auth/reset-password", body).await
    }

    async fn verify_email(&self, body: &VerifyEmailBody) -> ApiResult<ApiResponse<BasicResponse>> {
        self.post("/auth/verify-email", body).await
    }

    async fn resend_email_verification(
        &self,
        email: &str,
    ) -> ApiResult<ApiResponse<BasicResponse>> {
        let body = ResendEmailVerificationBody {
            email: email.to_string(),
        };
        self.post("/auth/resend-email-verification", &body).await
    }

    async fn me(&self) -> ApiResult<ApiResponse<User>> {
        self.get("/users/me").await
    }

    async fn logout(&self) -> ApiResult<ApiResponse<BasicResponse>> {
        self.post_empty("/auth/logout").await
    }

    async fn verify_password(
        &self,
        password: &str,
    ) -> ApiResult<ApiResponse<VerifyPasswordResponse>> {
        let body = VerifyPasswordBody {
            password: password.to_string(),
        };
        self.post("/auth/verify-password", &body).await
    }

    async fn ask_for_totp(&self) -> ApiResult<ApiResponse<AskForTotpResponse>> {
        self.get("/auth/totp").await
    }

    async fn setup_totp(&self, totp: &str) -> ApiResult<ApiResponse<SetupTotpResponse>> {
        let body = SetupTotpBody {
            totp: totp.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        };
        self.post("/auth/setup-totp", &body).await
    }

    async fn disable_totp(&self) -> ApiResult<ApiResponse<DisableTotpResponse>> {
        self.post_empty("/auth/disable-totp").await
    }

    async fn regenerate_recovery_codes(
        &self,
    ) -> ApiResult<ApiResponse<RegenerateRecoveryCodesResponse>> {
        self.post_empty("/auth/regenerate-recovery-codes").await
    }

    async fn change_password(
        &self,
        body: &ChangePasswordBody,
    ) -> ApiResult<ApiResponse<BasicResponse>> {
        self.post("/users/change-password", body).await
    }

    async fn update_profile(&self, body: &UpdateUserBody) -> ApiResult<ApiResponse<User>> {
        let mut body = body.clone();
        body.platform = self.platform;
        let builder = self.request(Method::PATCH, "/users/me")?.json(&body);
        self.execute("/users/me", builder).await
    }

    async fn delete_account(&self) -> ApiResult<ApiResponse<BasicResponse>> {
        let builder = self.request(Method::DELETE, "/users/me")?;
        self.execute("/users/me", builder).await
    }

    async fn get_user_file(&self, filename: &str) -> ApiResult<ApiResponse<GetUserFileResponse>> {
        let mut url = self.base_url.join("/users/files")?;
        url.query_pairs_mut().append_pair("filename", filename);
        let builder = self
            .client
            .get(url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
        self.execute("/users/files", builder).await
    }

    async fn get_csrf_token(&self) -> ApiResult<ApiResponse<GetCsrfTokenResponse>> {
        self.get("/auth/csrf-token").await
    }
}
