//! The account security store.
//!
//! Owns the four in-account flow machines and drives them around the
//! password reverification and the destructive calls. Flow errors stay in
//! each machine's own context; password verification failures land in the
//! store error slot since the machines have no transition for them.

use crate::messages;
use crate::session::Session;
use auth_api::{AuthApi, UpdateUserBody};
use auth_machines::{
    AccountDeletionDefinition, AccountDeletionEvent, AccountDeletionMachine, EmailUpdateDefinition,
    EmailUpdateEvent, EmailUpdateMachine, TotpActionType, TotpConfigurationDefinition,
    TotpConfigurationEvent, TotpConfigurationMachine, TotpSecureActionDefinition,
    TotpSecureActionEvent, TotpSecureActionMachine,
};
use flow_machine::Machine;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::auth::DEFAULT_MIN_EXEC_TIME;

/// TOTP secret presentation returned during configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpSecret {
    /// Data-URL encoded QR code image.
    pub qr_code: String,
    /// The `otpauth://` URL for manual entry.
    pub url: String,
}

pub struct SecurityStore<A: AuthApi> {
    api: Arc<A>,
    session: Arc<Session>,
    deletion: AccountDeletionMachine,
    totp_configuration: TotpConfigurationMachine,
    secure_action: TotpSecureActionMachine,
    email_update: EmailUpdateMachine,
    totp_secret: Mutex<Option<TotpSecret>>,
    /// Recovery codes to show once, from setup or regeneration.
    recovery_codes: Mutex<Vec<String>>,
    error: Mutex<Option<String>>,
    min_exec_time: Duration,
}

impl<A: AuthApi> SecurityStore<A> {
    pub fn new(api: Arc<A>, session: Arc<Session>) -> Self {
        Self::with_min_exec_time(api, session, DEFAULT_MIN_EXEC_TIME)
    }

    pub fn with_min_exec_time(
        api: Arc<A>,
        session: Arc<Session>,
        min_exec_time: Duration,
    ) -> Self {
        Self {
            api,
            session,
            deletion: Machine::new(AccountDeletionDefinition),
            totp_configuration: Machine::new(TotpConfigurationDefinition),
            secure_action: Machine::new(TotpSecureActionDefinition),
            email_update: Machine::new(EmailUpdateDefinition),
            totp_secret: Mutex::new(None),
            recovery_codes: Mutex::new(Vec::new()),
            error: Mutex::new(None),
            min_exec_time,
        }
    }

    pub fn deletion(&self) -> &AccountDeletionMachine {
        &self.deletion
    }

    pub fn totp_configuration(&self) -> &TotpConfigurationMachine {
        &self.totp_configuration
    }

    pub fn secure_action(&self) -> &TotpSecureActionMachine {
        &self.secure_action
    }

    pub fn email_update(&self) -> &EmailUpdateMachine {
        &self.email_update
    }

    pub fn totp_secret(&self) -> Option<TotpSecret> {
        self.totp_secret.lock().unwrap().clone()
    }

    pub fn recovery_codes(&self) -> Vec<String> {
        self.recovery_codes.lock().unwrap().clone()
    }

    /// Message identifier of the last store-level error, if any.
    pub fn error(&self) -> Option<String> {
        self.error.lock().unwrap().clone()
    }

    pub fn clear_error(&self) {
        self.error.lock().unwrap().take();
    }

    // ----- account deletion -----

    pub fn start_deletion(&self) {
        self.deletion.send(&AccountDeletionEvent::StartDeletion);
    }

    pub async fn verify_password_for_deletion(&self, password: &str) -> bool {
        let started = Instant::now();
        self.deletion.send(&AccountDeletionEvent::Loading);

        let verified = self.verify_password(password).await;
        if verified {
            self.deletion.send(&AccountDeletionEvent::PasswordVerified);
        }

        self.pad(started).await;
        self.deletion.send(&AccountDeletionEvent::Idle);
        verified
    }

    /// Execute the deletion. On success the session user is dropped; the
    /// server has already invalidated the cookie.
    pub async fn confirm_deletion(&self) -> bool {
        self.deletion.send(&AccountDeletionEvent::ConfirmDeletion);

        let started = Instant::now();
        self.deletion.send(&AccountDeletionEvent::Loading);

        let deleted = match self.api.delete_account().await {
            Ok(response) if response.ok() => {
                info!("account deleted");
                self.api.set_csrf_token(None);
                self.session.set_user(None);
                self.deletion.send(&AccountDeletionEvent::DeletionSuccess);
                true
            }
            Ok(response) => {
                let error = response
                    .error
                    .map(|details| details.message)
                    .unwrap_or_else(|| messages::NETWORK_ERROR.to_string());
                self.deletion
                    .send(&AccountDeletionEvent::DeletionError { error });
                false
            }
            Err(error) => {
                warn!(error = %error, "account deletion request failed");
                self.deletion.send(&AccountDeletionEvent::DeletionError {
                    error: messages::NETWORK_ERROR.to_string(),
                });
                false
            }
        };

        self.pad(started).await;
        self.deletion.send(&AccountDeletionEvent::Idle);
        deleted
    }

    pub fn reset_deletion(&self) {
        self.deletion.send(&AccountDeletionEvent::Reset);
    }

    // ----- TOTP configuration -----

    /// Verify the password and fetch the fresh TOTP secret in one step;
    /// the configuration screen needs the QR code immediately.
    pub async fn begin_totp_configuration(&self, password: &str) -> bool {
        let started = Instant::now();
        self.totp_configuration
            .send(&TotpConfigurationEvent::Loading);

        let mut advanced = false;
        if self.verify_password(password).await {
            match self.api.ask_for_totp().await {
                Ok(response) if response.ok() => {
                    if let Some(data) = response.data {
                        *self.totp_secret.lock().unwrap() = Some(TotpSecret {
                            qr_code: data.qr_code,
                            url: data.url,
                        });
                    }
                    self.totp_configuration
                        .send(&TotpConfigurationEvent::TotpConfig);
                    advanced = true;
                }
                Ok(response) => self.record_api_error(response.error.map(|e| e.message)),
                Err(error) => {
                    warn!(error = %error, "TOTP secret request failed");
                    self.record_api_error(None);
                }
            }
        }

        self.pad(started).await;
        self.totp_configuration.send(&TotpConfigurationEvent::Idle);
        advanced
    }

    /// Confirm the scanned secret with a first code; the response carries
    /// the recovery codes shown on the next screen.
    pub async fn confirm_totp_setup(&self, code: &str) -> bool {
        let started = Instant::now();
        self.totp_configuration
            .send(&TotpConfigurationEvent::Loading);

        let advanced = match self.api.setup_totp(code).await {
            Ok(response) if response.ok() => {
                if let Some(data) = response.data {
                    *self.recovery_codes.lock().unwrap() = data.totp_recovery_codes;
                }
                self.set_user_totp_enabled(true);
                info!("TOTP enabled");
                self.totp_configuration
                    .send(&TotpConfigurationEvent::ShowRecoveryCodes);
                true
            }
            Ok(response) => {
                self.record_api_error(response.error.map(|e| e.message));
                false
            }
            Err(error) => {
                warn!(error = %error, "TOTP setup request failed");
                self.record_api_error(None);
                false
            }
        };

        self.pad(started).await;
        self.totp_configuration.send(&TotpConfigurationEvent::Idle);
        advanced
    }

    /// The recovery codes were acknowledged; wipe them from memory.
    pub fn complete_totp_configuration(&self) {
        self.totp_configuration
            .send(&TotpConfigurationEvent::Complete);
        self.totp_secret.lock().unwrap().take();
        self.recovery_codes.lock().unwrap().clear();
    }

    pub fn reset_totp_configuration(&self) {
        self.totp_configuration.send(&TotpConfigurationEvent::Reset);
        self.totp_secret.lock().unwrap().take();
        self.recovery_codes.lock().unwrap().clear();
    }

    // ----- TOTP secure actions (disable / regenerate) -----

    pub fn start_secure_action(&self, action_type: TotpActionType) {
        self.secure_action
            .send(&TotpSecureActionEvent::StartAction { action_type });
    }

    pub async fn verify_password_for_secure_action(&self, password: &str) -> bool {
        let started = Instant::now();
        self.secure_action.send(&TotpSecureActionEvent::Loading);

        let verified = self.verify_password(password).await;
        if verified {
            self.secure_action
                .send(&TotpSecureActionEvent::PasswordVerified);
        }

        self.pad(started).await;
        self.secure_action.send(&TotpSecureActionEvent::Idle);
        verified
    }

    /// Run the call selected by the action type captured at start.
    pub async fn confirm_secure_action(&self) -> bool {
        self.secure_action.send(&TotpSecureActionEvent::ConfirmAction);

        let started = Instant::now();
        self.secure_action.send(&TotpSecureActionEvent::Loading);

        let action_type = self.secure_action.snapshot().context.action_type;
        let succeeded = match action_type {
            Some(TotpActionType::Disable) => match self.api.disable_totp().await {
                Ok(response) if response.ok() => {
                    self.set_user_totp_enabled(false);
                    info!("TOTP disabled");
                    self.secure_action.send(&TotpSecureActionEvent::ActionSuccess);
                    true
                }
                Ok(response) => {
                    self.send_action_error(response.error.map(|e| e.message));
                    false
                }
                Err(error) => {
                    warn!(error = %error, "TOTP disable request failed");
                    self.send_action_error(None);
                    false
                }
            },
            Some(TotpActionType::Regenerate) => {
                match self.api.regenerate_recovery_codes().await {
                    Ok(response) if response.ok() => {
                        if let Some(data) = response.data {
                            *self.recovery_codes.lock().unwrap() = data.totp_recovery_codes;
                        }
                        info!("recovery codes regenerated");
                        self.secure_action.send(&TotpSecureActionEvent::ActionSuccess);
                        true
                    }
                    Ok(response) => {
                        self.send_action_error(response.error.map(|e| e.message));
                        false
                    }
                    Err(error) => {
                        warn!(error = %error, "recovery code regeneration failed");
                        self.send_action_error(None);
                        false
                    }
                }
            }
            None => {
                warn!("confirm without a started secure action");
                false
            }
        };

        self.pad(started).await;
        self.secure_action.send(&TotpSecureActionEvent::Idle);
        succeeded
    }

    pub fn complete_secure_action(&self) {
        self.secure_action.send(&TotpSecureActionEvent::Complete);
        self.recovery_codes.lock().unwrap().clear();
    }

    pub fn reset_secure_action(&self) {
        self.secure_action.send(&TotpSecureActionEvent::Reset);
        self.recovery_codes.lock().unwrap().clear();
    }

    // ----- email update -----

    pub async fn verify_password_for_email_update(&self, password: &str) -> bool {
        let started = Instant::now();
        self.email_update.send(&EmailUpdateEvent::Loading);

        let verified = self.verify_password(password).await;
        if verified {
            self.email_update.send(&EmailUpdateEvent::EmailUpdate);
        }

        self.pad(started).await;
        self.email_update.send(&EmailUpdateEvent::Idle);
        verified
    }

    pub async fn update_email(&self, new_email: &str) -> bool {
        let started = Instant::now();
        self.email_update.send(&EmailUpdateEvent::Loading);

        let body = UpdateUserBody {
            email: Some(new_email.to_string()),
            ..Default::default()
        };
        let updated = match self.api.update_profile(&body).await {
            Ok(response) if response.ok() => {
                if let Some(user) = response.data {
                    self.session.set_user(Some(user));
                }
                info!("email updated");
                self.email_update.send(&EmailUpdateEvent::Complete);
                true
            }
            Ok(response) => {
                self.record_api_error(response.error.map(|e| e.message));
                false
            }
            Err(error) => {
                warn!(error = %error, "email update request failed");
                self.record_api_error(None);
                false
            }
        };

        self.pad(started).await;
        self.email_update.send(&EmailUpdateEvent::Idle);
        updated
    }

    pub fn reset_email_update(&self) {
        self.email_update.send(&EmailUpdateEvent::Reset);
    }

    // ----- shared plumbing -----

    async fn verify_password(&self, password: &str) -> bool {
        let verified = match self.api.verify_password(password).await {
            Ok(response) if response.ok() => response
                .data
                .map(|data| data.success)
                .unwrap_or(false),
            Ok(_) => false,
            Err(error) => {
                warn!(error = %error, "password verification request failed");
                *self.error.lock().unwrap() = Some(messages::NETWORK_ERROR.to_string());
                return false;
            }
        };
        if !verified {
            *self.error.lock().unwrap() = Some(messages::PASSWORD_VERIFY_ERROR.to_string());
        }
        verified
    }

    fn send_action_error(&self, message: Option<String>) {
        let error = message.unwrap_or_else(|| messages::NETWORK_ERROR.to_string());
        self.secure_action
            .send(&TotpSecureActionEvent::ActionError { error });
    }

    fn record_api_error(&self, message: Option<String>) {
        let message = message.unwrap_or_else(|| messages::NETWORK_ERROR.to_string());
        *self.error.lock().unwrap() = Some(message);
    }

    fn set_user_totp_enabled(&self, enabled: bool) {
        if let Some(mut user) = self.session.user() {
            user.totp_enabled = enabled;
            self.session.set_user(Some(user));
        }
    }

    async fn pad(&self, started: Instant) {
        let elapsed = started.elapsed();
        if elapsed < self.min_exec_time {
            sleep(self.min_exec_time - elapsed).await;
        }
    }
}
