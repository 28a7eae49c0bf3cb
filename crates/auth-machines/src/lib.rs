//! Machine definitions for the authentication and account security flows.
//!
//! Five machines share the two-region design from `flow-machine`:
//! - [`auth_flow`]: login → 2FA / recovery / signup / verify-email /
//!   reset-password → authenticated, with navigation entry actions
//! - [`account_deletion`]: password-verify → confirm → delete
//! - [`totp_configuration`]: password-verify → configure → recovery codes
//! - [`totp_secure_action`]: disable or regenerate TOTP, one machine
//!   branching on the action type captured at start
//! - [`email_update`]: password-verify → update
//!
//! The machines own no I/O. Navigation goes through the [`Navigator`]
//! seam; network calls live in the store layer, which drives the machines
//! with events.

pub mod account_deletion;
pub mod auth_flow;
pub mod email_update;
mod navigator;
pub mod totp_configuration;
pub mod totp_secure_action;

pub use auth_flow::{
    AuthFlowContext, AuthFlowDefinition, AuthFlowEvent, AuthFlowHooks, AuthFlowMachine,
    AuthFlowState,
};
pub use navigator::{NavigationRequest, Navigator, Query, RouteName};

pub use account_deletion::{
    AccountDeletionContext, AccountDeletionDefinition, AccountDeletionEvent, AccountDeletionMachine,
    AccountDeletionState,
};
pub use email_update::{
    EmailUpdateDefinition, EmailUpdateEvent, EmailUpdateMachine, EmailUpdateState,
};
pub use totp_configuration::{
    TotpConfigurationDefinition, TotpConfigurationEvent, TotpConfigurationMachine,
    TotpConfigurationState,
};
pub use totp_secure_action::{
    TotpActionType, TotpSecureActionContext, TotpSecureActionDefinition, TotpSecureActionEvent,
    TotpSecureActionMachine, TotpSecureActionState,
};
