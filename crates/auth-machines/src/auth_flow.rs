//! The authentication flow machine.
//!
//! Sequences which authentication screen is active: login, TOTP second
//! factor (app or email), recovery code entry, signup, email verification,
//! password reset, and finally authenticated. Entering a screen clears the
//! shared auth error and navigates through the [`Navigator`] seam; entering
//! `authenticated` navigates to the captured redirect path, or home.
//!
//! The `form` region is the usual idle/loading toggle the store drives
//! around every network call.

use crate::navigator::{NavigationRequest, Navigator, Query, RouteName};
use flow_machine::{FlowDefinition, FormSignal, Machine};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlowState {
    Login,
    TwoFaTotp,
    EmailTotp,
    RecoveryCode,
    Signup,
    VerifyEmail,
    ResetPassword,
    Authenticated,
}

#[derive(Debug)]
pub enum AuthFlowEvent {
    TwoFaTotp,
    EmailTotp,
    Signup,
    ResetPassword { query: Option<Query> },
    RestoreSession,
    RecoveryCode,
    Authenticated { redirect_path: Option<String> },
    Login,
    VerifyEmail,
    Logout,
    SetQuery { query: Query },
    SetRedirect { path: String },
    Loading,
    Idle,
}

impl AuthFlowEvent {
    /// `RESET_PASSWORD`, optionally carrying the query to preserve across
    /// the transition (e.g. the reset token from a deep link).
    pub fn reset_password(query: Option<Query>) -> Self {
        Self::ResetPassword { query }
    }

    /// `AUTHENTICATED`, optionally carrying the post-login destination.
    pub fn authenticated(redirect_path: Option<String>) -> Self {
        Self::Authenticated { redirect_path }
    }

    pub fn set_query(query: Query) -> Self {
        Self::SetQuery { query }
    }

    pub fn set_redirect(path: impl Into<String>) -> Self {
        Self::SetRedirect { path: path.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthFlowContext {
    /// Query carried into the reset-password screen.
    pub query: Query,
    /// Where to send the user once authenticated, captured by whichever
    /// code path bounced them to login in the first place.
    pub redirect_path: Option<String>,
}

/// Store-facing side effects triggered by flow transitions.
pub trait AuthFlowHooks: Send + Sync {
    /// Clear the user-visible auth error when switching screens.
    fn clear_auth_error(&self);
    /// Drop the persisted user on logout.
    fn session_logout(&self);
}

pub struct AuthFlowDefinition {
    navigator: Arc<dyn Navigator>,
    hooks: Arc<dyn AuthFlowHooks>,
}

pub type AuthFlowMachine = Machine<AuthFlowDefinition>;

impl AuthFlowDefinition {
    pub fn new(navigator: Arc<dyn Navigator>, hooks: Arc<dyn AuthFlowHooks>) -> Self {
        Self { navigator, hooks }
    }

    /// Entry actions for the target state: clear the auth error and
    /// navigate, in that order.
    fn enter(&self, target: AuthFlowState, context: &AuthFlowContext) {
        self.hooks.clear_auth_error();
        let request = match target {
            AuthFlowState::Login => NavigationRequest::named(RouteName::Login),
            AuthFlowState::TwoFaTotp | AuthFlowState::EmailTotp => {
                NavigationRequest::named(RouteName::Totp)
            }
            AuthFlowState::RecoveryCode => NavigationRequest::named(RouteName::TotpRecovery),
            AuthFlowState::Signup => NavigationRequest::named(RouteName::Signup),
            AuthFlowState::VerifyEmail => NavigationRequest::named(RouteName::VerifyEmail),
            AuthFlowState::ResetPassword => {
                if context.query.is_empty() {
                    NavigationRequest::named(RouteName::ResetPassword)
                } else {
                    NavigationRequest::named_with_query(
                        RouteName::ResetPassword,
                        context.query.clone(),
                    )
                }
            }
            AuthFlowState::Authenticated => match &context.redirect_path {
                Some(path) => NavigationRequest::path(path.clone()),
                None => NavigationRequest::named(RouteName::Home),
            },
        };
        self.navigator.navigate(request);
    }
}

impl FlowDefinition for AuthFlowDefinition {
    type State = AuthFlowState;
    type Event = AuthFlowEvent;
    type Context = AuthFlowContext;

    fn id(&self) -> &'static str {
        "auth_flow"
    }

    fn initial_state(&self) -> AuthFlowState {
        AuthFlowState::Login
    }

    fn initial_context(&self) -> AuthFlowContext {
        AuthFlowContext::default()
    }

    fn on_event(
        &self,
        state: &AuthFlowState,
        context: &mut AuthFlowContext,
        event: &AuthFlowEvent,
    ) -> Option<AuthFlowState> {
        use AuthFlowEvent as E;
        use AuthFlowState as S;

        // Context-only events, accepted in every flow state.
        match event {
            E::SetQuery { query } => {
                context.query = query.clone();
                return None;
            }
            E::SetRedirect { path } => {
                debug!(path = %path, "captured redirect path");
                context.redirect_path = Some(path.clone());
                return None;
            }
            _ => {}
        }

        let next = match (state, event) {
            (S::Login, E::TwoFaTotp) => S::TwoFaTotp,
            (S::Login, E::EmailTotp) => S::EmailTotp,
            (S::Login, E::Signup) => S::Signup,
            (S::Login, E::ResetPassword { query }) => {
                if let Some(query) = query {
                    context.query = query.clone();
                }
                S::ResetPassword
            }
            // Trusted input: the store only sends this after validating
            // that a session exists.
            (S::Login, E::RestoreSession) => S::Authenticated,

            (S::TwoFaTotp, E::RecoveryCode) => S::RecoveryCode,
            (S::RecoveryCode, E::TwoFaTotp) => S::TwoFaTotp,

            (
                S::TwoFaTotp | S::RecoveryCode | S::EmailTotp | S::VerifyEmail,
                E::Authenticated { redirect_path },
            ) => {
                if let Some(path) = redirect_path {
                    context.redirect_path = Some(path.clone());
                }
                S::Authenticated
            }

            (S::Signup, E::Login) => S::Login,
            (S::Signup, E::VerifyEmail) => S::VerifyEmail,
            (S::ResetPassword, E::Login) => S::Login,

            (S::Authenticated, E::Logout) => {
                self.hooks.session_logout();
                S::Login
            }

            _ => return None,
        };

        self.enter(next, context);
        Some(next)
    }

    fn form_signal(&self, event: &AuthFlowEvent) -> Option<FormSignal> {
        match event {
            AuthFlowEvent::Loading => Some(FormSignal::Loading),
            AuthFlowEvent::Idle => Some(FormSignal::Idle),
            _ => None,
        }
    }
}
