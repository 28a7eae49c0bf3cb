//! The account deletion machine.
//!
//! idle → password_verify → confirm → action → completed, with an error
//! state reachable from the execution step. A machine-level `RESET` returns
//! both regions to their initial states and clears context from anywhere in
//! the flow, not just from `error`.

use flow_machine::{FlowDefinition, FormSignal, FormState, Machine};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountDeletionState {
    Idle,
    PasswordVerify,
    Confirm,
    Action,
    Completed,
    Error,
}

#[derive(Debug)]
pub enum AccountDeletionEvent {
    StartDeletion,
    PasswordVerified,
    ConfirmDeletion,
    DeletionSuccess,
    DeletionError { error: String },
    Reset,
    Loading,
    Idle,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccountDeletionContext {
    pub error: Option<String>,
    /// Mirrors the form region for callers that only look at context.
    pub is_loading: bool,
}

#[derive(Default)]
pub struct AccountDeletionDefinition;

pub type AccountDeletionMachine = Machine<AccountDeletionDefinition>;

impl FlowDefinition for AccountDeletionDefinition {
    type State = AccountDeletionState;
    type Event = AccountDeletionEvent;
    type Context = AccountDeletionContext;

    fn id(&self) -> &'static str {
        "account_deletion"
    }

    fn initial_state(&self) -> AccountDeletionState {
        AccountDeletionState::Idle
    }

    fn initial_context(&self) -> AccountDeletionContext {
        AccountDeletionContext::default()
    }

    fn is_final(&self, state: &AccountDeletionState) -> bool {
        matches!(state, AccountDeletionState::Completed)
    }

    fn on_event(
        &self,
        state: &AccountDeletionState,
        context: &mut AccountDeletionContext,
        event: &AccountDeletionEvent,
    ) -> Option<AccountDeletionState> {
        use AccountDeletionEvent as E;
        use AccountDeletionState as S;

        match (state, event) {
            (S::Idle, E::StartDeletion) => {
                context.error = None;
                info!(flow = "account_deletion", "starting account deletion");
                Some(S::PasswordVerify)
            }
            (S::PasswordVerify, E::PasswordVerified) => {
                info!(flow = "account_deletion", "password verified");
                Some(S::Confirm)
            }
            (S::Confirm, E::ConfirmDeletion) => {
                info!(flow = "account_deletion", "deletion confirmed, executing");
                Some(S::Action)
            }
            (S::Action, E::DeletionSuccess) => {
                info!(flow = "account_deletion", "account deletion completed");
                Some(S::Completed)
            }
            (S::Action, E::DeletionError { error }) => {
                warn!(flow = "account_deletion", error = %error, "account deletion failed");
                context.error = Some(error.clone());
                Some(S::Error)
            }
            // Machine-level reset, usable from any state.
            (_, E::Reset) => {
                *context = AccountDeletionContext::default();
                Some(S::Idle)
            }
            _ => None,
        }
    }

    fn form_signal(&self, event: &AccountDeletionEvent) -> Option<FormSignal> {
        match event {
            AccountDeletionEvent::Loading => Some(FormSignal::Loading),
            AccountDeletionEvent::Idle => Some(FormSignal::Idle),
            _ => None,
        }
    }

    fn on_form_change(&self, context: &mut AccountDeletionContext, form: FormState) {
        context.is_loading = form.is_loading();
    }

    fn is_machine_reset(&self, event: &AccountDeletionEvent) -> bool {
        matches!(event, AccountDeletionEvent::Reset)
    }
}
