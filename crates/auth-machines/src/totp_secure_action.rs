//! The TOTP secure action machine.
//!
//! One machine for both security actions on an existing TOTP setup:
//! disabling it, or regenerating recovery codes. The two share the
//! password-reverification and confirmation steps; only the post-success
//! experience differs, so `ACTION_SUCCESS` branches on the `action_type`
//! captured at `START_ACTION` — `regenerate` shows the new codes on a
//! result screen first, `disable` completes immediately.

use flow_machine::{FlowDefinition, FormSignal, FormState, Machine};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotpActionType {
    Disable,
    Regenerate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotpSecureActionState {
    Idle,
    PasswordVerify,
    Confirm,
    Action,
    Result,
    Completed,
    Error,
}

#[derive(Debug)]
pub enum TotpSecureActionEvent {
    StartAction { action_type: TotpActionType },
    PasswordVerified,
    ConfirmAction,
    ActionSuccess,
    ActionError { error: String },
    Complete,
    Reset,
    Loading,
    Idle,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TotpSecureActionContext {
    /// Fixed at `START_ACTION`; selects the success transition.
    pub action_type: Option<TotpActionType>,
    pub error: Option<String>,
    pub is_loading: bool,
}

#[derive(Default)]
pub struct TotpSecureActionDefinition;

pub type TotpSecureActionMachine = Machine<TotpSecureActionDefinition>;

impl FlowDefinition for TotpSecureActionDefinition {
    type State = TotpSecureActionState;
    type Event = TotpSecureActionEvent;
    type Context = TotpSecureActionContext;

    fn id(&self) -> &'static str {
        "totp_secure_action"
    }

    fn initial_state(&self) -> TotpSecureActionState {
        TotpSecureActionState::Idle
    }

    fn initial_context(&self) -> TotpSecureActionContext {
        TotpSecureActionContext::default()
    }

    fn is_final(&self, state: &TotpSecureActionState) -> bool {
        matches!(state, TotpSecureActionState::Completed)
    }

    fn on_event(
        &self,
        state: &TotpSecureActionState,
        context: &mut TotpSecureActionContext,
        event: &TotpSecureActionEvent,
    ) -> Option<TotpSecureActionState> {
        use TotpSecureActionEvent as E;
        use TotpSecureActionState as S;

        match (state, event) {
            (S::Idle, E::StartAction { action_type }) => {
                context.action_type = Some(*action_type);
                context.error = None;
                info!(action_type = ?action_type, "starting TOTP secure action");
                Some(S::PasswordVerify)
            }
            (S::PasswordVerify, E::PasswordVerified) => Some(S::Confirm),
            (S::Confirm, E::ConfirmAction) => Some(S::Action),
            (S::Action, E::ActionSuccess) => match context.action_type {
                Some(TotpActionType::Regenerate) => Some(S::Result),
                Some(TotpActionType::Disable) => Some(S::Completed),
                // Only reachable if context was tampered with mid-flow;
                // surface it instead of stalling in `action`.
                None => {
                    warn!("ACTION_SUCCESS with no action type set");
                    context.error = Some("no action type set".to_string());
                    Some(S::Error)
                }
            },
            (S::Action, E::ActionError { error }) => {
                warn!(error = %error, "TOTP secure action failed");
                context.error = Some(error.clone());
                Some(S::Error)
            }
            (S::Result, E::Complete) => Some(S::Completed),
            (_, E::Reset) => {
                *context = TotpSecureActionContext::default();
                Some(S::Idle)
            }
            _ => None,
        }
    }

    fn form_signal(&self, event: &TotpSecureActionEvent) -> Option<FormSignal> {
        match event {
            TotpSecureActionEvent::Loading => Some(FormSignal::Loading),
            TotpSecureActionEvent::Idle => Some(FormSignal::Idle),
            _ => None,
        }
    }

    fn on_form_change(&self, context: &mut TotpSecureActionContext, form: FormState) {
        context.is_loading = form.is_loading();
    }

    fn is_machine_reset(&self, event: &TotpSecureActionEvent) -> bool {
        matches!(event, TotpSecureActionEvent::Reset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TotpSecureActionEvent as E;
    use TotpSecureActionState as S;

    fn machine() -> TotpSecureActionMachine {
        Machine::new(TotpSecureActionDefinition)
    }

    fn drive_to_action(machine: &TotpSecureActionMachine, action_type: TotpActionType) {
        machine.send(&E::StartAction { action_type });
        machine.send(&E::PasswordVerified);
        machine.send(&E::ConfirmAction);
    }

    #[test]
    fn regenerate_shows_result_before_completion() {
        let machine = machine();
        drive_to_action(&machine, TotpActionType::Regenerate);

        let snap = machine.send(&E::ActionSuccess);
        assert_eq!(snap.flow, S::Result);
        assert!(!snap.done);

        let snap = machine.send(&E::Complete);
        assert_eq!(snap.flow, S::Completed);
        assert!(snap.done);
    }

    #[test]
    fn disable_completes_directly() {
        let machine = machine();
        drive_to_action(&machine, TotpActionType::Disable);

        let snap = machine.send(&E::ActionSuccess);
        assert_eq!(snap.flow, S::Completed);
        assert!(snap.done);
    }

    #[test]
    fn action_type_is_captured_at_start() {
        let machine = machine();
        let snap = machine.send(&E::StartAction {
            action_type: TotpActionType::Regenerate,
        });
        assert_eq!(snap.flow, S::PasswordVerify);
        assert_eq!(snap.context.action_type, Some(TotpActionType::Regenerate));
    }

    #[test]
    fn success_without_action_type_lands_in_error() {
        let machine = machine();
        drive_to_action(&machine, TotpActionType::Regenerate);
        machine.update_context(|ctx| ctx.action_type = None);

        let snap = machine.send(&E::ActionSuccess);
        assert_eq!(snap.flow, S::Error);
        assert!(snap.context.error.is_some());
    }

    #[test]
    fn error_carries_message_and_resets_to_idle() {
        let machine = machine();
        drive_to_action(&machine, TotpActionType::Disable);

        let snap = machine.send(&E::ActionError {
            error: "401".into(),
        });
        assert_eq!(snap.flow, S::Error);
        assert_eq!(snap.context.error.as_deref(), Some("401"));

        let snap = machine.send(&E::Reset);
        assert_eq!(snap.flow, S::Idle);
        assert_eq!(snap.context, TotpSecureActionContext::default());
    }

    #[test]
    fn reset_clears_action_type_from_any_state() {
        let machine = machine();
        machine.send(&E::StartAction {
            action_type: TotpActionType::Disable,
        });
        machine.send(&E::Loading);

        let snap = machine.send(&E::Reset);
        assert_eq!(snap.flow, S::Idle);
        assert_eq!(snap.form, FormState::Idle);
        assert_eq!(snap.context.action_type, None);
        assert!(!snap.context.is_loading);
        assert_eq!(snap, Machine::new(TotpSecureActionDefinition).snapshot());
    }

    #[test]
    fn loading_is_orthogonal_to_flow() {
        let machine = machine();
        drive_to_action(&machine, TotpActionType::Regenerate);

        let snap = machine.send(&E::Loading);
        assert_eq!(snap.flow, S::Action);
        assert!(snap.context.is_loading);
    }
}
