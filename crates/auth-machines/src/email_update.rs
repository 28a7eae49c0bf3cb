//! The email update machine: re-verify the password, then update.

use flow_machine::{FlowDefinition, FormSignal, Machine};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailUpdateState {
    PasswordVerify,
    EmailUpdate,
    Completed,
}

#[derive(Debug)]
pub enum EmailUpdateEvent {
    EmailUpdate,
    Complete,
    Reset,
    Loading,
    Idle,
}

#[derive(Default)]
pub struct EmailUpdateDefinition;

pub type EmailUpdateMachine = Machine<EmailUpdateDefinition>;

impl FlowDefinition for EmailUpdateDefinition {
    type State = EmailUpdateState;
    type Event = EmailUpdateEvent;
    type Context = ();

    fn id(&self) -> &'static str {
        "email_update"
    }

    fn initial_state(&self) -> EmailUpdateState {
        EmailUpdateState::PasswordVerify
    }

    fn initial_context(&self) {}

    fn is_final(&self, state: &EmailUpdateState) -> bool {
        matches!(state, EmailUpdateState::Completed)
    }

    fn on_event(
        &self,
        state: &EmailUpdateState,
        _context: &mut (),
        event: &EmailUpdateEvent,
    ) -> Option<EmailUpdateState> {
        use EmailUpdateEvent as E;
        use EmailUpdateState as S;

        match (state, event) {
            (S::PasswordVerify, E::EmailUpdate) => {
                info!(flow = "email_update", "password verified, updating email");
                Some(S::EmailUpdate)
            }
            (S::EmailUpdate, E::Complete) => {
                info!(flow = "email_update", "email update completed");
                Some(S::Completed)
            }
            (_, E::Reset) => Some(S::PasswordVerify),
            _ => None,
        }
    }

    fn form_signal(&self, event: &EmailUpdateEvent) -> Option<FormSignal> {
        match event {
            EmailUpdateEvent::Loading => Some(FormSignal::Loading),
            EmailUpdateEvent::Idle => Some(FormSignal::Idle),
            _ => None,
        }
    }

    fn is_machine_reset(&self, event: &EmailUpdateEvent) -> bool {
        matches!(event, EmailUpdateEvent::Reset)
    }
}
