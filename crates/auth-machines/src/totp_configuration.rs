//! The TOTP configuration machine.
//!
//! Enabling TOTP: re-verify the password, scan the secret into an
//! authenticator, then the freshly generated recovery codes are shown once
//! before the flow completes. No context; the recovery codes themselves
//! live in the store, not the machine.

use flow_machine::{FlowDefinition, FormSignal, Machine};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotpConfigurationState {
    PasswordVerify,
    TotpConfig,
    RecoveryCodes,
    Completed,
}

#[derive(Debug)]
pub enum TotpConfigurationEvent {
    TotpConfig,
    ShowRecoveryCodes,
    Complete,
    Reset,
    Loading,
    Idle,
}

#[derive(Default)]
pub struct TotpConfigurationDefinition;

pub type TotpConfigurationMachine = Machine<TotpConfigurationDefinition>;

impl FlowDefinition for TotpConfigurationDefinition {
    type State = TotpConfigurationState;
    type Event = TotpConfigurationEvent;
    type Context = ();

    fn id(&self) -> &'static str {
        "totp_configuration"
    }

    fn initial_state(&self) -> TotpConfigurationState {
        TotpConfigurationState::PasswordVerify
    }

    fn initial_context(&self) {}

    fn is_final(&self, state: &TotpConfigurationState) -> bool {
        matches!(state, TotpConfigurationState::Completed)
    }

    fn on_event(
        &self,
        state: &TotpConfigurationState,
        _context: &mut (),
        event: &TotpConfigurationEvent,
    ) -> Option<TotpConfigurationState> {
        use TotpConfigurationEvent as E;
        use TotpConfigurationState as S;

        match (state, event) {
            (S::PasswordVerify, E::TotpConfig) => {
                info!(flow = "totp_configuration", "password verified, configuring TOTP");
                Some(S::TotpConfig)
            }
            (S::TotpConfig, E::ShowRecoveryCodes) => Some(S::RecoveryCodes),
            (S::RecoveryCodes, E::Complete) => {
                info!(flow = "totp_configuration", "TOTP configuration completed");
                Some(S::Completed)
            }
            (_, E::Reset) => Some(S::PasswordVerify),
            _ => None,
        }
    }

    fn form_signal(&self, event: &TotpConfigurationEvent) -> Option<FormSignal> {
        match event {
            TotpConfigurationEvent::Loading => Some(FormSignal::Loading),
            TotpConfigurationEvent::Idle => Some(FormSignal::Idle),
            _ => None,
        }
    }

    fn is_machine_reset(&self, event: &TotpConfigurationEvent) -> bool {
        matches!(event, TotpConfigurationEvent::Reset)
    }
}
