//! Two-region state machine runtime for UI flow control.
//!
//! Every flow in this codebase (authentication, account deletion, TOTP
//! management, email update) is the same shape: a `flow` region that steps
//! through the business sequence, and an orthogonal `form` region that
//! toggles between `idle` and `loading` around in-flight requests. Both
//! regions see every event; a region that has no matching transition for an
//! event simply stays put.
//!
//! A machine is described by a [`FlowDefinition`] (states, context, and the
//! transition function for the `flow` region) and run by a [`Machine`],
//! which serializes events, publishes [`Snapshot`]s to subscribers, and
//! supports destructive [`Machine::reset`].
//!
//! Transitions are synchronous and atomic: an observer never sees a
//! half-applied context. Async work (the actual network calls) lives in the
//! store layer, which sends `LOADING` before awaiting and `IDLE` after.

use serde::Serialize;
use std::fmt::Debug;
use std::sync::Mutex;
use tracing::debug;

/// State of the orthogonal `form` region: is a submission in flight?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    Idle,
    Loading,
}

impl FormState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FormState::Loading)
    }
}

/// How an event addresses the `form` region, if it does at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormSignal {
    Loading,
    Idle,
}

/// Immutable blueprint of one flow machine.
///
/// `on_event` is the transition table for the `flow` region, written as a
/// match over `(state, event)`. It returns the target state when a
/// transition matched and its guard passed, running any context-mutating
/// actions and side effects inline; `None` means the event is ignored in
/// this region (never an error).
pub trait FlowDefinition: Send + Sync + 'static {
    type State: Clone + PartialEq + Debug + Send + Sync;
    type Event: Debug + Send + Sync;
    type Context: Clone + PartialEq + Debug + Send + Sync;

    /// Stable identifier, used in logs.
    fn id(&self) -> &'static str;

    fn initial_state(&self) -> Self::State;

    fn initial_context(&self) -> Self::Context;

    /// True for terminal states (`completed` and friends).
    fn is_final(&self, _state: &Self::State) -> bool {
        false
    }

    /// Attempt a `flow` region transition for this event.
    fn on_event(
        &self,
        state: &Self::State,
        context: &mut Self::Context,
        event: &Self::Event,
    ) -> Option<Self::State>;

    /// Maps the event onto the `form` region. Machines route their
    /// `LOADING`/`IDLE` events here.
    fn form_signal(&self, _event: &Self::Event) -> Option<FormSignal> {
        None
    }

    /// Called when the `form` region changes state. Machines that mirror
    /// `is_loading` into context apply it here.
    fn on_form_change(&self, _context: &mut Self::Context, _form: FormState) {}

    /// True for a machine-level `RESET` event. Such events return the
    /// `form` region to `idle` in addition to whatever `on_event` does to
    /// the `flow` region and context.
    fn is_machine_reset(&self, _event: &Self::Event) -> bool {
        false
    }
}

/// A point-in-time view of a running machine: active state per region, the
/// context, and whether the configuration is terminal.
pub struct Snapshot<D: FlowDefinition> {
    pub flow: D::State,
    pub form: FormState,
    pub context: D::Context,
    pub done: bool,
}

impl<D: FlowDefinition> Snapshot<D> {
    pub fn is_loading(&self) -> bool {
        self.form.is_loading()
    }
}

// Manual impls: deriving would put bounds on `D` itself rather than on the
// associated types.
impl<D: FlowDefinition> Clone for Snapshot<D> {
    fn clone(&self) -> Self {
        Self {
            flow: self.flow.clone(),
            form: self.form,
            context: self.context.clone(),
            done: self.done,
        }
    }
}

impl<D: FlowDefinition> PartialEq for Snapshot<D> {
    fn eq(&self, other: &Self) -> bool {
        self.flow == other.flow
            && self.form == other.form
            && self.context == other.context
            && self.done == other.done
    }
}

impl<D: FlowDefinition> Debug for Snapshot<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("flow", &self.flow)
            .field("form", &self.form)
            .field("context", &self.context)
            .field("done", &self.done)
            .finish()
    }
}

type Subscriber<D> = Box<dyn Fn(&Snapshot<D>) + Send + Sync>;

struct Regions<D: FlowDefinition> {
    flow: D::State,
    form: FormState,
    context: D::Context,
}

/// The live actor for one [`FlowDefinition`].
///
/// Events are processed strictly in `send` call order; both regions are
/// updated under one lock and the new snapshot is published to all
/// subscribers before `send` returns.
pub struct Machine<D: FlowDefinition> {
    definition: D,
    /// Context the actor (re)starts with; carries the construction-time
    /// override so `reset` reproduces it.
    start_context: D::Context,
    regions: Mutex<Regions<D>>,
    subscribers: Mutex<Vec<Subscriber<D>>>,
}

impl<D: FlowDefinition> Machine<D> {
    pub fn new(definition: D) -> Self {
        let start_context = definition.initial_context();
        Self::start(definition, start_context)
    }

    /// Like [`Machine::new`] but with the initial context overridden before
    /// any event is processed. `reset` restores this same context.
    pub fn with_initial_context(definition: D, context: D::Context) -> Self {
        Self::start(definition, context)
    }

    fn start(definition: D, start_context: D::Context) -> Self {
        let regions = Regions {
            flow: definition.initial_state(),
            form: FormState::Idle,
            context: start_context.clone(),
        };
        Self {
            definition,
            start_context,
            regions: Mutex::new(regions),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &'static str {
        self.definition.id()
    }

    pub fn definition(&self) -> &D {
        &self.definition
    }

    pub fn snapshot(&self) -> Snapshot<D> {
        let regions = self.regions.lock().unwrap();
        self.snapshot_of(&regions)
    }

    /// Register a callback invoked synchronously with every published
    /// snapshot. Subscribers survive `reset`.
    pub fn subscribe(&self, subscriber: impl Fn(&Snapshot<D>) + Send + Sync + 'static) {
        self.subscribers.lock().unwrap().push(Box::new(subscriber));
    }

    /// Deliver an event to both regions.
    ///
    /// Unmatched events are silently ignored per region; the snapshot is
    /// republished only if a region or the context actually changed.
    pub fn send(&self, event: &D::Event) -> Snapshot<D> {
        let mut guard = self.regions.lock().unwrap();
        let regions = &mut *guard;

        let prev_flow = regions.flow.clone();
        let prev_form = regions.form;
        let prev_context = regions.context.clone();

        if let Some(next) = self
            .definition
            .on_event(&regions.flow, &mut regions.context, event)
        {
            regions.flow = next;
        }

        let form_target = if self.definition.is_machine_reset(event) {
            (regions.form != FormState::Idle).then_some(FormState::Idle)
        } else {
            match (regions.form, self.definition.form_signal(event)) {
                (FormState::Idle, Some(FormSignal::Loading)) => Some(FormState::Loading),
                (FormState::Loading, Some(FormSignal::Idle)) => Some(FormState::Idle),
                _ => None,
            }
        };
        if let Some(form) = form_target {
            regions.form = form;
            self.definition.on_form_change(&mut regions.context, form);
        }

        let changed = regions.flow != prev_flow
            || regions.form != prev_form
            || regions.context != prev_context;

        if regions.flow != prev_flow {
            debug!(
                machine = self.definition.id(),
                from = ?prev_flow,
                to = ?regions.flow,
                event = ?event,
                "flow transition"
            );
        }

        let snapshot = self.snapshot_of(regions);
        drop(guard);

        if changed {
            self.publish(&snapshot);
        }
        snapshot
    }

    /// Discard the running actor state and restart from the initial
    /// snapshot: initial state in every region, initial context (including
    /// any construction-time override). Subscribers are notified with the
    /// fresh snapshot.
    pub fn reset(&self) {
        let mut guard = self.regions.lock().unwrap();
        guard.flow = self.definition.initial_state();
        guard.form = FormState::Idle;
        guard.context = self.start_context.clone();
        let snapshot = self.snapshot_of(&guard);
        drop(guard);

        debug!(machine = self.definition.id(), "machine reset");
        self.publish(&snapshot);
    }

    /// Mutate the live context outside of any transition. Publishes a new
    /// snapshot only if the context actually changed.
    pub fn update_context(&self, updater: impl FnOnce(&mut D::Context)) {
        let mut guard = self.regions.lock().unwrap();
        let prev = guard.context.clone();
        updater(&mut guard.context);
        if guard.context == prev {
            return;
        }
        let snapshot = self.snapshot_of(&guard);
        drop(guard);
        self.publish(&snapshot);
    }

    fn snapshot_of(&self, regions: &Regions<D>) -> Snapshot<D> {
        Snapshot {
            flow: regions.flow.clone(),
            form: regions.form,
            context: regions.context.clone(),
            done: self.definition.is_final(&regions.flow),
        }
    }

    fn publish(&self, snapshot: &Snapshot<D>) {
        let subscribers = self.subscribers.lock().unwrap();
        for subscriber in subscribers.iter() {
            subscriber(snapshot);
        }
    }
}
