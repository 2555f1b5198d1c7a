//! SSO link state machine
//!
//! Pure state machine: receives events, returns (new_state, action).
//! The result channel applies transitions under its lock and performs the
//! delivery each action implies.

use auth_api::error::ALREADY_IN_PROGRESS;
use auth_api::{AuthError, Result};

/// What the attempt was handed off to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// A companion app found by discovery
    App,
    /// The secure in-app browser
    Browser,
}

impl Handler {
    /// Label for logging and metrics.
    pub fn label(self) -> &'static str {
        match self {
            Handler::App => "app",
            Handler::Browser => "browser",
        }
    }
}

/// Lifecycle of one hand-off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LinkState {
    /// No attempt has started
    #[default]
    Idle,
    /// URI built, handler being launched
    Dispatching,
    /// Handler launched, waiting for its single result
    AwaitingExternalResult { handler: Handler },
    /// Code delivered
    Completed,
    /// Error delivered
    Failed(AuthError),
}

impl LinkState {
    /// True between dispatch and the terminal result.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            LinkState::Dispatching | LinkState::AwaitingExternalResult { .. }
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LinkState::Completed | LinkState::Failed(_))
    }
}

/// Events that drive state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// `execute` called
    Execute,
    /// Launcher accepted the URI
    Launched(Handler),
    /// A terminal outcome arrived: handler result, deep link, launch failure
    /// or timeout
    Resolved(Result<String>),
}

/// Actions the caller should execute after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// Arm the result slot and launch a handler
    Dispatch,
    /// Refuse the `execute` call with this error
    Reject(AuthError),
    /// Fill the result slot
    Deliver(Result<String>),
    /// A second outcome for an attempt that already finished
    IgnoreDuplicate,
    /// An outcome with no attempt to receive it
    IgnoreUnsolicited,
    /// No-op
    None,
}

/// Handle a state transition. Pure function: no I/O.
pub fn handle_event(state: LinkState, event: LinkEvent) -> (LinkState, LinkAction) {
    match (state, event) {
        // --- Starting an attempt ---
        (LinkState::Idle | LinkState::Completed | LinkState::Failed(_), LinkEvent::Execute) => {
            (LinkState::Dispatching, LinkAction::Dispatch)
        }

        (state, LinkEvent::Execute) if state.is_in_progress() => (
            state,
            LinkAction::Reject(AuthError::Client(ALREADY_IN_PROGRESS.to_string())),
        ),

        // --- Dispatching ---
        (LinkState::Dispatching, LinkEvent::Launched(handler)) => (
            LinkState::AwaitingExternalResult { handler },
            LinkAction::None,
        ),

        // --- Terminal outcomes ---
        // A fast handler can answer before `Launched` is applied, so
        // Dispatching accepts outcomes as well.
        (state, LinkEvent::Resolved(result)) if state.is_in_progress() => {
            let next = match &result {
                Ok(_) => LinkState::Completed,
                Err(e) => LinkState::Failed(e.clone()),
            };
            (next, LinkAction::Deliver(result))
        }

        (state, LinkEvent::Resolved(_)) if state.is_terminal() => {
            (state, LinkAction::IgnoreDuplicate)
        }

        (LinkState::Idle, LinkEvent::Resolved(_)) => (LinkState::Idle, LinkAction::IgnoreUnsolicited),

        // --- Catch-all: launch acknowledgement after the result already arrived ---
        (state, _) => (state, LinkAction::None),
    }
}
