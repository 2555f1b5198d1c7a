//! Single-assignment result channel for the external hand-off
//!
//! Every terminal signal (handler result, deep link, launch failure, timeout)
//! goes through one mutex-guarded state machine. The first one fills the
//! oneshot slot; anything after that is logged and dropped. Each attempt gets
//! a fresh number, so a `ResultSender` left over from an earlier attempt
//! cannot complete a later one. An attempt nobody can complete any more
//! (every sender dropped) resolves as canceled.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use auth_api::error::UNKNOWN;
use auth_api::{AuthError, ExternalResult, RedirectParams, Result};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::state::{Handler, LinkAction, LinkEvent, LinkState, handle_event};

/// Receiving half handed to the awaiting `execute`.
pub type ResultReceiver = oneshot::Receiver<Result<String>>;

#[derive(Debug, Default)]
struct Pending {
    state: LinkState,
    attempt: u64,
    slot: Option<oneshot::Sender<Result<String>>>,
}

/// Link state plus the result slot of the current attempt.
#[derive(Debug, Default)]
pub struct ResultChannel {
    inner: Mutex<Pending>,
}

impl ResultChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // A panic while holding the lock cannot leave `Pending` half-updated:
    // every write is a whole-value replace.
    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(pending: &mut Pending, event: LinkEvent) -> LinkAction {
        let state = std::mem::take(&mut pending.state);
        let (next, action) = handle_event(state, event);
        pending.state = next;
        action
    }

    /// Start an attempt: arm a fresh slot and return its sender and receiver.
    ///
    /// Fails with `ALREADY_IN_PROGRESS` while another attempt is pending.
    pub fn begin(self: &Arc<Self>) -> Result<(ResultSender, ResultReceiver)> {
        let mut pending = self.lock();
        match Self::apply(&mut pending, LinkEvent::Execute) {
            LinkAction::Dispatch => {
                let (tx, rx) = oneshot::channel();
                pending.attempt += 1;
                pending.slot = Some(tx);
                let sender = ResultSender {
                    inner: Arc::new(AttemptGuard::new(Arc::clone(self), pending.attempt)),
                };
                debug!(attempt = pending.attempt, "result slot armed");
                Ok((sender, rx))
            }
            LinkAction::Reject(e) => Err(e),
            other => {
                warn!(action = ?other, "unexpected transition on execute");
                Err(AuthError::Client(UNKNOWN.to_string()))
            }
        }
    }

    /// Record which handler took the hand-off.
    pub(crate) fn launched(&self, attempt: u64, handler: Handler) {
        let mut pending = self.lock();
        if pending.attempt == attempt {
            Self::apply(&mut pending, LinkEvent::Launched(handler));
        }
    }

    /// Offer a terminal outcome. `attempt` pins it to one attempt; `None`
    /// targets whichever attempt is current (deep links carry no attempt).
    ///
    /// Returns true if this outcome was the one delivered.
    pub(crate) fn resolve(&self, attempt: Option<u64>, result: Result<String>) -> bool {
        let mut pending = self.lock();
        Self::resolve_locked(&mut pending, attempt, result)
    }

    /// Cancel `attempt` if it is still current and has no outcome yet.
    pub(crate) fn abandon(&self, attempt: u64) -> bool {
        let mut pending = self.lock();
        if pending.attempt != attempt || !pending.state.is_in_progress() {
            return false;
        }
        debug!(attempt, "attempt abandoned before any result");
        Self::resolve_locked(&mut pending, Some(attempt), Err(AuthError::canceled()))
    }

    fn resolve_locked(pending: &mut Pending, attempt: Option<u64>, result: Result<String>) -> bool {
        if let Some(attempt) = attempt
            && attempt != pending.attempt
        {
            debug!(
                attempt,
                current = pending.attempt,
                "dropping outcome for a finished attempt"
            );
            return false;
        }

        match Self::apply(pending, LinkEvent::Resolved(result)) {
            LinkAction::Deliver(result) => {
                let outcome = if result.is_ok() { "code" } else { "error" };
                let Some(slot) = pending.slot.take() else {
                    return false;
                };
                // The receiver is gone only if `execute` itself was dropped
                if slot.send(result).is_err() {
                    debug!(attempt = pending.attempt, "result receiver already dropped");
                }
                debug!(attempt = pending.attempt, outcome, "result delivered");
                true
            }
            LinkAction::IgnoreDuplicate => {
                debug!(attempt = pending.attempt, "duplicate result ignored");
                false
            }
            LinkAction::IgnoreUnsolicited => {
                warn!("result received with no authentication in progress");
                false
            }
            _ => false,
        }
    }

    pub fn state(&self) -> LinkState {
        self.lock().state.clone()
    }

    pub fn is_in_progress(&self) -> bool {
        self.lock().state.is_in_progress()
    }
}

/// Cancels its attempt on drop unless the attempt already has an outcome.
pub(crate) struct AttemptGuard {
    channel: Arc<ResultChannel>,
    attempt: u64,
}

impl AttemptGuard {
    pub(crate) fn new(channel: Arc<ResultChannel>, attempt: u64) -> Self {
        Self { channel, attempt }
    }
}

impl Drop for AttemptGuard {
    fn drop(&mut self) {
        self.channel.abandon(self.attempt);
    }
}

/// Producer side of one attempt's result slot, handed to launchers.
///
/// Cheap to clone. Only the first completion across all clones (and the
/// link's own deep-link path) counts. Dropping the last clone of a pending
/// attempt cancels it.
#[derive(Clone)]
pub struct ResultSender {
    inner: Arc<AttemptGuard>,
}

impl ResultSender {
    pub fn attempt(&self) -> u64 {
        self.inner.attempt
    }

    /// Deliver the raw outcome of the launched handler.
    pub fn send(&self, result: ExternalResult) -> bool {
        self.complete(result.into_result())
    }

    /// Deliver the parameters of a redirect back into the host.
    pub fn send_redirect(&self, params: RedirectParams) -> bool {
        self.complete(params.into_result())
    }

    /// Report that the user dismissed the handler.
    pub fn cancel(&self) -> bool {
        self.send(ExternalResult::Canceled)
    }

    pub fn complete(&self, result: Result<String>) -> bool {
        self.inner.channel.resolve(Some(self.inner.attempt), result)
    }
}

impl fmt::Debug for ResultSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSender")
            .field("attempt", &self.inner.attempt)
            .finish_non_exhaustive()
    }
}
