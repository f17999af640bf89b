//! Session bookkeeping and the epoch-guarded state cell.
//!
//! Every controller owns one `StateCell`. Opening a session bumps the epoch
//! and cancels the predecessor's token while holding the watch channel's
//! write lock; every mutation a session makes re-checks its epoch under the
//! same lock. A superseded session therefore can never overwrite the state of
//! its successor, no matter when its events arrive.

use crate::state::{ControllerState, Phase};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Last-value-wins holder for the published controller state.
#[derive(Debug)]
pub(crate) struct StateCell {
    tx: watch::Sender<ControllerState>,
    /// Only written inside a `tx` modify closure.
    epoch: AtomicU64,
    live: Mutex<Option<CancellationToken>>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(ControllerState::idle());
        Self {
            tx,
            epoch: AtomicU64::new(0),
            live: Mutex::new(None),
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.tx.subscribe()
    }

    pub(crate) fn snapshot(&self) -> ControllerState {
        self.tx.borrow().clone()
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Retire the live session, open a new epoch and publish `initial`.
    pub(crate) fn begin(&self, initial: ControllerState) -> (u64, CancellationToken) {
        let token = CancellationToken::new();
        let mut epoch = 0;
        self.tx.send_modify(|state| {
            epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            let previous = self
                .live
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .replace(token.clone());
            if let Some(previous) = previous {
                previous.cancel();
            }
            *state = initial;
        });
        (epoch, token)
    }

    /// Cancel the live session without touching the published state.
    ///
    /// Returns the epoch that was cancelled, if any session was live.
    pub(crate) fn cancel(&self) -> Option<u64> {
        let mut cancelled = None;
        self.tx.send_if_modified(|_| {
            let live = self
                .live
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(token) = live {
                token.cancel();
                cancelled = Some(self.epoch.load(Ordering::SeqCst));
            }
            false
        });
        cancelled
    }

    /// Publish `state` unconditionally. The live session keeps running.
    pub(crate) fn reset(&self, state: ControllerState) {
        self.tx.send_replace(state);
    }

    /// Apply `f` only if `epoch` is current and its token is not cancelled.
    pub(crate) fn publish_if_current<F>(&self, epoch: u64, token: &CancellationToken, f: F) -> bool
    where
        F: FnOnce(&mut ControllerState),
    {
        self.tx.send_if_modified(|state| {
            if token.is_cancelled() || self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            f(state);
            true
        })
    }

    /// Drop the live session's token once it has reached a terminal phase.
    pub(crate) fn finish(&self, epoch: u64) {
        self.tx.send_if_modified(|_| {
            if self.epoch.load(Ordering::SeqCst) == epoch {
                self.live
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
            }
            false
        });
    }
}

/// One attempt at producing output for one input.
#[derive(Debug)]
pub(crate) struct Session<R> {
    epoch: u64,
    input: Option<R>,
    output: String,
    token: CancellationToken,
    cell: Arc<StateCell>,
}

impl<R> Session<R> {
    pub(crate) fn new(epoch: u64, input: R, token: CancellationToken, cell: Arc<StateCell>) -> Self {
        Self {
            epoch,
            input: Some(input),
            output: String::new(),
            token,
            cell,
        }
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Accumulated output of this session.
    pub(crate) fn output(&self) -> &str {
        &self.output
    }

    pub(crate) fn take_input(&mut self) -> Option<R> {
        self.input.take()
    }

    pub(crate) async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Mutate the published state on behalf of this session.
    ///
    /// Returns false, leaving the state untouched, when the session is stale.
    pub(crate) fn publish<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut ControllerState),
    {
        self.cell.publish_if_current(self.epoch, &self.token, f)
    }

    /// Append one streamed token to both the accumulator and the state.
    pub(crate) fn append(&mut self, token: &str) -> bool {
        let accepted = self.publish(|state| {
            state.phase = Phase::Inferring;
            state.output.push_str(token);
        });
        if accepted {
            self.output.push_str(token);
        }
        accepted
    }

    pub(crate) fn finish(&self) {
        self.cell.finish(self.epoch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(cell: &Arc<StateCell>) -> Session<String> {
        let (epoch, token) = cell.begin(ControllerState::checking());
        Session::new(epoch, "input".to_string(), token, Arc::clone(cell))
    }

    #[test]
    fn test_epoch_is_strictly_increasing() {
        let cell = Arc::new(StateCell::new());
        let first = open(&cell);
        let second = open(&cell);
        assert!(second.epoch() > first.epoch());
        assert_eq!(cell.epoch(), second.epoch());
    }

    #[test]
    fn test_superseded_session_is_stale_and_cannot_publish() {
        let cell = Arc::new(StateCell::new());
        let mut first = open(&cell);
        let mut second = open(&cell);

        assert_ne!(cell.epoch(), first.epoch());
        assert!(first.token.is_cancelled());
        assert!(!first.append("old"));
        assert!(first.output().is_empty());

        assert!(second.append("new"));
        assert_eq!(cell.snapshot().output, "new");
        assert_eq!(second.output(), "new");
    }

    #[test]
    fn test_cancel_keeps_state_but_blocks_session() {
        let cell = Arc::new(StateCell::new());
        let mut session = open(&cell);
        assert!(session.append("partial"));

        assert_eq!(cell.cancel(), Some(session.epoch()));
        assert!(!session.append(" more"));

        let state = cell.snapshot();
        assert_eq!(state.phase, Phase::Inferring);
        assert_eq!(state.output, "partial");
        assert_eq!(cell.cancel(), None);
    }

    #[test]
    fn test_reset_does_not_cancel_live_session() {
        let cell = Arc::new(StateCell::new());
        let mut session = open(&cell);
        cell.reset(ControllerState::idle());

        assert!(!session.token.is_cancelled());
        assert_eq!(cell.epoch(), session.epoch());
        assert!(session.append("after clear"));
        assert_eq!(cell.snapshot().output, "after clear");
    }
}
