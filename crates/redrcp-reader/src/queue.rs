use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::error_code::ErrorCode;

/// A response as seen by the correlator, with command failures already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Ordinary response payload for `code`.
    Success { code: u8, payload: Bytes },
    /// The reader rejected `code`.
    Failure { code: u8, error: ErrorCode },
}

impl ResponseOutcome {
    /// The command code this outcome answers.
    pub fn code(&self) -> u8 {
        match self {
            Self::Success { code, .. } | Self::Failure { code, .. } => *code,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    Timeout,
    Closed,
}

#[derive(Debug, Default)]
struct QueueState {
    slot: Option<ResponseOutcome>,
    closed: bool,
}

/// Single-slot hand-off point between the receive thread and the calling
/// thread.
///
/// At most one command is outstanding, so the first outcome after a send is
/// its answer. Later outcomes are stragglers and are dropped until the slot
/// is taken or drained.
#[derive(Debug, Default)]
pub struct ResponseQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl ResponseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer an outcome to the slot.
    ///
    /// Returns `false` when the outcome was dropped: the queue is closed or
    /// an earlier outcome has not been taken yet.
    pub fn push(&self, outcome: ResponseOutcome) -> bool {
        let mut state = self.lock();
        if state.closed || state.slot.is_some() {
            return false;
        }
        state.slot = Some(outcome);
        drop(state);
        self.ready.notify_one();
        true
    }

    /// Wait up to `timeout` for the next outcome.
    ///
    /// A timeout too large to form a deadline waits until an outcome
    /// arrives or the queue is closed.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<ResponseOutcome, RecvError> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.lock();
        loop {
            if let Some(outcome) = state.slot.take() {
                return Ok(outcome);
            }
            if state.closed {
                return Err(RecvError::Closed);
            }
            state = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(RecvError::Timeout);
                    }
                    match self.ready.wait_timeout(state, deadline - now) {
                        Ok((guard, _)) => guard,
                        Err(poisoned) => poisoned.into_inner().0,
                    }
                }
                None => self
                    .ready
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner()),
            };
        }
    }

    /// Discard a pending outcome. Returns how many outcomes were dropped.
    pub fn drain(&self) -> usize {
        usize::from(self.lock().slot.take().is_some())
    }

    /// Drop a pending outcome and wake every waiter with [`RecvError::Closed`].
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.slot = None;
        drop(state);
        self.ready.notify_all();
    }

    /// Accept outcomes again after [`close`](Self::close).
    pub fn reopen(&self) {
        let mut state = self.lock();
        state.closed = false;
        state.slot = None;
    }

    pub fn is_empty(&self) -> bool {
        self.lock().slot.is_none()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
