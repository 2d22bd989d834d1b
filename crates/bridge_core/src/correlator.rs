//! Correlation of cross-boundary calls with their tagged responses.

use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
    task::{Context, Poll},
};

use serde_json::Value;
use shared::{domain::CallId, protocol::ReplyFrame};
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::{CallError, CorrelationError};

/// Settled value of a call, `Err` when the far side flagged it as an error.
pub type CallOutcome = Result<Value, Value>;

#[derive(Default)]
pub struct CallCorrelator {
    last_id: AtomicU64,
    pending: Mutex<HashMap<CallId, oneshot::Sender<CallOutcome>>>,
}

impl CallCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh id, strictly greater than every id returned before. Starts at 1.
    pub fn next_id(&self) -> CallId {
        CallId(self.last_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn issue(&self, id: CallId) -> Result<PendingCall, CorrelationError> {
        let mut pending = self.lock();
        if pending.contains_key(&id) {
            return Err(CorrelationError::DuplicateCall { id });
        }
        let (tx, rx) = oneshot::channel();
        pending.insert(id, tx);
        debug!(call_id = id.0, "correlator: call issued");
        Ok(PendingCall { id, rx })
    }

    /// Settles the call registered under `id` and removes it.
    ///
    /// A response nobody asked for means both sides disagree about the
    /// outstanding calls; that is reported, never ignored.
    pub fn complete(&self, id: CallId, outcome: CallOutcome) -> Result<(), CorrelationError> {
        let sender = self
            .lock()
            .remove(&id)
            .ok_or(CorrelationError::UnknownCall { id })?;
        if sender.send(outcome).is_err() {
            debug!(call_id = id.0, "correlator: caller stopped waiting before settlement");
        }
        Ok(())
    }

    pub fn complete_frame(&self, frame: ReplyFrame) -> Result<(), CorrelationError> {
        let (id, outcome) = frame.into_outcome();
        self.complete(id, outcome)
    }

    /// Drops a pending call without settling it. Its awaiting side sees
    /// [`CallError::Abandoned`]; a later response for `id` is unknown.
    pub fn forget(&self, id: CallId) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub fn is_pending(&self, id: CallId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn outstanding(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CallId, oneshot::Sender<CallOutcome>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Asynchronous handle returned by [`CallCorrelator::issue`].
#[derive(Debug)]
pub struct PendingCall {
    id: CallId,
    rx: oneshot::Receiver<CallOutcome>,
}

impl PendingCall {
    pub fn id(&self) -> CallId {
        self.id
    }
}

impl Future for PendingCall {
    type Output = Result<Value, CallError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(Ok(value))) => Poll::Ready(Ok(value)),
            Poll::Ready(Ok(Err(value))) => Poll::Ready(Err(CallError::Rejected(value))),
            Poll::Ready(Err(_)) => Poll::Ready(Err(CallError::Abandoned)),
        }
    }
}

#[cfg(test)]
#[path = "tests/correlator_tests.rs"]
mod tests;
