//! Cooperative cancellation shared by every pipeline stage.

use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Broadcast stop signal for one run.
///
/// Clones share the same state. Cancelling is one-way and idempotent.
/// Besides the flag, the token owns a channel nobody ever sends on; cancelling
/// drops its only sender, which makes [`CancellationToken::done`] ready in
/// every `select!` at once.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<TokenState>,
}

#[derive(Debug)]
struct TokenState {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (trigger, done) = bounded(0);
        Self {
            inner: Arc::new(TokenState {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                done,
            }),
        }
    }

    /// Request that every stage stop. Cancelling twice is harmless.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }

        let trigger = match self.inner.trigger.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(trigger);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Channel that becomes ready (disconnected) once cancelled
    pub fn done(&self) -> &Receiver<()> {
        &self.inner.done
    }

    /// Take the next value from `rx` unless cancellation comes first.
    ///
    /// Returns `None` once cancelled or when `rx` has no senders left and is
    /// drained.
    pub fn recv_or_cancel<T>(&self, rx: &Receiver<T>) -> Option<T> {
        if self.is_cancelled() {
            return None;
        }

        select! {
            recv(rx) -> msg => msg.ok().filter(|_| !self.is_cancelled()),
            recv(self.inner.done) -> _ => None,
        }
    }

    /// Hand `value` to `tx` unless cancellation comes first.
    ///
    /// Returns `false` if cancelled or every receiver is gone; the value is
    /// dropped in that case.
    pub fn send_or_cancel<T>(&self, tx: &Sender<T>, value: T) -> bool {
        if self.is_cancelled() {
            return false;
        }

        select! {
            send(tx, value) -> sent => sent.is_ok(),
            recv(self.inner.done) -> _ => false,
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancels the token when dropped, on every exit path of the owning scope
pub(crate) struct CancelGuard<'a> {
    token: &'a CancellationToken,
}

impl<'a> CancelGuard<'a> {
    pub(crate) fn new(token: &'a CancellationToken) -> Self {
        Self { token }
    }
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
