//! Trailing-edge debounce of raw search input
//!
//! The raw value is updated synchronously on every keystroke. The debounced
//! value, which drives filtering, follows it only after the input has been
//! quiet for the configured delay. Clearing the input bypasses the delay.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::task::DelayedTask;

pub struct SearchDebouncer {
    delay: Duration,
    raw: String,
    debounced: Arc<watch::Sender<String>>,
    pending: Option<DelayedTask>,
    teardown: CancellationToken,
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(String::new());
        Self {
            delay,
            raw: String::new(),
            debounced: Arc::new(tx),
            pending: None,
            teardown: CancellationToken::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a new raw input value
    ///
    /// Any pending timer is cancelled. An empty value is applied immediately;
    /// anything else is applied once `delay` elapses without another call.
    /// Must be called from within a tokio runtime.
    pub fn set_raw(&mut self, value: impl Into<String>) {
        let value = value.into();
        if let Some(task) = self.pending.take() {
            task.cancel();
        }
        self.raw = value.clone();

        if value.is_empty() {
            self.debounced.send_replace(String::new());
            return;
        }

        let debounced = self.debounced.clone();
        self.pending = Some(DelayedTask::schedule(&self.teardown, self.delay, move || async move {
            debug!(term = %value, "Search term settled");
            debounced.send_replace(value);
        }));
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Term currently used for filtering
    pub fn debounced(&self) -> String {
        self.debounced.borrow().clone()
    }

    /// Input is waiting to settle
    pub fn is_searching(&self) -> bool {
        !self.raw.is_empty() && *self.debounced.borrow() != self.raw
    }

    /// Receive every change of the debounced value
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.debounced.subscribe()
    }

    /// Cancel the pending timer; later input is still accepted
    pub fn teardown(&mut self) {
        self.teardown.cancel();
        self.pending = None;
        self.teardown = CancellationToken::new();
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.teardown.cancel();
    }
}
