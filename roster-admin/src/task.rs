//! Delayed tasks owned by a component
//!
//! A [`DelayedTask`] runs a future after a fixed delay unless it is cancelled
//! first. Tasks are created from a parent [`CancellationToken`] so that
//! tearing down the owning component cancels every pending timer. Dropping
//! the handle cancels the task as well.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct DelayedTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl DelayedTask {
    /// Schedule `action` to run after `delay`
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(parent: &CancellationToken, delay: Duration, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = parent.child_token();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => action().await,
            }
        });
        Self { cancel, handle }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Neither cancelled nor finished
    pub fn is_pending(&self) -> bool {
        !self.cancel.is_cancelled() && !self.handle.is_finished()
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
