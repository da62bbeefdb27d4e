use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::sync::Notify;

/// Cancellation handle shared between a polling task and whoever may stop it.
///
/// `cancel` takes effect synchronously: the flag is visible to the next
/// `is_cancelled` check and any task sleeping in [`PollHandle::sleep`] wakes up
/// immediately. An in-flight request is not interrupted; callers check the
/// handle again before applying its response.
#[derive(Clone, Debug, Default)]
pub struct PollHandle {
    inner: Arc<PollHandleInner>,
}

#[derive(Debug, Default)]
struct PollHandleInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl PollHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Wait for `duration`. Returns `false` if the handle was cancelled before or during the wait.
    pub async fn sleep(&self, duration: Duration) -> bool {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.is_cancelled() {
            return false;
        }

        tokio::select! {
            _ = tokio::time::sleep(duration) => !self.is_cancelled(),
            _ = notified => false,
        }
    }
}
