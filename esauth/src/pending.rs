use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Cancellation state shared by an in-flight request and its handle.
#[derive(Debug, Default)]
pub(crate) struct PendingOperation {
    aborted: AtomicBool,
    notify: Notify,
}

impl PendingOperation {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Mark the operation aborted and wake the dispatch step.
    ///
    /// Calling it more than once has no further effect.
    pub(crate) fn abort(&self) {
        if !self.aborted.swap(true, Ordering::SeqCst) {
            // `notify_one` keeps a permit when nobody is waiting yet.
            self.notify.notify_one();
        }
    }

    pub(crate) fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Resolves once [`PendingOperation::abort`] has been called.
    pub(crate) async fn aborted(&self) {
        if self.is_aborted() {
            return;
        }
        self.notify.notified().await;
    }
}

/// Counts a request as open until dropped.
#[derive(Debug)]
pub(crate) struct OpenRequestGuard(Arc<AtomicUsize>);

impl OpenRequestGuard {
    pub(crate) fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for OpenRequestGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
