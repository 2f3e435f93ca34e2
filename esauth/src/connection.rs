use std::sync::Arc;

use crate::pending::PendingOperation;
use crate::{RequestParams, Result};

/// Response handed to the callback: status and headers are in, the body is still streaming.
pub type Response = reqwest::Response;

/// Completion callback, called at most once per request.
pub type Callback = Box<dyn FnOnce(Result<Response>) + Send + 'static>;

/// Connection is the transport contract a search client drives.
pub trait Connection: Send + Sync {
    /// Start a request and report its outcome through `callback`.
    ///
    /// The returned handle aborts the request in any state. Called outside a tokio
    /// runtime, the callback receives a connection error before this returns.
    fn request(&self, params: RequestParams, callback: Callback) -> RequestHandle;

    /// Number of requests started but not yet finished.
    fn open_requests(&self) -> usize;
}

/// Handle to abort an in-flight request.
#[derive(Debug, Clone, Default)]
pub struct RequestHandle {
    pending: Option<Arc<PendingOperation>>,
}

impl RequestHandle {
    pub(crate) fn new(pending: Arc<PendingOperation>) -> Self {
        Self {
            pending: Some(pending),
        }
    }

    /// A handle whose abort does nothing.
    pub(crate) fn noop() -> Self {
        Self { pending: None }
    }

    /// Abort the request.
    ///
    /// While credentials are loading the request is dropped without an outcome; after
    /// that the callback receives a request aborted error. After completion this is a no-op.
    pub fn abort(&self) {
        if let Some(pending) = &self.pending {
            pending.abort();
        }
    }
}
