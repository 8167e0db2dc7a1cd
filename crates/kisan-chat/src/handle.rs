//! A cloneable handle for aborting a session's request from another task.

use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio_util::sync::CancellationToken;

/// Cloneable handle onto a running [`ChatSession`](crate::ChatSession).
#[derive(Clone)]
pub struct ChatHandle {
    pub(crate) cancel: Arc<Mutex<CancellationToken>>,
    pub(crate) is_streaming: Arc<AtomicBool>,
}

impl ChatHandle {
    pub(crate) fn new() -> Self {
        Self {
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            is_streaming: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Abort the in-flight request, keeping whatever text already arrived.
    pub fn abort(&self) {
        self.cancel.lock().cancel();
    }

    /// Whether a response is currently streaming.
    pub fn is_streaming(&self) -> bool {
        self.is_streaming.load(Ordering::Acquire)
    }

    /// Install a fresh token for the next request and return a clone of it.
    pub(crate) fn reset(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.cancel.lock() = token.clone();
        token
    }
}
