//! Cancellation token for render jobs
//!
//! Allows an in-flight page render to be cancelled cooperatively. The
//! worker checks the token before and after rendering and abandons the
//! job quietly when it has been cancelled.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Cancellation token for cooperative job cancellation
///
/// Clones share the same underlying state via `Arc`, so the UI thread can
/// keep one clone per page slot while the worker holds another.
///
/// # Example
///
/// ```
/// use pdfmark_scheduler::CancellationToken;
///
/// let token = CancellationToken::new();
/// let worker_token = token.clone();
///
/// token.cancel();
/// assert!(worker_token.is_cancelled());
/// ```
#[derive(Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new token in the non-cancelled state.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel this token
    ///
    /// All clones observe the cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check if `cancel()` has been called on this token or any clone.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
