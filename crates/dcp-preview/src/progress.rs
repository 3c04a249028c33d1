//! Progress reporting and cancellation

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Progress sink polled by long-running validation
pub trait ProgressMonitor {
    /// Whether the caller asked to stop
    fn is_cancelled(&self) -> bool;

    /// Report `n` units of finished work
    fn step(&self, n: usize);
}

/// Monitor that never cancels and ignores progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressMonitor for NullProgress {
    fn is_cancelled(&self) -> bool {
        false
    }

    fn step(&self, _n: usize) {}
}

/// Cloneable cancellation flag with a step counter
///
/// Clones share state, so one clone can be handed to the resolver while
/// another cancels from elsewhere.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    steps: Arc<AtomicUsize>,
    limit: Option<usize>,
}

impl CancellationToken {
    /// Create new token
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that cancels itself once `steps` units were reported
    #[inline]
    #[must_use]
    pub fn cancel_after(steps: usize) -> Self {
        Self {
            limit: Some(steps),
            ..Self::default()
        }
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Units reported so far
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::SeqCst)
    }
}

impl ProgressMonitor for CancellationToken {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn step(&self, n: usize) {
        let done = self.steps.fetch_add(n, Ordering::SeqCst) + n;
        if self.limit.is_some_and(|limit| done >= limit) {
            self.cancel();
        }
    }
}
