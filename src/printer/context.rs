//! Run-scoped state owned by the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Setter side of a run's cancellation flag.
///
/// The controller keeps one clone so `stop()` can flip the flag from any
/// thread; the loop samples it once per iteration, after the wait.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Reads and clears the flag.
    pub(crate) fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// Loop state for a single run. Created on start, dropped on exit.
#[derive(Debug)]
pub struct RunContext {
    /// 1-based page currently being produced; 0 before the first capture.
    pub current_iteration: u32,
    cancel: CancelToken,
}

impl RunContext {
    pub(crate) fn new(cancel: CancelToken) -> Self {
        Self {
            current_iteration: 0,
            cancel,
        }
    }

    pub(crate) fn take_cancel(&self) -> bool {
        self.cancel.take()
    }
}
