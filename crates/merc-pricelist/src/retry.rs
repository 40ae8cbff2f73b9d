//! Single-flight scheduled retries.
//!
//! Replaces ad-hoc timer chains with one cancellable handle per
//! concern: scheduling a new retry supersedes any pending one, so two
//! timers for the same concern can never be in flight together.

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A single-flight slot for one scheduled task.
#[derive(Debug, Default)]
pub struct RetrySlot {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RetrySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay`, aborting any previously scheduled run.
    pub fn schedule<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        if let Some(previous) = self.handle.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Abort the pending run, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }

    /// True iff a run is scheduled and has not completed.
    pub fn is_scheduled(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for RetrySlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
