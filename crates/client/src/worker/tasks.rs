//! Registry for fire-and-forget cache writes.
//!
//! Responses go back to the caller before their cache copy is written.
//! Those writes run here so that tests (and shutdown) can wait for them.
//! Dropping the registry, or a `settle()` that has not finished, detaches
//! the remaining writes instead of aborting them.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::task::JoinSet;

/// Detached background work, tracked until it finishes.
#[derive(Debug, Default)]
pub struct BackgroundTasks {
    set: Mutex<JoinSet<()>>,
}

/// Tasks taken out of the registry by `settle()`.
struct Settling(JoinSet<()>);

impl Drop for Settling {
    fn drop(&mut self) {
        self.0.detach_all();
    }
}

fn log_failure(result: Result<(), tokio::task::JoinError>) {
    if let Err(err) = result {
        tracing::warn!(error = %err, "background task failed");
    }
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.set.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn a task on the current runtime. Finished tasks are reaped here.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self.lock();
        while let Some(result) = set.try_join_next() {
            log_failure(result);
        }
        set.spawn(task);
    }

    /// Number of tasks spawned and not yet reaped.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Wait for every task spawned before this call.
    ///
    /// Cancel-safe: tasks still running when the returned future is dropped
    /// keep running to completion, untracked.
    pub async fn settle(&self) {
        let mut settling = Settling(std::mem::take(&mut *self.lock()));
        while let Some(result) = settling.0.join_next().await {
            log_failure(result);
        }
    }
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        let set = self.set.get_mut().unwrap_or_else(PoisonError::into_inner);
        if !set.is_empty() {
            tracing::debug!(pending = set.len(), "detaching background tasks");
        }
        set.detach_all();
    }
}
