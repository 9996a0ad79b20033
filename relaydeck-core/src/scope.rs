//! Lifecycle-bound task scope
//!
//! Every task a view model launches is owned by its scope. Cancelling the
//! scope, explicitly or by dropping it, aborts all of them, including
//! requests still waiting on a collaborator.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use tokio::task::JoinSet;
use tracing::debug;

#[derive(Debug)]
pub struct ViewModelScope {
    tasks: Mutex<Option<JoinSet<()>>>,
}

impl ViewModelScope {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(Some(JoinSet::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<JoinSet<()>>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Spawn `task` on the current runtime, owned by this scope
    ///
    /// Returns `false` without spawning once the scope has been cancelled.
    pub fn launch<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut guard = self.lock();
        match guard.as_mut() {
            Some(tasks) => {
                // Reap finished tasks so the set does not grow unbounded
                while tasks.try_join_next().is_some() {}
                tasks.spawn(task);
                true
            }
            None => {
                debug!("Scope cancelled, dropping launched task");
                false
            }
        }
    }

    /// Abort every task and refuse new ones
    pub fn cancel(&self) {
        if let Some(mut tasks) = self.lock().take() {
            debug!(running = tasks.len(), "Cancelling view model scope");
            tasks.abort_all();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.lock().is_none()
    }

    /// Number of tasks that have not been reaped yet
    pub fn task_count(&self) -> usize {
        self.lock().as_ref().map_or(0, JoinSet::len)
    }
}

impl Default for ViewModelScope {
    fn default() -> Self {
        Self::new()
    }
}
