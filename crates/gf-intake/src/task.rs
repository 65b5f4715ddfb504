//! Cancellable background task handle.

use std::future::Future;

use tokio::task::JoinHandle;

/// Owns one spawned tokio task.
///
/// `cancel` aborts the task and is idempotent; dropping the handle cancels
/// too, so a handle going out of scope never leaves an orphaned timer.
#[derive(Debug, Default)]
pub struct TaskHandle {
    name:  &'static str,
    inner: Option<JoinHandle<()>>,
}

impl TaskHandle {
    /// Spawn `fut` on the current runtime.
    pub fn spawn<F>(name: &'static str, fut: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::trace!(task = name, "spawned");
        Self { name, inner: Some(tokio::spawn(fut)) }
    }

    /// A handle that owns nothing.
    pub fn idle(name: &'static str) -> Self {
        Self { name, inner: None }
    }

    /// `true` while the task exists and has not finished.
    pub fn is_running(&self) -> bool {
        self.inner.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Abort the task.  Returns `true` if something was still running.
    pub fn cancel(&mut self) -> bool {
        match self.inner.take() {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                if was_running {
                    tracing::trace!(task = self.name, "cancelled");
                }
                was_running
            }
            None => false,
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
