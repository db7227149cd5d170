//! Cancellable one-shot deadlines.

use super::CancellationToken;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Schedules work to run once after a delay unless cancelled first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadline;

impl Deadline {
    /// Runs `on_expiry` after `after` unless the returned guard is cancelled
    /// or dropped first.
    ///
    /// Inside a Tokio runtime the wait is a spawned sleep task, which honours
    /// paused test time. Elsewhere a named timer thread waits on the guard's
    /// token.
    pub fn schedule<F>(after: Duration, on_expiry: F) -> DeadlineGuard
    where
        F: FnOnce() + Send + 'static,
    {
        let token = Arc::new(CancellationToken::new());
        let task = match Handle::try_current() {
            Ok(handle) => {
                let token = Arc::clone(&token);
                Some(handle.spawn(async move {
                    tokio::time::sleep(after).await;
                    if !token.is_cancelled() {
                        on_expiry();
                    }
                }))
            }
            Err(_) => {
                spawn_timer_thread(after, Arc::clone(&token), on_expiry);
                None
            }
        };
        trace!(?after, "deadline scheduled");
        DeadlineGuard { token, task }
    }
}

fn spawn_timer_thread<F>(after: Duration, token: Arc<CancellationToken>, on_expiry: F)
where
    F: FnOnce() + Send + 'static,
{
    let spawned = std::thread::Builder::new()
        .name("bricks-deadline".to_string())
        .spawn(move || {
            if !token.wait_timeout(after) {
                on_expiry();
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "failed to start deadline thread; deadline will not fire");
    }
}

/// Handle to a scheduled deadline. Dropping it cancels the deadline.
#[must_use = "dropping the guard cancels the deadline"]
pub struct DeadlineGuard {
    token: Arc<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl DeadlineGuard {
    /// Cancels the deadline. Does nothing if it already fired.
    pub fn cancel(&self) {
        self.token.cancel();
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    /// Returns true once the deadline was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for DeadlineGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for DeadlineGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeadlineGuard")
            .field("cancelled", &self.is_cancelled())
            .field("on_runtime", &self.task.is_some())
            .finish()
    }
}
