//! Cancellation token for scheduled work.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// A one-way cancellation flag that sleepers can wait on.
///
/// Cancellation is idempotent.
#[derive(Default)]
pub struct CancellationToken {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the token and wakes every waiter.
    pub fn cancel(&self) {
        let mut cancelled = self.cancelled.lock();
        if !*cancelled {
            *cancelled = true;
            self.wake.notify_all();
        }
    }

    /// Returns whether the token has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.lock()
    }

    /// Blocks for up to `timeout`, returning early on cancellation.
    ///
    /// A timeout too large to represent as an `Instant` waits for
    /// cancellation only. Returns true if the token was cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut cancelled = self.cancelled.lock();
        match Instant::now().checked_add(timeout) {
            Some(deadline) => {
                while !*cancelled {
                    if self.wake.wait_until(&mut cancelled, deadline).timed_out() {
                        break;
                    }
                }
            }
            None => {
                while !*cancelled {
                    self.wake.wait(&mut cancelled);
                }
            }
        }
        *cancelled
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
