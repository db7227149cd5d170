//! Fan-out configuration.

use super::Priority;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default deadline for one fan-out batch.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Configuration for a [`PriorityFanOut`](super::PriorityFanOut).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanOutConfig {
    /// Items at or above this priority are mandatory.
    pub mandatory_priority: Priority,
    /// Deadline for each batch in milliseconds.
    pub timeout_ms: u64,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            mandatory_priority: Priority::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl FanOutConfig {
    /// Creates the default config: every item mandatory, 30 second deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the mandatory threshold.
    #[must_use]
    pub const fn with_mandatory_priority(mut self, priority: Priority) -> Self {
        self.mandatory_priority = priority;
        self
    }

    /// Sets the batch deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// The batch deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
