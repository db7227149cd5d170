//! Timestamp validation policies.

use chrono::{DateTime, Duration, Utc};

/// Decides whether a stored value is still fresh enough to serve.
#[cfg_attr(test, mockall::automock)]
pub trait TimestampValidationPolicy: Send + Sync {
    /// Returns true if a value saved at `timestamp` may be served.
    ///
    /// `None` means nothing has been saved.
    fn validate(&self, timestamp: Option<DateTime<Utc>>) -> bool;
}

impl<F> TimestampValidationPolicy for F
where
    F: Fn(Option<DateTime<Utc>>) -> bool + Send + Sync,
{
    fn validate(&self, timestamp: Option<DateTime<Utc>>) -> bool {
        self(timestamp)
    }
}

/// Accepts timestamps younger than a fixed age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxAge {
    max_age: Duration,
}

impl MaxAge {
    /// Accepts values saved less than `max_age` ago.
    #[must_use]
    pub const fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    /// The configured age limit.
    #[must_use]
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }
}

impl TimestampValidationPolicy for MaxAge {
    fn validate(&self, timestamp: Option<DateTime<Utc>>) -> bool {
        timestamp.is_some_and(|saved_at| Utc::now() - saved_at < self.max_age)
    }
}
