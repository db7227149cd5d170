//! Storage-backed cache gated by a timestamp policy.

use crate::errors::CacheError;
use crate::query::{Completion, Query};
use crate::storage::{Storage, TimestampValidationPolicy};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Loads from a storage while its timestamp passes the validation policy.
///
/// A rejected timestamp completes with [`CacheError::Expired`] without
/// touching the storage. Storage failures are passed on as they are.
pub struct ExpiringCache<S, P> {
    shared: Arc<Shared<S, P>>,
}

struct Shared<S, P> {
    storage: S,
    policy: P,
}

impl<S, P> ExpiringCache<S, P>
where
    S: Storage,
    P: TimestampValidationPolicy,
{
    /// Creates a cache over `storage` validated by `policy`.
    pub fn new(storage: S, policy: P) -> Self {
        Self {
            shared: Arc::new(Shared { storage, policy }),
        }
    }

    /// Returns the backing storage.
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.shared.storage
    }
}

impl<S, P> Query for ExpiringCache<S, P>
where
    S: Storage + 'static,
    P: TimestampValidationPolicy + 'static,
{
    type Output = anyhow::Result<S::Value>;

    fn load(&self, completion: Completion<Self::Output>) {
        let timestamp = self.shared.storage.timestamp();
        if !self.shared.policy.validate(timestamp) {
            debug!(?timestamp, "cache expired");
            completion(Err(CacheError::Expired.into()));
            return;
        }

        let weak = Arc::downgrade(&self.shared);
        self.shared.storage.load(Box::new(move |result| {
            if weak.strong_count() > 0 {
                completion(result);
            }
        }));
    }
}

impl<S, P> fmt::Debug for ExpiringCache<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCache").finish_non_exhaustive()
    }
}
