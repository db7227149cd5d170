//! Write-through storage of successful results.

use crate::query::{Completion, FailableQuery, Query};
use crate::storage::SynchronousStorage;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Saves every successful value into a storage, then passes the result on.
///
/// Failures are passed on without touching the storage.
pub struct Storing<Q, S> {
    shared: Arc<Shared<Q, S>>,
}

struct Shared<Q, S> {
    query: Q,
    storage: S,
}

impl<Q, S> Storing<Q, S>
where
    Q: FailableQuery,
    S: SynchronousStorage<Value = Q::Success>,
{
    /// Wraps `query`, saving its successes into `storage`.
    pub fn new(query: Q, storage: S) -> Self {
        Self {
            shared: Arc::new(Shared { query, storage }),
        }
    }

    /// Returns the storage successes are written to.
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.shared.storage
    }
}

impl<Q, S> Query for Storing<Q, S>
where
    Q: FailableQuery + 'static,
    Q::Success: Clone,
    S: SynchronousStorage<Value = Q::Success> + 'static,
{
    type Output = Result<Q::Success, Q::Failure>;

    fn load(&self, completion: Completion<Self::Output>) {
        let weak = Arc::downgrade(&self.shared);
        self.shared.query.load_result(Box::new(move |result| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            if let Ok(value) = &result {
                trace!("storing loaded value");
                shared.storage.save(value.clone());
            }
            completion(result);
        }));
    }
}

impl<Q, S> fmt::Debug for Storing<Q, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storing").finish_non_exhaustive()
    }
}
