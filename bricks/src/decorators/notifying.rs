//! Success and failure hooks.

use crate::query::{Completion, FailableQuery, Query};
use std::fmt;
use std::sync::Arc;

type Hook<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Passes results through unchanged, calling a hook on each one first.
pub struct Notifying<Q: FailableQuery> {
    shared: Arc<Shared<Q>>,
}

struct Shared<Q: FailableQuery> {
    query: Q,
    on_success: Hook<Q::Success>,
    on_failure: Hook<Q::Failure>,
}

impl<Q: FailableQuery> Notifying<Q> {
    /// Wraps `query` with the two hooks.
    pub fn new<F, G>(query: Q, on_success: F, on_failure: G) -> Self
    where
        F: Fn(&Q::Success) + Send + Sync + 'static,
        G: Fn(&Q::Failure) + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                query,
                on_success: Box::new(on_success),
                on_failure: Box::new(on_failure),
            }),
        }
    }
}

impl<Q> Query for Notifying<Q>
where
    Q: FailableQuery + 'static,
{
    type Output = Result<Q::Success, Q::Failure>;

    fn load(&self, completion: Completion<Self::Output>) {
        let weak = Arc::downgrade(&self.shared);
        self.shared.query.load_result(Box::new(move |result| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            match &result {
                Ok(value) => (shared.on_success)(value),
                Err(err) => (shared.on_failure)(err),
            }
            completion(result);
        }));
    }
}

impl<Q: FailableQuery> fmt::Debug for Notifying<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifying").finish_non_exhaustive()
    }
}
