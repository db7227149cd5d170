//! Result conversion.

use crate::query::{Completion, Query};
use std::fmt;
use std::sync::{Arc, Weak};

/// Converts every result of the wrapped query with a mapper.
pub struct Map<Q, F> {
    shared: Arc<Shared<Q, F>>,
}

struct Shared<Q, F> {
    query: Q,
    mapper: F,
}

impl<Q, F> Map<Q, F> {
    /// Wraps `query`, converting its results with `mapper`.
    pub fn new(query: Q, mapper: F) -> Self {
        Self {
            shared: Arc::new(Shared { query, mapper }),
        }
    }
}

impl<Q, F, R> Query for Map<Q, F>
where
    Q: Query + 'static,
    F: Fn(Q::Output) -> R + Send + Sync + 'static,
    R: Send + 'static,
{
    type Output = R;

    fn load(&self, completion: Completion<R>) {
        let weak: Weak<Shared<Q, F>> = Arc::downgrade(&self.shared);
        self.shared.query.load(Box::new(move |output| {
            if let Some(shared) = weak.upgrade() {
                completion((shared.mapper)(output));
            }
        }));
    }
}

impl<Q, F> fmt::Debug for Map<Q, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map").finish_non_exhaustive()
    }
}
