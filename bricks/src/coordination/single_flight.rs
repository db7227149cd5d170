//! Single-flight coordination over one wrapped query.

use super::PendingCallbacks;
use crate::query::{Completion, Query};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Collapses concurrent loads of a query into one underlying load.
///
/// The first caller starts the wrapped load; callers arriving while it is in
/// flight only queue their completion. When the load resolves, every queued
/// completion receives the same result. Nothing is cached: the next call
/// after resolution starts a fresh load.
///
/// Dropping the coordinator while a load is in flight drops the queued
/// completions uninvoked.
pub struct SingleFlight<Q: Query> {
    shared: Arc<Shared<Q>>,
}

struct Shared<Q: Query> {
    query: Q,
    pending: Mutex<PendingCallbacks<Q::Output>>,
}

impl<Q> SingleFlight<Q>
where
    Q: Query,
    Q::Output: Clone,
{
    /// Wraps `query`.
    pub fn new(query: Q) -> Self {
        Self {
            shared: Arc::new(Shared {
                query,
                pending: Mutex::new(PendingCallbacks::new()),
            }),
        }
    }

    /// Returns true while a wrapped load is in flight.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        !self.shared.pending.lock().is_empty()
    }

    /// Number of callers waiting on the in-flight load.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.shared.pending.lock().len()
    }

    /// Returns the wrapped query.
    #[must_use]
    pub fn inner(&self) -> &Q {
        &self.shared.query
    }
}

impl<Q> Shared<Q>
where
    Q: Query,
    Q::Output: Clone,
{
    fn complete_all(&self, result: Q::Output) {
        let delivery = self.pending.lock().take();
        debug!(waiters = delivery.len(), "single-flight load resolved");
        delivery.deliver(result);
    }
}

impl<Q> Query for SingleFlight<Q>
where
    Q: Query + 'static,
    Q::Output: Clone,
{
    type Output = Q::Output;

    fn load(&self, completion: Completion<Q::Output>) {
        let first = self.shared.pending.lock().push(completion);
        if !first {
            trace!("joined in-flight load");
            return;
        }

        debug!("starting single-flight load");
        let weak: Weak<Shared<Q>> = Arc::downgrade(&self.shared);
        self.shared.query.load(Box::new(move |result| {
            match weak.upgrade() {
                Some(shared) => shared.complete_all(result),
                None => trace!("single-flight dropped before load resolved"),
            }
        }));
    }
}

impl<Q: Query> fmt::Debug for SingleFlight<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlight")
            .field("waiting", &self.shared.pending.lock().len())
            .finish_non_exhaustive()
    }
}
