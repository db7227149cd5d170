//! Type-erased query handle.

use super::{Completion, Query};
use std::fmt;
use std::sync::Arc;

/// A cloneable, type-erased query.
///
/// Clones share the same underlying query.
pub struct AnyQuery<R> {
    inner: Arc<dyn Query<Output = R>>,
}

impl<R: Send + 'static> AnyQuery<R> {
    /// Erases the concrete type of `query`.
    pub fn new<Q>(query: Q) -> Self
    where
        Q: Query<Output = R> + 'static,
    {
        Self {
            inner: Arc::new(query),
        }
    }

    /// Wraps an already shared query without another allocation.
    #[must_use]
    pub fn from_arc(inner: Arc<dyn Query<Output = R>>) -> Self {
        Self { inner }
    }
}

impl<R> Clone for AnyQuery<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Send + 'static> Query for AnyQuery<R> {
    type Output = R;

    fn load(&self, completion: Completion<R>) {
        self.inner.load(completion);
    }
}

impl<R> fmt::Debug for AnyQuery<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyQuery").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{QuerySpy, ResultRecorder};

    #[test]
    fn test_clones_share_the_wrapped_query() {
        let spy = QuerySpy::<&'static str>::new();
        let erased = AnyQuery::new(spy.clone());
        let copy = erased.clone();
        let recorder = ResultRecorder::new();

        erased.load(recorder.completion());
        copy.load(recorder.completion());

        assert_eq!(spy.load_count(), 2);
        spy.complete(0, "first");
        spy.complete(1, "second");
        assert_eq!(recorder.results(), vec!["first", "second"]);
    }
}
