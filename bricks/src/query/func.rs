//! Closure-backed queries.

use super::{Completion, Query};
use std::fmt;
use std::marker::PhantomData;

/// A query backed by a closure that receives the completion.
///
/// ```rust,ignore
/// let query = FnQuery::new(|completion: Completion<u32>| completion(42));
/// ```
pub struct FnQuery<F, R> {
    func: F,
    _output: PhantomData<fn() -> R>,
}

impl<F, R> FnQuery<F, R>
where
    F: Fn(Completion<R>) + Send + Sync,
    R: Send + 'static,
{
    /// Creates a query that calls `func` on every load.
    pub fn new(func: F) -> Self {
        Self {
            func,
            _output: PhantomData,
        }
    }
}

impl<F, R> Query for FnQuery<F, R>
where
    F: Fn(Completion<R>) + Send + Sync,
    R: Send + 'static,
{
    type Output = R;

    fn load(&self, completion: Completion<R>) {
        (self.func)(completion);
    }
}

impl<F, R> fmt::Debug for FnQuery<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnQuery").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ResultRecorder;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_fn_query_runs_closure_per_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let query = FnQuery::new(move |completion: Completion<usize>| {
            let n = calls_clone.fetch_add(1, Ordering::SeqCst);
            completion(n);
        });
        let recorder = ResultRecorder::new();

        query.load(recorder.completion());
        query.load(recorder.completion());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(recorder.results(), vec![0, 1]);
    }
}
