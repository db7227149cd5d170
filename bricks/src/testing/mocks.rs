//! Mock queries for testing.

use crate::query::{Completion, Query};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// A query that records every load and lets the test complete it later.
///
/// Clones share state, so a test can hand one clone to the component under
/// test and keep another to drive completions.
pub struct QuerySpy<R> {
    state: Arc<Mutex<SpyState<R>>>,
}

struct SpyState<R> {
    load_count: usize,
    completions: Vec<Option<Completion<R>>>,
}

impl<R: Send + 'static> QuerySpy<R> {
    /// Creates a spy with no recorded loads.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SpyState {
                load_count: 0,
                completions: Vec::new(),
            })),
        }
    }

    /// Number of times `load` was called.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.state.lock().load_count
    }

    /// Number of loads that have not been completed yet.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.state
            .lock()
            .completions
            .iter()
            .filter(|c| c.is_some())
            .count()
    }

    /// Completes the `index`-th load with `result`.
    ///
    /// The completion runs outside the spy's lock, so it may call `load`
    /// again.
    ///
    /// # Panics
    ///
    /// Panics if no such load was recorded or it was already completed.
    pub fn complete(&self, index: usize, result: R) {
        let completion = self
            .state
            .lock()
            .completions
            .get_mut(index)
            .and_then(Option::take);
        match completion {
            Some(completion) => completion(result),
            None => panic!("no outstanding load at index {index}"),
        }
    }

    /// Completes the most recent load with `result`.
    ///
    /// # Panics
    ///
    /// Panics if nothing was loaded.
    pub fn complete_last(&self, result: R) {
        let Some(index) = self.load_count().checked_sub(1) else {
            panic!("no load recorded");
        };
        self.complete(index, result);
    }
}

impl<R: Send + 'static> Default for QuerySpy<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for QuerySpy<R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<R: Send + 'static> Query for QuerySpy<R> {
    type Output = R;

    fn load(&self, completion: Completion<R>) {
        let mut state = self.state.lock();
        state.load_count += 1;
        state.completions.push(Some(completion));
    }
}

impl<R> fmt::Debug for QuerySpy<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("QuerySpy")
            .field("load_count", &state.load_count)
            .finish_non_exhaustive()
    }
}

/// A query that completes synchronously with a fixed value.
#[derive(Debug, Clone)]
pub struct StubQuery<R> {
    value: R,
}

impl<R: Clone> StubQuery<R> {
    /// Creates a stub that always yields `value`.
    pub const fn new(value: R) -> Self {
        Self { value }
    }
}

impl<R: Clone + Send + Sync + 'static> Query for StubQuery<R> {
    type Output = R;

    fn load(&self, completion: Completion<R>) {
        completion(self.value.clone());
    }
}
