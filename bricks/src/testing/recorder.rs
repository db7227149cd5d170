//! Recording completions.

use crate::query::Completion;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Collects every result delivered to completions it hands out.
///
/// Clones share the same log.
pub struct ResultRecorder<R> {
    results: Arc<Mutex<Vec<R>>>,
}

impl<R: Send + 'static> ResultRecorder<R> {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            results: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns a completion that records its result here.
    #[must_use]
    pub fn completion(&self) -> Completion<R> {
        let results = Arc::clone(&self.results);
        Box::new(move |result| results.lock().push(result))
    }

    /// Records a result directly.
    pub fn record(&self, result: R) {
        self.results.lock().push(result);
    }

    /// Number of recorded results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.lock().is_empty()
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&self) -> Vec<R> {
        std::mem::take(&mut *self.results.lock())
    }
}

impl<R: Clone + Send + 'static> ResultRecorder<R> {
    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn results(&self) -> Vec<R> {
        self.results.lock().clone()
    }
}

impl<R: Send + 'static> Default for ResultRecorder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for ResultRecorder<R> {
    fn clone(&self) -> Self {
        Self {
            results: Arc::clone(&self.results),
        }
    }
}

impl<R> fmt::Debug for ResultRecorder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultRecorder")
            .field("len", &self.results.lock().len())
            .finish()
    }
}
