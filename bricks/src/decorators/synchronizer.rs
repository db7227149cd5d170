//! Parallel loading of two queries.

use crate::query::{Completion, Query};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

/// Loads two queries in parallel and completes once both have.
///
/// The results are delivered together, in the order the queries were given.
pub struct Zip<A, B> {
    shared: Arc<Pair<A, B>>,
}

struct Pair<A, B> {
    first: A,
    second: B,
}

/// One load's halves; whoever fills the second slot delivers.
struct Join<L, R> {
    left: Option<L>,
    right: Option<R>,
    completion: Option<Completion<(L, R)>>,
}

impl<L, R> Join<L, R> {
    fn ready(&mut self) -> Option<(Completion<(L, R)>, (L, R))> {
        if self.left.is_none() || self.right.is_none() {
            return None;
        }
        let completion = self.completion.take()?;
        let left = self.left.take()?;
        let right = self.right.take()?;
        Some((completion, (left, right)))
    }
}

impl<A, B> Zip<A, B> {
    /// Pairs `first` with `second`.
    pub fn new(first: A, second: B) -> Self {
        Self {
            shared: Arc::new(Pair { first, second }),
        }
    }
}

impl<A, B> Query for Zip<A, B>
where
    A: Query + 'static,
    B: Query + 'static,
{
    type Output = (A::Output, B::Output);

    fn load(&self, completion: Completion<Self::Output>) {
        let join = Arc::new(Mutex::new(Join {
            left: None,
            right: None,
            completion: Some(completion),
        }));

        let weak = Arc::downgrade(&self.shared);
        let left_join = Arc::clone(&join);
        self.shared.first.load(Box::new(move |output| {
            let ready = {
                let mut join = left_join.lock();
                join.left = Some(output);
                join.ready()
            };
            deliver(&weak, ready);
        }));

        let weak = Arc::downgrade(&self.shared);
        self.shared.second.load(Box::new(move |output| {
            let ready = {
                let mut guard = join.lock();
                guard.right = Some(output);
                guard.ready()
            };
            deliver(&weak, ready);
        }));
    }
}

fn deliver<A, B, L, R>(weak: &Weak<Pair<A, B>>, ready: Option<(Completion<(L, R)>, (L, R))>) {
    if let Some((completion, outputs)) = ready {
        if weak.strong_count() > 0 {
            completion(outputs);
        }
    }
}

impl<A, B> fmt::Debug for Zip<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zip").finish_non_exhaustive()
    }
}
