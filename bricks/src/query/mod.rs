//! The query contract.
//!
//! A [`Query`] is an asynchronous operation that hands exactly one result to
//! the completion it is given. Loading never blocks the caller; the
//! completion may run later and on any thread. Every component in this crate
//! is itself a query, which is what lets them nest.

mod erased;
mod ext;
mod func;

pub use erased::AnyQuery;
pub use ext::{FailableQueryExt, QueryExt};
pub use func::FnQuery;

use std::sync::Arc;

/// Callback receiving the result of one load.
pub type Completion<R> = Box<dyn FnOnce(R) + Send + 'static>;

/// An asynchronous operation delivering one result per call.
///
/// Implementations must invoke `completion` exactly once per `load`, unless
/// they are torn down first, in which case dropping it uninvoked is the only
/// acceptable alternative.
pub trait Query: Send + Sync {
    /// The value handed to the completion.
    type Output: Send + 'static;

    /// Starts a load and reports its result through `completion`.
    fn load(&self, completion: Completion<Self::Output>);
}

/// A query whose result is a `Result`.
///
/// Implemented for every query with a `Result` output, in the same way
/// `futures` implements `TryFuture` for futures of results. Bounds can then
/// name `Success` and `Failure` without extra type parameters.
pub trait FailableQuery: Query {
    /// The value of a successful load.
    type Success: Send + 'static;
    /// The error of a failed load.
    type Failure: Send + 'static;

    /// Same as [`Query::load`], typed in terms of `Success` and `Failure`.
    fn load_result(&self, completion: Completion<Result<Self::Success, Self::Failure>>);
}

impl<Q, T, E> FailableQuery for Q
where
    Q: Query<Output = Result<T, E>> + ?Sized,
    T: Send + 'static,
    E: Send + 'static,
{
    type Success = T;
    type Failure = E;

    fn load_result(&self, completion: Completion<Result<T, E>>) {
        self.load(completion);
    }
}

impl<Q: Query + ?Sized> Query for Box<Q> {
    type Output = Q::Output;

    fn load(&self, completion: Completion<Self::Output>) {
        (**self).load(completion);
    }
}

impl<Q: Query + ?Sized> Query for Arc<Q> {
    type Output = Q::Output;

    fn load(&self, completion: Completion<Self::Output>) {
        (**self).load(completion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ResultRecorder, StubQuery};

    #[test]
    fn test_boxed_and_shared_queries_forward() {
        let recorder = ResultRecorder::new();

        let boxed: Box<dyn Query<Output = u32>> = Box::new(StubQuery::new(7));
        boxed.load(recorder.completion());

        let shared = Arc::new(StubQuery::new(8));
        shared.load(recorder.completion());

        assert_eq!(recorder.results(), vec![7, 8]);
    }

    fn assert_failable<Q: FailableQuery<Success = u32, Failure = String>>(_query: &Q) {}

    #[test]
    fn test_result_queries_are_failable() {
        let query = StubQuery::new(Ok::<u32, String>(1));
        assert_failable(&query);
    }
}
