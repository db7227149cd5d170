//! Parameterized one-shot queries.

use crate::query::{Completion, Query};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Executes an action described by a parameter and reports its result.
///
/// A query cannot take parameters, so the command builds a fresh query from
/// each parameter and loads it exactly once. The query is kept alive until
/// it completes, then discarded.
pub struct Command<P, Q> {
    build: Box<dyn Fn(P) -> Q + Send + Sync>,
}

impl<P, Q> Command<P, Q>
where
    Q: Query + 'static,
{
    /// Creates a command from a query builder.
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(P) -> Q + Send + Sync + 'static,
    {
        Self {
            build: Box::new(build),
        }
    }

    /// Builds the query for `param` and loads it.
    pub fn execute(&self, param: P, completion: Completion<Q::Output>) {
        let query = Arc::new((self.build)(param));
        let retained = Arc::clone(&query);
        trace!("executing command");
        query.load(Box::new(move |result| {
            drop(retained);
            completion(result);
        }));
    }
}

impl<P, Q> fmt::Debug for Command<P, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryExt;
    use crate::testing::{QuerySpy, ResultRecorder, StubQuery};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builds_query_from_each_param() {
        let command = Command::new(|name: &'static str| StubQuery::new(format!("hello {name}")));
        let recorder = ResultRecorder::new();

        command.execute("a", recorder.completion());
        command.execute("b", recorder.completion());

        assert_eq!(recorder.results(), vec!["hello a", "hello b"]);
    }

    #[test]
    fn test_query_lives_until_completion() {
        let spy = QuerySpy::<Result<u32, String>>::new();
        let builder_spy = spy.clone();
        let command = Command::new(move |delta: u32| {
            builder_spy.clone().map(move |result| result.map(|n| n + delta))
        });
        let recorder = ResultRecorder::new();

        command.execute(10, recorder.completion());
        spy.complete(0, Ok(1));

        assert_eq!(recorder.results(), vec![Ok(11)]);
    }
}
