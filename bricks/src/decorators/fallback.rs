//! Primary/secondary failover.
//!
//! Two flavours that differ only in the error reported when both sides fail:
//! [`Fallback`] reports the secondary's, [`SecondChance`] the primary's.

use crate::query::{Completion, FailableQuery, Query};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

struct Pair<P, S> {
    primary: P,
    secondary: S,
}

/// Loads the primary query and, if it fails, the secondary one.
///
/// The secondary's result is delivered as-is, error included.
pub struct Fallback<P, S> {
    shared: Arc<Pair<P, S>>,
}

impl<P, S> Fallback<P, S> {
    /// Creates a fallback from `primary` to `secondary`.
    pub fn new(primary: P, secondary: S) -> Self {
        Self {
            shared: Arc::new(Pair { primary, secondary }),
        }
    }
}

impl<P, S> Query for Fallback<P, S>
where
    P: FailableQuery + 'static,
    S: FailableQuery<Success = P::Success> + 'static,
{
    type Output = Result<P::Success, S::Failure>;

    fn load(&self, completion: Completion<Self::Output>) {
        let weak = Arc::downgrade(&self.shared);
        self.shared.primary.load_result(Box::new(move |result| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            match result {
                Ok(value) => completion(Ok(value)),
                Err(_) => {
                    debug!("primary failed, loading fallback");
                    let weak = Arc::downgrade(&shared);
                    shared
                        .secondary
                        .load_result(Box::new(move |result| deliver_if_alive(&weak, completion, result)));
                }
            }
        }));
    }
}

/// Loads the primary query and, if it fails, gives the secondary one a try.
///
/// When both fail the primary's error is delivered; the secondary's is
/// dropped.
pub struct SecondChance<P, S> {
    shared: Arc<Pair<P, S>>,
}

impl<P, S> SecondChance<P, S> {
    /// Creates a second chance from `primary` to `secondary`.
    pub fn new(primary: P, secondary: S) -> Self {
        Self {
            shared: Arc::new(Pair { primary, secondary }),
        }
    }
}

impl<P, S> Query for SecondChance<P, S>
where
    P: FailableQuery + 'static,
    S: FailableQuery<Success = P::Success> + 'static,
{
    type Output = Result<P::Success, P::Failure>;

    fn load(&self, completion: Completion<Self::Output>) {
        let weak = Arc::downgrade(&self.shared);
        self.shared.primary.load_result(Box::new(move |result| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            match result {
                Ok(value) => completion(Ok(value)),
                Err(primary_err) => {
                    debug!("primary failed, giving secondary a chance");
                    let weak = Arc::downgrade(&shared);
                    shared.secondary.load_result(Box::new(move |result| {
                        let result = result.map_err(|_| primary_err);
                        deliver_if_alive(&weak, completion, result);
                    }));
                }
            }
        }));
    }
}

fn deliver_if_alive<P, S, R>(weak: &Weak<Pair<P, S>>, completion: Completion<R>, result: R) {
    if weak.strong_count() > 0 {
        completion(result);
    }
}

impl<P, S> fmt::Debug for Fallback<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fallback").finish_non_exhaustive()
    }
}

impl<P, S> fmt::Debug for SecondChance<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecondChance").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FailableQueryExt;
    use crate::testing::{QuerySpy, ResultRecorder, StubQuery};
    use pretty_assertions::assert_eq;

    type Spy = QuerySpy<Result<u32, String>>;

    #[test]
    fn test_fallback_skips_secondary_on_success() {
        let secondary = Spy::new();
        let sut = StubQuery::new(Ok::<u32, String>(1)).fallback(secondary.clone());
        let recorder = ResultRecorder::new();

        sut.load(recorder.completion());

        assert_eq!(recorder.results(), vec![Ok(1)]);
        assert_eq!(secondary.load_count(), 0);
    }

    #[test]
    fn test_fallback_delivers_secondary_result() {
        let primary = Spy::new();
        let secondary = Spy::new();
        let sut = Fallback::new(primary.clone(), secondary.clone());
        let recorder = ResultRecorder::new();

        sut.load(recorder.completion());
        sut.load(recorder.completion());
        primary.complete(0, Err("primary".to_string()));
        primary.complete(1, Err("primary".to_string()));
        secondary.complete(0, Ok(2));
        secondary.complete(1, Err("secondary".to_string()));

        assert_eq!(
            recorder.results(),
            vec![Ok(2), Err("secondary".to_string())]
        );
    }

    #[test]
    fn test_second_chance_reports_primary_error() {
        let primary = Spy::new();
        let sut = primary
            .clone()
            .second_chance(StubQuery::new(Err::<u32, &str>("secondary")));
        let recorder = ResultRecorder::new();

        sut.load(recorder.completion());
        primary.complete(0, Err("primary".to_string()));

        assert_eq!(recorder.results(), vec![Err("primary".to_string())]);
    }

    #[test]
    fn test_second_chance_delivers_secondary_success() {
        let sut = StubQuery::new(Err::<u32, String>("primary".to_string()))
            .second_chance(StubQuery::new(Ok::<u32, String>(9)));
        let recorder = ResultRecorder::new();

        sut.load(recorder.completion());

        assert_eq!(recorder.results(), vec![Ok(9)]);
    }

    #[test]
    fn test_drop_before_primary_resolves_does_not_complete() {
        let primary = Spy::new();
        let secondary = Spy::new();
        let sut = Fallback::new(primary.clone(), secondary.clone());
        let recorder = ResultRecorder::new();

        sut.load(recorder.completion());
        drop(sut);
        primary.complete(0, Err("primary".to_string()));

        assert!(recorder.is_empty());
        assert_eq!(secondary.load_count(), 0);
    }

    #[test]
    fn test_drop_before_secondary_resolves_does_not_complete() {
        let primary = Spy::new();
        let secondary = Spy::new();
        let sut = SecondChance::new(primary.clone(), secondary.clone());
        let recorder = ResultRecorder::new();

        sut.load(recorder.completion());
        primary.complete(0, Err("primary".to_string()));
        drop(sut);
        secondary.complete(0, Ok(3));

        assert!(recorder.is_empty());
    }
}
