//! Combinator methods for queries.

use super::{AnyQuery, Completion, FailableQuery, FnQuery, Query};
use crate::coordination::SingleFlight;
use crate::decorators::{Fallback, Map, Notifying, SecondChance, Storing, Zip};
use crate::errors::Abandoned;
use crate::fanout::{FanOutConfig, Priority, PriorityFanOut, PriorityItem};
use crate::storage::SynchronousStorage;
use futures::channel::oneshot;
use futures::TryFutureExt;
use std::future::Future;
use std::sync::Arc;
use tracing::trace;

/// Chaining helpers available on every [`Query`].
pub trait QueryExt: Query {
    /// Erases the concrete type of this query.
    fn erased(self) -> AnyQuery<Self::Output>
    where
        Self: Sized + 'static,
    {
        AnyQuery::new(self)
    }

    /// Converts every result with `mapper`.
    fn map<F, R>(self, mapper: F) -> Map<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Output) -> R + Send + Sync + 'static,
        R: Send + 'static,
    {
        Map::new(self, mapper)
    }

    /// Loads this query and `other` in parallel and yields both results.
    fn zip<B>(self, other: B) -> Zip<Self, B>
    where
        Self: Sized,
        B: Query,
    {
        Zip::new(self, other)
    }

    /// Collapses concurrent loads of this query into one.
    fn single_flight(self) -> SingleFlight<Self>
    where
        Self: Sized,
        Self::Output: Clone,
    {
        SingleFlight::new(self)
    }

    /// Starts a load and returns a future for its result.
    ///
    /// The future resolves to [`Abandoned`] if the completion is dropped
    /// without being invoked.
    fn load_async(&self) -> impl Future<Output = Result<Self::Output, Abandoned>> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        self.load(Box::new(move |result| {
            if tx.send(result).is_err() {
                trace!("load_async future dropped before its result arrived");
            }
        }));
        rx.map_err(|_| Abandoned)
    }
}

impl<Q: Query + ?Sized> QueryExt for Q {}

/// Chaining helpers available on every [`FailableQuery`].
pub trait FailableQueryExt: FailableQuery {
    /// Falls back to `secondary` when this query fails.
    ///
    /// Delivers whatever the secondary yields, including its error.
    fn fallback<S>(self, secondary: S) -> Fallback<Self, S>
    where
        Self: Sized,
        S: FailableQuery<Success = Self::Success>,
    {
        Fallback::new(self, secondary)
    }

    /// Tries `secondary` when this query fails.
    ///
    /// If both fail, delivers this query's error.
    fn second_chance<S>(self, secondary: S) -> SecondChance<Self, S>
    where
        Self: Sized,
        S: FailableQuery<Success = Self::Success>,
    {
        SecondChance::new(self, secondary)
    }

    /// Calls `on_success` or `on_failure` before every delivery.
    fn notify<F, G>(self, on_success: F, on_failure: G) -> Notifying<Self>
    where
        Self: Sized,
        F: Fn(&Self::Success) + Send + Sync + 'static,
        G: Fn(&Self::Failure) + Send + Sync + 'static,
    {
        Notifying::new(self, on_success, on_failure)
    }

    /// Saves every successful value into `storage`.
    fn storing<S>(self, storage: S) -> Storing<Self, S>
    where
        Self: Sized,
        S: SynchronousStorage<Value = Self::Success>,
        Self::Success: Clone,
    {
        Storing::new(self, storage)
    }

    /// Turns this query into a fan-out item with the given priority.
    fn prioritized(self, priority: Priority) -> PriorityItem<Self::Success>
    where
        Self: Sized + 'static,
        Self::Failure: Into<anyhow::Error>,
    {
        let query = Arc::new(self);
        let loader = FnQuery::new(move |completion: Completion<anyhow::Result<Self::Success>>| {
            Self::load_result(&query, Box::new(move |result| completion(result.map_err(Into::into))));
        });
        PriorityItem::new(priority, loader)
    }

    /// Loads the items this query yields as a prioritized fan-out batch.
    fn fan_out<T>(self, config: FanOutConfig) -> PriorityFanOut<Self, T>
    where
        Self: FailableQuery<Success = Vec<PriorityItem<T>>> + Sized,
        T: Send + 'static,
    {
        PriorityFanOut::new(self, config)
    }
}

impl<Q: FailableQuery + ?Sized> FailableQueryExt for Q {}
