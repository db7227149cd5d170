//! Priority fan-out over a loaded item list.

use super::{FanOutConfig, Priority, PriorityItem};
use crate::cancellation::{Deadline, DeadlineGuard};
use crate::errors::FanOutError;
use crate::query::{Completion, FailableQuery, Query};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, trace, warn};
use uuid::Uuid;

type TimeoutProvider = Box<dyn Fn() -> Duration + Send + Sync>;

/// Result of one fan-out load: one slot per item, in item-list order.
pub type FanOutResult<T, E> = Result<Vec<Option<T>>, FanOutError<E>>;

/// Loads a list of prioritized items and then every item concurrently.
///
/// A batch completes as soon as every mandatory item has succeeded. Optional
/// items that failed or are still running leave their slot empty. The first
/// mandatory failure, or the batch deadline, completes it with an error
/// instead. Whatever resolves after that is ignored.
///
/// Every `load` runs its own batch with its own items and deadline.
pub struct PriorityFanOut<Q: FailableQuery, T> {
    shared: Arc<Shared<Q, T>>,
}

struct Shared<Q: FailableQuery, T> {
    query: Q,
    mandatory_priority: Priority,
    timeout: TimeoutProvider,
    batches: Mutex<HashMap<Uuid, Batch<T, Q::Failure>>>,
}

struct Batch<T, E> {
    /// Held so item loaders live until the batch is over.
    _items: Vec<PriorityItem<T>>,
    slots: Vec<Option<T>>,
    mandatory_left: usize,
    /// Set until every item load has been started; successes only fill
    /// slots meanwhile.
    launching: bool,
    timeout: Duration,
    completion: Completion<FanOutResult<T, E>>,
    deadline: Option<DeadlineGuard>,
}

impl<T, E> Batch<T, E> {
    /// Delivers the batch outcome. Call only after removing the batch from
    /// the map and releasing the lock.
    fn finish(mut self, outcome: Result<(), FanOutError<E>>) {
        if let Some(deadline) = self.deadline.take() {
            deadline.cancel();
        }
        let result = outcome.map(|()| std::mem::take(&mut self.slots));
        (self.completion)(result);
    }
}

impl<Q, T> PriorityFanOut<Q, T>
where
    Q: FailableQuery<Success = Vec<PriorityItem<T>>>,
    T: Send + 'static,
{
    /// Wraps the item-list `query` using `config`.
    pub fn new(query: Q, config: FanOutConfig) -> Self {
        let timeout = config.timeout();
        Self::with_timeout_provider(query, config.mandatory_priority, move || timeout)
    }

    /// Wraps the item-list `query`, reading the deadline from `timeout` at
    /// the start of every batch.
    pub fn with_timeout_provider<F>(query: Q, mandatory_priority: Priority, timeout: F) -> Self
    where
        F: Fn() -> Duration + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                query,
                mandatory_priority,
                timeout: Box::new(timeout),
                batches: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Items at or above this priority are mandatory.
    #[must_use]
    pub fn mandatory_priority(&self) -> Priority {
        self.shared.mandatory_priority
    }

    /// Number of batches still waiting on items.
    #[must_use]
    pub fn active_batches(&self) -> usize {
        self.shared.batches.lock().len()
    }
}

impl<Q, T> Shared<Q, T>
where
    Q: FailableQuery<Success = Vec<PriorityItem<T>>> + 'static,
    T: Send + 'static,
{
    fn start_batch(
        self: &Arc<Self>,
        items: Vec<PriorityItem<T>>,
        completion: Completion<FanOutResult<T, Q::Failure>>,
    ) {
        if items.is_empty() {
            debug!("empty item list, nothing to fan out");
            completion(Ok(Vec::new()));
            return;
        }

        let id = Uuid::new_v4();
        let timeout = (self.timeout)();
        let mandatory_left = items
            .iter()
            .filter(|item| item.is_mandatory(self.mandatory_priority))
            .count();
        debug!(
            batch_id = %id,
            items = items.len(),
            mandatory = mandatory_left,
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "starting fan-out batch"
        );

        let launch = items.clone();
        self.batches.lock().insert(
            id,
            Batch {
                slots: std::iter::repeat_with(|| None).take(items.len()).collect(),
                _items: items,
                mandatory_left,
                launching: true,
                timeout,
                completion,
                deadline: None,
            },
        );

        let weak = Arc::downgrade(self);
        let guard = Deadline::schedule(timeout, move || {
            if let Some(shared) = weak.upgrade() {
                shared.expire(id);
            }
        });
        if let Some(batch) = self.batches.lock().get_mut(&id) {
            batch.deadline = Some(guard);
        }

        for (index, item) in launch.into_iter().enumerate() {
            let weak: Weak<Self> = Arc::downgrade(self);
            let priority = item.priority();
            item.load(Box::new(move |result| match weak.upgrade() {
                Some(shared) => shared.resolve(id, index, priority, result),
                None => trace!(batch_id = %id, index, "fan-out dropped before item resolved"),
            }));
        }

        self.complete_if_ready(id);
    }

    fn resolve(&self, id: Uuid, index: usize, priority: Priority, result: anyhow::Result<T>) {
        let mandatory = priority >= self.mandatory_priority;
        let (batch, outcome) = {
            let mut batches = self.batches.lock();
            let Some(batch) = batches.get_mut(&id) else {
                trace!(batch_id = %id, index, "item resolved after batch completed");
                return;
            };
            match result {
                Ok(value) => {
                    if let Some(slot) = batch.slots.get_mut(index) {
                        *slot = Some(value);
                    }
                    if mandatory {
                        batch.mandatory_left = batch.mandatory_left.saturating_sub(1);
                    }
                    if batch.launching || batch.mandatory_left > 0 {
                        return;
                    }
                    (batches.remove(&id), Ok(()))
                }
                Err(source) if mandatory => {
                    warn!(batch_id = %id, index, %priority, error = %source, "required item failed");
                    let err = FanOutError::RequiredItemFailed {
                        index,
                        priority,
                        source,
                    };
                    (batches.remove(&id), Err(err))
                }
                Err(source) => {
                    debug!(batch_id = %id, index, %priority, error = %source, "optional item failed");
                    return;
                }
            }
        };
        if let Some(batch) = batch {
            debug!(batch_id = %id, success = outcome.is_ok(), "fan-out batch completed");
            batch.finish(outcome);
        }
    }

    fn complete_if_ready(&self, id: Uuid) {
        let batch = {
            let mut batches = self.batches.lock();
            match batches.get_mut(&id) {
                Some(batch) if batch.mandatory_left == 0 => batches.remove(&id),
                Some(batch) => {
                    batch.launching = false;
                    None
                }
                None => None,
            }
        };
        if let Some(batch) = batch {
            debug!(batch_id = %id, "mandatory items settled during launch");
            batch.finish(Ok(()));
        }
    }

    fn expire(&self, id: Uuid) {
        let Some(batch) = self.batches.lock().remove(&id) else {
            return;
        };
        warn!(batch_id = %id, timeout = ?batch.timeout, "fan-out batch timed out");
        let timeout = batch.timeout;
        batch.finish(Err(FanOutError::TimeoutExpired { timeout }));
    }
}

impl<Q, T> Query for PriorityFanOut<Q, T>
where
    Q: FailableQuery<Success = Vec<PriorityItem<T>>> + 'static,
    T: Send + 'static,
{
    type Output = FanOutResult<T, Q::Failure>;

    fn load(&self, completion: Completion<Self::Output>) {
        let weak = Arc::downgrade(&self.shared);
        self.shared.query.load_result(Box::new(move |result| {
            let Some(shared) = weak.upgrade() else {
                trace!("fan-out dropped before item list arrived");
                return;
            };
            match result {
                Ok(items) => shared.start_batch(items, completion),
                Err(err) => {
                    debug!("item list failed to load");
                    completion(Err(FanOutError::ItemListLoadFailed(err)));
                }
            }
        }));
    }
}

impl<Q: FailableQuery, T> fmt::Debug for PriorityFanOut<Q, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityFanOut")
            .field("mandatory_priority", &self.shared.mandatory_priority)
            .field("active_batches", &self.shared.batches.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FnQuery;
    use crate::testing::{QuerySpy, ResultRecorder, StubQuery};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Items = Vec<PriorityItem<String>>;
    type ListSpy = QuerySpy<Result<Items, String>>;
    type ItemSpy = QuerySpy<anyhow::Result<String>>;
    type Recorder = ResultRecorder<FanOutResult<String, String>>;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn config(mandatory: u32) -> FanOutConfig {
        FanOutConfig::new()
            .with_mandatory_priority(Priority::new(mandatory))
            .with_timeout(TIMEOUT)
    }

    fn ok_item(priority: u32, value: &str) -> PriorityItem<String> {
        let value = value.to_string();
        PriorityItem::new(
            Priority::new(priority),
            FnQuery::new(move |completion: Completion<anyhow::Result<String>>| {
                completion(Ok(value.clone()));
            }),
        )
    }

    fn failing_item(priority: u32) -> PriorityItem<String> {
        PriorityItem::new(
            Priority::new(priority),
            FnQuery::new(|completion: Completion<anyhow::Result<String>>| {
                completion(Err(anyhow::anyhow!("item failed")));
            }),
        )
    }

    fn spy_item(priority: u32, spy: &ItemSpy) -> PriorityItem<String> {
        PriorityItem::new(Priority::new(priority), spy.clone())
    }

    fn with_items(
        items: Items,
        mandatory: u32,
    ) -> PriorityFanOut<StubQuery<Result<Items, String>>, String> {
        PriorityFanOut::new(StubQuery::new(Ok(items)), config(mandatory))
    }

    fn single(recorder: &Recorder) -> FanOutResult<String, String> {
        let mut results = recorder.drain();
        assert_eq!(results.len(), 1, "expected exactly one delivery");
        match results.pop() {
            Some(result) => result,
            None => unreachable!(),
        }
    }

    fn slots(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(ToString::to_string)).collect()
    }

    #[test]
    fn test_optional_failure_is_tolerated() {
        let sut = with_items(
            vec![failing_item(0), ok_item(1, "x"), ok_item(2, "y")],
            1,
        );
        let recorder = Recorder::new();

        sut.load(recorder.completion());

        let result = single(&recorder).map_err(|e| format!("{e:?}"));
        assert_eq!(result, Ok(slots(&[None, Some("x"), Some("y")])));
        assert_eq!(sut.active_batches(), 0);
    }

    #[test]
    fn test_mandatory_failure_completes_immediately() {
        let pending = ItemSpy::new();
        let sut = with_items(vec![spy_item(2, &pending), failing_item(1)], 1);
        let recorder = Recorder::new();

        sut.load(recorder.completion());

        match single(&recorder) {
            Err(FanOutError::RequiredItemFailed { index, priority, source }) => {
                assert_eq!(index, 1);
                assert_eq!(priority, Priority::new(1));
                assert_eq!(source.to_string(), "item failed");
            }
            other => panic!("expected required item failure, got {other:?}"),
        }

        pending.complete(0, Ok("late".to_string()));
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_completes_without_waiting_for_optional_items() {
        let optional = ItemSpy::new();
        let mandatory = ItemSpy::new();
        let sut = with_items(
            vec![spy_item(0, &optional), spy_item(1, &mandatory)],
            1,
        );
        let recorder = Recorder::new();

        sut.load(recorder.completion());
        assert!(recorder.is_empty());
        mandatory.complete(0, Ok("m".to_string()));

        let result = single(&recorder).map_err(|e| format!("{e:?}"));
        assert_eq!(result, Ok(slots(&[None, Some("m")])));

        optional.complete(0, Ok("late".to_string()));
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_no_mandatory_items_completes_after_launch() {
        let optional = ItemSpy::new();
        let sut = with_items(vec![ok_item(0, "a"), spy_item(0, &optional)], 5);
        let recorder = Recorder::new();

        sut.load(recorder.completion());

        let result = single(&recorder).map_err(|e| format!("{e:?}"));
        assert_eq!(result, Ok(slots(&[Some("a"), None])));
        assert_eq!(optional.load_count(), 1);
    }

    #[test]
    fn test_synchronous_items_all_fill_before_completion() {
        let sut = with_items(vec![ok_item(0, "a"), ok_item(0, "b"), ok_item(2, "c")], 5);
        let recorder = Recorder::new();

        sut.load(recorder.completion());

        let result = single(&recorder).map_err(|e| format!("{e:?}"));
        assert_eq!(result, Ok(slots(&[Some("a"), Some("b"), Some("c")])));
        assert_eq!(sut.active_batches(), 0);
    }

    #[test]
    fn test_synchronous_mandatory_success_waits_for_launch() {
        let sut = with_items(vec![ok_item(1, "m"), ok_item(0, "o")], 1);
        let recorder = Recorder::new();

        sut.load(recorder.completion());

        let result = single(&recorder).map_err(|e| format!("{e:?}"));
        assert_eq!(result, Ok(slots(&[Some("m"), Some("o")])));
    }

    #[test]
    fn test_empty_item_list_succeeds_immediately() {
        let sut = with_items(Vec::new(), 0);
        let recorder = Recorder::new();

        sut.load(recorder.completion());

        let result = single(&recorder).map_err(|e| format!("{e:?}"));
        assert_eq!(result, Ok(Vec::new()));
    }

    #[test]
    fn test_item_list_failure_is_wrapped() {
        let list = ListSpy::new();
        let sut = PriorityFanOut::new(list.clone(), config(0));
        let recorder = Recorder::new();

        sut.load(recorder.completion());
        list.complete(0, Err("offline".to_string()));

        let err = single(&recorder).map(|_| ()).unwrap_err();
        assert_eq!(err.item_list_cause().map(String::as_str), Some("offline"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires_batch() {
        let stuck = ItemSpy::new();
        let sut = with_items(vec![ok_item(1, "a"), spy_item(1, &stuck)], 1);
        let recorder = Recorder::new();

        sut.load(recorder.completion());
        tokio::time::sleep(TIMEOUT - Duration::from_millis(1)).await;
        assert!(recorder.is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        match single(&recorder) {
            Err(FanOutError::TimeoutExpired { timeout }) => assert_eq!(timeout, TIMEOUT),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(sut.active_batches(), 0);

        stuck.complete(0, Ok("late".to_string()));
        assert!(recorder.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_cancels_deadline() {
        let item = ItemSpy::new();
        let sut = with_items(vec![spy_item(0, &item)], 0);
        let recorder = Recorder::new();

        sut.load(recorder.completion());
        item.complete(0, Ok("done".to_string()));
        tokio::time::sleep(TIMEOUT * 2).await;

        let result = single(&recorder).map_err(|e| format!("{e:?}"));
        assert_eq!(result, Ok(slots(&[Some("done")])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_provider_is_read_per_batch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let stuck = ItemSpy::new();
        let sut = PriorityFanOut::with_timeout_provider(
            StubQuery::new(Ok::<Items, String>(vec![spy_item(0, &stuck)])),
            Priority::new(0),
            move || {
                let n = calls_clone.fetch_add(1, Ordering::SeqCst) as u64;
                Duration::from_secs(1 + n)
            },
        );
        let recorder = Recorder::new();

        sut.load(recorder.completion());
        sut.load(recorder.completion());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(sut.active_batches(), 2);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(recorder.len(), 1);
        assert_eq!(sut.active_batches(), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(recorder.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_batches_are_independent() {
        let list = ListSpy::new();
        let first = ItemSpy::new();
        let second = ItemSpy::new();
        let sut = PriorityFanOut::new(list.clone(), config(0));
        let first_recorder = Recorder::new();
        let second_recorder = Recorder::new();

        sut.load(first_recorder.completion());
        sut.load(second_recorder.completion());
        list.complete(0, Ok(vec![spy_item(0, &first)]));
        list.complete(1, Ok(vec![spy_item(0, &second)]));
        assert_eq!(sut.active_batches(), 2);

        second.complete(0, Ok("two".to_string()));

        let result = single(&second_recorder).map_err(|e| format!("{e:?}"));
        assert_eq!(result, Ok(slots(&[Some("two")])));
        assert!(first_recorder.is_empty());
        assert_eq!(sut.active_batches(), 1);

        first.complete(0, Ok("one".to_string()));
        let result = single(&first_recorder).map_err(|e| format!("{e:?}"));
        assert_eq!(result, Ok(slots(&[Some("one")])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_while_loading_does_not_complete() {
        let item = ItemSpy::new();
        let sut = with_items(vec![spy_item(1, &item)], 1);
        let recorder = Recorder::new();

        sut.load(recorder.completion());
        drop(sut);
        item.complete(0, Ok("late".to_string()));
        tokio::time::sleep(TIMEOUT * 2).await;

        assert!(recorder.is_empty());
    }

    #[test]
    fn test_drop_before_item_list_arrives_does_not_complete() {
        let list = ListSpy::new();
        let sut = PriorityFanOut::new(list.clone(), config(0));
        let recorder = Recorder::new();

        sut.load(recorder.completion());
        drop(sut);
        list.complete(0, Ok(vec![ok_item(0, "a")]));

        assert!(recorder.is_empty());
    }
}
