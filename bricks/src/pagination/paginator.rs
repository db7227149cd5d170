//! Stateful page accumulation over a page-query factory.

use super::{Page, PaginatorConfig};
use crate::coordination::{Delivery, PendingCallbacks};
use crate::errors::Abandoned;
use crate::query::{AnyQuery, Completion, Query};
use futures::channel::oneshot;
use futures::TryFutureExt;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Builds the query for one page number.
pub type PageFactory<T, E> = Box<dyn Fn(u64) -> AnyQuery<Result<Vec<T>, E>> + Send + Sync>;

type PageResult<T, E> = Result<Page<T>, E>;

/// Loads a list page by page and keeps what it has loaded.
///
/// - [`Query::load`] serves the accumulated pages from memory once at least
///   one page has loaded and no fetch is running; otherwise it behaves like
///   [`Paginator::load_more`].
/// - [`Paginator::load_more`] fetches the page at the current cursor, appends
///   it and delivers the cumulative list. A failed fetch changes nothing, so
///   the next call retries the same page.
/// - [`Paginator::reset`] forgets everything, including callers waiting on a
///   running fetch. Those callers are never invoked.
///
/// At most one page fetch runs at a time; callers arriving during a fetch
/// receive its outcome.
pub struct Paginator<T, E> {
    shared: Arc<Shared<T, E>>,
}

struct Shared<T, E> {
    factory: PageFactory<T, E>,
    first_page: u64,
    state: Mutex<State<T, E>>,
}

struct State<T, E> {
    accumulated: Option<Vec<T>>,
    has_more: bool,
    cursor: u64,
    in_flight: Option<InFlight<T, E>>,
    pending: PendingCallbacks<PageResult<T, E>>,
    next_fetch_id: u64,
}

/// The running page fetch. Holding the query keeps it alive until it
/// resolves; it is `None` while the factory is still building it.
struct InFlight<T, E> {
    id: u64,
    page: u64,
    _query: Option<AnyQuery<Result<Vec<T>, E>>>,
}

enum Admission<T, E> {
    Serve(Completion<PageResult<T, E>>, Page<T>),
    Joined,
    Start { id: u64, page: u64 },
}

impl<T, E> Paginator<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Creates a paginator that counts pages from zero.
    pub fn new<F, Q>(factory: F) -> Self
    where
        F: Fn(u64) -> Q + Send + Sync + 'static,
        Q: Query<Output = Result<Vec<T>, E>> + 'static,
    {
        Self::with_config(factory, PaginatorConfig::default())
    }

    /// Creates a paginator with an explicit configuration.
    pub fn with_config<F, Q>(factory: F, config: PaginatorConfig) -> Self
    where
        F: Fn(u64) -> Q + Send + Sync + 'static,
        Q: Query<Output = Result<Vec<T>, E>> + 'static,
    {
        let factory: PageFactory<T, E> = Box::new(move |page| AnyQuery::new(factory(page)));
        Self {
            shared: Arc::new(Shared {
                factory,
                first_page: config.first_page,
                state: Mutex::new(State::new(config.first_page)),
            }),
        }
    }

    /// Fetches the next page and delivers the cumulative list.
    ///
    /// Joins the running fetch instead if there is one.
    pub fn load_more(&self, completion: Completion<PageResult<T, E>>) {
        self.admit(completion, false);
    }

    /// Same as [`Paginator::load_more`], as a future.
    ///
    /// Resolves to [`Abandoned`] if the paginator is reset or dropped before
    /// the page arrives.
    pub fn load_more_async(&self) -> impl Future<Output = Result<PageResult<T, E>, Abandoned>> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        self.load_more(Box::new(move |result| {
            if tx.send(result).is_err() {
                trace!("load_more_async future dropped before its page arrived");
            }
        }));
        rx.map_err(|_| Abandoned)
    }

    /// Forgets every loaded page and every waiting caller.
    ///
    /// A fetch running at this point is not cancelled, but its result is
    /// discarded when it arrives.
    pub fn reset(&self) {
        let (discarded, abandoned) = {
            let mut state = self.shared.state.lock();
            let discarded = state.pending.take();
            let abandoned = state.in_flight.take();
            state.accumulated = None;
            state.has_more = true;
            state.cursor = self.shared.first_page;
            (discarded, abandoned)
        };
        debug!(
            discarded = discarded.len(),
            abandoned_page = abandoned.as_ref().map(|fetch| fetch.page),
            "paginator reset"
        );
    }

    /// Returns the accumulated pages, if any page has loaded.
    #[must_use]
    pub fn page(&self) -> Option<Page<T>> {
        let state = self.shared.state.lock();
        state
            .accumulated
            .as_ref()
            .map(|items| Page::new(items.clone(), state.has_more))
    }

    /// False once a fetched page came back empty.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.shared.state.lock().has_more
    }

    /// The page number the next fetch will request.
    #[must_use]
    pub fn current_page(&self) -> u64 {
        self.shared.state.lock().cursor
    }

    /// Returns true while a page fetch is running.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.shared.state.lock().in_flight.is_some()
    }

    fn admit(&self, completion: Completion<PageResult<T, E>>, serve_loaded: bool) {
        let admission = self.shared.state.lock().admit(completion, serve_loaded);

        match admission {
            Admission::Serve(completion, page) => {
                trace!(items = page.len(), "serving loaded pages");
                completion(Ok(page));
            }
            Admission::Joined => trace!("joined running page fetch"),
            Admission::Start { id, page } => {
                // The factory runs unlocked so it may read or drive the paginator.
                let query = (self.shared.factory)(page);
                if !self.shared.state.lock().install(id, &query) {
                    debug!(fetch_id = id, page, "paginator reset while building page query");
                    return;
                }
                debug!(fetch_id = id, page, "fetching page");
                let weak: Weak<Shared<T, E>> = Arc::downgrade(&self.shared);
                query.load(Box::new(move |result| match weak.upgrade() {
                    Some(shared) => shared.finish(id, result),
                    None => trace!(fetch_id = id, "paginator dropped before page arrived"),
                }));
            }
        }
    }
}

impl<T, E> State<T, E>
where
    T: Clone,
{
    const fn new(first_page: u64) -> Self {
        Self {
            accumulated: None,
            has_more: true,
            cursor: first_page,
            in_flight: None,
            pending: PendingCallbacks::new(),
            next_fetch_id: 0,
        }
    }

    /// Decides, in one critical section, whether a caller is served from
    /// memory, joins the running fetch or starts a new one. A new fetch is
    /// reserved here and its query installed later.
    fn admit(
        &mut self,
        completion: Completion<PageResult<T, E>>,
        serve_loaded: bool,
    ) -> Admission<T, E> {
        if serve_loaded && self.in_flight.is_none() {
            if let Some(items) = &self.accumulated {
                return Admission::Serve(completion, Page::new(items.clone(), self.has_more));
            }
        }

        self.pending.push(completion);
        if self.in_flight.is_some() {
            return Admission::Joined;
        }

        let id = self.next_fetch_id;
        self.next_fetch_id += 1;
        let page = self.cursor;
        self.in_flight = Some(InFlight {
            id,
            page,
            _query: None,
        });
        Admission::Start { id, page }
    }

    /// Attaches the built query to fetch `id`. False if that fetch was
    /// abandoned by a reset in the meantime.
    fn install(&mut self, id: u64, query: &AnyQuery<Result<Vec<T>, E>>) -> bool {
        let Some(page) = self
            .in_flight
            .as_ref()
            .filter(|fetch| fetch.id == id)
            .map(|fetch| fetch.page)
        else {
            return false;
        };
        self.in_flight = Some(InFlight {
            id,
            page,
            _query: Some(query.clone()),
        });
        true
    }

    fn append(&mut self, items: Vec<T>) -> Page<T> {
        let has_more = !items.is_empty();
        let accumulated = self.accumulated.get_or_insert_with(Vec::new);
        accumulated.extend(items);
        self.has_more = has_more;
        self.cursor += 1;
        Page::new(accumulated.clone(), has_more)
    }
}

impl<T, E> Shared<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn finish(&self, id: u64, result: Result<Vec<T>, E>) {
        let (delivery, outcome): (Delivery<PageResult<T, E>>, PageResult<T, E>) = {
            let mut state = self.state.lock();
            let page = match &state.in_flight {
                Some(fetch) if fetch.id == id => fetch.page,
                _ => {
                    debug!(fetch_id = id, "discarding result of abandoned page fetch");
                    return;
                }
            };
            state.in_flight = None;
            let delivery = state.pending.take();
            let outcome = match result {
                Ok(items) => {
                    let fetched = items.len();
                    let loaded = state.append(items);
                    debug!(page, fetched, total = loaded.len(), has_more = loaded.has_more, "page loaded");
                    Ok(loaded)
                }
                Err(err) => {
                    debug!(page, "page fetch failed");
                    Err(err)
                }
            };
            (delivery, outcome)
        };
        delivery.deliver(outcome);
    }
}

impl<T, E> Query for Paginator<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    type Output = PageResult<T, E>;

    fn load(&self, completion: Completion<PageResult<T, E>>) {
        self.admit(completion, true);
    }
}

impl<T, E> fmt::Debug for Paginator<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Paginator")
            .field("loaded", &state.accumulated.as_ref().map(Vec::len))
            .field("has_more", &state.has_more)
            .field("cursor", &state.cursor)
            .field("loading", &state.in_flight.is_some())
            .field("waiting", &state.pending.len())
            .finish()
    }
}
