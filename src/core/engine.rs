//! The listing engine: filtered, sorted, paginated views of a remote collection
//!
//! A [`ListingEngine`] owns one [`ListingSession`] and is the only thing that
//! mutates it. It supports two access patterns:
//!
//! - **whole collection**: `load` reads every matching document once, then
//!   `jump_to_page` slices locally
//! - **incremental**: `load` reads the first page, `load_more` follows the
//!   cursor
//!
//! # Single flight
//!
//! At most one operation runs per session. An operation that arrives while
//! another is in flight is refused with
//! [`ListingError::ConcurrentOperation`]. The one exception is a `load` with
//! a different (filter, sort) pair: it starts a new generation, and the
//! result of the older in-flight fetch is discarded when it arrives.
//!
//! The session lock is never held across a provider call.
//!
//! # Cancellation
//!
//! Operations may be dropped mid-fetch, for example by a `tokio::select!`
//! or a caller-side timeout. A dropped operation moves its session to
//! `error` with [`ListingError::Cancelled`], so the same call can be retried.
//!
//! # Example
//!
//! ```rust,ignore
//! let engine = ListingEngine::new("jobs", provider, ListingSettings::incremental(10));
//!
//! let first = engine.load(FilterSpec::all().with(FilterKey::Category, "Farming"), SortSpec::PayHigh).await?;
//! while engine.snapshot().has_more {
//!     engine.load_more().await?;
//! }
//! ```

use crate::core::error::{FetchError, ListingError};
use crate::core::events::{AppEvent, EventBus, ListingEvent};
use crate::core::filter::FilterSpec;
use crate::core::item::Listable;
use crate::core::plan::{FetchStrategy, QueryPlan};
use crate::core::provider::CollectionProvider;
use crate::core::query::{PageCursor, PaginatedResponse, PaginationMeta};
use crate::core::session::{ListingMode, ListingSession, ListingStatus, Operation, SessionEvent};
use crate::core::sort::SortSpec;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Default time allowed for one provider call
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Paging behaviour of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingSettings {
    pub page_size: usize,
    pub mode: ListingMode,
    pub fetch_timeout: Duration,
}

impl ListingSettings {
    pub fn whole_collection(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            mode: ListingMode::WholeCollection,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn incremental(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            mode: ListingMode::Incremental,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

/// Read-only copy of a session for rendering
#[derive(Debug, Clone)]
pub struct SessionSnapshot<T> {
    pub generation: u64,
    pub status: ListingStatus,
    pub filter: FilterSpec,
    pub sort: SortSpec,
    pub items: Vec<T>,
    pub cursor: Option<PageCursor>,
    /// Whether `load_more` can fetch anything further
    pub has_more: bool,
    pub strategy: Option<FetchStrategy>,
    pub current_page: usize,
    pub last_error: Option<ListingError>,
}

impl<T> SessionSnapshot<T> {
    /// True when a load completed and nothing matched
    pub fn is_empty_result(&self) -> bool {
        self.status == ListingStatus::Loaded && self.items.is_empty()
    }
}

/// Marks an admitted operation whose fetch has not been settled yet
///
/// Dropping it while armed cancels the operation on the session.
struct InFlight<'a, T: Listable> {
    engine: &'a ListingEngine<T>,
    operation: Operation,
    generation: u64,
    armed: bool,
}

impl<'a, T: Listable> InFlight<'a, T> {
    fn new(engine: &'a ListingEngine<T>, operation: Operation, generation: u64) -> Self {
        Self {
            engine,
            operation,
            generation,
            armed: true,
        }
    }

    /// The fetch returned; its outcome settles the session instead
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<T: Listable> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut session = self.engine.session();
        if session.apply(SessionEvent::Cancelled {
            generation: self.generation,
            operation: self.operation,
        }) {
            tracing::debug!(
                listing = %self.engine.name,
                operation = %self.operation,
                generation = self.generation,
                "operation dropped before its fetch finished"
            );
        }
    }
}

/// Listing engine over one remote collection
pub struct ListingEngine<T: Listable> {
    name: String,
    provider: Arc<dyn CollectionProvider<T>>,
    settings: ListingSettings,
    session: Mutex<ListingSession<T>>,
    events: Option<EventBus>,
}

impl<T: Listable> ListingEngine<T> {
    /// Create an engine with a fresh, idle session
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn CollectionProvider<T>>,
        settings: ListingSettings,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            settings,
            session: Mutex::new(ListingSession::new()),
            events: None,
        }
    }

    /// Publish listing activity on the given bus
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> ListingSettings {
        self.settings
    }

    fn session(&self) -> MutexGuard<'_, ListingSession<T>> {
        // The session is only ever replaced wholesale, so a poisoned guard
        // still holds a consistent value.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: ListingEvent) {
        if let Some(events) = &self.events {
            events.publish(AppEvent::Listing(event));
        }
    }

    /// Record a refusal on the session and hand it back
    fn reject(&self, session: &mut ListingSession<T>, error: ListingError) -> ListingError {
        tracing::debug!(listing = %self.name, error = %error, "operation rejected");
        session.apply(SessionEvent::Rejected {
            error: error.clone(),
        });
        error
    }

    fn discarded(&self, operation: Operation, generation: u64) -> ListingError {
        tracing::warn!(
            listing = %self.name,
            operation = %operation,
            generation,
            "discarding result of a superseded request"
        );
        self.publish(ListingEvent::Discarded {
            listing: self.name.clone(),
            operation: operation.to_string(),
            generation,
        });
        ListingError::Superseded {
            operation: operation.as_str(),
            generation,
        }
    }

    fn failed(&self, operation: Operation, error: &ListingError) {
        tracing::warn!(listing = %self.name, operation = %operation, error = %error, "fetch failed");
        self.publish(ListingEvent::Failed {
            listing: self.name.clone(),
            operation: operation.to_string(),
            message: error.to_string(),
        });
    }

    async fn timed<F>(&self, fetch: F) -> Result<Vec<T>, FetchError>
    where
        F: Future<Output = Result<Vec<T>, FetchError>>,
    {
        tokio::time::timeout(self.settings.fetch_timeout, fetch)
            .await
            .map_err(|_| FetchError::Timeout {
                collection: T::collection().to_string(),
                timeout_ms: self.settings.fetch_timeout.as_millis() as u64,
            })?
    }

    /// Run a plan, degrading it while the provider reports a missing index
    async fn fetch_with_fallback(
        &self,
        mut plan: QueryPlan,
        filter: &FilterSpec,
    ) -> Result<(QueryPlan, Vec<T>), FetchError> {
        loop {
            let limit = self.page_limit(&plan);
            let result = if plan.strategy == FetchStrategy::FetchAll {
                self.timed(self.provider.fetch_all()).await
            } else {
                let query = plan.remote_query(None, limit);
                self.timed(self.provider.query(&query)).await
            };

            match result {
                Ok(raw) => return Ok((plan, raw)),
                Err(err @ FetchError::MissingIndex { .. }) => match plan.degrade(filter) {
                    Some(next) => {
                        tracing::warn!(
                            listing = %self.name,
                            from = %plan.strategy,
                            to = %next.strategy,
                            error = %err,
                            "provider lacks an index, degrading query plan"
                        );
                        plan = next;
                    }
                    None => return Err(err),
                },
                Err(err) => return Err(err),
            }
        }
    }

    /// Page size requested from the provider, if the plan pages at all
    fn page_limit(&self, plan: &QueryPlan) -> Option<usize> {
        (self.settings.mode == ListingMode::Incremental && plan.is_server_ordered())
            .then_some(self.settings.page_size)
    }

    /// Cursor after a raw page
    ///
    /// Points at the last raw item, filtered out or not. A short page means
    /// the collection is exhausted.
    fn next_cursor(raw: &[T], limit: Option<usize>) -> Option<PageCursor> {
        match limit {
            Some(limit) if raw.len() >= limit => raw.last().map(PageCursor::after),
            _ => None,
        }
    }

    /// Load the first page for a (filter, sort) pair
    ///
    /// Replaces the session content on success. On failure the previous
    /// items stay in place and the session moves to `error`.
    pub async fn load(&self, filter: FilterSpec, sort: SortSpec) -> Result<Vec<T>, ListingError> {
        let generation = {
            let mut session = self.session();
            // A different request supersedes whatever is in flight.
            if let Some(in_flight) = session.in_flight()
                && session.requested() == (&filter, sort)
            {
                let error = ListingError::ConcurrentOperation {
                    operation: Operation::Load.as_str(),
                    in_flight: in_flight.as_str(),
                };
                return Err(self.reject(&mut session, error));
            }
            session.apply(SessionEvent::LoadStarted {
                filter: filter.clone(),
                sort,
            });
            session.generation()
        };

        let plan = QueryPlan::select(&filter, sort, |equals, order| {
            self.provider.supports(equals, order)
        });
        tracing::debug!(
            listing = %self.name,
            generation,
            strategy = %plan.strategy,
            sort = %sort,
            "loading"
        );

        let in_flight = InFlight::new(self, Operation::Load, generation);
        let outcome = self.fetch_with_fallback(plan, &filter).await;
        in_flight.disarm();

        let mut session = self.session();
        match outcome {
            Ok((plan, raw)) => {
                let cursor = Self::next_cursor(&raw, self.page_limit(&plan));
                let strategy = plan.strategy;
                let items = plan.finish(raw);
                if !session.apply(SessionEvent::LoadSucceeded {
                    generation,
                    plan,
                    items,
                    cursor,
                }) {
                    return Err(self.discarded(Operation::Load, generation));
                }

                let count = session.items().len();
                tracing::debug!(listing = %self.name, generation, count, "loaded");
                self.publish(ListingEvent::Loaded {
                    listing: self.name.clone(),
                    generation,
                    count,
                    strategy: strategy.to_string(),
                });

                Ok(match self.settings.mode {
                    ListingMode::WholeCollection => {
                        let meta = PaginationMeta::new(1, self.settings.page_size, count);
                        session.items()[meta.range()].to_vec()
                    }
                    ListingMode::Incremental => session.items().to_vec(),
                })
            }
            Err(err) => {
                let error = ListingError::Fetch(err);
                if !session.apply(SessionEvent::Failed {
                    generation,
                    error: error.clone(),
                }) {
                    return Err(self.discarded(Operation::Load, generation));
                }
                self.failed(Operation::Load, &error);
                Err(error)
            }
        }
    }

    /// Fetch the page after the cursor and append it
    ///
    /// Returns the items actually appended; identifiers already present are
    /// dropped. On failure items and cursor are unchanged, so the call can be
    /// retried as is.
    pub async fn load_more(&self) -> Result<Vec<T>, ListingError> {
        let (generation, plan, cursor, before) = {
            let mut session = self.session();
            if let Some(in_flight) = session.in_flight() {
                let error = ListingError::ConcurrentOperation {
                    operation: Operation::LoadMore.as_str(),
                    in_flight: in_flight.as_str(),
                };
                return Err(self.reject(&mut session, error));
            }
            let ready = match (session.is_loaded(), session.plan(), session.cursor()) {
                (true, Some(plan), Some(cursor)) => Ok((plan.clone(), cursor.clone())),
                (true, Some(_), None) => Err("the collection is exhausted"),
                _ => Err("no successful load for the current filter"),
            };
            let (plan, cursor) = match ready {
                Ok(ready) => ready,
                Err(reason) => {
                    let error = ListingError::NotReady {
                        operation: Operation::LoadMore.as_str(),
                        reason: reason.to_string(),
                    };
                    return Err(self.reject(&mut session, error));
                }
            };
            let generation = session.generation();
            session.apply(SessionEvent::LoadMoreStarted { generation });
            (generation, plan, cursor, session.items().len())
        };

        tracing::debug!(listing = %self.name, generation, cursor = %cursor, "loading more");
        let query = plan.remote_query(Some(cursor), Some(self.settings.page_size));
        let in_flight = InFlight::new(self, Operation::LoadMore, generation);
        let outcome = self.timed(self.provider.query(&query)).await;
        in_flight.disarm();

        let mut session = self.session();
        match outcome {
            Ok(raw) => {
                let cursor = Self::next_cursor(&raw, Some(self.settings.page_size));
                let exhausted = cursor.is_none();
                let items = plan.finish(raw);
                if !session.apply(SessionEvent::PageAppended {
                    generation,
                    items,
                    cursor,
                }) {
                    return Err(self.discarded(Operation::LoadMore, generation));
                }

                let appended = session.items()[before..].to_vec();
                tracing::debug!(
                    listing = %self.name,
                    generation,
                    appended = appended.len(),
                    exhausted,
                    "page appended"
                );
                self.publish(ListingEvent::PageAppended {
                    listing: self.name.clone(),
                    generation,
                    appended: appended.len(),
                    exhausted,
                });
                Ok(appended)
            }
            Err(err) => {
                let error = ListingError::Fetch(err);
                if !session.apply(SessionEvent::Failed {
                    generation,
                    error: error.clone(),
                }) {
                    return Err(self.discarded(Operation::LoadMore, generation));
                }
                self.failed(Operation::LoadMore, &error);
                Err(error)
            }
        }
    }

    /// Return page `n` (1-based) of the loaded collection
    ///
    /// Pages outside `1..=total_pages` are refused with
    /// [`ListingError::InvalidPage`]. An empty result has no pages at all;
    /// hosts render their empty state from what `load` returned. Repeated
    /// calls with the same `n` return the same slice.
    pub fn jump_to_page(&self, n: usize) -> Result<PaginatedResponse<T>, ListingError> {
        let mut session = self.session();
        if let Some(in_flight) = session.in_flight() {
            let error = ListingError::ConcurrentOperation {
                operation: Operation::JumpToPage.as_str(),
                in_flight: in_flight.as_str(),
            };
            return Err(self.reject(&mut session, error));
        }
        if self.settings.mode != ListingMode::WholeCollection || !session.is_loaded() {
            let error = ListingError::NotReady {
                operation: Operation::JumpToPage.as_str(),
                reason: "the whole collection has not been loaded".to_string(),
            };
            return Err(self.reject(&mut session, error));
        }

        let generation = session.generation();
        let meta = PaginationMeta::new(n, self.settings.page_size, session.items().len());
        if n < 1 || n > meta.total_pages {
            let error = ListingError::InvalidPage {
                requested: n,
                total_pages: meta.total_pages,
            };
            session.apply(SessionEvent::Failed {
                generation,
                error: error.clone(),
            });
            return Err(error);
        }

        session.apply(SessionEvent::PageSelected { generation, page: n });
        Ok(PaginatedResponse {
            data: session.items()[meta.range()].to_vec(),
            pagination: meta,
        })
    }

    /// Tear the session down
    ///
    /// Any fetch still in flight will find a newer generation and be dropped.
    pub fn close(&self) {
        let mut session = self.session();
        session.apply(SessionEvent::Closed);
        tracing::debug!(listing = %self.name, generation = session.generation(), "closed");
        self.publish(ListingEvent::Closed {
            listing: self.name.clone(),
        });
    }

    pub fn status(&self) -> ListingStatus {
        self.session().status()
    }

    /// Copy the session for rendering
    pub fn snapshot(&self) -> SessionSnapshot<T> {
        let session = self.session();
        SessionSnapshot {
            generation: session.generation(),
            status: session.status(),
            filter: session.filter().clone(),
            sort: session.sort(),
            items: session.items().to_vec(),
            cursor: session.cursor().cloned(),
            has_more: session.is_loaded() && session.cursor().is_some(),
            strategy: session.plan().map(|plan| plan.strategy),
            current_page: session.current_page(),
            last_error: session.last_error().cloned(),
        }
    }
}
