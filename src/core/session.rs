//! Listing session state and its transitions
//!
//! A [`ListingSession`] is owned by one mounted listing view. Every change
//! to it goes through [`ListingSession::apply`], which computes the next
//! state from the previous state and a [`SessionEvent`] only. Events carry
//! the generation they were started under; an event from an older
//! generation is stale and leaves the session untouched.
//!
//! ```text
//!            load / load_more
//!   Idle ────────────────────▶ Loading ──ok──▶ Loaded
//!                                 │  ▲            │
//!                              err│  │retry       │load / load_more
//!                                 ▼  │            │
//!                                Error ◀──────────┘ (invalid page)
//! ```
//!
//! The filter and sort of a `load` stay pending until its fetch succeeds, so
//! the committed pair always describes the items held.

use crate::core::error::ListingError;
use crate::core::filter::FilterSpec;
use crate::core::item::Listable;
use crate::core::plan::QueryPlan;
use crate::core::query::PageCursor;
use crate::core::sort::SortSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// How a listing is paged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingMode {
    /// Fetch the whole filtered collection once, then jump between pages locally
    #[default]
    WholeCollection,
    /// Fetch one page at a time with a cursor ("load more")
    Incremental,
}

/// Engine operations, used for single-flight bookkeeping and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    LoadMore,
    JumpToPage,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Load => "load",
            Operation::LoadMore => "load_more",
            Operation::JumpToPage => "jump_to_page",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs to the session reducer
#[derive(Debug)]
pub enum SessionEvent<T> {
    /// A `load` was admitted; opens a new generation
    LoadStarted { filter: FilterSpec, sort: SortSpec },

    /// The fetch of a `load` finished
    LoadSucceeded {
        generation: u64,
        plan: QueryPlan,
        items: Vec<T>,
        cursor: Option<PageCursor>,
    },

    /// A `load_more` was admitted
    LoadMoreStarted { generation: u64 },

    /// The fetch of a `load_more` finished
    PageAppended {
        generation: u64,
        items: Vec<T>,
        cursor: Option<PageCursor>,
    },

    /// A fetch or a page request failed
    Failed {
        generation: u64,
        error: ListingError,
    },

    /// The caller dropped an admitted operation before its fetch finished
    Cancelled {
        generation: u64,
        operation: Operation,
    },

    /// An operation was refused without starting
    Rejected { error: ListingError },

    /// A page was selected in whole-collection mode
    PageSelected { generation: u64, page: usize },

    /// The owning view went away
    Closed,
}

/// Mutable state of one listing view
#[derive(Debug, Clone)]
pub struct ListingSession<T> {
    generation: u64,
    filter: FilterSpec,
    sort: SortSpec,
    /// Filter and sort of an admitted `load` that has not succeeded yet
    pending: Option<(FilterSpec, SortSpec)>,
    status: ListingStatus,
    in_flight: Option<Operation>,
    items: Vec<T>,
    seen: HashSet<String>,
    cursor: Option<PageCursor>,
    plan: Option<QueryPlan>,
    /// Whether a load succeeded within the current generation
    loaded: bool,
    current_page: usize,
    last_error: Option<ListingError>,
}

impl<T> Default for ListingSession<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            filter: FilterSpec::all(),
            sort: SortSpec::default(),
            pending: None,
            status: ListingStatus::Idle,
            in_flight: None,
            items: Vec::new(),
            seen: HashSet::new(),
            cursor: None,
            plan: None,
            loaded: false,
            current_page: 1,
            last_error: None,
        }
    }
}

impl<T: Listable> ListingSession<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event
    ///
    /// Returns `false` when the event belongs to an older generation and was
    /// ignored.
    pub fn apply(&mut self, event: SessionEvent<T>) -> bool {
        match event {
            SessionEvent::LoadStarted { filter, sort } => {
                self.generation += 1;
                self.pending = Some((filter, sort));
                self.status = ListingStatus::Loading;
                self.in_flight = Some(Operation::Load);
                self.loaded = false;
                true
            }
            SessionEvent::LoadSucceeded {
                generation,
                plan,
                items,
                cursor,
            } => {
                if generation != self.generation {
                    return false;
                }
                if let Some((filter, sort)) = self.pending.take() {
                    self.filter = filter;
                    self.sort = sort;
                }
                self.items.clear();
                self.seen.clear();
                self.append_unseen(items);
                self.cursor = cursor;
                self.plan = Some(plan);
                self.loaded = true;
                self.current_page = 1;
                self.settle(ListingStatus::Loaded, None);
                true
            }
            SessionEvent::LoadMoreStarted { generation } => {
                if generation != self.generation {
                    return false;
                }
                self.status = ListingStatus::Loading;
                self.in_flight = Some(Operation::LoadMore);
                true
            }
            SessionEvent::PageAppended {
                generation,
                items,
                cursor,
            } => {
                if generation != self.generation {
                    return false;
                }
                self.append_unseen(items);
                self.cursor = cursor;
                self.settle(ListingStatus::Loaded, None);
                true
            }
            SessionEvent::Failed { generation, error } => {
                if generation != self.generation {
                    return false;
                }
                self.pending = None;
                self.settle(ListingStatus::Error, Some(error));
                true
            }
            SessionEvent::Cancelled {
                generation,
                operation,
            } => {
                if generation != self.generation || self.in_flight != Some(operation) {
                    return false;
                }
                self.pending = None;
                self.settle(
                    ListingStatus::Error,
                    Some(ListingError::Cancelled {
                        operation: operation.as_str(),
                    }),
                );
                true
            }
            SessionEvent::Rejected { error } => {
                self.last_error = Some(error);
                true
            }
            SessionEvent::PageSelected { generation, page } => {
                if generation != self.generation {
                    return false;
                }
                self.current_page = page;
                self.settle(ListingStatus::Loaded, None);
                true
            }
            SessionEvent::Closed => {
                let generation = self.generation + 1;
                *self = Self::default();
                self.generation = generation;
                true
            }
        }
    }

    fn settle(&mut self, status: ListingStatus, error: Option<ListingError>) {
        self.status = status;
        self.in_flight = None;
        self.last_error = error;
    }

    /// Append items whose identifier has not been seen yet
    fn append_unseen(&mut self, items: Vec<T>) {
        for item in items {
            if self.seen.insert(item.id().to_string()) {
                self.items.push(item);
            }
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    /// The (filter, sort) pair the session is working towards
    ///
    /// The pending pair while a `load` is in flight, otherwise the committed
    /// one.
    pub fn requested(&self) -> (&FilterSpec, SortSpec) {
        match &self.pending {
            Some((filter, sort)) => (filter, *sort),
            None => (&self.filter, self.sort),
        }
    }

    pub fn status(&self) -> ListingStatus {
        self.status
    }

    pub fn in_flight(&self) -> Option<Operation> {
        self.in_flight
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn cursor(&self) -> Option<&PageCursor> {
        self.cursor.as_ref()
    }

    pub fn plan(&self) -> Option<&QueryPlan> {
        self.plan.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn last_error(&self) -> Option<&ListingError> {
        self.last_error.as_ref()
    }
}
