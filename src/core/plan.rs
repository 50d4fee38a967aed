//! Query planning: splitting a listing request between provider and client
//!
//! A listing request (filter + sort) is served by one of three strategies,
//! from most to least work pushed to the provider:
//!
//! ```text
//! ServerQuery  ── equality filters + ordering remotely, residual filters locally
//!      │ no index
//!      ▼
//! SortedScan   ── ordering remotely, every filter locally
//!      │ no index / derived sort field
//!      ▼
//! FetchAll     ── read everything, filter and sort locally
//! ```
//!
//! Only the first two keep a server-side order, which is what makes cursor
//! pagination produce a prefix of the final sequence. `FetchAll` therefore
//! always reads the whole collection in one call.

use crate::core::filter::{FilterKey, FilterSpec};
use crate::core::item::Listable;
use crate::core::query::{PageCursor, RemoteQuery};
use crate::core::sort::SortSpec;
use serde::Serialize;
use std::fmt;

/// Where the work of a listing request happens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    ServerQuery,
    SortedScan,
    FetchAll,
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchStrategy::ServerQuery => "server_query",
            FetchStrategy::SortedScan => "sorted_scan",
            FetchStrategy::FetchAll => "fetch_all",
        };
        f.write_str(name)
    }
}

/// A concrete execution plan for one (filter, sort) pair
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub strategy: FetchStrategy,
    pub sort: SortSpec,
    /// Keys the provider evaluates
    server_keys: Vec<FilterKey>,
    server_equals: Vec<(&'static str, String)>,
    /// Everything the provider does not evaluate
    residual: FilterSpec,
}

impl QueryPlan {
    /// The most ambitious plan for the request, before capability checks
    pub fn optimistic(filter: &FilterSpec, sort: SortSpec) -> Self {
        if sort.is_derived() {
            return Self::fetch_all(filter, sort);
        }

        let (server_keys, server_equals): (Vec<FilterKey>, Vec<(&'static str, String)>) = filter
            .concrete()
            .filter(|(key, _)| !key.is_multi_valued())
            .map(|(key, value)| (key, (key.field(), value.to_string())))
            .unzip();

        if server_keys.is_empty() {
            return Self::sorted_scan(filter, sort);
        }

        Self {
            strategy: FetchStrategy::ServerQuery,
            sort,
            residual: filter.without(&server_keys),
            server_keys,
            server_equals,
        }
    }

    /// Pick the best plan the provider declares it can serve
    pub fn select<F>(filter: &FilterSpec, sort: SortSpec, supports: F) -> Self
    where
        F: Fn(&[&str], Option<&str>) -> bool,
    {
        let mut plan = Self::optimistic(filter, sort);
        loop {
            if plan.strategy == FetchStrategy::FetchAll
                || supports(&plan.equality_fields(), plan.order_field())
            {
                return plan;
            }
            match plan.degrade(filter) {
                Some(next) => plan = next,
                None => return plan,
            }
        }
    }

    /// The next weaker plan, or `None` when already reading everything
    pub fn degrade(&self, filter: &FilterSpec) -> Option<Self> {
        match self.strategy {
            FetchStrategy::ServerQuery => Some(Self::sorted_scan(filter, self.sort)),
            FetchStrategy::SortedScan => Some(Self::fetch_all(filter, self.sort)),
            FetchStrategy::FetchAll => None,
        }
    }

    fn sorted_scan(filter: &FilterSpec, sort: SortSpec) -> Self {
        Self {
            strategy: FetchStrategy::SortedScan,
            sort,
            server_keys: Vec::new(),
            server_equals: Vec::new(),
            residual: filter.clone(),
        }
    }

    fn fetch_all(filter: &FilterSpec, sort: SortSpec) -> Self {
        Self {
            strategy: FetchStrategy::FetchAll,
            sort,
            server_keys: Vec::new(),
            server_equals: Vec::new(),
            residual: filter.clone(),
        }
    }

    /// Whether the provider orders results, allowing cursor pagination
    pub fn is_server_ordered(&self) -> bool {
        self.strategy != FetchStrategy::FetchAll
    }

    pub fn server_keys(&self) -> &[FilterKey] {
        &self.server_keys
    }

    pub fn residual(&self) -> &FilterSpec {
        &self.residual
    }

    pub fn equality_fields(&self) -> Vec<&'static str> {
        self.server_equals.iter().map(|(field, _)| *field).collect()
    }

    pub fn order_field(&self) -> Option<&'static str> {
        self.is_server_ordered().then(|| self.sort.field())
    }

    /// Build the provider query for one page
    ///
    /// `limit` of `None` reads to the end of the collection.
    pub fn remote_query(&self, cursor: Option<PageCursor>, limit: Option<usize>) -> RemoteQuery {
        let mut query = RemoteQuery::new();
        for (field, value) in &self.server_equals {
            query = query.where_eq(*field, value.clone());
        }
        if self.is_server_ordered() {
            query = query.order_by(self.sort);
        }
        query = query.start_after(cursor);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        query
    }

    /// Apply the client-side part of the plan to raw provider results
    pub fn finish<T: Listable>(&self, raw: Vec<T>) -> Vec<T> {
        let filtered = self.residual.apply(raw);
        if self.is_server_ordered() {
            filtered
        } else {
            self.sort.apply(filtered)
        }
    }
}
