//! Query parameters, remote query descriptions and pagination utilities

use crate::core::filter::{FilterKey, FilterSpec};
use crate::core::item::Listable;
use crate::core::sort::{Direction, SortSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Query parameters for listing endpoints
///
/// This structure is used to extract pagination, filter and sort parameters
/// from URL query strings. All parameters have sensible defaults.
///
/// # Example
/// ```text
/// GET /api/jobs?category=Farming&sort=pay-high&page=2&limit=10
/// GET /api/workers?skill=Transport&location=Nakuru&sort=rating
/// GET /api/jobs?q=harvest
/// GET /api/jobs?employer=emp-42&status=open
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct QueryParams {
    /// Page number (starts at 1)
    #[serde(default = "default_page")]
    pub page: usize,

    /// Number of items per page (falls back to the listing's page size)
    pub limit: Option<usize>,

    /// Sort order name (`newest`, `oldest`, `pay-high`, `pay-low`, `rating`, `experience`)
    pub sort: Option<String>,

    /// Free-text search
    pub q: Option<String>,

    pub category: Option<String>,
    pub skill: Option<String>,
    pub experience: Option<String>,
    pub location: Option<String>,

    /// Jobs posted by this employer account
    pub employer: Option<String>,

    /// Job status (`open`, ...)
    pub status: Option<String>,
}

fn default_page() -> usize {
    1
}

impl QueryParams {
    /// Get the requested page
    pub fn page(&self) -> usize {
        self.page
    }

    /// Get limit, ensuring it stays within 1..=100
    pub fn limit(&self, default: usize) -> usize {
        self.limit.unwrap_or(default).clamp(1, 100)
    }

    /// Build the filter described by these parameters
    ///
    /// Missing parameters and the `all` spelling are wildcards.
    pub fn filter(&self) -> FilterSpec {
        let mut filter = FilterSpec::all();
        let keyed = [
            (FilterKey::Category, &self.category),
            (FilterKey::Skill, &self.skill),
            (FilterKey::Experience, &self.experience),
            (FilterKey::Location, &self.location),
            (FilterKey::Employer, &self.employer),
            (FilterKey::Status, &self.status),
        ];
        for (key, value) in keyed {
            if let Some(value) = value {
                filter = filter.with(key, value.as_str());
            }
        }
        if let Some(q) = &self.q {
            filter = filter.with_search(q.as_str());
        }
        filter
    }

    /// Parse the sort parameter, using `default` when absent
    pub fn sort(&self, default: SortSpec) -> Result<SortSpec, String> {
        match &self.sort {
            Some(name) => name.parse(),
            None => Ok(default),
        }
    }
}

/// Opaque continuation token marking fetch progress through a collection
///
/// A cursor identifies the last raw document returned by the provider.
/// Providers resume strictly after it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    /// Cursor pointing after the given item
    pub fn after<T: Listable>(item: &T) -> Self {
        Self(item.id().to_string())
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Single-field ordering requested from the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: &'static str,
    pub direction: Direction,
}

impl From<SortSpec> for OrderBy {
    fn from(sort: SortSpec) -> Self {
        Self {
            field: sort.field(),
            direction: sort.direction(),
        }
    }
}

/// Query sent to a collection provider
///
/// Equality predicates and ordering are evaluated remotely; the engine is
/// responsible for everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteQuery {
    /// Exact-match predicates as (field, value)
    pub equals: Vec<(&'static str, String)>,
    pub order_by: Option<OrderBy>,
    pub start_after: Option<PageCursor>,
    pub limit: Option<usize>,
}

impl RemoteQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &'static str, value: impl Into<String>) -> Self {
        self.equals.push((field, value.into()));
        self
    }

    pub fn order_by(mut self, order: impl Into<OrderBy>) -> Self {
        self.order_by = Some(order.into());
        self
    }

    pub fn start_after(mut self, cursor: Option<PageCursor>) -> Self {
        self.start_after = cursor;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Fields constrained by equality
    pub fn equality_fields(&self) -> Vec<&'static str> {
        self.equals.iter().map(|(field, _)| *field).collect()
    }
}

/// Paginated response structure
///
/// This structure wraps one page of items with metadata about pagination state.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    /// The page of items
    pub data: Vec<T>,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Create pagination metadata from calculation
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        // Ensure limit is at least 1 to avoid division by zero
        let limit = limit.max(1);
        let total_pages = total.div_ceil(limit);
        let start = page.saturating_sub(1) * limit;

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: start + limit < total,
            has_prev: page > 1,
        }
    }

    /// Index range of the page inside the full sequence
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = (self.page.saturating_sub(1) * self.limit).min(self.total);
        let end = (start + self.limit).min(self.total);
        start..end
    }
}
