//! The remote collection provider seam

use crate::core::error::FetchError;
use crate::core::item::Listable;
use crate::core::query::RemoteQuery;
use async_trait::async_trait;

/// Remote document collection a listing reads from.
///
/// Implementations wrap a hosted document store. The engine is agnostic to
/// the transport; it only relies on:
/// - equality predicates on indexed fields
/// - single-field ordering
/// - `start_after` cursor pagination with a limit
/// - a plain "fetch every document" read
///
/// Documents are returned in the order the provider evaluated them. When no
/// ordering is requested that order is the collection's natural order.
///
/// Fetch errors are retryable with one exception: a `start_after` cursor
/// whose document has since been removed cannot be resumed, and retrying
/// the same page fails the same way. Callers recover with a fresh `load`.
#[async_trait]
pub trait CollectionProvider<T: Listable>: Send + Sync {
    /// Run a query
    ///
    /// Fails with [`FetchError::MissingIndex`] when the combination of
    /// equality fields and ordering cannot be served.
    async fn query(&self, query: &RemoteQuery) -> Result<Vec<T>, FetchError>;

    /// Read every document of the collection, unfiltered and unordered
    async fn fetch_all(&self) -> Result<Vec<T>, FetchError>;

    /// Whether the provider can serve the given equality fields with the
    /// given ordering
    ///
    /// Used for plan selection ahead of the call. Providers that cannot tell
    /// should return `true` and report `MissingIndex` from `query`.
    fn supports(&self, equality_fields: &[&str], order_field: Option<&str>) -> bool;
}
