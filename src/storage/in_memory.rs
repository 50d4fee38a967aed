//! In-memory implementation of CollectionProvider for development and tests
//!
//! Behaves like a hosted document collection: equality predicates and a
//! single-field ordering are evaluated "server side", and combining both
//! requires a declared composite index, exactly as a hosted store would
//! demand. Queries without a matching index fail with
//! [`FetchError::MissingIndex`].
//!
//! Cursors are document ids. Removing the cursor document invalidates it.

use crate::core::error::FetchError;
use crate::core::field::compare_missing_last;
use crate::core::item::Listable;
use crate::core::provider::CollectionProvider;
use crate::core::query::RemoteQuery;
use crate::core::sort::Direction;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// A composite index: equality fields plus one ordering field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeIndex {
    pub equals: Vec<String>,
    pub order_by: String,
}

impl CompositeIndex {
    pub fn new(equals: &[&str], order_by: &str) -> Self {
        Self {
            equals: equals.iter().map(|f| f.to_string()).collect(),
            order_by: order_by.to_string(),
        }
    }

    /// Whether this index serves the given fields, in any order
    fn covers(&self, equality_fields: &[&str], order_field: &str) -> bool {
        self.order_by == order_field
            && self.equals.len() == equality_fields.len()
            && equality_fields
                .iter()
                .all(|field| self.equals.iter().any(|f| f == field))
    }
}

/// In-memory document collection
///
/// Cheap to clone; clones share the same documents. Uses RwLock for
/// thread-safe access.
#[derive(Clone, Debug)]
pub struct InMemoryCollection<T> {
    documents: Arc<RwLock<Vec<T>>>,
    indexes: Arc<Vec<CompositeIndex>>,
}

impl<T: Listable> InMemoryCollection<T> {
    /// Create an empty collection without composite indexes
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
            indexes: Arc::new(Vec::new()),
        }
    }

    /// Create a collection holding `documents` in natural order
    pub fn with_documents(documents: Vec<T>) -> Self {
        Self {
            documents: Arc::new(RwLock::new(documents)),
            indexes: Arc::new(Vec::new()),
        }
    }

    /// Declare composite indexes
    pub fn with_indexes(mut self, indexes: Vec<CompositeIndex>) -> Self {
        self.indexes = Arc::new(indexes);
        self
    }

    fn lock_error(e: impl std::fmt::Display) -> FetchError {
        FetchError::remote(T::collection(), format!("Failed to acquire lock: {}", e))
    }

    /// Insert a document, replacing any document with the same id
    pub fn insert(&self, document: T) -> Result<(), FetchError> {
        let mut documents = self.documents.write().map_err(Self::lock_error)?;
        match documents.iter_mut().find(|d| d.id() == document.id()) {
            Some(existing) => *existing = document,
            None => documents.push(document),
        }
        Ok(())
    }

    /// Insert several documents
    pub fn extend(&self, new_documents: impl IntoIterator<Item = T>) -> Result<(), FetchError> {
        for document in new_documents {
            self.insert(document)?;
        }
        Ok(())
    }

    /// Remove a document by id, returning it if present
    pub fn remove(&self, id: &str) -> Result<Option<T>, FetchError> {
        let mut documents = self.documents.write().map_err(Self::lock_error)?;
        let position = documents.iter().position(|d| d.id() == id);
        Ok(position.map(|p| documents.remove(p)))
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Listable> Default for InMemoryCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Listable> CollectionProvider<T> for InMemoryCollection<T> {
    async fn query(&self, query: &RemoteQuery) -> Result<Vec<T>, FetchError> {
        let equality_fields = query.equality_fields();
        let order_field = query.order_by.as_ref().map(|o| o.field);
        if !self.supports(&equality_fields, order_field) {
            return Err(FetchError::MissingIndex {
                collection: T::collection().to_string(),
                fields: equality_fields
                    .iter()
                    .copied()
                    .chain(order_field)
                    .map(str::to_string)
                    .collect(),
            });
        }

        let documents = self.documents.read().map_err(Self::lock_error)?;

        let mut matched: Vec<T> = documents
            .iter()
            .filter(|doc| {
                query.equals.iter().all(|(field, expected)| {
                    doc.field_value(field)
                        .is_some_and(|value| value.matches(expected))
                })
            })
            .cloned()
            .collect();

        if let Some(order) = &query.order_by {
            let descending = order.direction == Direction::Desc;
            // Vec::sort_by is stable, ties keep natural order
            matched.sort_by(|a, b| {
                compare_missing_last(
                    a.field_value(order.field).and_then(|v| v.sort_key()),
                    b.field_value(order.field).and_then(|v| v.sort_key()),
                    descending,
                )
            });
        }

        let start = match &query.start_after {
            Some(cursor) => {
                let position = matched
                    .iter()
                    .position(|doc| doc.id() == cursor.as_str())
                    .ok_or_else(|| {
                        FetchError::remote(
                            T::collection(),
                            format!("cursor '{}' does not point into the result set", cursor),
                        )
                    })?;
                position + 1
            }
            None => 0,
        };

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matched.into_iter().skip(start).take(limit).collect())
    }

    async fn fetch_all(&self) -> Result<Vec<T>, FetchError> {
        let documents = self.documents.read().map_err(Self::lock_error)?;
        Ok(documents.clone())
    }

    fn supports(&self, equality_fields: &[&str], order_field: Option<&str>) -> bool {
        let Some(order_field) = order_field else {
            return true;
        };
        equality_fields.is_empty()
            || equality_fields.iter().all(|f| *f == order_field)
            || self
                .indexes
                .iter()
                .any(|index| index.covers(equality_fields, order_field))
    }
}
