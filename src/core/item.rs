//! The listable-item abstraction shared by jobs and workers

use crate::core::field::FieldValue;

/// Trait for records that can be browsed through a listing.
///
/// A listable item exposes:
/// - id: Unique document identifier within its collection
/// - field_value: Dynamic field access used by filters and sort orders
/// - search_text: Fields matched by free-text search
///
/// The engine never mutates an item once fetched; everything else about
/// the record is payload for the view layer.
pub trait Listable: Clone + Send + Sync + 'static {
    /// The collection name on the remote provider (e.g., "jobs")
    fn collection() -> &'static str;

    /// Get the unique document identifier
    fn id(&self) -> &str;

    /// Get the value of a specific field by name
    ///
    /// Returns `None` when the document does not carry the field.
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    /// Text fields scanned by free-text search
    fn search_text(&self) -> Vec<&str> {
        Vec::new()
    }
}
