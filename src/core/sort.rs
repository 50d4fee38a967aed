//! Named sort orders over listed items
//!
//! Every order is a total, stable comparator over one designated field.
//! Items whose field is missing or cannot be interpreted (for instance a
//! malformed posting date) always sort after every valid item, whatever the
//! direction, so broken records never surface ahead of valid ones.

use crate::core::field::compare_missing_last;
use crate::core::item::Listable;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// How the designated field is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
    Numeric,
    Temporal,
}

/// Direction of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// The orderings offered by the listing views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortSpec {
    #[default]
    #[serde(rename = "newest")]
    Newest,
    #[serde(rename = "oldest")]
    Oldest,
    #[serde(rename = "pay-high")]
    PayHigh,
    #[serde(rename = "pay-low")]
    PayLow,
    /// Rating, high to low
    #[serde(rename = "rating")]
    RatingHigh,
    /// Experience level, most experienced first
    #[serde(rename = "experience")]
    MostExperienced,
}

impl SortSpec {
    pub const ALL: [SortSpec; 6] = [
        SortSpec::Newest,
        SortSpec::Oldest,
        SortSpec::PayHigh,
        SortSpec::PayLow,
        SortSpec::RatingHigh,
        SortSpec::MostExperienced,
    ];

    /// Field the order compares
    pub fn field(&self) -> &'static str {
        match self {
            SortSpec::Newest | SortSpec::Oldest => "created_at",
            SortSpec::PayHigh | SortSpec::PayLow => "pay",
            SortSpec::RatingHigh => "rating",
            SortSpec::MostExperienced => "experience_rank",
        }
    }

    pub fn kind(&self) -> SortKind {
        match self {
            SortSpec::Newest | SortSpec::Oldest => SortKind::Temporal,
            _ => SortKind::Numeric,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            SortSpec::Oldest | SortSpec::PayLow => Direction::Asc,
            _ => Direction::Desc,
        }
    }

    /// Whether the field is computed from other fields
    ///
    /// Derived fields do not exist in the stored documents, so the provider
    /// cannot order by them.
    pub fn is_derived(&self) -> bool {
        matches!(self, SortSpec::MostExperienced)
    }

    /// Extract the comparison key of an item
    ///
    /// Temporal keys are epoch milliseconds. `None` marks a missing or
    /// unparseable value.
    pub fn key<T: Listable>(&self, item: &T) -> Option<f64> {
        let value = item.field_value(self.field())?;
        match self.kind() {
            SortKind::Numeric => value.as_number(),
            SortKind::Temporal => value.as_instant().map(|dt| dt.timestamp_millis() as f64),
        }
    }

    /// Compare two items under this order
    pub fn compare<T: Listable>(&self, a: &T, b: &T) -> Ordering {
        compare_missing_last(
            self.key(a),
            self.key(b),
            self.direction() == Direction::Desc,
        )
    }

    /// Sort items, keeping fetch order among equal keys
    pub fn apply<T: Listable>(&self, items: Vec<T>) -> Vec<T> {
        let mut keyed: Vec<(Option<f64>, T)> =
            items.into_iter().map(|item| (self.key(&item), item)).collect();
        let descending = self.direction() == Direction::Desc;
        keyed.sort_by(|(a, _), (b, _)| compare_missing_last(*a, *b, descending));
        keyed.into_iter().map(|(_, item)| item).collect()
    }

    /// True when `items` is already in this order
    pub fn is_sorted<T: Listable>(&self, items: &[T]) -> bool {
        items
            .windows(2)
            .all(|pair| self.compare(&pair[0], &pair[1]) != Ordering::Greater)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortSpec::Newest => "newest",
            SortSpec::Oldest => "oldest",
            SortSpec::PayHigh => "pay-high",
            SortSpec::PayLow => "pay-low",
            SortSpec::RatingHigh => "rating",
            SortSpec::MostExperienced => "experience",
        }
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortSpec::ALL
            .into_iter()
            .find(|spec| spec.as_str() == s)
            .ok_or_else(|| format!("unknown sort order '{}'", s))
    }
}
