//! Field value types and comparison

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A polymorphic field value read from a listed document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    /// Multi-valued field such as a worker's skills
    List(Vec<String>),
    Null,
}

impl FieldValue {
    /// Get the value as a float, widening integers
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    /// Interpret the value as an instant
    ///
    /// Strings are accepted in RFC 3339 or `YYYY-MM-DD` form. Anything else
    /// (including a malformed string) yields `None`.
    pub fn as_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::DateTime(dt) => Some(*dt),
            FieldValue::String(s) => parse_instant(s),
            _ => None,
        }
    }

    /// Generic ordering key: numbers as-is, instants as epoch milliseconds
    pub fn sort_key(&self) -> Option<f64> {
        self.as_number()
            .or_else(|| self.as_instant().map(|dt| dt.timestamp_millis() as f64))
    }

    /// Equality against a concrete filter value
    ///
    /// Primitive fields compare strictly against the rendered value, list
    /// fields match when they contain it. Null never matches.
    pub fn matches(&self, expected: &str) -> bool {
        match self {
            FieldValue::String(s) => s == expected,
            FieldValue::Integer(i) => expected.parse::<i64>().is_ok_and(|e| e == *i),
            FieldValue::Float(f) => expected.parse::<f64>().is_ok_and(|e| e == *f),
            FieldValue::Boolean(b) => expected.parse::<bool>().is_ok_and(|e| e == *b),
            FieldValue::DateTime(dt) => parse_instant(expected).is_some_and(|e| e == *dt),
            FieldValue::List(values) => values.iter().any(|v| v == expected),
            FieldValue::Null => false,
        }
    }
}

/// Parse a stored date string into an instant
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Compare two optional keys, placing missing keys last
///
/// `descending` flips the order of present keys only; absent keys stay at
/// the end in both directions.
pub fn compare_missing_last<K: PartialOrd>(
    a: Option<K>,
    b: Option<K>,
    descending: bool,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            if descending { ord.reverse() } else { ord }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
