//! Filter specifications and their evaluation against listed items

use crate::core::item::Listable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The wildcard spelling used by the view's filter controls
pub const WILDCARD: &str = "all";

/// Enumerated filter keys exposed by the listing views
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey {
    /// Job category tab (Construction, Farming, ...)
    Category,
    /// Worker skill, matched by containment in the skills list
    Skill,
    /// Worker experience level (Beginner, Intermediate, Expert)
    Experience,
    Location,
    /// Account type of a user document ("worker" or "employer")
    UserType,
    Status,
    Employer,
}

impl FilterKey {
    /// Document field the key constrains
    pub fn field(&self) -> &'static str {
        match self {
            FilterKey::Category => "category",
            FilterKey::Skill => "skills",
            FilterKey::Experience => "experience",
            FilterKey::Location => "location",
            FilterKey::UserType => "user_type",
            FilterKey::Status => "status",
            FilterKey::Employer => "employer_id",
        }
    }

    /// Whether the field holds several values
    ///
    /// Multi-valued fields are matched by containment, which the provider's
    /// equality queries cannot express.
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, FilterKey::Skill)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterKey::Category => "category",
            FilterKey::Skill => "skill",
            FilterKey::Experience => "experience",
            FilterKey::Location => "location",
            FilterKey::UserType => "user_type",
            FilterKey::Status => "status",
            FilterKey::Employer => "employer",
        };
        f.write_str(name)
    }
}

impl FromStr for FilterKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category" => Ok(FilterKey::Category),
            "skill" => Ok(FilterKey::Skill),
            "experience" => Ok(FilterKey::Experience),
            "location" => Ok(FilterKey::Location),
            "user_type" => Ok(FilterKey::UserType),
            "status" => Ok(FilterKey::Status),
            "employer" => Ok(FilterKey::Employer),
            other => Err(format!("unknown filter key '{}'", other)),
        }
    }
}

/// Value selected for one filter key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterValue {
    /// Matches every item
    Any,
    /// Item field must be defined and equal (or contain) this value
    Exact(String),
}

impl FilterValue {
    pub fn is_any(&self) -> bool {
        matches!(self, FilterValue::Any)
    }

    pub fn as_exact(&self) -> Option<&str> {
        match self {
            FilterValue::Any => None,
            FilterValue::Exact(v) => Some(v),
        }
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        if value.is_empty() || value == WILDCARD {
            FilterValue::Any
        } else {
            FilterValue::Exact(value)
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::from(value.to_string())
    }
}

impl From<FilterValue> for String {
    fn from(value: FilterValue) -> Self {
        match value {
            FilterValue::Any => WILDCARD.to_string(),
            FilterValue::Exact(v) => v,
        }
    }
}

/// A complete set of filter constraints for one listing
///
/// Keys not present are wildcards. Concrete keys are combined with logical
/// AND. `search` is a free-text term matched case-insensitively against the
/// item's searchable fields; it is never evaluated by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    constraints: BTreeMap<FilterKey, FilterValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    search: Option<String>,
}

impl FilterSpec {
    /// The all-wildcard filter
    pub fn all() -> Self {
        Self::default()
    }

    /// Set the value for a key, replacing any previous value
    pub fn with(mut self, key: FilterKey, value: impl Into<FilterValue>) -> Self {
        match value.into() {
            FilterValue::Any => {
                self.constraints.remove(&key);
            }
            exact => {
                self.constraints.insert(key, exact);
            }
        }
        self
    }

    /// Set the free-text search term (blank terms are ignored)
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_lowercase());
        self
    }

    /// Value currently selected for a key
    pub fn get(&self, key: FilterKey) -> FilterValue {
        self.constraints
            .get(&key)
            .cloned()
            .unwrap_or(FilterValue::Any)
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Iterate over the concrete (non-wildcard) constraints
    pub fn concrete(&self) -> impl Iterator<Item = (FilterKey, &str)> {
        self.constraints
            .iter()
            .filter_map(|(key, value)| value.as_exact().map(|v| (*key, v)))
    }

    /// True when nothing is constrained
    pub fn is_wildcard(&self) -> bool {
        self.concrete().next().is_none() && self.search.is_none()
    }

    /// The part of this filter not covered by `server_keys`
    ///
    /// Used to compute the residual predicate applied client-side after a
    /// provider query already enforced `server_keys`.
    pub fn without(&self, server_keys: &[FilterKey]) -> FilterSpec {
        FilterSpec {
            constraints: self
                .constraints
                .iter()
                .filter(|(key, _)| !server_keys.contains(*key))
                .map(|(key, value)| (*key, value.clone()))
                .collect(),
            search: self.search.clone(),
        }
    }

    /// Evaluate the filter against one item
    pub fn matches<T: Listable>(&self, item: &T) -> bool {
        let constraints_hold = self.concrete().all(|(key, expected)| {
            item.field_value(key.field())
                .is_some_and(|value| value.matches(expected))
        });

        constraints_hold
            && self.search.as_deref().is_none_or(|term| {
                item.search_text()
                    .iter()
                    .any(|text| text.to_lowercase().contains(term))
            })
    }

    /// Keep only the items matching this filter, preserving order
    pub fn apply<T: Listable>(&self, items: Vec<T>) -> Vec<T> {
        if self.is_wildcard() {
            return items;
        }
        items.into_iter().filter(|item| self.matches(item)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldValue;

    #[derive(Clone, Debug)]
    struct Card {
        id: String,
        category: Option<String>,
        skills: Vec<String>,
        title: String,
    }

    impl Listable for Card {
        fn collection() -> &'static str {
            "cards"
        }

        fn id(&self) -> &str {
            &self.id
        }

        fn field_value(&self, field: &str) -> Option<FieldValue> {
            match field {
                "category" => self.category.clone().map(FieldValue::String),
                "skills" => Some(FieldValue::List(self.skills.clone())),
                _ => None,
            }
        }

        fn search_text(&self) -> Vec<&str> {
            vec![self.title.as_str()]
        }
    }

    fn card(id: &str, category: Option<&str>, skills: &[&str], title: &str) -> Card {
        Card {
            id: id.to_string(),
            category: category.map(String::from),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_wildcard_matches_everything() {
        let filter = FilterSpec::all().with(FilterKey::Category, "all");
        assert!(filter.is_wildcard());
        assert!(filter.matches(&card("1", None, &[], "")));
    }

    #[test]
    fn test_absent_field_never_matches_concrete_value() {
        let filter = FilterSpec::all().with(FilterKey::Category, "Farming");
        assert!(filter.matches(&card("1", Some("Farming"), &[], "")));
        assert!(!filter.matches(&card("2", None, &[], "")));
        assert!(!filter.matches(&card("3", Some("Cleaning"), &[], "")));
    }

    #[test]
    fn test_concrete_keys_combine_with_and() {
        let filter = FilterSpec::all()
            .with(FilterKey::Category, "Farming")
            .with(FilterKey::Skill, "Transport");

        assert!(filter.matches(&card("1", Some("Farming"), &["Transport"], "")));
        assert!(!filter.matches(&card("2", Some("Farming"), &["Cleaning"], "")));
        assert!(!filter.matches(&card("3", Some("Cleaning"), &["Transport"], "")));
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let filter = FilterSpec::all().with_search("  MAIZE ");
        assert_eq!(filter.search(), Some("maize"));
        assert!(filter.matches(&card("1", None, &[], "Maize harvest helper")));
        assert!(!filter.matches(&card("2", None, &[], "Bricklayer")));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filter = FilterSpec::all().with_search("   ");
        assert!(filter.is_wildcard());
    }

    #[test]
    fn test_without_keeps_residual_constraints() {
        let filter = FilterSpec::all()
            .with(FilterKey::Category, "Farming")
            .with(FilterKey::Skill, "Transport")
            .with_search("driver");

        let residual = filter.without(&[FilterKey::Category]);
        assert_eq!(residual.get(FilterKey::Category), FilterValue::Any);
        assert_eq!(
            residual.get(FilterKey::Skill),
            FilterValue::Exact("Transport".into())
        );
        assert_eq!(residual.search(), Some("driver"));
    }

    #[test]
    fn test_apply_preserves_order() {
        let items = vec![
            card("a", Some("Farming"), &[], ""),
            card("b", Some("Cleaning"), &[], ""),
            card("c", Some("Farming"), &[], ""),
        ];
        let filter = FilterSpec::all().with(FilterKey::Category, "Farming");
        let ids: Vec<String> = filter.apply(items).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_filter_value_serde_uses_wildcard_spelling() {
        let json = serde_json::to_string(&FilterValue::Any).expect("serialize should succeed");
        assert_eq!(json, "\"all\"");
        let parsed: FilterValue =
            serde_json::from_str("\"Nairobi\"").expect("deserialize should succeed");
        assert_eq!(parsed, FilterValue::Exact("Nairobi".into()));
    }
}
