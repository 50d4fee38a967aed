//! Configuration loading and management

use crate::core::engine::{ListingSettings, DEFAULT_FETCH_TIMEOUT};
use crate::core::error::ConfigError;
use crate::core::session::ListingMode;
use crate::core::sort::SortSpec;
use crate::core::Listable;
use crate::entities::{Job, Worker};
use crate::storage::CompositeIndex;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Configuration of one listing view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingDefinition {
    /// Listing name (e.g., "jobs", "featured_jobs")
    pub name: String,

    /// Collection the listing reads ("jobs" or "users")
    pub collection: String,

    /// Items per page
    pub page_size: usize,

    /// Whole-collection paging or incremental "load more"
    #[serde(default)]
    pub mode: ListingMode,

    /// Order used when a request names none
    #[serde(default)]
    pub default_sort: SortSpec,

    /// Timeout for one provider call, in milliseconds
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

fn default_fetch_timeout_ms() -> u64 {
    DEFAULT_FETCH_TIMEOUT.as_millis() as u64
}

impl ListingDefinition {
    pub fn settings(&self) -> ListingSettings {
        let settings = match self.mode {
            ListingMode::WholeCollection => ListingSettings::whole_collection(self.page_size),
            ListingMode::Incremental => ListingSettings::incremental(self.page_size),
        };
        settings.with_fetch_timeout(Duration::from_millis(self.fetch_timeout_ms))
    }
}

/// A composite index declared on a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub collection: String,
    pub equals: Vec<String>,
    pub order_by: String,
}

impl IndexDefinition {
    fn new(collection: &str, equals: &[&str], order_by: &str) -> Self {
        Self {
            collection: collection.to_string(),
            equals: equals.iter().map(|f| f.to_string()).collect(),
            order_by: order_by.to_string(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Optional JSON file with `jobs` and `workers` arrays loaded at startup
    #[serde(default)]
    pub seed_file: Option<String>,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            seed_file: None,
        }
    }
}

fn default_categories() -> Vec<String> {
    ["Construction", "Farming", "Cleaning", "Transport", "Gardening"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingsConfig {
    /// Listing views served by the application
    pub listings: Vec<ListingDefinition>,

    /// Job categories offered as filter tabs
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    #[serde(default)]
    pub server: ServerConfig,

    /// Composite indexes available on the collections
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
}

impl ListingsConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.to_string(),
            },
            _ => ConfigError::IoError {
                message: e.to_string(),
            },
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.to_string()),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check page sizes, listing names and collection names
    pub fn validate(&self) -> Result<(), ConfigError> {
        let known = [Job::collection(), Worker::collection()];
        let mut names = HashSet::new();

        for listing in &self.listings {
            if !names.insert(listing.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "listings.name".to_string(),
                    message: format!("duplicate listing '{}'", listing.name),
                });
            }
            if listing.page_size == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("listings.{}.page_size", listing.name),
                    message: "must be at least 1".to_string(),
                });
            }
            if !known.contains(&listing.collection.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: format!("listings.{}.collection", listing.name),
                    message: format!("unknown collection '{}'", listing.collection),
                });
            }
        }

        if let Some(index) = self
            .indexes
            .iter()
            .find(|index| !known.contains(&index.collection.as_str()))
        {
            return Err(ConfigError::InvalidValue {
                field: "indexes.collection".to_string(),
                message: format!("unknown collection '{}'", index.collection),
            });
        }

        Ok(())
    }

    /// Find a listing by name
    pub fn listing(&self, name: &str) -> Option<&ListingDefinition> {
        self.listings.iter().find(|l| l.name == name)
    }

    /// Composite indexes declared for a collection
    pub fn indexes_for(&self, collection: &str) -> Vec<CompositeIndex> {
        self.indexes
            .iter()
            .filter(|index| index.collection == collection)
            .map(|index| CompositeIndex {
                equals: index.equals.clone(),
                order_by: index.order_by.clone(),
            })
            .collect()
    }

    /// Create the default configuration
    pub fn default_config() -> Self {
        let listing = |name: &str, collection: &str, page_size, mode, default_sort| {
            ListingDefinition {
                name: name.to_string(),
                collection: collection.to_string(),
                page_size,
                mode,
                default_sort,
                fetch_timeout_ms: default_fetch_timeout_ms(),
            }
        };

        Self {
            listings: vec![
                listing("jobs", "jobs", 10, ListingMode::WholeCollection, SortSpec::Newest),
                listing(
                    "featured_jobs",
                    "jobs",
                    5,
                    ListingMode::WholeCollection,
                    SortSpec::Newest,
                ),
                listing("workers", "users", 9, ListingMode::Incremental, SortSpec::RatingHigh),
            ],
            categories: default_categories(),
            server: ServerConfig::default(),
            indexes: vec![
                IndexDefinition::new("jobs", &["category"], "created_at"),
                IndexDefinition::new("jobs", &["category"], "pay"),
                IndexDefinition::new("jobs", &["employer_id"], "created_at"),
                IndexDefinition::new("users", &["user_type"], "rating"),
                IndexDefinition::new("users", &["user_type"], "created_at"),
            ],
        }
    }
}
