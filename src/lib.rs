//! # Manualink
//!
//! Listing engine and JSON API for a manual-labour job marketplace.
//!
//! ## Features
//!
//! - **Filter, sort, paginate**: Jobs and workers browsed through one generic engine
//! - **Two paging modes**: Whole-collection with page jumps, or incremental "load more"
//! - **Query planning**: Equality filters and ordering pushed to the provider when it has an index
//! - **Single flight**: One operation per listing session, stale results discarded by generation
//! - **Event bus**: Listing activity and user notices broadcast to subscribers
//! - **Configuration-Based**: Listings, categories and indexes defined in YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use manualink::prelude::*;
//!
//! let jobs = Arc::new(InMemoryCollection::with_documents(load_jobs()));
//! let engine = ListingEngine::new("jobs", jobs, ListingSettings::whole_collection(10));
//!
//! let filter = FilterSpec::all().with(FilterKey::Category, "Farming");
//! let first_page = engine.load(filter, SortSpec::PayHigh).await?;
//! let third_page = engine.jump_to_page(3)?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod stats;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Listing engine ===
    pub use crate::core::{
        engine::{ListingEngine, ListingSettings, SessionSnapshot},
        events::{AppEvent, EventBus, EventEnvelope, ListingEvent, Notice, NoticeLevel, Subscription},
        field::FieldValue,
        filter::{FilterKey, FilterSpec, FilterValue},
        item::Listable,
        plan::{FetchStrategy, QueryPlan},
        provider::CollectionProvider,
        query::{PageCursor, PaginatedResponse, PaginationMeta, QueryParams, RemoteQuery},
        session::{ListingMode, ListingStatus},
        sort::SortSpec,
    };

    // === Errors ===
    pub use crate::core::error::{
        ConfigError, FetchError, ListingError, ManualinkError, ManualinkResult,
    };

    // === Domain ===
    pub use crate::entities::{ExperienceLevel, Job, NewJob, Worker, WorkerProfile};

    // === Storage ===
    pub use crate::storage::{CompositeIndex, InMemoryCollection};

    // === Config ===
    pub use crate::config::{IndexDefinition, ListingDefinition, ListingsConfig, ServerConfig};

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder};
    pub use crate::stats::category_counts;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
}
