//! Core module containing the listing engine and the types it is built from

pub mod engine;
pub mod error;
pub mod events;
pub mod field;
pub mod filter;
pub mod item;
pub mod plan;
pub mod provider;
pub mod query;
pub mod session;
pub mod sort;

pub use engine::{DEFAULT_FETCH_TIMEOUT, ListingEngine, ListingSettings, SessionSnapshot};
pub use error::{
    ConfigError, FetchError, ListingError, ManualinkError, ManualinkResult, RequestError,
    ValidationError,
};
pub use events::{AppEvent, EventBus, EventEnvelope, ListingEvent, Notice, NoticeLevel, Subscription};
pub use field::FieldValue;
pub use filter::{FilterKey, FilterSpec, FilterValue, WILDCARD};
pub use item::Listable;
pub use plan::{FetchStrategy, QueryPlan};
pub use provider::CollectionProvider;
pub use query::{PageCursor, PaginatedResponse, PaginationMeta, QueryParams, RemoteQuery};
pub use session::{ListingMode, ListingSession, ListingStatus, Operation, SessionEvent};
pub use sort::{Direction, SortSpec};
