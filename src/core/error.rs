//! Typed error handling for the listing engine and its API
//!
//! This module provides the error hierarchy used across the crate. Engine
//! operations return the specific [`ListingError`]; the HTTP layer converts
//! everything into [`ManualinkError`], which knows its status code and JSON
//! shape.
//!
//! # Error Categories
//!
//! - [`FetchError`]: The remote collection call failed or timed out (retryable)
//! - [`ListingError`]: Listing session errors (concurrency, paging, preconditions)
//! - [`ConfigError`]: Errors related to configuration parsing and validation
//! - [`ValidationError`]: Errors related to input validation
//! - [`RequestError`]: Malformed HTTP requests
//!
//! # Example
//!
//! ```rust,ignore
//! match engine.jump_to_page(4) {
//!     Ok(page) => render(page),
//!     Err(ListingError::InvalidPage { total_pages, .. }) => {
//!         disable_next_button(total_pages);
//!     }
//!     Err(e) => show_banner(e.to_string()),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type for the crate
///
/// Each variant contains a more specific error type for that category.
#[derive(Debug)]
pub enum ManualinkError {
    /// Listing session errors
    Listing(ListingError),

    /// Remote collection errors
    Fetch(FetchError),

    /// Configuration errors
    Config(ConfigError),

    /// Validation errors
    Validation(ValidationError),

    /// HTTP/Request errors
    Request(RequestError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for ManualinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManualinkError::Listing(e) => write!(f, "{}", e),
            ManualinkError::Fetch(e) => write!(f, "{}", e),
            ManualinkError::Config(e) => write!(f, "{}", e),
            ManualinkError::Validation(e) => write!(f, "{}", e),
            ManualinkError::Request(e) => write!(f, "{}", e),
            ManualinkError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ManualinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ManualinkError::Listing(e) => Some(e),
            ManualinkError::Fetch(e) => Some(e),
            ManualinkError::Config(e) => Some(e),
            ManualinkError::Validation(e) => Some(e),
            ManualinkError::Request(e) => Some(e),
            ManualinkError::Internal(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ManualinkError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ManualinkError::Listing(e) => e.status_code(),
            ManualinkError::Fetch(e) => e.status_code(),
            ManualinkError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ManualinkError::Validation(_) => StatusCode::BAD_REQUEST,
            ManualinkError::Request(_) => StatusCode::BAD_REQUEST,
            ManualinkError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ManualinkError::Listing(e) => e.error_code(),
            ManualinkError::Fetch(e) => e.error_code(),
            ManualinkError::Config(_) => "CONFIG_ERROR",
            ManualinkError::Validation(_) => "VALIDATION_ERROR",
            ManualinkError::Request(e) => e.error_code(),
            ManualinkError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    /// Get additional details for the error
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ManualinkError::Listing(ListingError::InvalidPage {
                requested,
                total_pages,
            }) => Some(serde_json::json!({
                "requested": requested,
                "total_pages": total_pages
            })),
            ManualinkError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ManualinkError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(code = self.error_code(), error = %self, "request failed");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Fetch Errors
// =============================================================================

/// Errors raised by the remote collection provider
///
/// All fetch errors are transient from the session's point of view: the
/// operation that produced them can be re-invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The provider call failed
    Remote {
        collection: String,
        message: String,
    },

    /// The provider did not answer in time
    Timeout {
        collection: String,
        timeout_ms: u64,
    },

    /// The provider has no index for the requested (filter, order) combination
    MissingIndex {
        collection: String,
        fields: Vec<String>,
    },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Remote {
                collection,
                message,
            } => write!(f, "Failed to fetch '{}': {}", collection, message),
            FetchError::Timeout {
                collection,
                timeout_ms,
            } => write!(
                f,
                "Fetching '{}' timed out after {}ms",
                collection, timeout_ms
            ),
            FetchError::MissingIndex { collection, fields } => write!(
                f,
                "Collection '{}' has no index on [{}]",
                collection,
                fields.join(", ")
            ),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    pub fn remote(collection: impl Into<String>, message: impl Into<String>) -> Self {
        FetchError::Remote {
            collection: collection.into(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            FetchError::Remote { .. } => StatusCode::BAD_GATEWAY,
            FetchError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            FetchError::MissingIndex { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            FetchError::Remote { .. } => "FETCH_FAILED",
            FetchError::Timeout { .. } => "FETCH_TIMEOUT",
            FetchError::MissingIndex { .. } => "FETCH_MISSING_INDEX",
        }
    }
}

impl From<FetchError> for ManualinkError {
    fn from(err: FetchError) -> Self {
        ManualinkError::Fetch(err)
    }
}

// =============================================================================
// Listing Errors
// =============================================================================

/// Errors reported by listing session operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
    /// The remote fetch failed; the session keeps what it had
    Fetch(FetchError),

    /// An operation was invoked while another one was in flight
    ConcurrentOperation {
        operation: &'static str,
        in_flight: &'static str,
    },

    /// Requested page is outside `1..=total_pages`
    InvalidPage {
        requested: usize,
        total_pages: usize,
    },

    /// The operation's precondition does not hold
    NotReady {
        operation: &'static str,
        reason: String,
    },

    /// A newer `load` or a close made this result stale; it was discarded
    Superseded {
        operation: &'static str,
        generation: u64,
    },

    /// The caller dropped the operation before its fetch finished
    Cancelled { operation: &'static str },
}

impl fmt::Display for ListingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingError::Fetch(e) => write!(f, "{}", e),
            ListingError::ConcurrentOperation {
                operation,
                in_flight,
            } => write!(
                f,
                "Cannot {} while {} is in progress",
                operation, in_flight
            ),
            ListingError::InvalidPage {
                requested,
                total_pages,
            } => write!(
                f,
                "Page {} is out of range (1..={})",
                requested, total_pages
            ),
            ListingError::NotReady { operation, reason } => {
                write!(f, "Cannot {}: {}", operation, reason)
            }
            ListingError::Superseded {
                operation,
                generation,
            } => write!(
                f,
                "Result of {} (generation {}) was discarded by a newer request",
                operation, generation
            ),
            ListingError::Cancelled { operation } => {
                write!(f, "{} was cancelled before it finished", operation)
            }
        }
    }
}

impl std::error::Error for ListingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListingError::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

impl ListingError {
    /// Whether re-invoking the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ListingError::Fetch(_)
                | ListingError::ConcurrentOperation { .. }
                | ListingError::Cancelled { .. }
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ListingError::Fetch(e) => e.status_code(),
            ListingError::ConcurrentOperation { .. } => StatusCode::CONFLICT,
            ListingError::InvalidPage { .. } => StatusCode::BAD_REQUEST,
            ListingError::NotReady { .. } => StatusCode::CONFLICT,
            ListingError::Superseded { .. } => StatusCode::CONFLICT,
            ListingError::Cancelled { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ListingError::Fetch(e) => e.error_code(),
            ListingError::ConcurrentOperation { .. } => "CONCURRENT_OPERATION",
            ListingError::InvalidPage { .. } => "INVALID_PAGE",
            ListingError::NotReady { .. } => "LISTING_NOT_READY",
            ListingError::Superseded { .. } => "LISTING_SUPERSEDED",
            ListingError::Cancelled { .. } => "LISTING_CANCELLED",
        }
    }
}

impl From<FetchError> for ListingError {
    fn from(err: FetchError) -> Self {
        ListingError::Fetch(err)
    }
}

impl From<ListingError> for ManualinkError {
    fn from(err: ListingError) -> Self {
        ManualinkError::Listing(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid configuration value
    InvalidValue {
        field: String,
        message: String,
    },

    /// Configuration file not found
    FileNotFound {
        path: String,
    },

    /// IO error reading configuration
    IoError {
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::InvalidValue { field, message } => {
                write!(f, "Invalid value for '{}': {}", field, message)
            }
            ConfigError::FileNotFound { path } => {
                write!(f, "Configuration file not found: {}", path)
            }
            ConfigError::IoError { message } => {
                write!(f, "IO error reading config: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for ManualinkError {
    fn from(err: ConfigError) -> Self {
        ManualinkError::Config(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug)]
pub enum ValidationError {
    /// Single field validation error
    FieldError {
        field: String,
        message: String,
    },

    /// Multiple field validation errors
    FieldErrors(Vec<FieldValidationError>),

    /// Invalid JSON format
    InvalidJson {
        message: String,
    },
}

/// A single field validation error
#[derive(Debug, Clone, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::FieldError { field, message } => {
                write!(f, "Validation error for field '{}': {}", field, message)
            }
            ValidationError::FieldErrors(errors) => {
                let msgs: Vec<String> = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect();
                write!(f, "Validation errors: {}", msgs.join(", "))
            }
            ValidationError::InvalidJson { message } => {
                write!(f, "Invalid JSON: {}", message)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldValidationError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldValidationError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        ValidationError::FieldErrors(fields)
    }
}

impl From<ValidationError> for ManualinkError {
    fn from(err: ValidationError) -> Self {
        ManualinkError::Validation(err)
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to HTTP request handling
#[derive(Debug)]
pub enum RequestError {
    /// A query string parameter could not be interpreted
    InvalidQuery {
        parameter: String,
        message: String,
    },

    /// Unknown listing name
    UnknownListing {
        name: String,
    },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::InvalidQuery { parameter, message } => {
                write!(f, "Invalid query parameter '{}': {}", parameter, message)
            }
            RequestError::UnknownListing { name } => {
                write!(f, "Unknown listing: {}", name)
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::InvalidQuery { .. } => "INVALID_QUERY",
            RequestError::UnknownListing { .. } => "UNKNOWN_LISTING",
        }
    }
}

impl From<RequestError> for ManualinkError {
    fn from(err: RequestError) -> Self {
        ManualinkError::Request(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for ManualinkError {
    fn from(err: serde_json::Error) -> Self {
        ManualinkError::Validation(ValidationError::InvalidJson {
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for ManualinkError {
    fn from(err: std::io::Error) -> Self {
        ManualinkError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for ManualinkError {
    fn from(err: serde_yaml::Error) -> Self {
        ManualinkError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<anyhow::Error> for ManualinkError {
    fn from(err: anyhow::Error) -> Self {
        ManualinkError::Internal(err.to_string())
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for API operations
pub type ManualinkResult<T> = Result<T, ManualinkError>;

// =============================================================================
// Tests
// =============================================================================
