//! Server module exposing the listings over HTTP
//!
//! This module provides:
//! - `ServerBuilder` to assemble state, routes and graceful shutdown
//! - JSON handlers for jobs, workers and category counts

pub mod builder;
pub mod handlers;
pub mod router;

pub use builder::{SeedData, ServerBuilder};
pub use handlers::AppState;
pub use router::build_routes;
