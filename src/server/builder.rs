//! ServerBuilder for fluent API to build the HTTP server

use super::handlers::AppState;
use super::router::build_routes;
use crate::config::ListingsConfig;
use crate::core::Listable;
use crate::core::events::EventBus;
use crate::entities::{Job, Worker};
use crate::storage::InMemoryCollection;
use anyhow::{Context, Result};
use axum::Router;
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Documents loaded into the collections at startup
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub workers: Vec<Worker>,
}

impl SeedData {
    /// Read seed documents from a JSON file
    pub fn from_json_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read seed file '{}'", path))?;
        let seed = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse seed file '{}'", path))?;
        Ok(seed)
    }
}

/// Builder for the HTTP server
///
/// # Example
///
/// ```ignore
/// ServerBuilder::new(ListingsConfig::default_config())
///     .with_event_bus(1024)
///     .serve()
///     .await?;
/// ```
pub struct ServerBuilder {
    config: ListingsConfig,
    jobs: Option<InMemoryCollection<Job>>,
    workers: Option<InMemoryCollection<Worker>>,
    event_bus: Option<EventBus>,
}

impl ServerBuilder {
    pub fn new(config: ListingsConfig) -> Self {
        Self {
            config,
            jobs: None,
            workers: None,
            event_bus: None,
        }
    }

    /// Serve jobs from the given collection instead of a fresh one
    pub fn with_jobs(mut self, jobs: InMemoryCollection<Job>) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Serve workers from the given collection instead of a fresh one
    pub fn with_workers(mut self, workers: InMemoryCollection<Worker>) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Use a bus with the given capacity for listing events and notices
    pub fn with_event_bus(mut self, capacity: usize) -> Self {
        self.event_bus = Some(EventBus::new(capacity));
        self
    }

    /// Share an existing bus, e.g. to subscribe before serving
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.event_bus = Some(events);
        self
    }

    /// Build the shared handler state
    ///
    /// Collections not supplied are created with the configured indexes and
    /// filled from the seed file, if one is configured.
    pub fn build_state(self) -> Result<AppState> {
        self.config.validate()?;

        let jobs = match self.jobs {
            Some(jobs) => jobs,
            None => InMemoryCollection::new()
                .with_indexes(self.config.indexes_for(Job::collection())),
        };
        let workers = match self.workers {
            Some(workers) => workers,
            None => InMemoryCollection::new()
                .with_indexes(self.config.indexes_for(Worker::collection())),
        };

        if let Some(path) = &self.config.server.seed_file {
            let seed = SeedData::from_json_file(path)?;
            tracing::info!(
                path = %path,
                jobs = seed.jobs.len(),
                workers = seed.workers.len(),
                "seeding collections"
            );
            jobs.extend(seed.jobs)?;
            workers.extend(seed.workers)?;
        }

        Ok(AppState {
            config: Arc::new(self.config),
            jobs: Arc::new(jobs),
            workers: Arc::new(workers),
            events: self.event_bus.unwrap_or_default(),
        })
    }

    /// Build the final router
    pub fn build(self) -> Result<Router> {
        Ok(build_routes(self.build_state()?))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to `server.bind` from the configuration
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.server.bind.clone();
        let app = self.build()?;
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
