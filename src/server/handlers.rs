//! HTTP handlers for the listing API
//!
//! Every listing request gets its own [`ListingEngine`]: the request is the
//! view, so the session lives exactly as long as the request.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::config::{ListingDefinition, ListingsConfig};
use crate::core::engine::{ListingEngine, ListingSettings};
use crate::core::error::{ManualinkError, ManualinkResult, RequestError, ValidationError};
use crate::core::events::{AppEvent, EventBus, Notice};
use crate::core::filter::{FilterKey, FilterSpec};
use crate::core::item::Listable;
use crate::core::provider::CollectionProvider;
use crate::core::query::QueryParams;
use crate::core::session::ListingMode;
use crate::entities::{Job, NewJob, WORKER_USER_TYPE, Worker};
use crate::stats::category_counts;
use crate::storage::InMemoryCollection;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<ListingsConfig>,
    pub jobs: Arc<InMemoryCollection<Job>>,
    pub workers: Arc<InMemoryCollection<Worker>>,
    pub events: EventBus,
}

impl AppState {
    fn listing(&self, name: &str) -> ManualinkResult<&ListingDefinition> {
        self.config.listing(name).ok_or_else(|| {
            RequestError::UnknownListing {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Build a fresh engine for one request
    fn engine<T: Listable>(
        &self,
        definition: &ListingDefinition,
        provider: Arc<dyn CollectionProvider<T>>,
        params: &QueryParams,
        mode: ListingMode,
    ) -> ListingEngine<T> {
        let page_size = params.limit(definition.page_size);
        let settings = match mode {
            ListingMode::WholeCollection => ListingSettings::whole_collection(page_size),
            ListingMode::Incremental => ListingSettings::incremental(page_size),
        }
        .with_fetch_timeout(definition.settings().fetch_timeout);

        ListingEngine::new(definition.name.clone(), provider, settings)
            .with_events(self.events.clone())
    }
}

fn invalid_sort(message: String) -> ManualinkError {
    RequestError::InvalidQuery {
        parameter: "sort".to_string(),
        message,
    }
    .into()
}

/// A job with its rendered posting label
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    #[serde(flatten)]
    pub job: Job,
    pub posted_label: String,
}

/// Response for `GET /api/jobs`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobsPage {
    pub jobs: Vec<JobView>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}

/// Response for `GET /api/workers`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkersPage {
    pub workers: Vec<Worker>,
    pub page: usize,
    pub has_more: bool,
}

/// Health check endpoint handler
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "manualink"
    }))
}

/// Load one page of a job listing
async fn job_page(
    state: &AppState,
    listing: &str,
    params: &QueryParams,
) -> ManualinkResult<JobsPage> {
    let definition = state.listing(listing)?;
    let sort = params.sort(definition.default_sort).map_err(invalid_sort)?;
    let filter = params
        .filter()
        .without(&[FilterKey::Skill, FilterKey::Experience]);

    let engine = state.engine::<Job>(
        definition,
        state.jobs.clone(),
        params,
        ListingMode::WholeCollection,
    );
    let first = engine.load(filter, sort).await?;
    if first.is_empty() && params.page() == 1 {
        return Ok(JobsPage {
            jobs: Vec::new(),
            total: 0,
            page: 1,
            total_pages: 0,
        });
    }
    let page = engine.jump_to_page(params.page())?;

    let now = Utc::now();
    Ok(JobsPage {
        jobs: page
            .data
            .into_iter()
            .map(|job| JobView {
                posted_label: job.posted_label(now),
                job,
            })
            .collect(),
        total: page.pagination.total,
        page: page.pagination.page,
        total_pages: page.pagination.total_pages,
    })
}

/// `GET /api/jobs?category&q&location&employer&status&sort&page&limit`
///
/// Loads the whole filtered collection, then returns the requested page.
/// With `employer` set this is the employer's own job list. An empty result
/// is answered on page 1 only; it has no pages to jump to.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> ManualinkResult<Json<JobsPage>> {
    job_page(&state, "jobs", &params).await.map(Json)
}

/// `GET /api/jobs/featured`, the home page strip
pub async fn list_featured_jobs(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> ManualinkResult<Json<JobsPage>> {
    job_page(&state, "featured_jobs", &params).await.map(Json)
}

/// `POST /api/jobs`
pub async fn create_job(
    State(state): State<AppState>,
    Json(payload): Json<NewJob>,
) -> ManualinkResult<impl IntoResponse> {
    payload.validate().map_err(ValidationError::from)?;
    if !state.config.categories.contains(&payload.category) {
        return Err(ValidationError::FieldError {
            field: "jobCategory".to_string(),
            message: format!("unknown category '{}'", payload.category),
        }
        .into());
    }

    let job = payload.into_job(Uuid::new_v4().to_string(), Utc::now());
    state.jobs.insert(job.clone())?;

    tracing::info!(job_id = %job.id, category = %job.category, "job posted");
    state
        .events
        .publish(AppEvent::Notice(Notice::success("Job posted successfully")));

    Ok((StatusCode::CREATED, Json(job)))
}

/// `GET /api/workers?skill&experience&location&q&sort&page&limit`
///
/// Follows the listing's configured mode. In incremental mode `page` N is
/// the batch returned by the (N-1)th "load more".
pub async fn list_workers(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> ManualinkResult<Json<WorkersPage>> {
    let definition = state.listing("workers")?;
    let sort = params.sort(definition.default_sort).map_err(invalid_sort)?;
    let filter: FilterSpec = params
        .filter()
        .without(&[FilterKey::Category, FilterKey::Employer, FilterKey::Status])
        .with(FilterKey::UserType, WORKER_USER_TYPE);

    let engine = state.engine::<Worker>(
        definition,
        state.workers.clone(),
        &params,
        definition.mode,
    );
    let page = params.page();

    match definition.mode {
        ListingMode::WholeCollection => {
            let first = engine.load(filter, sort).await?;
            if first.is_empty() && page == 1 {
                return Ok(Json(WorkersPage {
                    workers: Vec::new(),
                    page,
                    has_more: false,
                }));
            }
            let slice = engine.jump_to_page(page)?;
            Ok(Json(WorkersPage {
                workers: slice.data,
                page,
                has_more: slice.pagination.has_next,
            }))
        }
        ListingMode::Incremental => {
            if page == 0 {
                return Err(RequestError::InvalidQuery {
                    parameter: "page".to_string(),
                    message: "pages start at 1".to_string(),
                }
                .into());
            }
            let mut batch = engine.load(filter, sort).await?;
            for _ in 1..page {
                if !engine.snapshot().has_more {
                    batch.clear();
                    break;
                }
                batch = engine.load_more().await?;
            }
            Ok(Json(WorkersPage {
                workers: batch,
                page,
                has_more: engine.snapshot().has_more,
            }))
        }
    }
}

/// `GET /api/categories`
pub async fn list_categories(State(state): State<AppState>) -> ManualinkResult<Json<Value>> {
    let counts: IndexMap<String, usize> =
        category_counts(state.jobs.as_ref(), &state.config.categories).await?;
    let total: usize = counts.values().sum();

    Ok(Json(json!({
        "categories": counts,
        "total": total
    })))
}
