//! Shared test harness for listing engine testing
//!
//! Provides job and worker fixtures plus providers with controllable
//! behaviour wrapped around `InMemoryCollection`:
//! - `GatedProvider`: every call blocks until the test releases it
//! - `FailingProvider`: the next N calls fail, or every call times out
//! - `CountingProvider`: records each query it serves
//! - `UnindexedProvider`: claims every index, then reports it missing
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! mod listing_harness;
//! use listing_harness::*;
//! ```

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

use manualink::core::error::FetchError;
use manualink::core::item::Listable;
use manualink::core::provider::CollectionProvider;
use manualink::core::query::RemoteQuery;
use manualink::entities::{Job, Worker, WorkerProfile};
use manualink::storage::InMemoryCollection;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn job(id: &str, category: &str, pay: Option<i64>, created_at: Option<&str>) -> Job {
    Job {
        id: id.to_string(),
        title: format!("{} job {}", category, id),
        category: category.to_string(),
        location: "Nairobi".to_string(),
        pay,
        pay_period: Some("daily".to_string()),
        requirements: vec![],
        description: None,
        employer_id: None,
        status: Some("open".to_string()),
        created_at: created_at.map(str::to_string),
    }
}

/// The three-job collection used by the "Farming, pay high" scenario
pub fn scenario_jobs() -> Vec<Job> {
    vec![
        job("1", "Farming", Some(1000), Some("2024-01-01")),
        job("2", "Construction", Some(1500), Some("2024-02-01")),
        job("3", "Farming", Some(800), Some("2024-03-01")),
    ]
}

/// `count` jobs of one category, ids `{prefix}1..`, oldest first
pub fn numbered_jobs(prefix: &str, category: &str, count: usize) -> Vec<Job> {
    (1..=count)
        .map(|i| {
            let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                .map(|d| d + chrono::Days::new(i as u64))
                .map(|d| d.format("%Y-%m-%d").to_string());
            job(
                &format!("{}{}", prefix, i),
                category,
                Some(100 * i as i64),
                day.as_deref(),
            )
        })
        .collect()
}

/// Five jobs split between `emp-a` (j1, j3, j5) and `emp-b` (j2, j4);
/// j5 is already filled
pub fn employer_jobs() -> Vec<Job> {
    let mut jobs = numbered_jobs("j", "Farming", 5);
    for (i, job) in jobs.iter_mut().enumerate() {
        let employer = if i % 2 == 0 { "emp-a" } else { "emp-b" };
        job.employer_id = Some(employer.to_string());
    }
    jobs[4].status = Some("filled".to_string());
    jobs
}

/// A mixed collection across all categories with some broken records
pub fn mixed_jobs() -> Vec<Job> {
    let categories = ["Construction", "Farming", "Cleaning", "Transport", "Gardening"];
    let mut jobs: Vec<Job> = (0..23)
        .map(|i| {
            let category = categories[i % categories.len()];
            let created = format!("2024-{:02}-{:02}", 1 + i % 12, 1 + (i * 7) % 28);
            job(
                &format!("m{}", i),
                category,
                Some(((i * 37) % 11) as i64 * 250),
                Some(created.as_str()),
            )
        })
        .collect();
    jobs.push(job("broken-date", "Farming", Some(900), Some("Invalid Date")));
    jobs.push(job("no-pay", "Farming", None, None));
    jobs
}

pub fn worker(
    id: &str,
    skills: &[&str],
    experience: Option<&str>,
    location: Option<&str>,
    rating: Option<f64>,
) -> Worker {
    Worker {
        id: id.to_string(),
        name: format!("Worker {}", id),
        user_type: "worker".to_string(),
        profile: WorkerProfile {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            experience: experience.map(str::to_string),
            location: location.map(str::to_string),
            rating,
            bio: None,
        },
        created_at: None,
    }
}

pub fn employer(id: &str) -> Worker {
    Worker {
        id: id.to_string(),
        name: format!("Employer {}", id),
        user_type: "employer".to_string(),
        profile: WorkerProfile::default(),
        created_at: None,
    }
}

pub fn sample_workers() -> Vec<Worker> {
    vec![
        worker("w1", &["Farming", "Transport"], Some("Expert"), Some("Nakuru"), Some(4.8)),
        worker("w2", &["Cleaning"], Some("Beginner"), Some("Nairobi"), Some(3.9)),
        employer("e1"),
        worker("w3", &["Transport"], Some("Intermediate"), Some("Nakuru"), None),
        worker("w4", &["Construction", "Transport"], Some("Expert"), Some("Mombasa"), Some(4.1)),
        worker("w5", &["Gardening"], None, Some("Kiambu"), Some(4.5)),
    ]
}

pub fn ids<T: Listable>(items: &[T]) -> Vec<String> {
    items.iter().map(|item| item.id().to_string()).collect()
}

pub fn collection<T: Listable>(items: Vec<T>) -> Arc<InMemoryCollection<T>> {
    Arc::new(InMemoryCollection::with_documents(items))
}

// ---------------------------------------------------------------------------
// GatedProvider: calls block until released
// ---------------------------------------------------------------------------

/// Provider whose calls wait until the test releases them by arrival index
pub struct GatedProvider<T> {
    inner: InMemoryCollection<T>,
    gates: Mutex<Vec<Option<oneshot::Sender<()>>>>,
}

impl<T: Listable> GatedProvider<T> {
    pub fn new(items: Vec<T>) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryCollection::with_documents(items),
            gates: Mutex::new(Vec::new()),
        })
    }

    pub fn inner(&self) -> &InMemoryCollection<T> {
        &self.inner
    }

    pub fn arrived(&self) -> usize {
        self.gates.lock().unwrap().len()
    }

    /// Yield until at least `n` calls are waiting or done
    pub async fn wait_for_calls(&self, n: usize) {
        while self.arrived() < n {
            tokio::task::yield_now().await;
        }
    }

    /// Let the call with the given arrival index answer
    pub fn release(&self, index: usize) {
        let sender = self.gates.lock().unwrap()[index].take();
        if let Some(sender) = sender {
            let _ = sender.send(());
        }
    }

    async fn gate(&self) {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push(Some(tx));
        let _ = rx.await;
    }
}

#[async_trait]
impl<T: Listable> CollectionProvider<T> for GatedProvider<T> {
    async fn query(&self, query: &RemoteQuery) -> Result<Vec<T>, FetchError> {
        self.gate().await;
        self.inner.query(query).await
    }

    async fn fetch_all(&self) -> Result<Vec<T>, FetchError> {
        self.gate().await;
        self.inner.fetch_all().await
    }

    fn supports(&self, equality_fields: &[&str], order_field: Option<&str>) -> bool {
        self.inner.supports(equality_fields, order_field)
    }
}

// ---------------------------------------------------------------------------
// FailingProvider: scripted failures
// ---------------------------------------------------------------------------

/// Provider that fails its next N calls, or stalls every call
pub struct FailingProvider<T> {
    inner: InMemoryCollection<T>,
    failures_left: AtomicUsize,
    stall: Option<Duration>,
}

impl<T: Listable> FailingProvider<T> {
    pub fn new(items: Vec<T>) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryCollection::with_documents(items),
            failures_left: AtomicUsize::new(0),
            stall: None,
        })
    }

    /// Every call sleeps for `delay` before answering
    pub fn stalling(items: Vec<T>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryCollection::with_documents(items),
            failures_left: AtomicUsize::new(0),
            stall: Some(delay),
        })
    }

    pub fn fail_next(&self, calls: usize) {
        self.failures_left.store(calls, Ordering::SeqCst);
    }

    async fn before_call(&self) -> Result<(), FetchError> {
        if let Some(delay) = self.stall {
            tokio::time::sleep(delay).await;
        }
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(FetchError::remote(T::collection(), "network unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Listable> CollectionProvider<T> for FailingProvider<T> {
    async fn query(&self, query: &RemoteQuery) -> Result<Vec<T>, FetchError> {
        self.before_call().await?;
        self.inner.query(query).await
    }

    async fn fetch_all(&self) -> Result<Vec<T>, FetchError> {
        self.before_call().await?;
        self.inner.fetch_all().await
    }

    fn supports(&self, equality_fields: &[&str], order_field: Option<&str>) -> bool {
        self.inner.supports(equality_fields, order_field)
    }
}

// ---------------------------------------------------------------------------
// CountingProvider: records traffic
// ---------------------------------------------------------------------------

/// Provider that records every query and fetch-all it serves
pub struct CountingProvider<T> {
    inner: InMemoryCollection<T>,
    queries: Mutex<Vec<RemoteQuery>>,
    fetch_alls: AtomicUsize,
}

impl<T: Listable> CountingProvider<T> {
    pub fn new(inner: InMemoryCollection<T>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            queries: Mutex::new(Vec::new()),
            fetch_alls: AtomicUsize::new(0),
        })
    }

    pub fn queries(&self) -> Vec<RemoteQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn fetch_all_calls(&self) -> usize {
        self.fetch_alls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Listable> CollectionProvider<T> for CountingProvider<T> {
    async fn query(&self, query: &RemoteQuery) -> Result<Vec<T>, FetchError> {
        self.queries.lock().unwrap().push(query.clone());
        self.inner.query(query).await
    }

    async fn fetch_all(&self) -> Result<Vec<T>, FetchError> {
        self.fetch_alls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_all().await
    }

    fn supports(&self, equality_fields: &[&str], order_field: Option<&str>) -> bool {
        self.inner.supports(equality_fields, order_field)
    }
}

// ---------------------------------------------------------------------------
// UnindexedProvider: capability check passes, query reports missing index
// ---------------------------------------------------------------------------

/// Provider that claims every index up front and has none
pub struct UnindexedProvider<T> {
    inner: InMemoryCollection<T>,
    attempts: Mutex<Vec<RemoteQuery>>,
}

impl<T: Listable> UnindexedProvider<T> {
    pub fn new(items: Vec<T>) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryCollection::with_documents(items),
            attempts: Mutex::new(Vec::new()),
        })
    }

    pub fn attempts(&self) -> Vec<RemoteQuery> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl<T: Listable> CollectionProvider<T> for UnindexedProvider<T> {
    async fn query(&self, query: &RemoteQuery) -> Result<Vec<T>, FetchError> {
        self.attempts.lock().unwrap().push(query.clone());
        self.inner.query(query).await
    }

    async fn fetch_all(&self) -> Result<Vec<T>, FetchError> {
        self.inner.fetch_all().await
    }

    fn supports(&self, _equality_fields: &[&str], _order_field: Option<&str>) -> bool {
        true
    }
}
