//! Domain records listed by the marketplace

pub mod job;
pub mod worker;

pub use job::{DATE_UNAVAILABLE, Job, NewJob};
pub use worker::{ExperienceLevel, WORKER_USER_TYPE, Worker, WorkerProfile};
