//! Storage-facing layer for the chommie data-access core.
//!
//! This crate turns loosely-typed search and mutation requests into safe,
//! structured store requests. It provides:
//!
//! - A narrow `DataService` adapter trait with REST and in-memory backends
//! - Schema validation and pattern sanitization ahead of the adapter
//! - Per-entity repositories (jobs, users, applications) with batched
//!   identifier resolution and transient-failure retries
//! - A pure ranking engine for trending and similar-job orderings

pub mod adapter;
pub mod error;
pub mod model;
pub mod rank;
pub mod repo;
pub mod validate;

pub use adapter::{DataService, MemoryDataService, Method, Query, RestDataService, StoreRequest, StoreResponse};
pub use error::StoreError;
pub use model::{
    Application, ApplicationStatus, Job, JobPatch, JobSearch, JobType, NewApplication, NewJob, NewUser,
    SubscriptionPlan, User,
};
pub use rank::{FrequencyExtractor, KeywordExtractor};
pub use repo::{ApplicationRepository, JobRepository, UserRepository};
