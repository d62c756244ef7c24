//! Use-case surface of the chommie data-access core.
//!
//! Composes the repositories, cache, ranking engine, and lockout guard into
//! the operations the UI/API-route layer consumes: job search, job details,
//! trending jobs, registration, authentication, and profile views. This is
//! a library boundary, not a network service; components are constructed at
//! process start and injected explicitly.
//!
//! ```no_run
//! use std::sync::Arc;
//! use chommie_core::{AppConfig, CacheDb};
//! use chommie_service::{Accounts, AttemptGuard, JobCatalog};
//! use chommie_store::RestDataService;
//!
//! # async fn boot() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let store = Arc::new(RestDataService::new(&config)?);
//! let cache = CacheDb::open(&config.db_path, config.compress_threshold).await?;
//! let guard = Arc::new(AttemptGuard::new(&config));
//!
//! let catalog = JobCatalog::new(store.clone(), cache.clone(), guard.clone(), &config);
//! let accounts = Accounts::new(store, cache, guard, &config);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod guard;
pub mod jobs;
pub mod password;
pub mod users;

pub use error::ServiceError;
pub use guard::AttemptGuard;
pub use jobs::{JobCatalog, JobDetails, SearchOutcome};
pub use users::{Accounts, ApplicationStats, ApplicationWithJob, AuthOutcome, UserProfile};
