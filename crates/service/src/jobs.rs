//! Job catalog use cases: search, details, trending, and the validated
//! mutations behind them.
//!
//! Reads go through the cache with per-operation TTLs; any mutation
//! invalidates the owning entity's whole cache namespace rather than
//! chasing precise dependencies. Cache trouble on the read path degrades to
//! a miss and a warning, never a failed request.

use crate::ServiceError;
use crate::guard::AttemptGuard;
use chommie_core::cache::{cache_key, entity_prefix};
use chommie_core::{AppConfig, CacheDb};
use chommie_store::{
    Application, ApplicationRepository, DataService, Job, JobPatch, JobRepository, JobSearch, NewApplication, NewJob,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const ENTITY_JOB: &str = "job";
const ENTITY_APPLICATION: &str = "application";

/// Similar jobs attached to a details view.
const SIMILAR_LIMIT: usize = 5;

/// Search result page plus the total match count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub jobs: Vec<Job>,
    pub total: u64,
}

/// Details view for a single job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDetails {
    pub job: Job,
    pub similar_jobs: Vec<Job>,
    /// Whether the requesting user already applied; false when the request
    /// is anonymous.
    pub has_applied: bool,
}

/// Read a cache key, degrading any failure to a miss.
pub(crate) async fn cache_get(cache: &CacheDb, key: &str) -> Option<serde_json::Value> {
    match cache.get(key).await {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("cache read failed for {key}: {err}");
            None
        }
    }
}

/// Populate a cache key, logging failures instead of surfacing them.
pub(crate) async fn cache_set(cache: &CacheDb, key: &str, value: &serde_json::Value, ttl: i64) {
    if let Err(err) = cache.set(key, value, ttl).await {
        tracing::warn!("cache write failed for {key}: {err}");
    }
}

/// Decode a cached value, treating shape drift as a miss.
pub(crate) fn cache_decode<T: serde::de::DeserializeOwned>(key: &str, value: serde_json::Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            tracing::warn!("cache entry for {key} has stale shape: {err}");
            None
        }
    }
}

/// Use-case surface for the job catalog.
pub struct JobCatalog {
    jobs: JobRepository,
    applications: ApplicationRepository,
    cache: CacheDb,
    guard: Arc<AttemptGuard>,
    entity_ttl: i64,
    search_ttl: i64,
    max_search_limit: usize,
}

impl JobCatalog {
    pub fn new(store: Arc<dyn DataService>, cache: CacheDb, guard: Arc<AttemptGuard>, config: &AppConfig) -> Self {
        Self {
            jobs: JobRepository::new(store.clone(), config),
            applications: ApplicationRepository::new(store, config),
            cache,
            guard,
            entity_ttl: config.entity_ttl_secs,
            search_ttl: config.search_ttl_secs,
            max_search_limit: config.max_search_limit,
        }
    }

    /// Search active jobs.
    ///
    /// When an actor key is supplied the call is flood-gated: a locked
    /// actor is refused outright and every gated call counts toward the
    /// window.
    pub async fn search_jobs(&self, actor: Option<&str>, search: &JobSearch) -> Result<SearchOutcome, ServiceError> {
        if let Some(actor) = actor {
            let guard_key = format!("search:{actor}");
            if self.guard.is_locked(&guard_key).await {
                return Err(ServiceError::RateLimited("search temporarily blocked for this client".to_string()));
            }
            self.guard.record_attempt(&guard_key, false).await;
        }

        let effective = search.clamped(self.max_search_limit);
        let key = cache_key(ENTITY_JOB, "search", &serde_json::to_value(&effective)?);

        if let Some(cached) = cache_get(&self.cache, &key).await
            && let Some(outcome) = cache_decode::<SearchOutcome>(&key, cached)
        {
            tracing::debug!("cache hit for job search");
            return Ok(outcome);
        }

        let (jobs, total) = self.jobs.search(&effective).await?;
        let outcome = SearchOutcome { jobs, total };
        cache_set(&self.cache, &key, &serde_json::to_value(&outcome)?, self.search_ttl).await;
        Ok(outcome)
    }

    /// Jobs ranked by application volume over the trailing window.
    pub async fn get_trending_jobs(&self, days: i64, limit: usize) -> Result<Vec<Job>, ServiceError> {
        let limit = limit.min(self.max_search_limit);
        let key = cache_key(ENTITY_JOB, "trending", &serde_json::json!({ "days": days, "limit": limit }));

        if let Some(cached) = cache_get(&self.cache, &key).await
            && let Some(jobs) = cache_decode::<Vec<Job>>(&key, cached)
        {
            tracing::debug!("cache hit for trending jobs");
            return Ok(jobs);
        }

        let jobs = self.jobs.trending(days, limit).await?;
        cache_set(&self.cache, &key, &serde_json::to_value(&jobs)?, self.search_ttl).await;
        Ok(jobs)
    }

    /// Details view: the job, similar postings, and whether the requesting
    /// user already applied. An unknown job is `None`, not an error.
    pub async fn get_job_details(
        &self, job_id: &str, user_id: Option<&str>,
    ) -> Result<Option<JobDetails>, ServiceError> {
        let job_key = cache_key(ENTITY_JOB, "get_by_id", &serde_json::json!({ "id": job_id }));

        let job = match cache_get(&self.cache, &job_key)
            .await
            .and_then(|cached| cache_decode::<Job>(&job_key, cached))
        {
            Some(job) => job,
            None => match self.jobs.get_by_id(job_id).await? {
                Some(job) => {
                    cache_set(&self.cache, &job_key, &serde_json::to_value(&job)?, self.entity_ttl).await;
                    job
                }
                None => return Ok(None),
            },
        };

        let similar_key =
            cache_key(ENTITY_JOB, "similar", &serde_json::json!({ "id": job_id, "limit": SIMILAR_LIMIT }));
        let similar_jobs = match cache_get(&self.cache, &similar_key)
            .await
            .and_then(|cached| cache_decode::<Vec<Job>>(&similar_key, cached))
        {
            Some(jobs) => jobs,
            None => {
                let jobs = self.jobs.similar(job_id, SIMILAR_LIMIT).await?;
                cache_set(&self.cache, &similar_key, &serde_json::to_value(&jobs)?, self.search_ttl).await;
                jobs
            }
        };

        let has_applied = match user_id {
            Some(user_id) => self.applications.exists(user_id, job_id).await?,
            None => false,
        };

        Ok(Some(JobDetails { job, similar_jobs, has_applied }))
    }

    /// Create a posting and drop every cached job view.
    pub async fn create_job(&self, new: &NewJob) -> Result<Job, ServiceError> {
        let job = self.jobs.create(new).await?;
        self.cache.invalidate_prefix(&entity_prefix(ENTITY_JOB)).await?;
        Ok(job)
    }

    /// Update a posting and drop every cached job view.
    pub async fn update_job(&self, id: &str, patch: &JobPatch) -> Result<Job, ServiceError> {
        let job = self.jobs.update(id, patch).await?;
        self.cache.invalidate_prefix(&entity_prefix(ENTITY_JOB)).await?;
        Ok(job)
    }

    /// Delete a posting and drop every cached job view.
    pub async fn delete_job(&self, id: &str) -> Result<(), ServiceError> {
        self.jobs.delete(id).await?;
        self.cache.invalidate_prefix(&entity_prefix(ENTITY_JOB)).await?;
        Ok(())
    }

    /// Submit an application to an existing job.
    ///
    /// Application counts feed trending, so both the application and job
    /// namespaces are dropped.
    pub async fn apply_to_job(&self, new: &NewApplication) -> Result<Application, ServiceError> {
        if self.jobs.get_by_id(&new.job_id).await?.is_none() {
            return Err(ServiceError::NotFound { entity: "job".to_string(), id: new.job_id.clone() });
        }

        let application = self.applications.create(new).await?;
        self.cache.invalidate_prefix(&entity_prefix(ENTITY_APPLICATION)).await?;
        self.cache.invalidate_prefix(&entity_prefix(ENTITY_JOB)).await?;
        Ok(application)
    }

    /// Jobs eligible for purging, for the external scheduler.
    pub async fn list_expired_jobs(&self, older_than_days: i64) -> Result<Vec<Job>, ServiceError> {
        Ok(self.jobs.list_expired(older_than_days).await?)
    }
}
