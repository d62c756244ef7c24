//! Job repository: CRUD plus the composite search, trending, and
//! similar-job queries.
//!
//! Composite queries are built as single structured filter sets; derived
//! data (application counts, referenced rows) is resolved through batched
//! in-set requests, never one request per record.

use crate::StoreError;
use crate::adapter::{DataService, Method, Query, StoreRequest};
use crate::model::{Job, JobPatch, JobSearch, NewJob};
use crate::rank::{self, FrequencyExtractor, KeywordExtractor};
use crate::repo::{decode_first, decode_rows, wire_timestamp, with_retry};
use crate::validate;
use chommie_core::AppConfig;
use chrono::{Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;

const RESOURCE: &str = "jobs";
const APPLICATIONS_RESOURCE: &str = "applications";

/// Repository for job postings.
pub struct JobRepository {
    store: Arc<dyn DataService>,
    extractor: Arc<dyn KeywordExtractor>,
    max_retries: u32,
    retry_backoff_ms: u64,
    batch_cap: usize,
    max_search_limit: usize,
    similar_keyword_count: usize,
}

impl JobRepository {
    pub fn new(store: Arc<dyn DataService>, config: &AppConfig) -> Self {
        Self {
            store,
            extractor: Arc::new(FrequencyExtractor),
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            batch_cap: config.batch_cap,
            max_search_limit: config.max_search_limit,
            similar_keyword_count: config.similar_keyword_count,
        }
    }

    /// Swap the keyword extraction strategy.
    pub fn with_extractor(mut self, extractor: Arc<dyn KeywordExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    async fn execute(&self, req: &StoreRequest) -> Result<crate::adapter::StoreResponse, StoreError> {
        with_retry(self.max_retries, self.retry_backoff_ms, || self.store.execute(req.clone())).await
    }

    /// Create a job posting from a validated draft.
    pub async fn create(&self, new: &NewJob) -> Result<Job, StoreError> {
        validate::validate_new_job(new)?;

        let now = Utc::now();
        let mut body = serde_json::to_value(new)?;
        body["is_active"] = serde_json::json!(true);
        body["created_at"] = serde_json::json!(now);
        body["updated_at"] = serde_json::json!(now);

        let resp = self.execute(&StoreRequest::new(Method::Post, RESOURCE).with_body(body)).await?;
        decode_first(resp.rows)?.ok_or_else(|| StoreError::Parse("insert returned no rows".to_string()))
    }

    /// Fetch a job by identifier. A missing record is `None`, not an error.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Job>, StoreError> {
        let req = StoreRequest::new(Method::Get, RESOURCE).with_query(Query::new().eq("id", id).limit(1));
        let resp = self.execute(&req).await?;
        decode_first(resp.rows)
    }

    /// Apply a partial update. Missing target is a `NotFound` failure.
    pub async fn update(&self, id: &str, patch: &JobPatch) -> Result<Job, StoreError> {
        validate::validate_job_patch(patch)?;

        let mut body = serde_json::to_value(patch)?;
        body["updated_at"] = serde_json::json!(Utc::now());

        let req = StoreRequest::new(Method::Patch, RESOURCE)
            .with_query(Query::new().eq("id", id))
            .with_body(body);
        let resp = self.execute(&req).await?;
        decode_first(resp.rows)?.ok_or_else(|| StoreError::NotFound { entity: "job", id: id.to_string() })
    }

    /// Delete a job. Missing target is a `NotFound` failure.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let req = StoreRequest::new(Method::Delete, RESOURCE).with_query(Query::new().eq("id", id));
        let resp = self.execute(&req).await?;
        if resp.rows.is_empty() {
            return Err(StoreError::NotFound { entity: "job", id: id.to_string() });
        }
        Ok(())
    }

    /// List jobs, newest first.
    pub async fn list(&self, limit: usize, offset: usize) -> Result<Vec<Job>, StoreError> {
        let query = Query::new()
            .order_desc("created_at")
            .limit(limit.min(self.max_search_limit))
            .offset(offset);
        let resp = self.execute(&StoreRequest::new(Method::Get, RESOURCE).with_query(query)).await?;
        decode_rows(resp.rows)
    }

    /// Search active jobs with one structured filter set: a single store
    /// round trip regardless of how many conditions are present.
    ///
    /// Returns the page of jobs and the total match count. Salary bounds
    /// select jobs whose advertised range overlaps the requested one.
    pub async fn search(&self, search: &JobSearch) -> Result<(Vec<Job>, u64), StoreError> {
        let limit = search.effective_limit(self.max_search_limit);

        let mut query = Query::new().eq("is_active", "true");

        if let Some(text) = &search.query {
            let pattern = validate::sanitize_pattern(text);
            if !pattern.is_empty() {
                query = query.ilike_any(&["title", "company", "description"], &pattern);
            }
        }

        if let Some(location) = &search.location {
            let pattern = validate::sanitize_pattern(location);
            if !pattern.is_empty() {
                query = query.ilike("location", &pattern);
            }
        }

        if let Some(job_type) = search.job_type {
            query = query.eq("job_type", job_type.as_str());
        }
        if let Some(min) = search.salary_min {
            query = query.gte("salary_max", min);
        }
        if let Some(max) = search.salary_max {
            query = query.lte("salary_min", max);
        }
        if search.remote_only {
            query = query.eq("remote_friendly", "true");
        }

        query = query.order_desc("created_at").limit(limit);

        let req = StoreRequest::new(Method::Get, RESOURCE).with_query(query).with_count();
        let resp = self.execute(&req).await?;
        let total = resp.total.unwrap_or(resp.rows.len() as u64);

        Ok((decode_rows(resp.rows)?, total))
    }

    /// Jobs created within the last `days` days, ranked by application
    /// volume.
    ///
    /// Application counts for the whole candidate set resolve through
    /// batched in-set requests (`ceil(candidates / batch_cap)` round trips),
    /// then the ranking engine orders the result.
    pub async fn trending(&self, days: i64, limit: usize) -> Result<Vec<Job>, StoreError> {
        let cutoff = wire_timestamp(Utc::now() - Duration::days(days));
        let query = Query::new().eq("is_active", "true").gte("created_at", cutoff);
        let resp = self.execute(&StoreRequest::new(Method::Get, RESOURCE).with_query(query)).await?;
        let jobs: Vec<Job> = decode_rows(resp.rows)?;
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = jobs.iter().map(|job| job.id.clone()).collect();
        let mut rows = Vec::new();
        for chunk in ids.chunks(self.batch_cap) {
            let query = Query::new().select("job_id").in_set("job_id", chunk);
            let resp = self
                .execute(&StoreRequest::new(Method::Get, APPLICATIONS_RESOURCE).with_query(query))
                .await?;
            rows.extend(resp.rows);
        }

        let counts = rank::count_by_job(&rows);
        Ok(rank::trending(jobs, &counts, limit.min(self.max_search_limit)))
    }

    /// Jobs sharing extracted keywords with the source job.
    ///
    /// One bounded search per keyword, deduplicated by identifier across
    /// keyword passes in first-seen order; the source job never appears.
    /// An unknown source yields an empty list.
    pub async fn similar(&self, job_id: &str, limit: usize) -> Result<Vec<Job>, StoreError> {
        let Some(source) = self.get_by_id(job_id).await? else {
            return Ok(Vec::new());
        };

        let text = format!("{} {}", source.title, source.description);
        let keywords = self.extractor.extract(&text, self.similar_keyword_count);

        let mut seen: HashSet<String> = HashSet::from([source.id]);
        let mut out: Vec<Job> = Vec::new();

        for keyword in keywords {
            let pattern = validate::sanitize_pattern(&keyword);
            if pattern.is_empty() {
                continue;
            }

            let query = Query::new()
                .eq("is_active", "true")
                .ilike_any(&["title", "description"], &pattern)
                .limit(limit + 1);
            let resp = self.execute(&StoreRequest::new(Method::Get, RESOURCE).with_query(query)).await?;

            for job in decode_rows::<Job>(resp.rows)? {
                if seen.insert(job.id.clone()) {
                    out.push(job);
                }
            }
        }

        out.truncate(limit);
        Ok(out)
    }

    /// Jobs eligible for purging: inactive, or untouched for longer than
    /// `older_than_days`. The purge itself belongs to an external scheduler.
    pub async fn list_expired(&self, older_than_days: i64) -> Result<Vec<Job>, StoreError> {
        let cutoff = wire_timestamp(Utc::now() - Duration::days(older_than_days));
        let query = Query::new().any_of(&["is_active.eq.false".to_string(), format!("updated_at.lte.{cutoff}")]);
        let resp = self.execute(&StoreRequest::new(Method::Get, RESOURCE).with_query(query)).await?;
        decode_rows(resp.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemoryDataService;
    use crate::model::JobType;
    use chommie_core::AppConfig;

    fn test_config() -> AppConfig {
        AppConfig { retry_backoff_ms: 1, ..Default::default() }
    }

    fn draft(title: &str, salary_min: Option<u32>, salary_max: Option<u32>) -> NewJob {
        NewJob {
            title: title.into(),
            company: "Acme".into(),
            location: "Cape Town".into(),
            description: format!("{title} building distributed services"),
            salary_min,
            salary_max,
            job_type: JobType::FullTime,
            remote_friendly: true,
        }
    }

    async fn seeded_repo(titles: &[&str]) -> (Arc<MemoryDataService>, JobRepository) {
        let store = Arc::new(MemoryDataService::new());
        let repo = JobRepository::new(store.clone(), &test_config());
        for title in titles {
            repo.create(&draft(title, Some(50_000), Some(90_000))).await.unwrap();
        }
        (store, repo)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_, repo) = seeded_repo(&[]).await;
        let job = repo.create(&draft("Rust Engineer", None, None)).await.unwrap();
        assert!(!job.id.is_empty());
        assert!(job.is_active);

        let fetched = repo.get_by_id(&job.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Rust Engineer");
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let (_, repo) = seeded_repo(&[]).await;
        assert!(repo.get_by_id("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let (_, repo) = seeded_repo(&[]).await;
        let patch = JobPatch { title: Some("New title".into()), ..Default::default() };
        let result = repo.update("ghost", &patch).await;
        assert!(matches!(result, Err(StoreError::NotFound { entity: "job", .. })));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (_, repo) = seeded_repo(&[]).await;
        assert!(matches!(repo.delete("ghost").await, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_applies_patch() {
        let (_, repo) = seeded_repo(&[]).await;
        let job = repo.create(&draft("Rust Engineer", None, None)).await.unwrap();

        let patch = JobPatch { is_active: Some(false), ..Default::default() };
        let updated = repo.update(&job.id, &patch).await.unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.title, "Rust Engineer");
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (_, repo) = seeded_repo(&["First", "Second"]).await;
        let jobs = repo.list(10, 0).await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs[0].created_at >= jobs[1].created_at);
    }

    #[tokio::test]
    async fn test_search_is_single_round_trip() {
        let (store, repo) = seeded_repo(&["Rust Engineer", "Go Engineer"]).await;

        let before = store.request_count();
        let search = JobSearch {
            query: Some("rust".into()),
            job_type: Some(JobType::FullTime),
            salary_min: Some(40_000),
            remote_only: true,
            ..Default::default()
        };
        let (jobs, _) = repo.search(&search).await.unwrap();

        assert_eq!(store.request_count() - before, 1);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Rust Engineer");
    }

    #[tokio::test]
    async fn test_search_salary_overlap() {
        let store = Arc::new(MemoryDataService::new());
        let repo = JobRepository::new(store, &test_config());
        repo.create(&draft("Low ceiling", Some(10_000), Some(40_000))).await.unwrap();
        let kept = repo.create(&draft("In range", Some(60_000), Some(90_000))).await.unwrap();

        let search = JobSearch { salary_min: Some(50_000), salary_max: Some(80_000), ..Default::default() };
        let (jobs, total) = repo.search(&search).await.unwrap();

        assert_eq!(total, 1);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_search_excludes_inactive() {
        let (_, repo) = seeded_repo(&["Rust Engineer"]).await;
        let (jobs, _) = repo.search(&JobSearch::default()).await.unwrap();
        let patch = JobPatch { is_active: Some(false), ..Default::default() };
        repo.update(&jobs[0].id, &patch).await.unwrap();

        let (jobs, total) = repo.search(&JobSearch::default()).await.unwrap();
        assert_eq!(total, 0);
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn test_search_reports_total_beyond_page() {
        let (_, repo) = seeded_repo(&["A Engineer", "B Engineer", "C Engineer"]).await;

        let search = JobSearch { limit: Some(2), ..Default::default() };
        let (jobs, total) = repo.search(&search).await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_trending_batches_count_resolution() {
        let store = Arc::new(MemoryDataService::new());
        let config = AppConfig { batch_cap: 2, retry_backoff_ms: 1, ..Default::default() };
        let repo = JobRepository::new(store.clone(), &config);

        for i in 0..5 {
            repo.create(&draft(&format!("Job {i}"), None, None)).await.unwrap();
        }

        let before = store.request_count();
        repo.trending(7, 10).await.unwrap();
        // One candidate query plus ceil(5 / 2) = 3 batched count queries.
        assert_eq!(store.request_count() - before, 4);
    }

    #[tokio::test]
    async fn test_trending_ranks_by_applications_then_recency() {
        let store = Arc::new(MemoryDataService::new());
        let repo = JobRepository::new(store.clone(), &test_config());

        let popular = repo.create(&draft("Popular", None, None)).await.unwrap();
        let quiet = repo.create(&draft("Quiet", None, None)).await.unwrap();

        for i in 0..3 {
            store
                .seed("applications", vec![serde_json::json!({"user_id": format!("u{i}"), "job_id": popular.id})])
                .await;
        }

        let ranked = repo.trending(7, 10).await.unwrap();
        assert_eq!(ranked[0].id, popular.id);
        assert_eq!(ranked[1].id, quiet.id);
    }

    #[tokio::test]
    async fn test_trending_equal_counts_newer_first() {
        let store = Arc::new(MemoryDataService::new());
        let repo = JobRepository::new(store.clone(), &test_config());

        // Job A created 1 day ago, job B 6 days ago, both with 10 applications.
        let day = |days_ago: i64| wire_timestamp(Utc::now() - Duration::days(days_ago));
        store
            .seed(
                "jobs",
                vec![
                    serde_json::json!({
                        "id": "b", "title": "Older", "company": "Acme", "location": "", "description": "",
                        "job_type": "full-time", "remote_friendly": false, "is_active": true,
                        "created_at": day(6), "updated_at": day(6),
                    }),
                    serde_json::json!({
                        "id": "a", "title": "Newer", "company": "Acme", "location": "", "description": "",
                        "job_type": "full-time", "remote_friendly": false, "is_active": true,
                        "created_at": day(1), "updated_at": day(1),
                    }),
                ],
            )
            .await;
        for job in ["a", "b"] {
            for i in 0..10 {
                store.seed("applications", vec![serde_json::json!({"user_id": format!("u{i}"), "job_id": job})]).await;
            }
        }

        let ranked = repo.trending(7, 10).await.unwrap();
        assert_eq!(ranked[0].id, "a");
        assert_eq!(ranked[1].id, "b");
    }

    #[tokio::test]
    async fn test_trending_window_excludes_old_jobs() {
        let store = Arc::new(MemoryDataService::new());
        let repo = JobRepository::new(store.clone(), &test_config());

        let stale = wire_timestamp(Utc::now() - Duration::days(30));
        store
            .seed(
                "jobs",
                vec![serde_json::json!({
                    "id": "old", "title": "Old", "company": "Acme", "location": "", "description": "",
                    "job_type": "full-time", "remote_friendly": false, "is_active": true,
                    "created_at": stale, "updated_at": stale,
                })],
            )
            .await;

        assert!(repo.trending(7, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_similar_excludes_source_and_dedupes() {
        let store = Arc::new(MemoryDataService::new());
        let repo = JobRepository::new(store.clone(), &test_config());

        let source = repo.create(&draft("Rust Backend Engineer", None, None)).await.unwrap();
        repo.create(&draft("Rust Platform Engineer", None, None)).await.unwrap();
        repo.create(&draft("Backend Engineer", None, None)).await.unwrap();

        let similar = repo.similar(&source.id, 10).await.unwrap();

        assert!(!similar.is_empty());
        assert!(similar.iter().all(|job| job.id != source.id));

        let mut ids: Vec<&str> = similar.iter().map(|job| job.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), similar.len());
    }

    #[tokio::test]
    async fn test_similar_respects_limit_and_fanout() {
        let store = Arc::new(MemoryDataService::new());
        let repo = JobRepository::new(store.clone(), &test_config());

        let source = repo.create(&draft("Rust Backend Engineer", None, None)).await.unwrap();
        for i in 0..6 {
            repo.create(&draft(&format!("Rust Engineer {i}"), None, None)).await.unwrap();
        }

        let before = store.request_count();
        let similar = repo.similar(&source.id, 2).await.unwrap();

        assert_eq!(similar.len(), 2);
        // Source lookup plus at most similar_keyword_count keyword searches.
        assert!(store.request_count() - before <= 1 + 3);
    }

    #[tokio::test]
    async fn test_similar_with_custom_extractor() {
        struct FixedExtractor;
        impl KeywordExtractor for FixedExtractor {
            fn extract(&self, _text: &str, _max: usize) -> Vec<String> {
                vec!["platform".to_string()]
            }
        }

        let store = Arc::new(MemoryDataService::new());
        let repo = JobRepository::new(store, &test_config()).with_extractor(Arc::new(FixedExtractor));

        let source = repo.create(&draft("Rust Backend Engineer", None, None)).await.unwrap();
        let platform = repo.create(&draft("Platform Engineer", None, None)).await.unwrap();
        repo.create(&draft("Data Analyst", None, None)).await.unwrap();

        let similar = repo.similar(&source.id, 10).await.unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].id, platform.id);
    }

    #[tokio::test]
    async fn test_similar_unknown_source_is_empty() {
        let (_, repo) = seeded_repo(&["Rust Engineer"]).await;
        assert!(repo.similar("ghost", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_expired() {
        let store = Arc::new(MemoryDataService::new());
        let repo = JobRepository::new(store.clone(), &test_config());

        let fresh = repo.create(&draft("Fresh", None, None)).await.unwrap();
        let retired = repo.create(&draft("Retired", None, None)).await.unwrap();
        repo.update(&retired.id, &JobPatch { is_active: Some(false), ..Default::default() }).await.unwrap();

        let stale = wire_timestamp(Utc::now() - Duration::days(120));
        store
            .seed(
                "jobs",
                vec![serde_json::json!({
                    "id": "stale", "title": "Stale", "company": "Acme", "location": "", "description": "",
                    "job_type": "full-time", "remote_friendly": false, "is_active": true,
                    "created_at": stale, "updated_at": stale,
                })],
            )
            .await;

        let expired = repo.list_expired(90).await.unwrap();
        let ids: Vec<&str> = expired.iter().map(|job| job.id.as_str()).collect();
        assert!(ids.contains(&retired.id.as_str()));
        assert!(ids.contains(&"stale"));
        assert!(!ids.contains(&fresh.id.as_str()));
    }
}
