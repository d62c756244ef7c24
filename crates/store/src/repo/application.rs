//! Application repository.
//!
//! One application per (user, job) pair: a repeat submission is rejected
//! rather than upserted, so trending counts stay honest and an existing
//! cover letter is never silently replaced. Job details for a user's
//! applications resolve through batched in-set requests.

use crate::StoreError;
use crate::adapter::{DataService, Method, Query, StoreRequest};
use crate::model::{Application, ApplicationStatus, Job, NewApplication};
use crate::repo::{decode_first, decode_rows, with_retry};
use crate::validate;
use chommie_core::AppConfig;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

const RESOURCE: &str = "applications";
const JOBS_RESOURCE: &str = "jobs";

/// Repository for job applications.
pub struct ApplicationRepository {
    store: Arc<dyn DataService>,
    max_retries: u32,
    retry_backoff_ms: u64,
    batch_cap: usize,
}

impl ApplicationRepository {
    pub fn new(store: Arc<dyn DataService>, config: &AppConfig) -> Self {
        Self {
            store,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            batch_cap: config.batch_cap,
        }
    }

    async fn execute(&self, req: &StoreRequest) -> Result<crate::adapter::StoreResponse, StoreError> {
        with_retry(self.max_retries, self.retry_backoff_ms, || self.store.execute(req.clone())).await
    }

    /// Submit an application from a validated draft.
    ///
    /// A second application to the same job by the same user is a
    /// `Duplicate` failure.
    pub async fn create(&self, new: &NewApplication) -> Result<Application, StoreError> {
        validate::validate_new_application(new)?;

        if self.exists(&new.user_id, &new.job_id).await? {
            return Err(StoreError::Duplicate {
                entity: "application",
                detail: format!("user {} already applied to job {}", new.user_id, new.job_id),
            });
        }

        let now = Utc::now();
        let body = serde_json::json!({
            "user_id": new.user_id,
            "job_id": new.job_id,
            "cover_letter": new.cover_letter,
            "notes": new.notes,
            "status": ApplicationStatus::Pending,
            "created_at": now,
            "updated_at": now,
        });

        let resp = self.execute(&StoreRequest::new(Method::Post, RESOURCE).with_body(body)).await?;
        decode_first(resp.rows)?.ok_or_else(|| StoreError::Parse("insert returned no rows".to_string()))
    }

    /// Whether a (user, job) application already exists.
    pub async fn exists(&self, user_id: &str, job_id: &str) -> Result<bool, StoreError> {
        let query = Query::new().eq("user_id", user_id).eq("job_id", job_id).limit(1);
        let resp = self.execute(&StoreRequest::new(Method::Get, RESOURCE).with_query(query)).await?;
        Ok(!resp.rows.is_empty())
    }

    /// Fetch an application by identifier. A missing record is `None`.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Application>, StoreError> {
        let req = StoreRequest::new(Method::Get, RESOURCE).with_query(Query::new().eq("id", id).limit(1));
        let resp = self.execute(&req).await?;
        decode_first(resp.rows)
    }

    /// Move an application through the review pipeline. Missing target is a
    /// `NotFound` failure.
    pub async fn update_status(
        &self, id: &str, status: ApplicationStatus, notes: Option<&str>,
    ) -> Result<Application, StoreError> {
        let mut body = serde_json::json!({ "status": status, "updated_at": Utc::now() });
        if let Some(notes) = notes {
            body["notes"] = serde_json::json!(notes);
        }

        let req = StoreRequest::new(Method::Patch, RESOURCE)
            .with_query(Query::new().eq("id", id))
            .with_body(body);
        let resp = self.execute(&req).await?;
        decode_first(resp.rows)?.ok_or_else(|| StoreError::NotFound { entity: "application", id: id.to_string() })
    }

    /// Withdraw an application. Missing target is a `NotFound` failure.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let req = StoreRequest::new(Method::Delete, RESOURCE).with_query(Query::new().eq("id", id));
        let resp = self.execute(&req).await?;
        if resp.rows.is_empty() {
            return Err(StoreError::NotFound { entity: "application", id: id.to_string() });
        }
        Ok(())
    }

    /// A user's applications, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Application>, StoreError> {
        let query = Query::new().eq("user_id", user_id).order_desc("created_at");
        let resp = self.execute(&StoreRequest::new(Method::Get, RESOURCE).with_query(query)).await?;
        decode_rows(resp.rows)
    }

    /// A user's applications with their referenced jobs attached.
    ///
    /// The full job set resolves in `ceil(jobs / batch_cap)` batched
    /// requests. A job that no longer exists yields `None` rather than
    /// failing the whole call.
    pub async fn for_user_with_jobs(&self, user_id: &str) -> Result<Vec<(Application, Option<Job>)>, StoreError> {
        let applications = self.list_for_user(user_id).await?;
        if applications.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids: Vec<String> = applications.iter().map(|app| app.job_id.clone()).collect();
        ids.sort_unstable();
        ids.dedup();

        let mut jobs_by_id: HashMap<String, Job> = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(self.batch_cap) {
            let query = Query::new().in_set("id", chunk);
            let resp = self.execute(&StoreRequest::new(Method::Get, JOBS_RESOURCE).with_query(query)).await?;
            for job in decode_rows::<Job>(resp.rows)? {
                jobs_by_id.insert(job.id.clone(), job);
            }
        }

        Ok(applications
            .into_iter()
            .map(|app| {
                let job = jobs_by_id.get(&app.job_id).cloned();
                (app, job)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemoryDataService;

    fn test_config() -> AppConfig {
        AppConfig { retry_backoff_ms: 1, ..Default::default() }
    }

    fn draft(user_id: &str, job_id: &str) -> NewApplication {
        NewApplication {
            user_id: user_id.into(),
            job_id: job_id.into(),
            cover_letter: "I would like to apply.".into(),
            notes: String::new(),
        }
    }

    fn job_row(id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id, "title": format!("Job {id}"), "company": "Acme", "location": "", "description": "",
            "job_type": "full-time", "remote_friendly": false, "is_active": true,
            "created_at": "2026-08-01T00:00:00Z", "updated_at": "2026-08-01T00:00:00Z",
        })
    }

    #[tokio::test]
    async fn test_create_starts_pending() {
        let store = Arc::new(MemoryDataService::new());
        let repo = ApplicationRepository::new(store, &test_config());

        let app = repo.create(&draft("u1", "j1")).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::Pending);
        assert_eq!(app.user_id, "u1");
    }

    #[tokio::test]
    async fn test_duplicate_submission_rejected() {
        let store = Arc::new(MemoryDataService::new());
        let repo = ApplicationRepository::new(store, &test_config());

        repo.create(&draft("u1", "j1")).await.unwrap();
        let result = repo.create(&draft("u1", "j1")).await;
        assert!(matches!(result, Err(StoreError::Duplicate { entity: "application", .. })));

        // A different job by the same user is fine.
        assert!(repo.create(&draft("u1", "j2")).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_status() {
        let store = Arc::new(MemoryDataService::new());
        let repo = ApplicationRepository::new(store, &test_config());
        let app = repo.create(&draft("u1", "j1")).await.unwrap();

        let updated = repo.update_status(&app.id, ApplicationStatus::Interview, Some("phone screen")).await.unwrap();
        assert_eq!(updated.status, ApplicationStatus::Interview);
        assert_eq!(updated.notes, "phone screen");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = Arc::new(MemoryDataService::new());
        let repo = ApplicationRepository::new(store, &test_config());
        let result = repo.update_status("ghost", ApplicationStatus::Rejected, None).await;
        assert!(matches!(result, Err(StoreError::NotFound { entity: "application", .. })));
    }

    #[tokio::test]
    async fn test_get_by_id_and_delete() {
        let store = Arc::new(MemoryDataService::new());
        let repo = ApplicationRepository::new(store, &test_config());
        let app = repo.create(&draft("u1", "j1")).await.unwrap();

        assert!(repo.get_by_id(&app.id).await.unwrap().is_some());
        repo.delete(&app.id).await.unwrap();
        assert!(repo.get_by_id(&app.id).await.unwrap().is_none());
        assert!(matches!(repo.delete(&app.id).await, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_for_user_with_jobs_batches() {
        let store = Arc::new(MemoryDataService::new());
        let config = AppConfig { batch_cap: 2, retry_backoff_ms: 1, ..Default::default() };
        let repo = ApplicationRepository::new(store.clone(), &config);

        for i in 0..5 {
            store.seed("jobs", vec![job_row(&format!("j{i}"))]).await;
            repo.create(&draft("u1", &format!("j{i}"))).await.unwrap();
        }

        let before = store.request_count();
        let resolved = repo.for_user_with_jobs("u1").await.unwrap();

        // One application list query plus ceil(5 / 2) = 3 batched job queries.
        assert_eq!(store.request_count() - before, 4);
        assert_eq!(resolved.len(), 5);
        assert!(resolved.iter().all(|(app, job)| job.as_ref().is_some_and(|j| j.id == app.job_id)));
    }

    #[tokio::test]
    async fn test_for_user_with_jobs_tolerates_missing_job() {
        let store = Arc::new(MemoryDataService::new());
        let repo = ApplicationRepository::new(store.clone(), &test_config());

        store.seed("jobs", vec![job_row("j1")]).await;
        repo.create(&draft("u1", "j1")).await.unwrap();
        repo.create(&draft("u1", "vanished")).await.unwrap();

        let resolved = repo.for_user_with_jobs("u1").await.unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved.iter().filter(|(_, job)| job.is_none()).count(), 1);
    }

    #[tokio::test]
    async fn test_list_for_user_empty() {
        let store = Arc::new(MemoryDataService::new());
        let repo = ApplicationRepository::new(store, &test_config());
        assert!(repo.for_user_with_jobs("nobody").await.unwrap().is_empty());
    }
}
