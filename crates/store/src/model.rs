//! Entity models and mutation drafts.
//!
//! All identifiers are opaque strings assigned by the backing store; the
//! core never assumes integer auto-increment semantics. Draft types
//! (`NewJob`, `JobPatch`, ...) are what the validator checks before any
//! request reaches the adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Employment arrangement for a job posting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
}

impl JobType {
    /// Wire value used in store filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            JobType::Contract => "contract",
            JobType::Internship => "internship",
        }
    }
}

/// Review pipeline state of an application.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Interview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// Subscription tier of a user account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Basic,
    Premium,
    Enterprise,
}

/// A job posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub job_type: JobType,
    pub remote_friendly: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's application to a job. References are non-owning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub user_id: String,
    pub job_id: String,
    pub cover_letter: String,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub subscription_plan: SubscriptionPlan,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

/// Draft for creating a job posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    #[serde(default)]
    pub salary_min: Option<u32>,
    #[serde(default)]
    pub salary_max: Option<u32>,
    pub job_type: JobType,
    #[serde(default)]
    pub remote_friendly: bool,
}

/// Partial update for a job posting; absent fields are left untouched and
/// stay out of the request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_friendly: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Draft for submitting an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewApplication {
    pub user_id: String,
    pub job_id: String,
    pub cover_letter: String,
    #[serde(default)]
    pub notes: String,
}

/// Draft for registering a user. The password is digested before storage;
/// the repository layer never sees it in the clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub subscription_plan: SubscriptionPlan,
}

/// Search filter set for job queries.
///
/// Serializes to a stable form so logically identical searches share a
/// cache key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSearch {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub job_type: Option<JobType>,
    #[serde(default)]
    pub salary_min: Option<u32>,
    #[serde(default)]
    pub salary_max: Option<u32>,
    #[serde(default)]
    pub remote_only: bool,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Default result count when the caller does not ask for one.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

impl JobSearch {
    /// Effective result limit: requested, defaulted, then clamped to `max`.
    pub fn effective_limit(&self, max: usize) -> usize {
        self.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).min(max)
    }

    /// Copy of the filter set with the limit resolved against `max`.
    ///
    /// This is the post-validation form hashed into cache keys.
    pub fn clamped(&self, max: usize) -> JobSearch {
        JobSearch { limit: Some(self.effective_limit(max)), ..self.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_type_wire_values() {
        assert_eq!(serde_json::to_value(JobType::FullTime).unwrap(), "full-time");
        assert_eq!(serde_json::to_value(JobType::Internship).unwrap(), "internship");
        assert_eq!(JobType::PartTime.as_str(), "part-time");
    }

    #[test]
    fn test_application_status_wire_values() {
        assert_eq!(serde_json::to_value(ApplicationStatus::Pending).unwrap(), "pending");
        assert_eq!(ApplicationStatus::Interview.as_str(), "interview");
    }

    #[test]
    fn test_job_round_trip() {
        let job = Job {
            id: "job-1".into(),
            title: "Backend Engineer".into(),
            company: "Acme".into(),
            location: "Cape Town".into(),
            description: "Rust services".into(),
            salary_min: Some(50_000),
            salary_max: Some(90_000),
            job_type: JobType::FullTime,
            remote_friendly: true,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(&job).unwrap();
        let back: Job = serde_json::from_value(value).unwrap();
        assert_eq!(back.id, "job-1");
        assert_eq!(back.job_type, JobType::FullTime);
    }

    #[test]
    fn test_effective_limit() {
        let search = JobSearch::default();
        assert_eq!(search.effective_limit(100), DEFAULT_SEARCH_LIMIT);

        let search = JobSearch { limit: Some(500), ..Default::default() };
        assert_eq!(search.effective_limit(100), 100);

        let search = JobSearch { limit: Some(5), ..Default::default() };
        assert_eq!(search.effective_limit(100), 5);
    }

    #[test]
    fn test_clamped_is_stable() {
        let a = JobSearch { query: Some("rust".into()), ..Default::default() }.clamped(100);
        let b = JobSearch { query: Some("rust".into()), limit: Some(20), ..Default::default() }.clamped(100);
        assert_eq!(serde_json::to_value(&a).unwrap(), serde_json::to_value(&b).unwrap());
    }
}
