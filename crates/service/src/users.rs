//! Account use cases: registration, authentication, and profile views.
//!
//! Authentication is gated by the lockout guard keyed on the email address;
//! failures count toward the window and a success clears it. Profile reads
//! cache under the user and application namespaces.

use crate::ServiceError;
use crate::guard::AttemptGuard;
use crate::jobs::{cache_decode, cache_get, cache_set};
use crate::password;
use chommie_core::cache::cache_key;
use chommie_core::{AppConfig, CacheDb};
use chommie_store::{
    Application, ApplicationRepository, DataService, Job, NewUser, User, UserRepository, validate,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

const ENTITY_USER: &str = "user";
const ENTITY_APPLICATION: &str = "application";

/// Outcome of an authentication attempt. Lockout and bad credentials are
/// ordinary outcomes, not errors.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    Success(User),
    InvalidCredentials,
    Locked,
}

/// An application joined with its referenced job, when it still exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationWithJob {
    pub application: Application,
    pub job: Option<Job>,
}

/// Aggregate counts over a user's applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationStats {
    pub total: u64,
    pub by_status: HashMap<String, u64>,
}

/// Profile view: the account, its applications with job details, and
/// aggregate statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user: User,
    pub applications: Vec<ApplicationWithJob>,
    pub statistics: ApplicationStats,
}

fn statistics(applications: &[ApplicationWithJob]) -> ApplicationStats {
    let mut by_status: HashMap<String, u64> = HashMap::new();
    for entry in applications {
        *by_status.entry(entry.application.status.as_str().to_string()).or_insert(0) += 1;
    }
    ApplicationStats { total: applications.len() as u64, by_status }
}

/// Use-case surface for accounts.
pub struct Accounts {
    users: UserRepository,
    applications: ApplicationRepository,
    cache: CacheDb,
    guard: Arc<AttemptGuard>,
    entity_ttl: i64,
    search_ttl: i64,
}

impl Accounts {
    pub fn new(store: Arc<dyn DataService>, cache: CacheDb, guard: Arc<AttemptGuard>, config: &AppConfig) -> Self {
        Self {
            users: UserRepository::new(store.clone(), config),
            applications: ApplicationRepository::new(store, config),
            cache,
            guard,
            entity_ttl: config.entity_ttl_secs,
            search_ttl: config.search_ttl_secs,
        }
    }

    /// Register an account.
    ///
    /// Validation runs before anything touches the store: a malformed email
    /// fails with field detail and zero store requests. The password is
    /// digested here; the repository only ever sees the digest.
    pub async fn register_user(&self, new: &NewUser) -> Result<User, ServiceError> {
        validate::validate_new_user(new)?;
        let digest = password::hash_password(&new.password);
        Ok(self.users.create(new, &digest).await?)
    }

    /// Authenticate by email and password.
    ///
    /// A locked actor short-circuits before any store request. Failures
    /// (unknown email or bad password) count toward the lockout window; a
    /// success clears it and stamps `last_login`.
    pub async fn authenticate_user(&self, email: &str, password: &str) -> Result<AuthOutcome, ServiceError> {
        let guard_key = format!("login:{}", email.trim().to_lowercase());
        if self.guard.is_locked(&guard_key).await {
            return Ok(AuthOutcome::Locked);
        }

        let Some(user) = self.users.get_by_email(email).await? else {
            self.guard.record_attempt(&guard_key, false).await;
            return Ok(AuthOutcome::InvalidCredentials);
        };

        if !password::verify_password(password, &user.password_hash) {
            self.guard.record_attempt(&guard_key, false).await;
            return Ok(AuthOutcome::InvalidCredentials);
        }

        self.guard.record_attempt(&guard_key, true).await;

        // Login stamping is best-effort: a store or cache hiccup here must
        // not fail an otherwise valid login.
        let user = match self.users.update_last_login(&user.id, Utc::now()).await {
            Ok(updated) => {
                if let Err(err) = self.cache.invalidate_prefix(&chommie_core::cache::entity_prefix(ENTITY_USER)).await
                {
                    tracing::warn!("failed to drop cached user views after login: {err}");
                }
                updated
            }
            Err(err) => {
                tracing::warn!("failed to stamp last_login for {}: {err}", user.id);
                user
            }
        };

        Ok(AuthOutcome::Success(user))
    }

    /// Profile view for a user. An unknown user is `None`, not an error.
    pub async fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, ServiceError> {
        let user_key = cache_key(ENTITY_USER, "get_by_id", &serde_json::json!({ "id": user_id }));
        let user = match cache_get(&self.cache, &user_key)
            .await
            .and_then(|cached| cache_decode::<User>(&user_key, cached))
        {
            Some(user) => user,
            None => match self.users.get_by_id(user_id).await? {
                Some(user) => {
                    cache_set(&self.cache, &user_key, &serde_json::to_value(&user)?, self.entity_ttl).await;
                    user
                }
                None => return Ok(None),
            },
        };

        let apps_key = cache_key(ENTITY_APPLICATION, "for_user", &serde_json::json!({ "user_id": user_id }));
        let applications = match cache_get(&self.cache, &apps_key)
            .await
            .and_then(|cached| cache_decode::<Vec<ApplicationWithJob>>(&apps_key, cached))
        {
            Some(applications) => applications,
            None => {
                let applications: Vec<ApplicationWithJob> = self
                    .applications
                    .for_user_with_jobs(user_id)
                    .await?
                    .into_iter()
                    .map(|(application, job)| ApplicationWithJob { application, job })
                    .collect();
                cache_set(&self.cache, &apps_key, &serde_json::to_value(&applications)?, self.search_ttl).await;
                applications
            }
        };

        let statistics = statistics(&applications);
        Ok(Some(UserProfile { user, applications, statistics }))
    }
}
