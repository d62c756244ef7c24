//! User repository.
//!
//! Accounts are created with an already-digested password; the clear text
//! never reaches this layer. Email addresses are normalized to lowercase
//! before they hit the store, so uniqueness and lookups are
//! case-insensitive.

use crate::StoreError;
use crate::adapter::{DataService, Method, Query, StoreRequest};
use crate::model::{NewUser, User};
use crate::repo::{decode_first, decode_rows, with_retry};
use crate::validate;
use chommie_core::AppConfig;
use chrono::{DateTime, Utc};
use std::sync::Arc;

const RESOURCE: &str = "users";

/// Repository for user accounts.
pub struct UserRepository {
    store: Arc<dyn DataService>,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DataService>, config: &AppConfig) -> Self {
        Self { store, max_retries: config.max_retries, retry_backoff_ms: config.retry_backoff_ms }
    }

    async fn execute(&self, req: &StoreRequest) -> Result<crate::adapter::StoreResponse, StoreError> {
        with_retry(self.max_retries, self.retry_backoff_ms, || self.store.execute(req.clone())).await
    }

    /// Create an account from a validated draft and password digest.
    ///
    /// A registered email is a `Duplicate` failure.
    pub async fn create(&self, new: &NewUser, password_hash: &str) -> Result<User, StoreError> {
        validate::validate_new_user(new)?;

        let email = new.email.trim().to_lowercase();
        if self.get_by_email(&email).await?.is_some() {
            return Err(StoreError::Duplicate { entity: "user", detail: format!("email {email} already registered") });
        }

        let body = serde_json::json!({
            "name": new.name.trim(),
            "email": email,
            "password_hash": password_hash,
            "subscription_plan": new.subscription_plan,
            "last_login": null,
        });

        let resp = self.execute(&StoreRequest::new(Method::Post, RESOURCE).with_body(body)).await?;
        decode_first(resp.rows)?.ok_or_else(|| StoreError::Parse("insert returned no rows".to_string()))
    }

    /// Fetch an account by identifier. A missing record is `None`.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let req = StoreRequest::new(Method::Get, RESOURCE).with_query(Query::new().eq("id", id).limit(1));
        let resp = self.execute(&req).await?;
        decode_first(resp.rows)
    }

    /// Fetch an account by email, case-insensitively.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = email.trim().to_lowercase();
        let req = StoreRequest::new(Method::Get, RESOURCE).with_query(Query::new().eq("email", email).limit(1));
        let resp = self.execute(&req).await?;
        decode_first(resp.rows)
    }

    /// Stamp a successful login. Missing target is a `NotFound` failure.
    pub async fn update_last_login(&self, id: &str, when: DateTime<Utc>) -> Result<User, StoreError> {
        let req = StoreRequest::new(Method::Patch, RESOURCE)
            .with_query(Query::new().eq("id", id))
            .with_body(serde_json::json!({ "last_login": when }));
        let resp = self.execute(&req).await?;
        decode_first(resp.rows)?.ok_or_else(|| StoreError::NotFound { entity: "user", id: id.to_string() })
    }

    /// Delete an account. Missing target is a `NotFound` failure.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let req = StoreRequest::new(Method::Delete, RESOURCE).with_query(Query::new().eq("id", id));
        let resp = self.execute(&req).await?;
        if resp.rows.is_empty() {
            return Err(StoreError::NotFound { entity: "user", id: id.to_string() });
        }
        Ok(())
    }

    /// List accounts.
    pub async fn list(&self, limit: usize, offset: usize) -> Result<Vec<User>, StoreError> {
        let query = Query::new().order_asc("email").limit(limit).offset(offset);
        let resp = self.execute(&StoreRequest::new(Method::Get, RESOURCE).with_query(query)).await?;
        decode_rows(resp.rows)
    }
}
