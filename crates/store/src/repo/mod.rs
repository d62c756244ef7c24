//! Per-entity repositories.
//!
//! Repositories translate validated drafts and filter sets into adapter
//! requests. Shared machinery lives here: transient-failure retries with
//! doubling backoff, row decoding, and the wire timestamp format.

pub mod application;
pub mod job;
pub mod user;

pub use application::ApplicationRepository;
pub use job::JobRepository;
pub use user::UserRepository;

use crate::StoreError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

/// Execute `op`, retrying transient failures up to `max_retries` times with
/// doubling backoff. Permanent failures surface immediately.
pub(crate) async fn with_retry<T, F, Fut>(max_retries: u32, backoff_ms: u64, op: F) -> Result<T, StoreError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 0;
    let mut delay = Duration::from_millis(backoff_ms);
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < max_retries => {
                attempt += 1;
                tracing::warn!("transient store failure, retrying (attempt {attempt}): {err}");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Decode store rows into typed records.
pub(crate) fn decode_rows<T: DeserializeOwned>(rows: Vec<serde_json::Value>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| StoreError::Parse(e.to_string())))
        .collect()
}

/// Decode the first row of a response, if any.
pub(crate) fn decode_first<T: DeserializeOwned>(rows: Vec<serde_json::Value>) -> Result<Option<T>, StoreError> {
    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row).map_err(|e| StoreError::Parse(e.to_string()))?)),
        None => Ok(None),
    }
}

/// Timestamp in the same RFC 3339 form serde writes into row bodies, so
/// range filters compare against stored values consistently.
pub(crate) fn wire_timestamp(when: DateTime<Utc>) -> String {
    when.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
