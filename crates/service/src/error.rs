//! Service layer error types.
//!
//! Maps store-layer failures onto the outcomes the consuming UI/API layer
//! branches on: validation detail for the caller, a distinct rate-limited
//! outcome, a generic "try again" for exhausted transients, and cache
//! failures only where skipping invalidation would serve stale data.

use chommie_store::StoreError;

/// Errors surfaced by the service layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Bad caller input, with field-level detail.
    #[error("VALIDATION: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// A uniqueness rule was violated.
    #[error("DUPLICATE: {0}")]
    Duplicate(String),

    /// The requested record does not exist.
    #[error("NOT_FOUND: {entity} {id}")]
    NotFound { entity: String, id: String },

    /// The actor exceeded the attempt policy and is temporarily blocked.
    #[error("RATE_LIMITED: {0}")]
    RateLimited(String),

    /// Transient store trouble outlived the retry budget.
    #[error("STORE_UNAVAILABLE: {0}")]
    Unavailable(String),

    /// Permanent store failure.
    #[error("STORE_ERROR: {0}")]
    Store(String),

    /// Cache invalidation failed after a mutation; the mutation itself
    /// landed.
    #[error("CACHE_ERROR: {0}")]
    Cache(String),

    /// Internal serialization failure.
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation { field, reason } => ServiceError::Validation { field, reason },
            StoreError::Duplicate { entity, detail } => ServiceError::Duplicate(format!("{entity}: {detail}")),
            StoreError::NotFound { entity, id } => ServiceError::NotFound { entity: entity.to_string(), id },
            StoreError::Timeout(msg) | StoreError::Transient(msg) => ServiceError::Unavailable(msg),
            StoreError::Permanent(msg) | StoreError::Parse(msg) => ServiceError::Store(msg),
        }
    }
}

impl From<chommie_core::Error> for ServiceError {
    fn from(err: chommie_core::Error) -> Self {
        ServiceError::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Internal(err.to_string())
    }
}
