//! Store layer error types.
//!
//! The taxonomy separates caller mistakes (validation, duplicates) from
//! store-side failures, and store-side failures into transient ones the
//! repositories may retry and permanent ones they surface immediately.

/// Errors from validation, repositories, and the data-service adapter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Bad caller input, with field-level detail.
    #[error("VALIDATION: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// A uniqueness rule was violated (duplicate email, repeat application).
    #[error("DUPLICATE: {entity}: {detail}")]
    Duplicate { entity: &'static str, detail: String },

    /// Mutation target does not exist.
    #[error("NOT_FOUND: {entity} {id}")]
    NotFound { entity: &'static str, id: String },

    /// Store request timed out.
    #[error("STORE_TIMEOUT: {0}")]
    Timeout(String),

    /// Transient store failure (connection reset, 5xx, throttling).
    #[error("STORE_TRANSIENT: {0}")]
    Transient(String),

    /// Permanent store failure (malformed request, bad resource path).
    #[error("STORE_PERMANENT: {0}")]
    Permanent(String),

    /// Store response could not be decoded.
    #[error("STORE_PARSE: {0}")]
    Parse(String),
}

impl StoreError {
    /// Construct a field-level validation error.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Validation { field: field.into(), reason: reason.into() }
    }

    /// Whether the repository layer may retry this failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Timeout(_) | StoreError::Transient(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Parse(err.to_string())
    }
}
