//! Unified error types for the cache and configuration layer.

use tokio_rusqlite::rusqlite;

/// Errors raised by the cache manager and its SQLite backing store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty cache key).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Cache value could not be serialized or deserialized.
    #[error("CACHE_ERROR: serialization: {0}")]
    Serialization(String),

    /// Compressed cache value could not be inflated.
    #[error("CACHE_ERROR: decompression: {0}")]
    Decompression(String),

    /// Decompressed value exceeds the configured ceiling.
    #[error("CACHE_ERROR: decompressed value exceeds {max} bytes")]
    DecompressedTooLarge { max: usize },
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("empty key".to_string());
        assert!(err.to_string().contains("INVALID_INPUT"));
        assert!(err.to_string().contains("empty key"));
    }

    #[test]
    fn test_decompressed_too_large_display() {
        let err = Error::DecompressedTooLarge { max: 1024 };
        assert!(err.to_string().contains("1024"));
    }
}
