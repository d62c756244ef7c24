//! SQLite-backed key-value cache for repository and service results.
//!
//! This module provides a persistent cache using SQLite with async access
//! via tokio-rusqlite. It supports:
//!
//! - Deterministic keys hashed from entity, operation, and parameter set
//! - TTL expiry with lazy eviction and an explicit purge operation
//! - Batched multi-get/multi-set in single round trips
//! - Prefix invalidation per entity namespace
//! - Transparent gzip compression for oversized values
//! - Automatic schema migrations, WAL mode for concurrent access

pub mod compress;
pub mod connection;
pub mod entries;
pub mod keys;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use keys::{cache_key, entity_prefix};
