//! Deterministic cache key construction.
//!
//! Keys are namespaced as `{entity}:{operation}:{hash}` where the hash is a
//! SHA-256 digest of the effective parameter set. Two logically identical
//! requests always map to the same key; prefix invalidation operates on the
//! `{entity}:` namespace.

use sha2::{Digest, Sha256};

/// Compute a cache key for an entity operation and its parameter set.
///
/// Parameters must already be in their effective (post-validation) form.
/// `serde_json::Value` objects serialize with sorted keys, so the digest is
/// stable across call sites.
pub fn cache_key(entity: &str, operation: &str, params: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entity.as_bytes());
    hasher.update(b"\n");
    hasher.update(operation.as_bytes());
    hasher.update(b"\n");
    hasher.update(params.to_string().as_bytes());
    format!("{entity}:{operation}:{}", hex::encode(hasher.finalize()))
}

/// Namespace prefix covering every cached operation for an entity.
pub fn entity_prefix(entity: &str) -> String {
    format!("{entity}:")
}
