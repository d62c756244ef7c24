//! Key-value cache entry operations.
//!
//! Provides get/set, batched multi-get/multi-set, deletion, prefix
//! invalidation, and TTL purging. Entries are created on miss population and
//! replaced on refresh, never mutated in place.

use super::compress;
use super::connection::CacheDb;
use crate::Error;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// SQLite bound-parameter budget per statement; batched reads chunk at this.
const PARAMS_PER_QUERY: usize = 400;

fn encode(value: &serde_json::Value, threshold: usize) -> Result<(Vec<u8>, bool), Error> {
    let raw = serde_json::to_vec(value)?;
    if raw.len() > threshold {
        let packed = compress::compress(&raw)?;
        Ok((packed, true))
    } else {
        Ok((raw, false))
    }
}

fn decode(blob: &[u8], compressed: bool) -> Result<serde_json::Value, Error> {
    if compressed {
        let raw = compress::decompress(blob)?;
        Ok(serde_json::from_slice(&raw)?)
    } else {
        Ok(serde_json::from_slice(blob)?)
    }
}

impl CacheDb {
    /// Get a cached value by key.
    ///
    /// Returns None if the key doesn't exist or its TTL has lapsed; an
    /// expired row is deleted on the way.
    pub async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, Error> {
        if key.is_empty() {
            return Err(Error::InvalidInput("cache key cannot be empty".to_string()));
        }

        let key = key.to_string();
        let now = Utc::now().to_rfc3339();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(Vec<u8>, bool)>, Error> {
                conn.execute("DELETE FROM cache_entries WHERE key = ?1 AND expires_at <= ?2", params![key, now])?;

                let mut stmt = conn.prepare("SELECT value, compressed FROM cache_entries WHERE key = ?1")?;
                let result = stmt.query_row(params![key], |row| {
                    Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, i32>(1)? == 1))
                });

                match result {
                    Ok(found) => Ok(Some(found)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        match row {
            Some((blob, compressed)) => Ok(Some(decode(&blob, compressed)?)),
            None => Ok(None),
        }
    }

    /// Insert or replace a cached value with the given TTL.
    ///
    /// Values whose serialized size exceeds the database's compression
    /// threshold are gzipped first; the decision is size-based only.
    pub async fn set(&self, key: &str, value: &serde_json::Value, ttl_seconds: i64) -> Result<(), Error> {
        if key.is_empty() {
            return Err(Error::InvalidInput("cache key cannot be empty".to_string()));
        }

        let (blob, compressed) = encode(value, self.compress_threshold)?;
        let key = key.to_string();
        let created_at = Utc::now().to_rfc3339();
        let expires_at = (Utc::now() + Duration::seconds(ttl_seconds)).to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO cache_entries (key, value, compressed, created_at, expires_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        compressed = excluded.compressed,
                        created_at = excluded.created_at,
                        expires_at = excluded.expires_at",
                    params![key, blob, compressed as i32, created_at, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get multiple cached values in one round trip.
    ///
    /// Returns a partial map containing only the keys that are present and
    /// fresh. Key sets larger than the statement parameter budget are split
    /// across sequential queries.
    pub async fn multi_get(&self, keys: &[String]) -> Result<HashMap<String, serde_json::Value>, Error> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let keys = keys.to_vec();
        let now = Utc::now().to_rfc3339();
        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<(String, Vec<u8>, bool)>, Error> {
                let mut rows = Vec::new();
                for chunk in keys.chunks(PARAMS_PER_QUERY) {
                    let placeholders = (2..=chunk.len() + 1)
                        .map(|i| format!("?{i}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let sql = format!(
                        "SELECT key, value, compressed FROM cache_entries
                         WHERE expires_at > ?1 AND key IN ({placeholders})"
                    );

                    let mut stmt = conn.prepare(&sql)?;
                    let mut values: Vec<&dyn rusqlite::ToSql> = vec![&now];
                    for key in chunk {
                        values.push(key);
                    }

                    let found = stmt
                        .query_map(values.as_slice(), |row| {
                            Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?, row.get::<_, i32>(2)? == 1))
                        })?
                        .collect::<Result<Vec<_>, _>>()?;
                    rows.extend(found);
                }
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        let mut out = HashMap::with_capacity(rows.len());
        for (key, blob, compressed) in rows {
            out.insert(key, decode(&blob, compressed)?);
        }
        Ok(out)
    }

    /// Insert or replace multiple values in one transaction, sharing a TTL.
    pub async fn multi_set(&self, entries: Vec<(String, serde_json::Value)>, ttl_seconds: i64) -> Result<(), Error> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut rows = Vec::with_capacity(entries.len());
        for (key, value) in &entries {
            if key.is_empty() {
                return Err(Error::InvalidInput("cache key cannot be empty".to_string()));
            }
            let (blob, compressed) = encode(value, self.compress_threshold)?;
            rows.push((key.clone(), blob, compressed));
        }

        let created_at = Utc::now().to_rfc3339();
        let expires_at = (Utc::now() + Duration::seconds(ttl_seconds)).to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO cache_entries (key, value, compressed, created_at, expires_at)
                        VALUES (?1, ?2, ?3, ?4, ?5)
                        ON CONFLICT(key) DO UPDATE SET
                            value = excluded.value,
                            compressed = excluded.compressed,
                            created_at = excluded.created_at,
                            expires_at = excluded.expires_at",
                    )?;
                    for (key, blob, compressed) in &rows {
                        stmt.execute(params![key, blob, *compressed as i32, created_at, expires_at])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a cache entry by key.
    pub async fn delete(&self, key: &str) -> Result<(), Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every cache entry whose key starts with `prefix`.
    ///
    /// Returns the number of deleted entries. This is the invalidation path
    /// used after entity mutations; precision is traded for correctness.
    pub async fn invalidate_prefix(&self, prefix: &str) -> Result<u64, Error> {
        if prefix.is_empty() {
            return Err(Error::InvalidInput("invalidation prefix cannot be empty".to_string()));
        }

        let escaped = prefix.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let pattern = format!("{escaped}%");
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM cache_entries WHERE key LIKE ?1 ESCAPE '\\'", params![pattern])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete expired cache entries.
    ///
    /// Returns the number of deleted entries. Intended for an external
    /// scheduler; reads already treat expired rows as absent.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM cache_entries WHERE expires_at <= ?1", params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
