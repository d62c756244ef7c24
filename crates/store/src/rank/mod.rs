//! Ranking engine.
//!
//! Pure functions over repository-fetched data: given candidate records and
//! an auxiliary count map, produce a sorted, limited output. Nothing here
//! issues store requests; everything needed must already have been
//! batch-fetched.

pub mod keywords;

pub use keywords::{FrequencyExtractor, KeywordExtractor};

use crate::model::Job;
use std::collections::HashMap;

/// Tally application rows into a per-job count map.
///
/// Rows are projected application records carrying a `job_id` field; rows
/// without one are ignored (partial batch resolution is tolerated).
pub fn count_by_job(rows: &[serde_json::Value]) -> HashMap<String, u64> {
    let mut counts = HashMap::new();
    for row in rows {
        if let Some(job_id) = row.get("job_id").and_then(|v| v.as_str()) {
            *counts.entry(job_id.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Order candidates by recent application volume.
///
/// Sort key: application count descending, then `created_at` descending
/// (newer first on equal counts), then identifier ascending as the stable
/// final tie-break. Output is truncated to `limit`.
pub fn trending(mut jobs: Vec<Job>, counts: &HashMap<String, u64>, limit: usize) -> Vec<Job> {
    jobs.sort_by(|a, b| {
        let count_a = counts.get(&a.id).copied().unwrap_or(0);
        let count_b = counts.get(&b.id).copied().unwrap_or(0);
        count_b
            .cmp(&count_a)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    jobs.truncate(limit);
    jobs
}
