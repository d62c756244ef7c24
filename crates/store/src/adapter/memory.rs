//! In-memory backend interpreting the adapter's operator grammar.
//!
//! Used by tests and local development. Rows are plain JSON objects held in
//! per-collection tables; identifiers are assigned on insert. The backend
//! counts every executed request so callers can assert round-trip budgets.

use super::{DataService, Method, StoreRequest, StoreResponse};
use crate::StoreError;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tokio::sync::Mutex;

/// In-memory data service.
#[derive(Debug, Default)]
pub struct MemoryDataService {
    tables: Mutex<HashMap<String, Vec<serde_json::Value>>>,
    next_id: AtomicU64,
    requests: AtomicU64,
}

impl MemoryDataService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests executed so far.
    pub fn request_count(&self) -> u64 {
        self.requests.load(AtomicOrdering::SeqCst)
    }

    /// Insert rows directly, bypassing the request counter. Rows without an
    /// `id` field get one assigned.
    pub async fn seed(&self, table: &str, rows: Vec<serde_json::Value>) {
        let mut tables = self.tables.lock().await;
        let entries = tables.entry(table.to_string()).or_default();
        for mut row in rows {
            if row.get("id").is_none()
                && let Some(obj) = row.as_object_mut()
            {
                let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst) + 1;
                obj.insert("id".to_string(), serde_json::Value::String(format!("mem-{id}")));
            }
            entries.push(row);
        }
    }

    fn assign_id(&self, row: &mut serde_json::Value) {
        if row.get("id").is_none()
            && let Some(obj) = row.as_object_mut()
        {
            let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst) + 1;
            obj.insert("id".to_string(), serde_json::Value::String(format!("mem-{id}")));
        }
    }
}

/// Split a `column.op.operand` condition. Column and operator never contain
/// dots; the operand may.
fn split_condition(cond: &str) -> Option<(&str, &str, &str)> {
    let (column, rest) = cond.split_once('.')?;
    let (op, operand) = rest.split_once('.')?;
    Some((column, op, operand))
}

fn field_matches(row: &serde_json::Value, column: &str, op: &str, operand: &str) -> bool {
    let field = row.get(column).unwrap_or(&serde_json::Value::Null);
    match op {
        "eq" => match field {
            serde_json::Value::Bool(b) => operand.parse::<bool>().map(|o| *b == o).unwrap_or(false),
            serde_json::Value::Number(n) => operand.parse::<f64>().map(|o| n.as_f64() == Some(o)).unwrap_or(false),
            serde_json::Value::String(s) => s == operand,
            _ => false,
        },
        "neq" => !field_matches(row, column, "eq", operand),
        "gte" | "lte" | "gt" | "lt" => {
            let ordering = match field {
                serde_json::Value::Number(n) => {
                    let Ok(o) = operand.parse::<f64>() else { return false };
                    n.as_f64().and_then(|v| v.partial_cmp(&o))
                }
                // RFC 3339 timestamps compare correctly as strings.
                serde_json::Value::String(s) => Some(s.as_str().cmp(operand)),
                _ => None,
            };
            match (op, ordering) {
                ("gte", Some(Ordering::Greater | Ordering::Equal)) => true,
                ("lte", Some(Ordering::Less | Ordering::Equal)) => true,
                ("gt", Some(Ordering::Greater)) => true,
                ("lt", Some(Ordering::Less)) => true,
                _ => false,
            }
        }
        "ilike" => {
            let serde_json::Value::String(s) = field else { return false };
            let needle = operand.trim_matches('*').to_lowercase();
            s.to_lowercase().contains(&needle)
        }
        "in" => {
            let list = operand.trim_start_matches('(').trim_end_matches(')');
            let value = match field {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                _ => return false,
            };
            list.split(',').any(|candidate| candidate == value)
        }
        _ => false,
    }
}

fn row_matches(row: &serde_json::Value, key: &str, value: &str) -> bool {
    if key == "or" {
        let inner = value.trim_start_matches('(').trim_end_matches(')');
        return inner.split(',').any(|cond| {
            split_condition(cond)
                .map(|(column, op, operand)| field_matches(row, column, op, operand))
                .unwrap_or(false)
        });
    }

    match value.split_once('.') {
        Some((op, operand)) => field_matches(row, key, op, operand),
        None => false,
    }
}

fn compare_fields(a: &serde_json::Value, b: &serde_json::Value, column: &str) -> Ordering {
    let left = a.get(column).unwrap_or(&serde_json::Value::Null);
    let right = b.get(column).unwrap_or(&serde_json::Value::Null);
    match (left, right) {
        (serde_json::Value::Number(x), serde_json::Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (serde_json::Value::String(x), serde_json::Value::String(y)) => x.cmp(y),
        (serde_json::Value::Bool(x), serde_json::Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn project(row: &serde_json::Value, columns: &str) -> serde_json::Value {
    let mut out = serde_json::Map::new();
    for column in columns.split(',') {
        let column = column.trim();
        if let Some(value) = row.get(column) {
            out.insert(column.to_string(), value.clone());
        }
    }
    serde_json::Value::Object(out)
}

#[async_trait]
impl DataService for MemoryDataService {
    async fn execute(&self, req: StoreRequest) -> Result<StoreResponse, StoreError> {
        self.requests.fetch_add(1, AtomicOrdering::SeqCst);

        let mut order: Option<(String, bool)> = None;
        let mut limit: Option<usize> = None;
        let mut offset: usize = 0;
        let mut select: Option<String> = None;
        let mut filters: Vec<(String, String)> = Vec::new();

        for (key, value) in &req.params {
            match key.as_str() {
                "order" => {
                    if let Some((column, dir)) = value.rsplit_once('.') {
                        order = Some((column.to_string(), dir == "desc"));
                    }
                }
                "limit" => limit = value.parse().ok(),
                "offset" => offset = value.parse().unwrap_or(0),
                "select" => select = Some(value.clone()),
                _ => filters.push((key.clone(), value.clone())),
            }
        }

        let mut tables = self.tables.lock().await;
        let rows = tables.entry(req.path.clone()).or_default();

        match req.method {
            Method::Get => {
                let mut matched: Vec<serde_json::Value> = rows
                    .iter()
                    .filter(|row| filters.iter().all(|(key, value)| row_matches(row, key, value)))
                    .cloned()
                    .collect();

                if let Some((column, desc)) = &order {
                    matched.sort_by(|a, b| {
                        let ordering = compare_fields(a, b, column);
                        if *desc { ordering.reverse() } else { ordering }
                    });
                }

                let total = matched.len() as u64;
                let mut page: Vec<serde_json::Value> = matched.into_iter().skip(offset).collect();
                if let Some(limit) = limit {
                    page.truncate(limit);
                }

                if let Some(columns) = &select {
                    page = page.iter().map(|row| project(row, columns)).collect();
                }

                Ok(StoreResponse { rows: page, total: Some(total) })
            }
            Method::Post => {
                let body = req
                    .body
                    .ok_or_else(|| StoreError::Permanent("insert requires a body".to_string()))?;
                let inserted = match body {
                    serde_json::Value::Array(items) => items,
                    single => vec![single],
                };

                let mut stored = Vec::with_capacity(inserted.len());
                for mut row in inserted {
                    self.assign_id(&mut row);
                    rows.push(row.clone());
                    stored.push(row);
                }

                let total = Some(stored.len() as u64);
                Ok(StoreResponse { rows: stored, total })
            }
            Method::Patch => {
                let body = req
                    .body
                    .ok_or_else(|| StoreError::Permanent("update requires a body".to_string()))?;
                let patch = body
                    .as_object()
                    .ok_or_else(|| StoreError::Permanent("update body must be an object".to_string()))?;

                let mut updated = Vec::new();
                for row in rows.iter_mut() {
                    if filters.iter().all(|(key, value)| row_matches(row, key, value))
                        && let Some(obj) = row.as_object_mut()
                    {
                        for (key, value) in patch {
                            obj.insert(key.clone(), value.clone());
                        }
                        updated.push(row.clone());
                    }
                }

                let total = Some(updated.len() as u64);
                Ok(StoreResponse { rows: updated, total })
            }
            Method::Delete => {
                let mut removed = Vec::new();
                rows.retain(|row| {
                    if filters.iter().all(|(key, value)| row_matches(row, key, value)) {
                        removed.push(row.clone());
                        false
                    } else {
                        true
                    }
                });

                let total = Some(removed.len() as u64);
                Ok(StoreResponse { rows: removed, total })
            }
        }
    }
}
