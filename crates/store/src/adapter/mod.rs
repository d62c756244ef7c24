//! Data-service adapter.
//!
//! The external store is a black box reached through a single request
//! primitive: method, resource path, and a structured parameter list. The
//! core never concatenates raw query strings, so the backing store can be
//! swapped without touching the repository layer.

pub mod memory;
pub mod query;
pub mod rest;

pub use memory::MemoryDataService;
pub use query::Query;
pub use rest::RestDataService;

use crate::StoreError;
use async_trait::async_trait;

/// Request verb understood by the data service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

/// A structured request against one resource collection.
#[derive(Debug, Clone)]
pub struct StoreRequest {
    pub method: Method,
    /// Resource collection, e.g. `jobs`.
    pub path: String,
    /// Filter/ordering parameters in the adapter's operator grammar.
    pub params: Vec<(String, String)>,
    /// Row payload for Post/Patch.
    pub body: Option<serde_json::Value>,
    /// Ask the store for the total match count alongside the rows.
    pub count: bool,
}

impl StoreRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), params: Vec::new(), body: None, count: false }
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.params = query.build();
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_count(mut self) -> Self {
        self.count = true;
        self
    }
}

/// Rows returned by the data service, plus the total match count when the
/// request asked for it.
#[derive(Debug, Clone, Default)]
pub struct StoreResponse {
    pub rows: Vec<serde_json::Value>,
    pub total: Option<u64>,
}

/// Narrow interface over the external store.
///
/// Implementations must send every parameter as structured data (no query
/// string assembly from user text) and carry a request timeout, reporting
/// it as a transient failure.
#[async_trait]
pub trait DataService: Send + Sync {
    async fn execute(&self, req: StoreRequest) -> Result<StoreResponse, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = StoreRequest::new(Method::Get, "jobs")
            .with_query(Query::new().eq("id", "job-1").limit(1))
            .with_count();

        assert_eq!(req.method, Method::Get);
        assert_eq!(req.path, "jobs");
        assert!(req.count);
        assert!(req.params.contains(&("id".to_string(), "eq.job-1".to_string())));
    }
}
