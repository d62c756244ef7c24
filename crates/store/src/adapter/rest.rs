//! REST backend for a hosted Postgres-compatible data service.
//!
//! Speaks the PostgREST-style interface: one resource collection per path,
//! operator grammar in query parameters, JSON rows in and out. Transient
//! failures (timeouts, connection resets, 5xx, throttling) are reported
//! distinctly from permanent ones so the repository layer can retry.

use super::{DataService, Method, StoreRequest, StoreResponse};
use crate::StoreError;
use async_trait::async_trait;
use chommie_core::AppConfig;
use reqwest::StatusCode;

/// Data service client for a hosted REST store.
#[derive(Debug, Clone)]
pub struct RestDataService {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestDataService {
    /// Build a client from configuration.
    ///
    /// Requires `store_base_url`; the API key is optional for stores with
    /// anonymous read access.
    pub fn new(config: &AppConfig) -> Result<Self, StoreError> {
        let base_url = config
            .require_store_base_url()
            .map_err(|e| StoreError::Permanent(e.to_string()))?
            .trim_end_matches('/')
            .to_string();

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .use_rustls_tls()
            .build()
            .map_err(|e| StoreError::Permanent(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, base_url, api_key: config.store_api_key.clone() })
    }

    fn classify_status(status: StatusCode) -> Option<StoreError> {
        if status.is_success() {
            return None;
        }

        let detail = format!("status {}", status.as_u16());
        if status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
            || status.is_server_error()
        {
            Some(StoreError::Transient(detail))
        } else {
            Some(StoreError::Permanent(detail))
        }
    }

    /// Total match count from a `Content-Range: 0-19/42` header.
    fn parse_total(headers: &reqwest::header::HeaderMap) -> Option<u64> {
        headers
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit('/').next())
            .and_then(|total| total.parse().ok())
    }
}

#[async_trait]
impl DataService for RestDataService {
    async fn execute(&self, req: StoreRequest) -> Result<StoreResponse, StoreError> {
        let url = format!("{}/{}", self.base_url, req.path);

        let mut request = match req.method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
            Method::Patch => self.http.patch(&url),
            Method::Delete => self.http.delete(&url),
        };

        request = request.query(&req.params).header("Accept", "application/json");

        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let mut prefer = Vec::new();
        if req.count {
            prefer.push("count=exact");
        }
        if matches!(req.method, Method::Post | Method::Patch | Method::Delete) {
            prefer.push("return=representation");
        }
        if !prefer.is_empty() {
            request = request.header("Prefer", prefer.join(", "));
        }

        if let Some(body) = &req.body {
            request = request.json(body);
        }

        tracing::debug!("store request: {:?} {}", req.method, req.path);

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout(e.to_string())
            } else {
                StoreError::Transient(format!("network error: {e}"))
            }
        })?;

        let status = response.status();
        if let Some(err) = Self::classify_status(status) {
            tracing::debug!("store request failed: {:?} {} -> {}", req.method, req.path, status);
            return Err(err);
        }

        let total = Self::parse_total(response.headers());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::Transient(format!("failed to read response: {e}")))?;

        let rows = if bytes.is_empty() {
            Vec::new()
        } else {
            match serde_json::from_slice::<serde_json::Value>(&bytes).map_err(|e| StoreError::Parse(e.to_string()))? {
                serde_json::Value::Array(rows) => rows,
                serde_json::Value::Null => Vec::new(),
                single => vec![single],
            }
        };

        Ok(StoreResponse { rows, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_base_url() {
        let config = AppConfig::default();
        let result = RestDataService::new(&config);
        assert!(matches!(result, Err(StoreError::Permanent(_))));
    }

    #[test]
    fn test_new_with_base_url() {
        let config = AppConfig { store_base_url: Some("https://data.example.com/rest/v1/".into()), ..Default::default() };
        let service = RestDataService::new(&config).unwrap();
        assert_eq!(service.base_url, "https://data.example.com/rest/v1");
    }

    #[test]
    fn test_status_classification() {
        assert!(RestDataService::classify_status(StatusCode::OK).is_none());
        assert!(matches!(
            RestDataService::classify_status(StatusCode::SERVICE_UNAVAILABLE),
            Some(StoreError::Transient(_))
        ));
        assert!(matches!(
            RestDataService::classify_status(StatusCode::TOO_MANY_REQUESTS),
            Some(StoreError::Transient(_))
        ));
        assert!(matches!(RestDataService::classify_status(StatusCode::BAD_REQUEST), Some(StoreError::Permanent(_))));
        assert!(matches!(RestDataService::classify_status(StatusCode::NOT_FOUND), Some(StoreError::Permanent(_))));
    }

    #[test]
    fn test_parse_total() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::CONTENT_RANGE, "0-19/42".parse().unwrap());
        assert_eq!(RestDataService::parse_total(&headers), Some(42));

        headers.clear();
        assert_eq!(RestDataService::parse_total(&headers), None);
    }
}
