//! HTTP client for API scenarios
//!
//! Thin wrapper over reqwest that resolves paths against a base URL and
//! normalizes transport faults into the harness error taxonomy.

use std::collections::HashMap;
use std::time::Duration;

use sitecheck_common::{Error, Result};

/// Response snapshot handed back to scenario bodies.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    /// Parsed JSON body, or a JSON string when the body was not JSON
    pub body: serde_json::Value,
}

impl ApiResponse {
    /// Top-level body key lookup (object bodies only).
    pub fn key(&self, name: &str) -> Option<&serde_json::Value> {
        self.body.get(name)
    }
}

/// HTTP client bound to an API base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self {
            inner,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// Issue a request. Transport failures (DNS, refused connection,
    /// timeouts) surface as `NetworkError`. HTTP error statuses do not:
    /// asserting on status is the scenario's job.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ApiResponse> {
        let method = reqwest::Method::from_bytes(method.to_uppercase().as_bytes())
            .map_err(|_| Error::InvalidConfig(format!("invalid HTTP method '{}'", method)))?;

        let mut request = self.inner.request(method, self.resolve(path));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_string(), v.to_string()))
            })
            .collect();

        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.request("GET", path, None).await
    }

    pub async fn post(&self, path: &str, body: &serde_json::Value) -> Result<ApiResponse> {
        self.request("POST", path, Some(body)).await
    }
}
