//! Base HTTP JSON client.
//!
//! Provides `get()` and `post()` against a daemon's plain-JSON endpoints.
//! Supports Basic auth, configurable timeout, and retry with exponential
//! backoff on transient failures.

use crate::error::RpcError;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;

/// Configuration for an HTTP client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL (e.g., `http://localhost:11898`).
    pub url: String,
    /// Optional username for Basic auth.
    pub username: Option<String>,
    /// Optional password for Basic auth.
    pub password: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// Number of retry attempts on transient failure.
    pub retries: u32,
    /// Initial delay between retries (doubles each attempt).
    pub retry_delay: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11898".to_string(),
            username: None,
            password: None,
            timeout: Duration::from_secs(10),
            retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Async JSON client for the daemon's HTTP endpoints.
pub struct HttpClient {
    client: reqwest::Client,
    config: HttpConfig,
}

impl HttpClient {
    /// Create a new client with the given URL.
    pub fn new(url: &str) -> Self {
        Self::with_config(HttpConfig {
            url: url.trim_end_matches('/').to_string(),
            ..Default::default()
        })
    }

    /// Create a new client with full configuration.
    pub fn with_config(config: HttpConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(4)
            .build()
            .expect("failed to create HTTP client");

        Self { client, config }
    }

    /// Get the configured base URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn auth_header(&self) -> Option<HeaderValue> {
        match (&self.config.username, &self.config.password) {
            (Some(user), Some(pass)) => {
                let creds = format!("{}:{}", user, pass);
                let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
                HeaderValue::from_str(&format!("Basic {}", encoded)).ok()
            }
            _ => None,
        }
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(auth) = self.auth_header() {
            headers.insert(AUTHORIZATION, auth);
        }
        headers
    }

    fn classify(&self, endpoint: &str, e: reqwest::Error) -> RpcError {
        if e.is_timeout() {
            RpcError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else {
            RpcError::Http {
                endpoint: endpoint.to_string(),
                source: e,
            }
        }
    }

    /// GET a JSON endpoint.
    pub async fn get(&self, endpoint: &str) -> Result<Value, RpcError> {
        self.with_retries(endpoint, || self.do_get(endpoint)).await
    }

    /// POST JSON to an endpoint.
    pub async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, RpcError> {
        self.with_retries(endpoint, || self.do_post(endpoint, body))
            .await
    }

    async fn with_retries<F, Fut>(&self, endpoint: &str, call: F) -> Result<Value, RpcError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<Value, RpcError>>,
    {
        let attempts = self.config.retries + 1;
        let mut last_err = RpcError::NoResult {
            endpoint: endpoint.to_string(),
        };

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.config.retry_delay * 2u32.saturating_pow(attempt - 1);
                tokio::time::sleep(delay).await;
            }

            match call().await {
                Ok(val) => return Ok(val),
                Err(e) => {
                    let should_retry = e.is_transient() && attempt + 1 < attempts;
                    if !should_retry {
                        return Err(e);
                    }
                    tracing::debug!(endpoint, attempt, error = %e, "retrying daemon request");
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }

    async fn do_get(&self, endpoint: &str) -> Result<Value, RpcError> {
        let url = format!("{}{}", self.config.url, endpoint);
        let resp = self
            .client
            .get(&url)
            .headers(self.build_headers())
            .send()
            .await
            .map_err(|e| self.classify(endpoint, e))?;

        self.decode(endpoint, &url, resp).await
    }

    async fn do_post(&self, endpoint: &str, body: &Value) -> Result<Value, RpcError> {
        let url = format!("{}{}", self.config.url, endpoint);
        let resp = self
            .client
            .post(&url)
            .headers(self.build_headers())
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(endpoint, e))?;

        self.decode(endpoint, &url, resp).await
    }

    async fn decode(
        &self,
        endpoint: &str,
        url: &str,
        resp: reqwest::Response,
    ) -> Result<Value, RpcError> {
        let status = resp.status().as_u16();

        if status == 401 {
            return Err(RpcError::AuthFailed {
                url: url.to_string(),
            });
        }

        if status >= 400 {
            let body = resp.text().await.unwrap_or_default();
            return Err(RpcError::HttpStatus {
                endpoint: endpoint.to_string(),
                status,
                body: body.chars().take(500).collect(),
            });
        }

        resp.json().await.map_err(|e| self.classify(endpoint, e))
    }
}
