use std::sync::Arc;

use reqwest::multipart::Form;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use sr_core::{Error, Result, TokenStorage, ACCESS_TOKEN};

use crate::config::ClientConfig;

/// Normalized outcome of one HTTP exchange. Any response the server
/// produced lands here, whatever its status; only transport-level
/// failures surface as the `Err` arm of [`ApiClient::send`].
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    /// True for statuses in [200, 300).
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// User-facing message from an error body, with a fallback when the
    /// server sent none.
    pub fn message(&self, fallback: &str) -> String {
        self.body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// HTTP wrapper shared by every store. Reads the bearer token from
/// [`TokenStorage`] on each call and decodes response bodies as JSON.
///
/// Every call is its own round trip; identical in-flight requests are
/// not coalesced.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    storage: Arc<dyn TokenStorage>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, storage: Arc<dyn TokenStorage>) -> Result<Self> {
        Url::parse(&config.base_url)
            .map_err(|e| Error::Parse(format!("Invalid server URL {}: {}", config.base_url, e)))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            storage,
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// One JSON round trip without query parameters.
    pub async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        self.send_query(method, path, &[], body).await
    }

    /// One JSON round trip. `Ok` carries whatever the server answered,
    /// success or error status alike.
    pub async fn send_query(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        let mut request = self.http.request(method.clone(), self.endpoint(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = self.bearer().await {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        Self::normalize(method, path, response).await
    }

    /// Multipart POST, used by the document upload path.
    pub async fn send_multipart(&self, path: &str, form: Form) -> Result<ApiResponse> {
        let mut request = self.http.post(self.endpoint(path)).multipart(form);
        if let Some(token) = self.bearer().await {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        let response = request.send().await?;
        Self::normalize(Method::POST, path, response).await
    }

    /// The predicate every store branches on: did the exchange succeed
    /// with a 2xx status?
    pub fn is_ok(outcome: &Result<ApiResponse>) -> bool {
        matches!(outcome, Ok(response) if response.ok())
    }

    async fn bearer(&self) -> Option<String> {
        match self.storage.get(ACCESS_TOKEN).await {
            Ok(token) => token,
            Err(e) => {
                error!("Failed to read access token: {}", e);
                None
            }
        }
    }

    async fn normalize(method: Method, path: &str, response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status();
        // Bodies that are not JSON (or empty) decode to Null rather than
        // failing the exchange.
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        debug!("{} {} -> {}", method, path, status);
        Ok(ApiResponse { status, body })
    }
}
