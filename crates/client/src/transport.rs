//! HTTP transport capability and its reqwest implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Description of one outgoing API request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, TransportError> {
        let body = serde_json::to_value(body).map_err(|e| TransportError::Encode(e.to_string()))?;
        self.body = Some(body);
        Ok(self)
    }

    /// Bearer credential carried by this request, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
    }

    pub fn set_bearer_token(
        &mut self,
        token: &str,
    ) -> Result<(), reqwest::header::InvalidHeaderValue> {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))?;
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// Successful (2xx) API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_str(&self.body).map_err(|e| TransportError::Decode {
            status: self.status,
            message: e.to_string(),
        })
    }

    pub fn text(&self) -> &str {
        &self.body
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("API error ({status})")]
    Status { status: u16, body: Option<Value> },

    /// The server could not be reached (or did not answer in time).
    #[error("network error: {0}")]
    Network(String),

    #[error("failed to decode response ({status}): {message}")]
    Decode { status: u16, message: String },

    #[error("failed to encode request body: {0}")]
    Encode(String),
}

impl TransportError {
    /// Numeric status of the failure; `0` when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            TransportError::Status { status, .. } | TransportError::Decode { status, .. } => {
                *status
            }
            TransportError::Network(_) | TransportError::Encode(_) => 0,
        }
    }

    /// `message` field of a JSON error body, when the server sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            TransportError::Status { body: Some(body), .. } => body.get("message")?.as_str(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == 401
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == 403
    }
}

/// Sends a request and resolves once with its outcome.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut req = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| TransportError::Network(e.to_string()))?;
        let status = resp.status();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) if status.is_success() => return Err(TransportError::Network(e.to_string())),
            Err(e) => {
                // The status line arrived; keep it even if the error body did not.
                tracing::debug!(status = status.as_u16(), error = %e, "unreadable error body");
                String::new()
            }
        };

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: serde_json::from_str(&body).ok(),
            });
        }

        Ok(ApiResponse::new(status.as_u16(), body))
    }
}
