use crate::config::ConsoleConfig;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// HTTP method subset used by the console REST API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

/// A single REST request: method, path, query pairs, optional JSON body.
///
/// Path segments containing user-supplied identifiers must be
/// percent-encoded by the caller before the path is assembled.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Failure of a single request.
///
/// `Status` keeps the response body verbatim so callers can reshape
/// structured error payloads; everything else collapses to a message.
#[derive(Clone, Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl TransportError {
    /// The error as a JSON value for view consumption: the parsed response
    /// body when there is one, otherwise the message as a string.
    pub fn payload(&self) -> Value {
        match self {
            TransportError::Status { body, .. } => {
                serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.clone()))
            }
            other => Value::String(other.to_string()),
        }
    }
}

/// Serialize a payload into a JSON value, mapping failures into the
/// transport error space so request producers can use `?`.
pub fn to_json<T: Serialize>(value: &T) -> Result<Value, TransportError> {
    serde_json::to_value(value).map_err(|e| TransportError::Decode(e.to_string()))
}

/// The seam to the REST backend. Services depend on this trait, never on
/// the HTTP client directly, so tests can substitute a recording fake.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError>;
}

/// Production transport backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ConsoleConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };
        builder = builder.timeout(self.timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            log::warn!("{} {} failed: HTTP {}", method_name(request.method), url, status);
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }
        // Some endpoints answer with JSON, others with plain text. Non-JSON
        // bodies are surfaced as strings for the caller to reshape.
        Ok(match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(_) => Value::String(body),
        })
    }
}

fn method_name(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Get => "GET",
        HttpMethod::Post => "POST",
        HttpMethod::Delete => "DELETE",
    }
}
