//! HTTP transport seam with a pooled reqwest implementation
//!
//! The engine only ever sees [`Transport`]; tests and embedders swap in their
//! own implementation to observe or script individual invocations.

use std::time::Duration;

use async_trait::async_trait;
use rbx_core::{BoxError, Headers, HttpMethod, HttpRequest, HttpResponse};
use reqwest::{Client, ClientBuilder, Method};
use thiserror::Error;

use rbx_core::error::{RbxError, RbxResult};

/// Reason a request produced no response at all
#[derive(Debug, Error)]
pub enum TransportFailure {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{message}")]
    Other {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

/// Performs one HTTP request
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure>;
}

/// Connection settings for [`ReqwestTransport`]
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Whole-request timeout
    pub timeout: Duration,
    /// Idle connections kept per host
    pub pool_max_idle_per_host: usize,
    /// How long an idle connection stays in the pool
    pub pool_idle_timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 50,
            pool_idle_timeout: Duration::from_secs(90),
            user_agent: concat!("rbxapi/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Transport backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> RbxResult<Self> {
        Self::with_config(TransportConfig::default())
    }

    pub fn with_config(config: TransportConfig) -> RbxResult<Self> {
        let client = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .timeout(config.timeout)
            .gzip(true)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| RbxError::ConfigValidation {
                field: "transport".to_string(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn map_reqwest_error(error: reqwest::Error) -> TransportFailure {
    if error.is_timeout() {
        TransportFailure::Timeout
    } else if error.is_connect() {
        TransportFailure::Connect(error.to_string())
    } else {
        TransportFailure::Other {
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure> {
        let mut builder = self
            .client
            .request(reqwest_method(request.method), &request.url);

        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
