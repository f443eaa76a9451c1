//! HTTP transports.
//!
//! A [`Transport`] only moves bytes: any completed exchange, whatever its
//! status, is `Ok`. Classifying failures and running middleware is the
//! pipeline's job (see `client`).

use reqwest::header::AUTHORIZATION;

use super::types::{ApiError, ApiRequest, ApiResponse, Method, parse_body};
use crate::config::ClientConfig;

/// Sends one request and returns the raw exchange. Enables mocking in tests.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ApiError::Timeout`] or [`ApiError::Network`] when no
    /// response was received.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

// =============================================================================
// REQWEST
// =============================================================================

pub struct ReqwestTransport {
    http: reqwest::Client,
    api_root: String,
}

impl ReqwestTransport {
    /// Build a transport rooted at `config.api_root()` with the configured
    /// request and connect timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the TLS backend fails to load.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, api_root: config.api_root() })
    }

    #[must_use]
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_root)
    }
}

fn map_send_error(e: &reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(e.to_string())
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.url(&request.path);
        let mut builder = match request.method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
            Method::Put => self.http.put(&url),
            Method::Delete => self.http.delete(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(auth) = &request.authorization {
            builder = builder.header(AUTHORIZATION, auth);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| map_send_error(&e))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| map_send_error(&e))?;

        Ok(ApiResponse { status, body: parse_body(&text) })
    }
}
