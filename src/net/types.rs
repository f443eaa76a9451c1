//! Transport-neutral request, response, and error types.

use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

/// `detail` string the backend returns when no bearer token was sent.
pub const CREDENTIALS_NOT_PROVIDED_DETAIL: &str = "Authentication credentials were not provided.";
/// `code` the backend returns for an expired or otherwise invalid token.
pub const TOKEN_NOT_VALID_CODE: &str = "token_not_valid";

// =============================================================================
// ERROR
// =============================================================================

/// Grepable error code and retryable flag for logs and callers.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Tagged failure of a single API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request did not complete within the client timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection, DNS, TLS, or body transfer failure.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("API response error: status {status}")]
    Status { status: u16, body: Value },

    /// The server rejected the bearer token (or saw none). The session has
    /// already been torn down by the time the caller sees this.
    #[error("authentication invalidated: status {status}")]
    AuthInvalidated { status: u16, body: Value },

    /// A success body did not match the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// An outgoing request body could not be serialized.
    #[error("request encode failed: {0}")]
    Encode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// HTTP status for server-side failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::AuthInvalidated { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body for server-side failures.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } | Self::AuthInvalidated { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Timeout => "E_TIMEOUT",
            Self::Network(_) => "E_NETWORK",
            Self::Status { .. } => "E_API_STATUS",
            Self::AuthInvalidated { .. } => "E_AUTH_INVALIDATED",
            Self::Decode(_) => "E_DECODE",
            Self::Encode(_) => "E_ENCODE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Network(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

/// True when a failure body carries either auth-invalidation marker.
#[must_use]
pub fn is_auth_invalidation(body: &Value) -> bool {
    body.get("detail").and_then(Value::as_str) == Some(CREDENTIALS_NOT_PROVIDED_DETAIL)
        || body.get("code").and_then(Value::as_str) == Some(TOKEN_NOT_VALID_CODE)
}

// =============================================================================
// REQUEST
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound call. `path` is relative to the API root (`/snippets/`).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Correlates log lines for one call.
    pub id: Uuid,
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Full `Authorization` header value, set by the pipeline.
    pub authorization: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            authorization: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// A completed HTTP exchange. `body` is `Null` for empty bodies and a JSON
/// string for bodies that are not JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        T::deserialize(&self.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Split a raw exchange into success or a tagged failure.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthInvalidated`] when a failure body carries an
    /// auth-invalidation marker, else [`ApiError::Status`].
    pub fn into_result(self) -> Result<Self, ApiError> {
        if self.is_success() {
            return Ok(self);
        }
        if is_auth_invalidation(&self.body) {
            return Err(ApiError::AuthInvalidated { status: self.status, body: self.body });
        }
        Err(ApiError::Status { status: self.status, body: self.body })
    }
}

/// Parse a raw body: empty is `Null`, non-JSON is kept as a string.
#[must_use]
pub fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
