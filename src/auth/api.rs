//! Auth endpoint wrappers. One call each, no local state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::net::{ApiClient, ApiError, ApiResponse};

pub const TOKEN_PATH: &str = "/token/";
pub const TOKEN_REFRESH_PATH: &str = "/token/refresh/";
pub const REGISTER_PATH: &str = "/register/";
pub const PROFILE_PATH: &str = "/profile/";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Sign-up payload. Fields the backend needs beyond these go in `extra`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub password: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Body of `/token/` and `/token/refresh/`. The refresh endpoint only
/// returns `refresh` when the backend rotates refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// `POST /token/`.
///
/// # Errors
///
/// Propagates the pipeline error.
pub async fn obtain_token(client: &ApiClient, credentials: &Credentials) -> Result<ApiResponse, ApiError> {
    client.post(TOKEN_PATH, to_body(credentials)?).await
}

/// `POST /register/`.
///
/// # Errors
///
/// Propagates the pipeline error.
pub async fn register(client: &ApiClient, registration: &Registration) -> Result<ApiResponse, ApiError> {
    client.post(REGISTER_PATH, to_body(registration)?).await
}

/// `GET /profile/`.
///
/// # Errors
///
/// Propagates the pipeline error.
pub async fn profile(client: &ApiClient) -> Result<ApiResponse, ApiError> {
    client.get(PROFILE_PATH, &[]).await
}

/// `POST /token/refresh/`.
///
/// # Errors
///
/// Propagates the pipeline error.
pub async fn refresh_token(client: &ApiClient, refresh: &str) -> Result<ApiResponse, ApiError> {
    client
        .post(TOKEN_REFRESH_PATH, json!({ "refresh": refresh }))
        .await
}

fn to_body<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Encode(e.to_string()))
}
