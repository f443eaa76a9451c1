//! Request pipeline with bearer-token and auth-invalidation middleware.
//!
//! DESIGN
//! ======
//! Every call goes through [`ApiClient::execute`]:
//!
//! 1. Outgoing: read the access token from storage (never cached) and, if
//!    present, set `Authorization: Bearer <token>`.
//! 2. Send via the configured [`Transport`].
//! 3. Incoming: successes pass through untouched; failures are tagged. An
//!    auth-invalidation failure additionally fires the installed
//!    [`AuthFailureHook`] before being returned to the caller.
//!
//! The hook is installed once after construction because the thing it tears
//! down (the session) is itself built on top of this client.

use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tracing::{debug, warn};

use super::transport::Transport;
use super::types::{ApiError, ApiRequest, ApiResponse, ErrorCode};
use crate::storage::TokenStorage;

/// Global recovery action for a rejected or missing bearer token.
pub trait AuthFailureHook: Send + Sync {
    fn on_auth_invalidated(&self, error: &ApiError);
}

impl<F> AuthFailureHook for F
where
    F: Fn(&ApiError) + Send + Sync,
{
    fn on_auth_invalidated(&self, error: &ApiError) {
        self(error);
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("auth failure hook already installed")]
pub struct HookAlreadyInstalled;

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    tokens: TokenStorage,
    auth_failure_hook: OnceLock<Arc<dyn AuthFailureHook>>,
}

impl ApiClient {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, tokens: TokenStorage) -> Self {
        Self { transport, tokens, auth_failure_hook: OnceLock::new() }
    }

    /// Install the auth-invalidation hook.
    ///
    /// # Errors
    ///
    /// Returns [`HookAlreadyInstalled`] on any call after the first.
    pub fn install_auth_failure_hook(&self, hook: Arc<dyn AuthFailureHook>) -> Result<(), HookAlreadyInstalled> {
        self.auth_failure_hook
            .set(hook)
            .map_err(|_| HookAlreadyInstalled)
    }

    #[must_use]
    pub fn has_auth_failure_hook(&self) -> bool {
        self.auth_failure_hook.get().is_some()
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStorage {
        &self.tokens
    }

    /// Run one request through the full middleware chain.
    ///
    /// # Errors
    ///
    /// Returns the tagged [`ApiError`] for transport failures and non-success
    /// statuses. [`ApiError::AuthInvalidated`] is returned after the session
    /// has been torn down by the hook.
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        request.authorization = self.tokens.token().map(|t| bearer(&t));

        debug!(
            request_id = %request.id,
            method = %request.method,
            path = %request.path,
            authenticated = request.authorization.is_some(),
            "api request"
        );

        let result = self
            .transport
            .send(&request)
            .await
            .and_then(ApiResponse::into_result);

        match &result {
            Ok(resp) => debug!(request_id = %request.id, status = resp.status, "api response"),
            Err(e @ ApiError::AuthInvalidated { .. }) => {
                warn!(request_id = %request.id, path = %request.path, error = %e, "authentication invalidated");
                if let Some(hook) = self.auth_failure_hook.get() {
                    hook.on_auth_invalidated(e);
                }
            }
            Err(e) => debug!(request_id = %request.id, code = e.error_code(), error = %e, "api failure"),
        }

        result
    }

    /// `GET {path}` with query parameters.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`].
    pub async fn get(&self, path: &str, query: &[(String, String)]) -> Result<ApiResponse, ApiError> {
        self.execute(ApiRequest::get(path).with_query(query.iter().cloned()))
            .await
    }

    /// `POST {path}` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`].
    pub async fn post(&self, path: &str, body: Value) -> Result<ApiResponse, ApiError> {
        self.execute(ApiRequest::post(path, body)).await
    }

    /// `PUT {path}` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`].
    pub async fn put(&self, path: &str, body: Value) -> Result<ApiResponse, ApiError> {
        self.execute(ApiRequest::put(path, body)).await
    }

    /// `DELETE {path}`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`].
    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.execute(ApiRequest::delete(path)).await
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
