//! Session state machine and the auth session manager.
//!
//! DESIGN
//! ======
//! Two states: Unauthenticated (no token) and Authenticated (token held).
//! The in-memory token is hydrated from storage once at construction and
//! changes only on login/refresh success or logout. The profile is a
//! cache: refetched on demand, dropped wholesale on any logout.
//!
//! TRADE-OFFS
//! ==========
//! Login stores the token before fetching the profile (the profile call
//! needs the bearer header). If that fetch fails the session is rolled back
//! to Unauthenticated, so callers never observe a half-logged-in state.

use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{info, warn};

use super::api::{self, Credentials, Registration, TokenResponse};
use crate::net::{ApiClient, ApiError, ApiResponse, AuthFailureHook, ErrorCode};
use crate::router::{Navigator, Route, SessionOracle};
use crate::storage::{ProfileCache, TokenStorage};

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The token endpoint answered 2xx without an `access` token.
    #[error("token response did not include an access token")]
    MissingAccessToken,

    /// A refresh was requested but no refresh token is stored.
    #[error("no refresh token stored")]
    MissingRefreshToken,
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Api(e) => e.error_code(),
            Self::MissingAccessToken => "E_MISSING_ACCESS_TOKEN",
            Self::MissingRefreshToken => "E_MISSING_REFRESH_TOKEN",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Api(e) if e.retryable())
    }
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// The one session of an application context.
#[derive(Debug)]
pub struct SessionState {
    token: RwLock<Option<String>>,
    tokens: TokenStorage,
    profile: ProfileCache,
}

impl SessionState {
    /// Build the session, taking the token from persistent storage.
    #[must_use]
    pub fn hydrate(tokens: TokenStorage, profile: ProfileCache) -> Self {
        let token = tokens.token();
        Self { token: RwLock::new(token), tokens, profile }
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_some()
    }

    #[must_use]
    pub fn cached_profile(&self) -> Option<Value> {
        self.profile.get()
    }

    #[must_use]
    pub fn storage(&self) -> &TokenStorage {
        &self.tokens
    }

    /// Transition to Authenticated, persisting the token.
    pub fn set_auth_token(&self, token: &str) {
        *self
            .token
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(token.to_owned());
        self.tokens.set_token(token);
    }

    pub fn set_profile(&self, profile: &Value) {
        self.profile.set(profile);
    }

    /// Transition to Unauthenticated: drop the token, the cached profile,
    /// and both persisted tokens. Purely local.
    pub fn logout(&self) {
        *self
            .token
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        self.profile.clear();
        self.tokens.remove_tokens();
    }
}

/// Session contents captured before a login attempt.
#[derive(Debug, Clone)]
pub(crate) struct SessionSnapshot {
    token: Option<String>,
    stored_token: Option<String>,
    refresh: Option<String>,
    profile: Option<Value>,
}

impl SessionState {
    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            token: self.token(),
            stored_token: self.tokens.token(),
            refresh: self.tokens.refresh_token(),
            profile: self.profile.get(),
        }
    }

    /// Put back exactly what `snapshot` saw.
    pub(crate) fn restore(&self, snapshot: SessionSnapshot) {
        *self
            .token
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = snapshot.token;
        self.tokens.remove_tokens();
        if let Some(token) = snapshot.stored_token.as_deref() {
            self.tokens.set_token(token);
        }
        if let Some(refresh) = snapshot.refresh.as_deref() {
            self.tokens.set_refresh_token(refresh);
        }
        match snapshot.profile {
            Some(profile) => self.profile.set(&profile),
            None => self.profile.clear(),
        }
    }
}

impl SessionOracle for SessionState {
    fn is_authenticated(&self) -> bool {
        SessionState::is_authenticated(self)
    }
}

// =============================================================================
// INVALIDATION HOOK
// =============================================================================

/// Installed on the pipeline: a rejected token logs the session out and
/// hard-redirects to the login route.
pub struct LogoutOnInvalidToken {
    state: Arc<SessionState>,
    navigator: Arc<dyn Navigator>,
}

impl LogoutOnInvalidToken {
    #[must_use]
    pub fn new(state: Arc<SessionState>, navigator: Arc<dyn Navigator>) -> Self {
        Self { state, navigator }
    }
}

impl AuthFailureHook for LogoutOnInvalidToken {
    fn on_auth_invalidated(&self, error: &ApiError) {
        info!(error = %error, "forcing logout after auth invalidation");
        self.state.logout();
        self.navigator.redirect(&Route::Login.path());
    }
}

// =============================================================================
// AUTH SESSION MANAGER
// =============================================================================

pub struct AuthSession {
    client: Arc<ApiClient>,
    state: Arc<SessionState>,
}

impl AuthSession {
    #[must_use]
    pub fn new(client: Arc<ApiClient>, state: Arc<SessionState>) -> Self {
        Self { client, state }
    }

    #[must_use]
    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.state.token()
    }

    #[must_use]
    pub fn cached_profile(&self) -> Option<Value> {
        self.state.cached_profile()
    }

    /// Obtain a token, become Authenticated, then fetch and cache the
    /// profile. Returns the profile.
    ///
    /// # Errors
    ///
    /// Propagates the token or profile failure. State is unchanged when the
    /// token request fails and rolled back when the profile fetch fails.
    pub async fn login(&self, credentials: &Credentials) -> Result<Value, AuthError> {
        let response = api::obtain_token(&self.client, credentials)
            .await
            .inspect_err(|e| warn!(error = %e, username = %credentials.username, "login failed"))?;
        let tokens: TokenResponse = response.json()?;
        let access = tokens
            .access
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingAccessToken)?;

        let previous = self.state.snapshot();
        self.state.set_auth_token(&access);
        if let Some(refresh) = tokens.refresh.as_deref() {
            self.state.storage().set_refresh_token(refresh);
        }

        match api::profile(&self.client).await {
            Ok(resp) => {
                self.state.set_profile(&resp.body);
                info!(username = %credentials.username, "logged in");
                Ok(resp.body)
            }
            Err(e) => {
                warn!(error = %e, "profile fetch after login failed; rolling back session");
                self.state.restore(previous);
                Err(e.into())
            }
        }
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Propagates the pipeline error.
    pub async fn register(&self, registration: &Registration) -> Result<ApiResponse, AuthError> {
        let response = api::register(&self.client, registration)
            .await
            .inspect_err(|e| warn!(error = %e, username = %registration.username, "registration failed"))?;
        info!(username = %registration.username, "registered");
        Ok(response)
    }

    /// Refresh the cached profile. Returns `Ok(None)` without a network call
    /// while Unauthenticated.
    ///
    /// # Errors
    ///
    /// Propagates the pipeline error after logging the session out.
    pub async fn fetch_profile(&self) -> Result<Option<Value>, AuthError> {
        if !self.state.is_authenticated() {
            return Ok(None);
        }
        match api::profile(&self.client).await {
            Ok(resp) => {
                self.state.set_profile(&resp.body);
                Ok(Some(resp.body))
            }
            Err(e) => {
                warn!(error = %e, "profile fetch failed; logging out");
                self.state.logout();
                Err(e.into())
            }
        }
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// [`AuthError::MissingRefreshToken`] if none is stored (no request is
    /// made), else the pipeline or decode failure. State is unchanged on
    /// failure.
    pub async fn refresh_token(&self) -> Result<(), AuthError> {
        let refresh = self
            .state
            .storage()
            .refresh_token()
            .ok_or(AuthError::MissingRefreshToken)?;
        let response = api::refresh_token(&self.client, &refresh)
            .await
            .inspect_err(|e| warn!(error = %e, "token refresh failed"))?;
        let tokens: TokenResponse = response.json()?;
        let access = tokens
            .access
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingAccessToken)?;

        self.state.set_auth_token(&access);
        if let Some(rotated) = tokens.refresh.as_deref() {
            self.state.storage().set_refresh_token(rotated);
        }
        info!("access token refreshed");
        Ok(())
    }

    pub fn logout(&self) {
        self.state.logout();
        info!("logged out");
    }
}

impl SessionOracle for AuthSession {
    fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
