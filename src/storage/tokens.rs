//! Access/refresh token persistence.
//!
//! Thin typed wrapper over the cookie store. No in-memory cache: every read
//! goes to the backing store so an external logout is observed immediately.

use std::sync::Arc;
use std::time::Duration;

use super::KeyValueStore;

pub const ACCESS_TOKEN_KEY: &str = "jwt_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const DEFAULT_TOKEN_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Clone)]
pub struct TokenStorage {
    store: Arc<dyn KeyValueStore>,
    expiry: Duration,
}

impl TokenStorage {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_expiry(store, DEFAULT_TOKEN_EXPIRY)
    }

    #[must_use]
    pub fn with_expiry(store: Arc<dyn KeyValueStore>, expiry: Duration) -> Self {
        Self { store, expiry }
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.store.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn set_token(&self, token: &str) {
        self.store.set(ACCESS_TOKEN_KEY, token, Some(self.expiry));
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn set_refresh_token(&self, token: &str) {
        self.store.set(REFRESH_TOKEN_KEY, token, Some(self.expiry));
    }

    /// Remove both the access and the refresh token.
    pub fn remove_tokens(&self) {
        self.store.remove(ACCESS_TOKEN_KEY);
        self.store.remove(REFRESH_TOKEN_KEY);
    }
}

impl std::fmt::Debug for TokenStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStorage")
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "tokens_test.rs"]
mod tests;
