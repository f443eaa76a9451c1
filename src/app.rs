//! Application context.
//!
//! DESIGN
//! ======
//! `App` is built once at startup and owns every long-lived component:
//! storage, the request pipeline, the session, the snippet store, and the
//! location history. Handlers receive it (or pieces of it) explicitly;
//! there are no ambient singletons. Construction installs the
//! auth-invalidation hook exactly once. Dropping `App` tears it all down.

use std::path::Path;
use std::sync::Arc;

use crate::auth::{AuthSession, LogoutOnInvalidToken, SessionState};
use crate::config::ClientConfig;
use crate::net::{ApiClient, ApiError, ReqwestTransport, Transport};
use crate::router::{History, NavigationError, Route};
use crate::snippets::SnippetStore;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, ProfileCache, TokenStorage};

pub const COOKIE_FILE: &str = "cookies.json";
pub const LOCAL_STORAGE_FILE: &str = "local_storage.json";

/// The two origin-scoped stores: cookies (tokens) and local storage
/// (profile snapshot).
#[derive(Clone)]
pub struct Stores {
    pub cookies: Arc<dyn KeyValueStore>,
    pub local: Arc<dyn KeyValueStore>,
}

impl Stores {
    #[must_use]
    pub fn in_memory() -> Self {
        Self { cookies: Arc::new(MemoryStore::new()), local: Arc::new(MemoryStore::new()) }
    }

    #[must_use]
    pub fn file_backed(dir: &Path) -> Self {
        Self {
            cookies: Arc::new(FileStore::new(dir.join(COOKIE_FILE))),
            local: Arc::new(FileStore::new(dir.join(LOCAL_STORAGE_FILE))),
        }
    }
}

pub struct App {
    pub config: ClientConfig,
    pub client: Arc<ApiClient>,
    pub auth: AuthSession,
    pub snippets: SnippetStore,
    pub history: Arc<History>,
}

impl App {
    #[must_use]
    pub fn new(config: ClientConfig, stores: Stores, transport: Arc<dyn Transport>) -> Self {
        let tokens = TokenStorage::with_expiry(stores.cookies, config.token_expiry());
        let profile = ProfileCache::new(stores.local);

        let client = Arc::new(ApiClient::new(transport, tokens.clone()));
        let state = Arc::new(SessionState::hydrate(tokens, profile));
        let history = Arc::new(History::default());

        let hook = Arc::new(LogoutOnInvalidToken::new(state.clone(), history.clone()));
        if client.install_auth_failure_hook(hook).is_err() {
            tracing::warn!("auth failure hook was already installed");
        }

        Self {
            auth: AuthSession::new(client.clone(), state),
            snippets: SnippetStore::new(client.clone()),
            client,
            history,
            config,
        }
    }

    /// Production wiring: file-backed stores under `config.state_dir` and a
    /// reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn from_config(config: ClientConfig) -> Result<Self, ApiError> {
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        let stores = Stores::file_backed(&config.state_dir);
        Ok(Self::new(config, stores, transport))
    }

    /// Guarded navigation using this app's session as the oracle.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::UnknownRoute`] for unmatched paths.
    pub fn visit(&self, path: &str) -> Result<Route, NavigationError> {
        self.history.navigate_to(path, &self.auth)
    }
}

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;
