//! Cached user-profile snapshot (`user_profile` in local storage).
//!
//! The snapshot is a cache, never the source of truth: it is rewritten on
//! every successful profile fetch and dropped wholesale on logout.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::KeyValueStore;

pub const PROFILE_KEY: &str = "user_profile";

#[derive(Clone)]
pub struct ProfileCache {
    store: Arc<dyn KeyValueStore>,
}

impl ProfileCache {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the cached profile. Unparseable blobs read as `None`.
    #[must_use]
    pub fn get(&self) -> Option<Value> {
        let raw = self.store.get(PROFILE_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, "cached profile unreadable");
                None
            }
        }
    }

    pub fn set(&self, profile: &Value) {
        self.store.set(PROFILE_KEY, &profile.to_string(), None);
    }

    pub fn clear(&self) {
        self.store.remove(PROFILE_KEY);
    }
}

impl std::fmt::Debug for ProfileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileCache").finish_non_exhaustive()
    }
}
