//! Persistent client-side storage.
//!
//! SYSTEM CONTEXT
//! ==============
//! Two origin-scoped stores back the session: a cookie store for the access
//! and refresh tokens (entries carry an expiry) and a local store for the
//! cached profile blob (no expiry). Both speak [`KeyValueStore`]; `tokens`
//! and `profile` layer typed accessors on top.
//!
//! ERROR HANDLING
//! ==============
//! Storage never fails outward. Missing, expired, or unreadable entries read
//! as `None`; write failures are logged and dropped.

pub mod file;
pub mod memory;
pub mod profile;
pub mod tokens;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub use file::FileStore;
pub use memory::MemoryStore;
pub use profile::ProfileCache;
pub use tokens::TokenStorage;

/// A string key/value store with optional per-entry expiry.
pub trait KeyValueStore: Send + Sync {
    /// Read a live entry. Expired entries read as `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Write an entry. `expires_in = None` keeps it until removed.
    fn set(&self, key: &str, value: &str, expires_in: Option<Duration>);

    fn remove(&self, key: &str);
}

/// Stored value plus its absolute expiry in unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Entry {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl Entry {
    pub(crate) fn new(value: &str, expires_in: Option<Duration>, now: u64) -> Self {
        Self { value: value.to_owned(), expires_at: expires_in.map(|d| now.saturating_add(d.as_secs())) }
    }

    pub(crate) fn is_live(&self, now: u64) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// Current time as seconds since Unix epoch.
pub(crate) fn now_secs() -> u64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    dur.as_secs()
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
