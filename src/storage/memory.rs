//! In-process [`KeyValueStore`] for tests and throwaway sessions.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::{Entry, KeyValueStore, now_secs};

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = now_secs();
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries
            .get(key)
            .filter(|e| e.is_live(now_secs()))
            .map(|e| e.value.clone())
    }

    fn set(&self, key: &str, value: &str, expires_in: Option<Duration>) {
        let entry = Entry::new(value, expires_in, now_secs());
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_owned(), entry);
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
