//! JSON-file [`KeyValueStore`].
//!
//! DESIGN
//! ======
//! Every `get` re-reads the file so concurrent processes sharing a state
//! directory observe each other's logins and logouts. Writes rewrite the
//! whole map through a temp file + rename. The in-process mutex only
//! serializes writers; it never caches contents.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use tracing::warn;

use super::{Entry, KeyValueStore, now_secs};

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, Entry> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "store read failed");
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, path = %self.path.display(), "store contents unreadable; treating as empty");
            BTreeMap::new()
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, Entry>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)
    }

    fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, Entry>)) {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut entries = self.read_all();
        let now = now_secs();
        entries.retain(|_, e| e.is_live(now));
        f(&mut entries);
        if let Err(e) = self.write_all(&entries) {
            warn!(error = %e, path = %self.path.display(), "store write failed");
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.read_all();
        entries
            .remove(key)
            .filter(|e| e.is_live(now_secs()))
            .map(|e| e.value)
    }

    fn set(&self, key: &str, value: &str, expires_in: Option<Duration>) {
        let entry = Entry::new(value, expires_in, now_secs());
        self.mutate(|entries| {
            entries.insert(key.to_owned(), entry);
        });
    }

    fn remove(&self, key: &str) {
        self.mutate(|entries| {
            entries.remove(key);
        });
    }
}

#[cfg(test)]
#[path = "file_test.rs"]
mod tests;
