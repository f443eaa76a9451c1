//! Snippet store: CRUD + search mirrored into local state.
//!
//! DESIGN
//! ======
//! Each operation is one request followed by a synchronous local mutation
//! under a short-lived mutex (never held across `.await`). Concurrent calls
//! are not coordinated: whichever response lands last wins.
//!
//! Creates are prepended optimistically; the server's order is restored by
//! the next `list`. Failures are logged and returned as-is, no retries.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tracing::{debug, error};

use super::types::{Page, QueryParams, Snippet, SnippetId};
use crate::net::{ApiClient, ApiError, ApiResponse};

pub const SEARCH_PATH: &str = "/search/";
pub const SNIPPETS_PATH: &str = "/snippets/";

fn detail_path(id: &SnippetId) -> String {
    format!("/snippet/detail/{id}/")
}

fn item_path(id: &SnippetId) -> String {
    format!("/snippets/{id}/")
}

fn analytics_path(id: &SnippetId) -> String {
    format!("/snippets/{id}/analytics/")
}

/// Local mirror of server snippet state.
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetState {
    pub snippets: Vec<Snippet>,
    pub search_results: Vec<Snippet>,
    pub current: Option<Snippet>,
    pub total_pages: u64,
    pub current_page: u32,
}

impl Default for SnippetState {
    fn default() -> Self {
        Self { snippets: Vec::new(), search_results: Vec::new(), current: None, total_pages: 1, current_page: 1 }
    }
}

pub struct SnippetStore {
    client: Arc<ApiClient>,
    state: Mutex<SnippetState>,
}

impl SnippetStore {
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client, state: Mutex::new(SnippetState::default()) }
    }

    /// Copy of the current local state.
    #[must_use]
    pub fn snapshot(&self) -> SnippetState {
        self.lock().clone()
    }

    #[must_use]
    pub fn snippets(&self) -> Vec<Snippet> {
        self.lock().snippets.clone()
    }

    #[must_use]
    pub fn current(&self) -> Option<Snippet> {
        self.lock().current.clone()
    }

    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.lock().total_pages
    }

    /// `GET /search/`: replace search results and the page count.
    ///
    /// # Errors
    ///
    /// Propagates pipeline and decode failures after logging them.
    pub async fn search(&self, params: &QueryParams) -> Result<Page, ApiError> {
        let page = self
            .fetch_page(SEARCH_PATH, params)
            .await
            .inspect_err(|e| error!(error = %e, "searching snippets failed"))?;

        let mut state = self.lock();
        state.search_results.clone_from(&page.results);
        state.total_pages = page.total_pages();
        Ok(page)
    }

    /// `GET /snippets/`: replace the collection and the page count.
    ///
    /// # Errors
    ///
    /// Propagates pipeline and decode failures after logging them.
    pub async fn list(&self, params: &QueryParams) -> Result<Page, ApiError> {
        let page = self
            .fetch_page(SNIPPETS_PATH, params)
            .await
            .inspect_err(|e| error!(error = %e, "fetching snippets failed"))?;

        let mut state = self.lock();
        state.snippets.clone_from(&page.results);
        state.total_pages = page.total_pages();
        if let Some(n) = params.page_number() {
            state.current_page = n;
        }
        debug!(count = page.count, loaded = page.results.len(), "snippets loaded");
        Ok(page)
    }

    /// `GET /snippet/detail/{id}/`: replace the current snippet.
    ///
    /// # Errors
    ///
    /// Propagates pipeline and decode failures after logging them.
    pub async fn get(&self, id: &SnippetId) -> Result<Snippet, ApiError> {
        let snippet: Snippet = self
            .client
            .get(&detail_path(id), &[])
            .await
            .and_then(|r| r.json())
            .inspect_err(|e| error!(error = %e, %id, "fetching snippet failed"))?;

        self.lock().current = Some(snippet.clone());
        Ok(snippet)
    }

    /// `POST /snippets/`: prepend the created record.
    ///
    /// # Errors
    ///
    /// Propagates pipeline and decode failures after logging them.
    pub async fn create(&self, data: &Value) -> Result<Snippet, ApiError> {
        let snippet: Snippet = self
            .client
            .post(SNIPPETS_PATH, data.clone())
            .await
            .and_then(|r| r.json())
            .inspect_err(|e| error!(error = %e, "creating snippet failed"))?;

        self.lock().snippets.insert(0, snippet.clone());
        Ok(snippet)
    }

    /// `PUT /snippets/{id}/`: replace the matching entry in place (if
    /// loaded) and the current snippet.
    ///
    /// # Errors
    ///
    /// Propagates pipeline and decode failures after logging them.
    pub async fn update(&self, id: &SnippetId, data: &Value) -> Result<Snippet, ApiError> {
        let snippet: Snippet = self
            .client
            .put(&item_path(id), data.clone())
            .await
            .and_then(|r| r.json())
            .inspect_err(|e| error!(error = %e, %id, "updating snippet failed"))?;

        let mut state = self.lock();
        if let Some(slot) = state.snippets.iter_mut().find(|s| &s.id == id) {
            *slot = snippet.clone();
        }
        state.current = Some(snippet.clone());
        Ok(snippet)
    }

    /// `DELETE /snippets/{id}/`: drop matching entries, keeping the order of
    /// the rest. The request is sent even if nothing local matches.
    ///
    /// # Errors
    ///
    /// Propagates pipeline failures after logging them.
    pub async fn delete(&self, id: &SnippetId) -> Result<(), ApiError> {
        self.client
            .delete(&item_path(id))
            .await
            .inspect_err(|e| error!(error = %e, %id, "deleting snippet failed"))?;

        self.lock().snippets.retain(|s| &s.id != id);
        Ok(())
    }

    /// `GET /snippets/{id}/analytics/`. Raw response, no local state.
    ///
    /// # Errors
    ///
    /// Propagates pipeline failures after logging them.
    pub async fn analytics(&self, id: &SnippetId) -> Result<ApiResponse, ApiError> {
        self.client
            .get(&analytics_path(id), &[])
            .await
            .inspect_err(|e| error!(error = %e, %id, "fetching snippet analytics failed"))
    }

    async fn fetch_page(&self, path: &str, params: &QueryParams) -> Result<Page, ApiError> {
        self.client
            .get(path, &params.to_pairs())
            .await?
            .json()
    }

    fn lock(&self) -> MutexGuard<'_, SnippetState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
