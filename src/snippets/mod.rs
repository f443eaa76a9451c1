//! Snippet resource: wire types and the locally mirrored store.

pub mod store;
pub mod types;

pub use store::{SnippetState, SnippetStore};
pub use types::{PAGE_SIZE, Page, QueryParams, Snippet, SnippetId, total_pages};
