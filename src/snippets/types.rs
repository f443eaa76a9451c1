//! Snippet wire types.
//!
//! A snippet is opaque to the client apart from its `id`, which list
//! mutations match on. Every other field round-trips untouched.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fixed server page size.
pub const PAGE_SIZE: u64 = 10;

/// Number of pages for `count` results. Zero results is zero pages.
#[must_use]
pub fn total_pages(count: u64) -> u64 {
    count.div_ceil(PAGE_SIZE)
}

/// Server-assigned identifier. Integer keys in practice; string keys (slugs,
/// UUIDs) are tolerated.
///
/// Equality follows the wire form, so `Int(12)` and `Text("12")` name the
/// same snippet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnippetId {
    Int(i64),
    Text(String),
}

impl PartialEq for SnippetId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl Eq for SnippetId {}

impl std::hash::Hash for SnippetId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl std::fmt::Display for SnippetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for SnippetId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for SnippetId {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| Self::Text(s.to_owned()))
    }
}

impl FromStr for SnippetId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>().map_or_else(|_| Self::Text(s.to_owned()), Self::Int))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: SnippetId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Snippet {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub results: Vec<Snippet>,
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

impl Page {
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        total_pages(self.count)
    }
}

/// Query-string parameters for list/search. Ordered for stable URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn page(self, page: u32) -> Self {
        self.with("page", page.to_string())
    }

    #[must_use]
    pub fn search(self, term: impl Into<String>) -> Self {
        self.with("search", term)
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// The requested page, if one was set and parses.
    #[must_use]
    pub fn page_number(&self) -> Option<u32> {
        self.0.get("page").and_then(|p| p.parse().ok())
    }

    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
