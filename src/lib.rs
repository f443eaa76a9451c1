//! Client for a code-snippet REST backend: session lifecycle, bearer-token
//! request pipeline, locally mirrored snippet store, and route guards.
//!
//! SYSTEM CONTEXT
//! ==============
//! `app::App` wires everything together. The guard (`router`) asks the
//! session (`auth`) before each transition; the session and the snippet
//! store (`snippets`) send every call through the pipeline (`net`), which
//! injects the token from `storage` and tears the session down when the
//! server rejects it.

pub mod app;
pub mod auth;
pub mod config;
pub mod net;
pub mod router;
pub mod snippets;
pub mod storage;

pub use app::{App, Stores};
pub use config::ClientConfig;
