//! Authentication: endpoint wrappers and the session lifecycle.
//!
//! ARCHITECTURE
//! ============
//! `api` maps each auth endpoint to one pipeline call. `session` owns the
//! two-state machine (Unauthenticated / Authenticated), the cached profile,
//! and the hook that tears the session down when the server rejects the
//! bearer token.

pub mod api;
pub mod session;

pub use api::{Credentials, Registration, TokenResponse};
pub use session::{AuthError, AuthSession, LogoutOnInvalidToken, SessionState};
