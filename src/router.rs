//! Route table, navigation guard, and in-memory history.
//!
//! SYSTEM CONTEXT
//! ==============
//! Before each transition the guard compares the target route's declared
//! requirement with the session state: protected routes bounce to login,
//! guest-only routes bounce to the dashboard. The session manager is the
//! only oracle; the guard itself holds no state.

use std::sync::Mutex;

use tracing::info;

// =============================================================================
// ROUTES
// =============================================================================

/// What a route demands of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRequirement {
    Auth,
    Guest,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Login,
    Register,
    Snippets,
    SnippetCreate,
    SnippetEdit(String),
    SnippetDetail(String),
    Explore,
}

impl Route {
    #[must_use]
    pub fn requirement(&self) -> RouteRequirement {
        match self {
            Self::Dashboard | Self::Snippets | Self::SnippetCreate | Self::SnippetEdit(_) => RouteRequirement::Auth,
            Self::Login | Self::Register => RouteRequirement::Guest,
            Self::SnippetDetail(_) | Self::Explore => RouteRequirement::None,
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Dashboard => "/".to_owned(),
            Self::Login => "/login".to_owned(),
            Self::Register => "/register".to_owned(),
            Self::Snippets => "/snippets".to_owned(),
            Self::SnippetCreate => "/snippets/new".to_owned(),
            Self::SnippetEdit(id) => format!("/snippets/{id}/edit"),
            Self::SnippetDetail(id) => format!("/snippets/{id}"),
            Self::Explore => "/explore".to_owned(),
        }
    }

    /// Resolve a location path. Query strings, fragments, and a trailing
    /// slash are ignored. Unknown paths resolve to `None`.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Some(Self::Dashboard),
            ["login"] => Some(Self::Login),
            ["register"] => Some(Self::Register),
            ["explore"] => Some(Self::Explore),
            ["snippets"] => Some(Self::Snippets),
            ["snippets", "new"] => Some(Self::SnippetCreate),
            ["snippets", id] => Some(Self::SnippetDetail((*id).to_owned())),
            ["snippets", id, "edit"] => Some(Self::SnippetEdit((*id).to_owned())),
            _ => None,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

// =============================================================================
// GUARD
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Route),
}

/// Anything that can answer "is there a session right now?".
pub trait SessionOracle {
    fn is_authenticated(&self) -> bool;
}

/// Decide a transition to `to` given the current session state.
#[must_use]
pub fn guard(to: &Route, authenticated: bool) -> GuardDecision {
    match (to.requirement(), authenticated) {
        (RouteRequirement::Auth, false) => GuardDecision::Redirect(Route::Login),
        (RouteRequirement::Guest, true) => GuardDecision::Redirect(Route::Dashboard),
        _ => GuardDecision::Allow,
    }
}

// =============================================================================
// NAVIGATION
// =============================================================================

/// Receiver of forced (unguarded) navigations such as the hard redirect to
/// login after the server rejects the token.
pub trait Navigator: Send + Sync {
    fn redirect(&self, path: &str);
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("no route matches {0}")]
    UnknownRoute(String),
}

/// In-memory location history.
#[derive(Debug)]
pub struct History {
    entries: Mutex<Vec<String>>,
}

impl History {
    #[must_use]
    pub fn new(initial: &str) -> Self {
        Self { entries: Mutex::new(vec![initial.to_owned()]) }
    }

    #[must_use]
    pub fn current(&self) -> String {
        self.lock().last().cloned().unwrap_or_else(|| Route::Dashboard.path())
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Guarded navigation: resolve `path`, consult the guard, and land on
    /// either the target or the redirect. Returns the route landed on.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::UnknownRoute`] if `path` matches nothing;
    /// the location is left unchanged.
    pub fn navigate_to(&self, path: &str, session: &dyn SessionOracle) -> Result<Route, NavigationError> {
        let target = Route::parse(path).ok_or_else(|| NavigationError::UnknownRoute(path.to_owned()))?;
        let landed = match guard(&target, session.is_authenticated()) {
            GuardDecision::Allow => target,
            GuardDecision::Redirect(to) => {
                info!(from = %target, to = %to, "navigation redirected by guard");
                to
            }
        };
        self.lock().push(landed.path());
        Ok(landed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for History {
    fn redirect(&self, path: &str) {
        info!(to = path, "forced navigation");
        self.lock().push(path.to_owned());
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
