//! Route table and the guard consulted before rendering a view.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every navigation resolves its path against the route table; protected
//! routes additionally ask the guard, which reads the session store fresh
//! each time. Nothing is cached, so a session cleared in the background
//! (failed profile fetch) redirects on the very next navigation.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use super::session::{Session, SessionStore};

pub const HOME_PATH: &str = "/";
pub const SIGN_IN_PATH: &str = "/signin";
pub const SIGN_UP_PATH: &str = "/signup";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Whether a route needs a signed-in user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
}

/// Views reachable through the router.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Marketing,
    SignIn,
    SignUp,
    Dashboard,
    Users,
    Settings,
    /// Any other path under `/dashboard`; rendered by the dashboard shell.
    DashboardOther,
}

impl Route {
    #[must_use]
    pub fn access(self) -> Access {
        match self {
            Self::Marketing | Self::SignIn | Self::SignUp => Access::Public,
            Self::Dashboard | Self::Users | Self::Settings | Self::DashboardOther => Access::Protected,
        }
    }
}

/// Outcome of a navigation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Denied; navigate here instead.
    Redirect(&'static str),
    NotFound,
}

/// Strip query/fragment and trailing slashes so `/dashboard/?tab=1` and
/// `/dashboard` resolve alike.
fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');
    if trimmed.is_empty() { HOME_PATH } else { trimmed }
}

/// Resolve `path` against the route table.
#[must_use]
pub fn resolve(path: &str) -> Option<Route> {
    match normalize(path) {
        HOME_PATH => Some(Route::Marketing),
        SIGN_IN_PATH => Some(Route::SignIn),
        SIGN_UP_PATH => Some(Route::SignUp),
        DASHBOARD_PATH => Some(Route::Dashboard),
        "/dashboard/users" => Some(Route::Users),
        "/dashboard/settings" => Some(Route::Settings),
        other if other.starts_with("/dashboard/") => Some(Route::DashboardOther),
        _ => None,
    }
}

/// Allow iff the session is authenticated; otherwise redirect to sign-in.
///
/// A `Pending` session (token held, profile not yet loaded) is denied.
#[must_use]
pub fn can_activate(session: &Session) -> GuardDecision {
    if session.is_authenticated() { GuardDecision::Allow } else { GuardDecision::Redirect(SIGN_IN_PATH) }
}

/// Guard bound to a live session store.
#[derive(Clone)]
pub struct RouteGuard {
    store: SessionStore,
}

impl RouteGuard {
    #[must_use]
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// Decide for a protected view using the store's current state.
    #[must_use]
    pub fn can_activate(&self) -> GuardDecision {
        can_activate(&self.store.snapshot())
    }

    /// Full navigation decision for `path`.
    #[must_use]
    pub fn check(&self, path: &str) -> GuardDecision {
        match resolve(path).map(Route::access) {
            None => GuardDecision::NotFound,
            Some(Access::Public) => GuardDecision::Allow,
            Some(Access::Protected) => self.can_activate(),
        }
    }
}
