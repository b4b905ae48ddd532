//! services/reader/src/session/guard.rs
//!
//! Route guard: decides from the session whether a screen may render or must
//! redirect. Decisions are made on the tri-state `AuthStatus`, so nothing guarded
//! is ever mounted while the session is still unknown.

use std::fmt;
use std::time::Duration;

use tracing::warn;

use crate::session::provider::{AuthStatus, SessionHandle, SETTLE_TIMEOUT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Dashboard,
    Document(String),
}

/// Screens are guarded per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenGroup {
    /// Only for visitors who are not signed in (login, register).
    AuthOnly,
    /// Only for signed-in users (dashboard, documents).
    Protected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The session is still unknown: render the loading placeholder only.
    Pending,
    Allow,
    Redirect(Route),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown route: {0}")]
pub struct UnknownRoute(pub String);

impl Route {
    pub fn parse(path: &str) -> Result<Self, UnknownRoute> {
        let trimmed = path.trim().trim_end_matches('/');
        let route = match trimmed {
            "" => Route::Home,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/dashboard" => Route::Dashboard,
            other => match other.strip_prefix("/document/") {
                Some(id) if !id.is_empty() && !id.contains('/') => Route::Document(id.to_string()),
                _ => return Err(UnknownRoute(path.to_string())),
            },
        };
        Ok(route)
    }

    /// The guard group for this route; `None` for public routes.
    pub fn group(&self) -> Option<ScreenGroup> {
        match self {
            Route::Home => None,
            Route::Login | Route::Register => Some(ScreenGroup::AuthOnly),
            Route::Dashboard | Route::Document(_) => Some(ScreenGroup::Protected),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Login => write!(f, "/login"),
            Route::Register => write!(f, "/register"),
            Route::Dashboard => write!(f, "/dashboard"),
            Route::Document(id) => write!(f, "/document/{}", id),
        }
    }
}

/// Applies the redirect policy of `group` to `status`.
pub fn decide(group: Option<ScreenGroup>, status: &AuthStatus) -> GuardDecision {
    let Some(group) = group else {
        return GuardDecision::Allow;
    };
    match (group, status) {
        (_, AuthStatus::Unknown) => GuardDecision::Pending,
        (ScreenGroup::AuthOnly, AuthStatus::Authorized(_)) => GuardDecision::Redirect(Route::Dashboard),
        (ScreenGroup::AuthOnly, AuthStatus::Unauthorized) => GuardDecision::Allow,
        (ScreenGroup::Protected, AuthStatus::Unauthorized) => GuardDecision::Redirect(Route::Login),
        (ScreenGroup::Protected, AuthStatus::Authorized(_)) => GuardDecision::Allow,
    }
}

/// Waits for the session to resolve before deciding, giving up after
/// [`SETTLE_TIMEOUT`].
pub async fn resolve(session: &mut SessionHandle, route: &Route) -> (GuardDecision, AuthStatus) {
    resolve_within(session, route, SETTLE_TIMEOUT).await
}

/// Like [`resolve`], but waits at most `timeout` for the first verdict.
///
/// A guarded route whose session is still unknown after that is `Pending`.
pub async fn resolve_within(
    session: &mut SessionHandle,
    route: &Route,
    timeout: Duration,
) -> (GuardDecision, AuthStatus) {
    let status = match route.group() {
        Some(_) => match tokio::time::timeout(timeout, session.resolved()).await {
            Ok(status) => status,
            Err(_) => {
                warn!(route = %route, "Session still unknown after {:?}.", timeout);
                AuthStatus::Unknown
            }
        },
        None => session.status(),
    };
    (decide(route.group(), &status), status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clearread_core::Identity;

    fn authorized() -> AuthStatus {
        AuthStatus::Authorized(Identity {
            uid: "uid-1".to_string(),
            email: "reader@example.com".to_string(),
        })
    }

    #[test]
    fn protected_routes_wait_while_loading() {
        let decision = decide(Some(ScreenGroup::Protected), &AuthStatus::Unknown);
        assert_eq!(decision, GuardDecision::Pending);
    }

    #[test]
    fn auth_only_routes_wait_while_loading() {
        let decision = decide(Some(ScreenGroup::AuthOnly), &AuthStatus::Unknown);
        assert_eq!(decision, GuardDecision::Pending);
    }

    #[test]
    fn signed_in_users_are_bounced_to_dashboard() {
        let decision = decide(Route::Login.group(), &authorized());
        assert_eq!(decision, GuardDecision::Redirect(Route::Dashboard));
        assert_eq!(decide(Route::Register.group(), &AuthStatus::Unauthorized), GuardDecision::Allow);
    }

    #[test]
    fn visitors_are_bounced_to_login() {
        let route = Route::Document("abc".to_string());
        assert_eq!(decide(route.group(), &AuthStatus::Unauthorized), GuardDecision::Redirect(Route::Login));
        assert_eq!(decide(route.group(), &authorized()), GuardDecision::Allow);
    }

    #[test]
    fn home_is_public() {
        assert_eq!(decide(Route::Home.group(), &AuthStatus::Unknown), GuardDecision::Allow);
    }

    #[test]
    fn routes_parse_and_print() {
        for path in ["/", "/login", "/register", "/dashboard", "/document/abc123"] {
            let route = Route::parse(path).unwrap();
            assert_eq!(route.to_string(), path);
        }
        assert_eq!(Route::parse("/dashboard/").unwrap(), Route::Dashboard);
        assert!(Route::parse("/document/").is_err());
        assert!(Route::parse("/document/a/b").is_err());
        assert!(Route::parse("/settings").is_err());
    }
}
