//! Pre-transition access checks.

use super::{Route, HOME_PATH, LOGIN_PATH};
use crate::session::SessionStore;

/// Verdict for one transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(String),
}

/// Evaluate route metadata against the session.
///
/// Authentication is checked strictly before admin rights, so an anonymous visitor
/// of an admin route lands on the login page rather than home.
pub fn evaluate(route: &Route, authenticated: bool, admin: bool) -> Decision {
    if route.requires_auth && !authenticated {
        return Decision::Redirect(LOGIN_PATH.to_string());
    }
    if route.requires_admin && !admin {
        return Decision::Redirect(HOME_PATH.to_string());
    }
    Decision::Allow
}

/// Reads the session synchronously on every transition.
#[derive(Clone)]
pub struct NavigationGuard {
    session: SessionStore,
}

impl NavigationGuard {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    pub fn check(&self, route: &Route) -> Decision {
        let decision = evaluate(
            route,
            self.session.is_authenticated(),
            self.session.is_admin(),
        );
        if let Decision::Redirect(to) = &decision {
            tracing::debug!("Guard rejected {} -> {}", route.path, to);
        }
        decision
    }
}
