//! Route table and guarded navigation.

mod guard;

pub use guard::*;

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::errors::StoreError;

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";

const MAX_REDIRECTS: usize = 4;

/// A declared route with its access metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub name: Option<String>,
    pub requires_auth: bool,
    pub requires_admin: bool,
}

impl Route {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            requires_auth: false,
            requires_admin: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn requires_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub fn requires_admin(mut self) -> Self {
        self.requires_admin = true;
        self
    }

    /// Match a concrete path, capturing `:param` segments.
    fn capture(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let pattern: Vec<&str> = segments(&self.path).collect();
        let actual: Vec<&str> = segments(path).collect();
        if pattern.len() != actual.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (expected, given) in pattern.iter().zip(actual.iter()) {
            match expected.strip_prefix(':') {
                Some(param) => {
                    params.insert(param.to_string(), given.to_string());
                }
                None if expected == given => {}
                None => return None,
            }
        }
        Some(params)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Strip query string and fragment.
fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

/// A route resolved against a concrete path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: Route,
    pub path: String,
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Routes of the catalog front end.
    pub fn catalog() -> Self {
        Self::new(vec![
            Route::new("/").named("Home"),
            Route::new("/movies").named("Movies"),
            Route::new("/movies/:id").named("MovieDetail"),
            Route::new("/crew-member/:id").named("CrewMemberDetail"),
            Route::new("/login").named("UserLogin"),
            Route::new("/register").named("UserRegister"),
            Route::new("/profile").named("UserProfile"),
            Route::new("/recommendations").named("MovieRecommendations"),
            Route::new("/admin").requires_auth().requires_admin(),
        ])
    }

    /// First declared route matching `path`.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        let path = normalize(path);
        self.routes.iter().find_map(|route| {
            route.capture(path).map(|params| RouteMatch {
                route: route.clone(),
                path: path.to_string(),
                params,
            })
        })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub requested: String,
    pub landed: String,
    pub redirected: bool,
}

/// Side effect run when a route is entered.
pub type EntryHook = Arc<dyn Fn(&RouteMatch) + Send + Sync>;

/// Holds the current location and runs the guard on every transition.
pub struct Router {
    table: RouteTable,
    guard: NavigationGuard,
    current: RwLock<Option<String>>,
    hooks: RwLock<Vec<EntryHook>>,
}

impl Router {
    pub fn new(table: RouteTable, guard: NavigationGuard) -> Self {
        Self {
            table,
            guard,
            current: RwLock::new(None),
            hooks: RwLock::new(Vec::new()),
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn current(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Register a hook fired after a route is committed.
    pub fn on_enter<F>(&self, hook: F)
    where
        F: Fn(&RouteMatch) + Send + Sync + 'static,
    {
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(hook));
    }

    /// Attempt a transition. Rejected targets never fire entry hooks.
    pub fn navigate(&self, path: &str) -> Result<Transition, StoreError> {
        let requested = normalize(path).to_string();
        let mut target = requested.clone();

        for _ in 0..MAX_REDIRECTS {
            let resolved = self.table.resolve(&target);
            let decision = resolved
                .as_ref()
                .map(|m| self.guard.check(&m.route))
                .unwrap_or(Decision::Allow);

            match decision {
                Decision::Allow => {
                    self.enter(&target, resolved.as_ref());
                    return Ok(Transition {
                        redirected: target != requested,
                        requested,
                        landed: target,
                    });
                }
                Decision::Redirect(to) => {
                    tracing::info!("Navigation to {} redirected to {}", target, to);
                    target = to;
                }
            }
        }

        Err(StoreError::InvalidArgument(format!(
            "Too many redirects navigating to {}",
            requested
        )))
    }

    fn enter(&self, path: &str, resolved: Option<&RouteMatch>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(path.to_string());

        if let Some(route_match) = resolved {
            // Hooks run outside the lock so they may register further hooks.
            let hooks = self
                .hooks
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            for hook in hooks {
                hook(route_match);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_captures_params() {
        let table = RouteTable::catalog();
        let m = table.resolve("/movies/42?tab=crew").unwrap();
        assert_eq!(m.route.name.as_deref(), Some("MovieDetail"));
        assert_eq!(m.params["id"], "42");
        assert_eq!(m.path, "/movies/42");
    }

    #[test]
    fn test_resolve_root_and_unknown() {
        let table = RouteTable::catalog();
        assert_eq!(table.resolve("/").unwrap().route.name.as_deref(), Some("Home"));
        assert!(table.resolve("/nowhere").is_none());
        assert!(table.resolve("/movies/1/extra").is_none());
    }

    #[test]
    fn test_hook_may_register_another_hook() {
        use crate::api::mock::MockApi;
        use crate::storage::MemoryStorage;
        use crate::store::Store;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let session = crate::session::SessionStore::new(
            Store::default(),
            Arc::new(MockApi::new()),
            Arc::new(MemoryStorage::new()),
        );
        let router = Arc::new(Router::new(RouteTable::catalog(), NavigationGuard::new(session)));
        let late_entries = Arc::new(AtomicUsize::new(0));

        let registrar = Arc::downgrade(&router);
        let counter = late_entries.clone();
        router.on_enter(move |m| {
            if m.path == "/movies" {
                if let Some(router) = registrar.upgrade() {
                    let counter = counter.clone();
                    router.on_enter(move |_| {
                        counter.fetch_add(1, Ordering::SeqCst);
                    });
                }
            }
        });

        router.navigate("/movies").unwrap();
        assert_eq!(late_entries.load(Ordering::SeqCst), 0);

        router.navigate("/movies/3").unwrap();
        assert_eq!(late_entries.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_admin_route_metadata() {
        let table = RouteTable::catalog();
        let admin = table.resolve("/admin").unwrap().route;
        assert!(admin.requires_auth);
        assert!(admin.requires_admin);
    }
}
