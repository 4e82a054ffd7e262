//! Catalog client
//!
//! Session and state-synchronization layer between catalog views and the catalog REST
//! API: one shared store for the session, search results, comments and the admin
//! collections, plus a navigation guard that gates routes on the session.

pub mod admin;
pub mod api;
pub mod comments;
pub mod config;
pub mod errors;
pub mod models;
pub mod router;
pub mod search;
pub mod session;
pub mod storage;
pub mod store;

use std::sync::Arc;

use admin::AdminCollectionManager;
use api::{ApiClient, HttpApiClient};
use comments::CommentFeed;
use config::Config;
use errors::ApiError;
use router::{NavigationGuard, RouteTable, Router};
use search::SearchCoordinator;
use session::SessionStore;
use storage::SessionStorage;
use store::Store;

/// Every component wired to one store instance.
pub struct CatalogClient {
    pub config: Arc<Config>,
    pub store: Store,
    pub session: SessionStore,
    pub search: SearchCoordinator,
    pub comments: CommentFeed,
    pub admin: AdminCollectionManager,
    pub router: Router,
}

impl CatalogClient {
    /// Assemble the client around an existing transport and storage.
    ///
    /// The persisted session is rehydrated here, once.
    pub fn new(config: Config, api: Arc<dyn ApiClient>, storage: Arc<dyn SessionStorage>) -> Self {
        let store = Store::new(SessionStore::rehydrate(storage.as_ref()));

        let session = SessionStore::new(store.clone(), api.clone(), storage)
            .with_logout_on_unauthorized(config.logout_on_unauthorized);
        let search = SearchCoordinator::new(
            store.clone(),
            session.clone(),
            api.clone(),
            config.search_debounce,
            config.page_sizes.search,
        );
        let comments = CommentFeed::new(
            store.clone(),
            session.clone(),
            api.clone(),
            config.page_sizes.comments,
        );
        let admin = AdminCollectionManager::new(store.clone(), session.clone(), api, config.page_sizes);
        let router = Router::new(RouteTable::catalog(), NavigationGuard::new(session.clone()));

        Self {
            config: Arc::new(config),
            store,
            session,
            search,
            comments,
            admin,
            router,
        }
    }

    /// Assemble the client over HTTP against `config.api_base_url`.
    pub fn connect(config: Config, storage: Arc<dyn SessionStorage>) -> Result<Self, ApiError> {
        let api = HttpApiClient::new(
            config.api_base_url.clone(),
            config.request_timeout,
            storage.clone(),
        )?;
        Ok(Self::new(config, Arc::new(api), storage))
    }
}
