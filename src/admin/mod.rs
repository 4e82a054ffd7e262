//! Paginated CRUD state for the admin panel.
//!
//! Movies, crew members and genres each own one `Page` slot. Deletes never splice the
//! stored page locally: the same page index is re-fetched so `total_pages` always comes
//! from the server. One operation per kind runs at a time, so nothing can slip in
//! between a delete and its refetch.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};

use crate::api::{ApiClient, ApiResult};
use crate::config::PageSizes;
use crate::errors::{ApiError, StoreError};
use crate::models::{
    CrewMember, Genre, MovieSummary, Page, PageEnvelope, PaginationDefaults, ResourceKind,
};
use crate::session::SessionStore;
use crate::store::{AdminCollections, Store};

/// Binds a resource kind to its item type, API verbs and store slot.
#[async_trait]
pub trait AdminResource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    const KIND: ResourceKind;

    async fn list(
        api: &dyn ApiClient,
        page: u32,
        size: u32,
    ) -> ApiResult<PageEnvelope<Self::Item>>;

    async fn remove(api: &dyn ApiClient, id: i64) -> ApiResult<()>;

    fn slot(collections: &mut AdminCollections) -> &mut Page<Self::Item>;
}

pub struct Movies;
pub struct CrewMembers;
pub struct Genres;

#[async_trait]
impl AdminResource for Movies {
    type Item = MovieSummary;

    const KIND: ResourceKind = ResourceKind::Movie;

    async fn list(
        api: &dyn ApiClient,
        page: u32,
        size: u32,
    ) -> ApiResult<PageEnvelope<MovieSummary>> {
        api.list_movies(page, size).await
    }

    async fn remove(api: &dyn ApiClient, id: i64) -> ApiResult<()> {
        api.delete_movie(id).await
    }

    fn slot(collections: &mut AdminCollections) -> &mut Page<MovieSummary> {
        &mut collections.movies
    }
}

#[async_trait]
impl AdminResource for CrewMembers {
    type Item = CrewMember;

    const KIND: ResourceKind = ResourceKind::CrewMember;

    async fn list(api: &dyn ApiClient, page: u32, size: u32) -> ApiResult<PageEnvelope<CrewMember>> {
        api.list_crew_members(page, size).await
    }

    async fn remove(api: &dyn ApiClient, id: i64) -> ApiResult<()> {
        api.delete_crew_member(id).await
    }

    fn slot(collections: &mut AdminCollections) -> &mut Page<CrewMember> {
        &mut collections.crew
    }
}

#[async_trait]
impl AdminResource for Genres {
    type Item = Genre;

    const KIND: ResourceKind = ResourceKind::Genre;

    async fn list(api: &dyn ApiClient, page: u32, size: u32) -> ApiResult<PageEnvelope<Genre>> {
        api.list_genres(page, size).await
    }

    async fn remove(api: &dyn ApiClient, id: i64) -> ApiResult<()> {
        api.delete_genre(id).await
    }

    fn slot(collections: &mut AdminCollections) -> &mut Page<Genre> {
        &mut collections.genres
    }
}

/// A page of any admin collection, for callers that pick the kind at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminPage {
    Movies(Page<MovieSummary>),
    Crew(Page<CrewMember>),
    Genres(Page<Genre>),
}

impl AdminPage {
    pub fn kind(&self) -> ResourceKind {
        match self {
            AdminPage::Movies(_) => ResourceKind::Movie,
            AdminPage::Crew(_) => ResourceKind::CrewMember,
            AdminPage::Genres(_) => ResourceKind::Genre,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            AdminPage::Movies(page) => page.items.len(),
            AdminPage::Crew(page) => page.items.len(),
            AdminPage::Genres(page) => page.items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(page_index, total_pages)`
    pub fn cursor(&self) -> (u32, u32) {
        match self {
            AdminPage::Movies(page) => (page.page_index, page.total_pages),
            AdminPage::Crew(page) => (page.page_index, page.total_pages),
            AdminPage::Genres(page) => (page.page_index, page.total_pages),
        }
    }
}

/// Owns the three admin collections.
#[derive(Clone)]
pub struct AdminCollectionManager {
    store: Store,
    session: SessionStore,
    api: Arc<dyn ApiClient>,
    page_sizes: PageSizes,
    locks: Arc<[Mutex<()>; 3]>,
}

impl AdminCollectionManager {
    pub fn new(
        store: Store,
        session: SessionStore,
        api: Arc<dyn ApiClient>,
        page_sizes: PageSizes,
    ) -> Self {
        Self {
            store,
            session,
            api,
            page_sizes,
            locks: Arc::new([Mutex::new(()), Mutex::new(()), Mutex::new(())]),
        }
    }

    /// Page size convention for a kind (movies 12, crew 20, genres 20 by default).
    pub fn page_size(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Movie => self.page_sizes.movies,
            ResourceKind::CrewMember => self.page_sizes.crew,
            ResourceKind::Genre => self.page_sizes.genres,
        }
    }

    async fn lock(&self, kind: ResourceKind) -> MutexGuard<'_, ()> {
        self.locks[kind.index()].lock().await
    }

    pub async fn fetch_page<R: AdminResource>(
        &self,
        page_index: u32,
        page_size: u32,
    ) -> Result<Page<R::Item>, StoreError> {
        let _guard = self.lock(R::KIND).await;
        self.load::<R>(page_index, page_size).await.map_err(|e| {
            tracing::error!("Fetching {} page {} failed: {}", R::KIND, page_index, e);
            self.session.note_rejection(&e);
            StoreError::Fetch {
                kind: Some(R::KIND),
                reason: e.reason_or(&format!("Failed to fetch {}", R::KIND.noun())),
            }
        })
    }

    /// Delete an item, then re-fetch the page index currently held for its kind, with the
    /// size that page was fetched with (the kind's convention when nothing is held yet).
    ///
    /// A failed refetch is reported as a delete error even though the item is gone.
    pub async fn delete_item<R: AdminResource>(
        &self,
        id: i64,
    ) -> Result<Page<R::Item>, StoreError> {
        let _guard = self.lock(R::KIND).await;

        R::remove(self.api.as_ref(), id).await.map_err(|e| {
            tracing::error!("Deleting {} {} failed: {}", R::KIND, id, e);
            self.delete_error(R::KIND, e)
        })?;

        let (page_index, held_size) = self
            .store
            .view(|s| (s.admin.page_index(R::KIND), s.admin.page_size(R::KIND)));
        let page_size = held_size.unwrap_or_else(|| self.page_size(R::KIND));
        tracing::debug!("Deleted {} {}; refetching page {}", R::KIND, id, page_index);

        self.load::<R>(page_index, page_size).await.map_err(|e| {
            tracing::warn!(
                "Deleted {} {} but refetching page {} failed: {}",
                R::KIND,
                id,
                page_index,
                e
            );
            self.delete_error(R::KIND, e)
        })
    }

    pub async fn fetch_page_of(
        &self,
        kind: ResourceKind,
        page_index: u32,
        page_size: u32,
    ) -> Result<AdminPage, StoreError> {
        Ok(match kind {
            ResourceKind::Movie => {
                AdminPage::Movies(self.fetch_page::<Movies>(page_index, page_size).await?)
            }
            ResourceKind::CrewMember => {
                AdminPage::Crew(self.fetch_page::<CrewMembers>(page_index, page_size).await?)
            }
            ResourceKind::Genre => {
                AdminPage::Genres(self.fetch_page::<Genres>(page_index, page_size).await?)
            }
        })
    }

    pub async fn delete_item_of(&self, kind: ResourceKind, id: i64) -> Result<AdminPage, StoreError> {
        Ok(match kind {
            ResourceKind::Movie => AdminPage::Movies(self.delete_item::<Movies>(id).await?),
            ResourceKind::CrewMember => AdminPage::Crew(self.delete_item::<CrewMembers>(id).await?),
            ResourceKind::Genre => AdminPage::Genres(self.delete_item::<Genres>(id).await?),
        })
    }

    /// Fetch by admin tab name with the kind's page size convention.
    pub async fn fetch_tab(&self, tab: &str, page_index: u32) -> Result<AdminPage, StoreError> {
        let kind: ResourceKind = tab.parse()?;
        self.fetch_page_of(kind, page_index, self.page_size(kind))
            .await
    }

    /// Delete by admin tab name.
    pub async fn delete_in_tab(&self, tab: &str, id: i64) -> Result<AdminPage, StoreError> {
        let kind: ResourceKind = tab.parse()?;
        self.delete_item_of(kind, id).await
    }

    pub fn current(&self) -> AdminCollections {
        self.store.admin()
    }

    async fn load<R: AdminResource>(
        &self,
        page_index: u32,
        page_size: u32,
    ) -> Result<Page<R::Item>, ApiError> {
        let epoch = self.store.session_epoch();
        let envelope = R::list(self.api.as_ref(), page_index, page_size).await?;
        let page = PaginationDefaults::for_request(page_index).apply(envelope);

        let stored = page.clone();
        let applied = self.store.update_admin(epoch, |admin| {
            *R::slot(admin) = stored;
            admin.record_page_size(R::KIND, page_size);
        });
        if !applied {
            tracing::debug!("Discarding {} page {}: session was reset", R::KIND, page_index);
        }
        Ok(page)
    }

    fn delete_error(&self, kind: ResourceKind, err: ApiError) -> StoreError {
        self.session.note_rejection(&err);
        StoreError::Delete {
            kind,
            reason: err.reason_or(&format!("Failed to delete {}", kind.as_str())),
        }
    }
}
