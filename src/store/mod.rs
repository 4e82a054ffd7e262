//! Process-wide client state.
//!
//! `Store` is a cheap cloneable handle to the single source of truth shared by every
//! component. Reads take a snapshot; writes go through the crate-internal operations
//! below, each of which commits atomically under one lock and bumps the revision
//! counter that consumers watch.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;

use crate::models::{
    CommentList, CrewMember, Genre, MovieSummary, Page, ResourceKind, Session,
};

/// Latest accepted search query and its results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub results: Page<MovieSummary>,
}

/// The three admin-managed collections, each with its own cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminCollections {
    pub movies: Page<MovieSummary>,
    pub crew: Page<CrewMember>,
    pub genres: Page<Genre>,
    /// Page size each slot was last fetched with, indexed like `ResourceKind::ALL`
    fetched_sizes: [Option<u32>; 3],
}

impl AdminCollections {
    /// Size the held page was fetched with, if any page is held.
    pub fn page_size(&self, kind: ResourceKind) -> Option<u32> {
        self.fetched_sizes[kind.index()]
    }

    pub(crate) fn record_page_size(&mut self, kind: ResourceKind, size: u32) {
        self.fetched_sizes[kind.index()] = Some(size);
    }

    pub fn page_index(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Movie => self.movies.page_index,
            ResourceKind::CrewMember => self.crew.page_index,
            ResourceKind::Genre => self.genres.page_index,
        }
    }

    pub fn total_pages(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Movie => self.movies.total_pages,
            ResourceKind::CrewMember => self.crew.total_pages,
            ResourceKind::Genre => self.genres.total_pages,
        }
    }
}

/// Everything the client holds. `Default` is the logged-out state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientState {
    pub session: Session,
    pub search: SearchState,
    pub comments: CommentList,
    pub admin: AdminCollections,
}

#[derive(Default)]
struct Ledger {
    state: ClientState,
    /// Sequence number of the most recently issued search request
    search_issued: u64,
    /// Bumped whenever search state is reset; pending debounced calls from an older epoch are dropped
    search_epoch: u64,
    /// Bumped on every full reset; reads started under an older epoch are not applied
    session_epoch: u64,
}

struct StoreInner {
    ledger: RwLock<Ledger>,
    revision: watch::Sender<u64>,
}

/// Handle to the shared client state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Session::default())
    }
}

impl Store {
    /// Create a store holding a (possibly rehydrated) session.
    pub fn new(session: Session) -> Self {
        let (revision, _) = watch::channel(0);
        let ledger = Ledger {
            state: ClientState {
                session,
                ..ClientState::default()
            },
            ..Ledger::default()
        };

        Self {
            inner: Arc::new(StoreInner {
                ledger: RwLock::new(ledger),
                revision,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Ledger> {
        self.inner
            .ledger
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ledger> {
        self.inner
            .ledger
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a mutation and notify subscribers.
    fn commit<R>(&self, mutate: impl FnOnce(&mut Ledger) -> R) -> R {
        let result = {
            let mut ledger = self.write();
            mutate(&mut ledger)
        };
        self.inner.revision.send_modify(|rev| *rev += 1);
        result
    }

    /// Revision counter bumped after every committed mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    /// Copy of the whole state.
    pub fn snapshot(&self) -> ClientState {
        self.read().state.clone()
    }

    /// Run a read-only projection without cloning the whole state.
    pub fn view<R>(&self, project: impl FnOnce(&ClientState) -> R) -> R {
        project(&self.read().state)
    }

    pub fn session(&self) -> Session {
        self.view(|s| s.session.clone())
    }

    pub fn search(&self) -> SearchState {
        self.view(|s| s.search.clone())
    }

    pub fn comments(&self) -> CommentList {
        self.view(|s| s.comments.clone())
    }

    pub fn admin(&self) -> AdminCollections {
        self.view(|s| s.admin.clone())
    }

    pub(crate) fn install_session(&self, session: Session) {
        self.commit(|ledger| ledger.state.session = session);
    }

    /// Full reset to the logged-out defaults; in-flight searches become stale.
    pub(crate) fn reset(&self) {
        self.commit(|ledger| {
            ledger.state = ClientState::default();
            ledger.search_epoch += 1;
            ledger.search_issued += 1;
            ledger.session_epoch += 1;
        });
    }

    /// Epoch to capture before a read whose result will be written back.
    pub(crate) fn session_epoch(&self) -> u64 {
        self.read().session_epoch
    }

    pub(crate) fn search_epoch(&self) -> u64 {
        self.read().search_epoch
    }

    /// Mint the sequence number for a search about to be sent.
    ///
    /// Returns `None` when search state was reset since `epoch` was observed.
    pub(crate) fn issue_search(&self, epoch: u64) -> Option<u64> {
        let mut ledger = self.write();
        if ledger.search_epoch != epoch {
            return None;
        }
        ledger.search_issued += 1;
        Some(ledger.search_issued)
    }

    /// Install search results if `seq` is still the latest issued request.
    pub(crate) fn apply_search(&self, seq: u64, query: &str, results: Page<MovieSummary>) -> bool {
        {
            let mut ledger = self.write();
            if ledger.search_issued != seq {
                return false;
            }
            ledger.state.search = SearchState {
                query: query.to_string(),
                results,
            };
        }
        self.inner.revision.send_modify(|rev| *rev += 1);
        true
    }

    pub(crate) fn clear_search(&self) {
        self.commit(|ledger| {
            ledger.state.search = SearchState::default();
            ledger.search_epoch += 1;
            ledger.search_issued += 1;
        });
    }

    /// Replace the comment list unless the store was reset after `epoch` was captured.
    pub(crate) fn set_comments(&self, epoch: u64, comments: CommentList) -> bool {
        self.commit_in_epoch(epoch, |state| state.comments = comments)
    }

    /// Update the admin collections unless the store was reset after `epoch` was captured.
    pub(crate) fn update_admin(&self, epoch: u64, update: impl FnOnce(&mut AdminCollections)) -> bool {
        self.commit_in_epoch(epoch, |state| update(&mut state.admin))
    }

    fn commit_in_epoch(&self, epoch: u64, mutate: impl FnOnce(&mut ClientState)) -> bool {
        {
            let mut ledger = self.write();
            if ledger.session_epoch != epoch {
                return false;
            }
            mutate(&mut ledger.state);
        }
        self.inner.revision.send_modify(|rev| *rev += 1);
        true
    }
}
