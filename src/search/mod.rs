//! Debounced full-text movie search.
//!
//! Each call replaces the pending request and restarts the debounce timer; when the
//! timer fires, exactly one request goes out with a freshly minted sequence number,
//! and its outcome is delivered to every caller that was collapsed into it. A
//! response only reaches the store if its sequence number is still the latest issued.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::api::ApiClient;
use crate::errors::StoreError;
use crate::models::{MovieSummary, Page, PaginationDefaults};
use crate::session::SessionStore;
use crate::store::{SearchState, Store};

const SEARCH_FAILED: &str = "Search failed";

/// Result delivered to each debounced caller.
pub type SearchOutcome = Result<Page<MovieSummary>, StoreError>;

/// A search intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub page_index: u32,
}

#[derive(Default)]
struct PendingSearch {
    generation: u64,
    query: Option<SearchQuery>,
    epoch: u64,
    waiters: Vec<oneshot::Sender<SearchOutcome>>,
}

struct SearchInner {
    store: Store,
    session: SessionStore,
    api: Arc<dyn ApiClient>,
    debounce: Duration,
    page_size: u32,
    pending: Mutex<PendingSearch>,
}

/// Owns debounced, stale-safe movie search.
#[derive(Clone)]
pub struct SearchCoordinator {
    inner: Arc<SearchInner>,
}

impl SearchCoordinator {
    pub fn new(
        store: Store,
        session: SessionStore,
        api: Arc<dyn ApiClient>,
        debounce: Duration,
        page_size: u32,
    ) -> Self {
        Self {
            inner: Arc::new(SearchInner {
                store,
                session,
                api,
                debounce,
                page_size,
                pending: Mutex::new(PendingSearch::default()),
            }),
        }
    }

    /// Queue a search. Resolves once the collapsed request for the debounce window completes.
    pub async fn search(&self, text: impl Into<String>, page_index: u32) -> SearchOutcome {
        let query = SearchQuery {
            text: text.into(),
            page_index,
        };
        let (tx, rx) = oneshot::channel();

        let generation = {
            let mut pending = self
                .inner
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            pending.generation += 1;
            pending.query = Some(query);
            pending.epoch = self.inner.store.search_epoch();
            pending.waiters.push(tx);
            pending.generation
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            inner.fire(generation).await;
        });

        rx.await.unwrap_or(Err(StoreError::Cancelled))
    }

    /// Reset query, results and cursors. Pending debounced calls resolve as cancelled.
    pub fn clear(&self) {
        self.inner.store.clear_search();
    }

    pub fn current(&self) -> SearchState {
        self.inner.store.search()
    }
}

impl SearchInner {
    async fn fire(&self, generation: u64) {
        let (query, epoch, waiters) = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if pending.generation != generation {
                return;
            }
            let Some(query) = pending.query.take() else {
                return;
            };
            (query, pending.epoch, std::mem::take(&mut pending.waiters))
        };

        let outcome = match self.store.issue_search(epoch) {
            Some(seq) => self.execute(seq, &query).await,
            None => {
                tracing::debug!("Dropping search for {:?}: search state was reset", query.text);
                Err(StoreError::Cancelled)
            }
        };

        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }

    async fn execute(&self, seq: u64, query: &SearchQuery) -> SearchOutcome {
        tracing::debug!(
            "Issuing search #{} for {:?} (page {})",
            seq,
            query.text,
            query.page_index
        );

        match self
            .api
            .search_movies(&query.text, query.page_index, self.page_size)
            .await
        {
            Ok(envelope) => {
                let page = PaginationDefaults::for_request(query.page_index).apply(envelope);
                if !self.store.apply_search(seq, &query.text, page.clone()) {
                    tracing::debug!("Discarding stale search response #{}", seq);
                }
                Ok(page)
            }
            Err(e) => {
                tracing::error!("Search for {:?} failed: {}", query.text, e);
                self.session.note_rejection(&e);
                Err(StoreError::Search {
                    reason: e.reason_or(SEARCH_FAILED),
                })
            }
        }
    }
}
