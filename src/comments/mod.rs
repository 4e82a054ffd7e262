//! Per-movie comment feed.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::errors::StoreError;
use crate::models::{Comment, CommentList, CommentPayload, NewComment, Page, PaginationDefaults};
use crate::session::SessionStore;
use crate::store::Store;

const FETCH_FAILED: &str = "Failed to fetch comments";
const POST_FAILED: &str = "Failed to post comment";

/// Owns the comment list of the movie currently shown.
#[derive(Clone)]
pub struct CommentFeed {
    store: Store,
    session: SessionStore,
    api: Arc<dyn ApiClient>,
    default_page_size: u32,
}

impl CommentFeed {
    pub fn new(
        store: Store,
        session: SessionStore,
        api: Arc<dyn ApiClient>,
        default_page_size: u32,
    ) -> Self {
        Self {
            store,
            session,
            api,
            default_page_size,
        }
    }

    pub fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    /// Fetch one page of comments and replace the stored list wholesale.
    pub async fn fetch(
        &self,
        movie_id: i64,
        page_index: u32,
        page_size: u32,
    ) -> Result<Page<Comment>, StoreError> {
        let epoch = self.store.session_epoch();
        let envelope = self
            .api
            .list_comments(movie_id, page_index, page_size)
            .await
            .map_err(|e| {
                tracing::error!("Fetching comments for movie {} failed: {}", movie_id, e);
                self.session.note_rejection(&e);
                StoreError::Fetch {
                    kind: None,
                    reason: e.reason_or(FETCH_FAILED),
                }
            })?;

        let page = PaginationDefaults::for_request(page_index).apply(envelope);
        let list = CommentList {
            movie_id: Some(movie_id),
            items: page.items.clone(),
        };
        if !self.store.set_comments(epoch, list) {
            tracing::debug!("Discarding comments for movie {}: session was reset", movie_id);
            return Ok(page);
        }
        tracing::debug!(
            "Loaded {} comments for movie {} (page {})",
            page.items.len(),
            movie_id,
            page.page_index
        );
        Ok(page)
    }

    /// Post a comment as the session user.
    ///
    /// The stored list is left alone; callers re-fetch to see the new comment.
    pub async fn post(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let user_id = self
            .session
            .current_user_id()
            .ok_or(StoreError::Unauthenticated)?;

        let payload = CommentPayload {
            movie_id: comment.movie_id,
            content: comment.body,
            user_id,
        };

        self.api.post_comment(&payload).await.map_err(|e| {
            tracing::error!("Posting comment on movie {} failed: {}", payload.movie_id, e);
            self.session.note_rejection(&e);
            StoreError::Post {
                reason: e.reason_or(POST_FAILED),
            }
        })
    }

    pub fn current(&self) -> CommentList {
        self.store.comments()
    }
}
