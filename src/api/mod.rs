//! Catalog API contract.
//!
//! One method per (resource, verb) pair. Collections come back as a `PageEnvelope`,
//! singular resources as the bare object; failures reject with an `ApiError`.

mod http;

#[cfg(test)]
pub(crate) mod mock;

pub use http::*;

use async_trait::async_trait;

use crate::errors::ApiError;
use crate::models::{
    AuthResponse, Comment, CommentPayload, Credentials, CrewMember, Genre, MovieSummary,
    PageEnvelope, Registration,
};

/// Result type of every `ApiClient` call.
pub type ApiResult<T> = Result<T, ApiError>;

/// Transport the store calls through.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> ApiResult<AuthResponse>;

    async fn register(&self, registration: &Registration) -> ApiResult<AuthResponse>;

    async fn search_movies(
        &self,
        query: &str,
        page: u32,
        size: u32,
    ) -> ApiResult<PageEnvelope<MovieSummary>>;

    async fn list_movies(&self, page: u32, size: u32) -> ApiResult<PageEnvelope<MovieSummary>>;

    async fn get_movie(&self, id: i64) -> ApiResult<MovieSummary>;

    async fn delete_movie(&self, id: i64) -> ApiResult<()>;

    async fn list_crew_members(&self, page: u32, size: u32)
        -> ApiResult<PageEnvelope<CrewMember>>;

    async fn delete_crew_member(&self, id: i64) -> ApiResult<()>;

    async fn list_genres(&self, page: u32, size: u32) -> ApiResult<PageEnvelope<Genre>>;

    async fn delete_genre(&self, id: i64) -> ApiResult<()>;

    async fn list_comments(
        &self,
        movie_id: i64,
        page: u32,
        size: u32,
    ) -> ApiResult<PageEnvelope<Comment>>;

    async fn post_comment(&self, payload: &CommentPayload) -> ApiResult<Comment>;
}
