//! reqwest-backed implementation of the catalog API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::{ApiClient, ApiResult};
use crate::errors::{ApiError, ErrorBody};
use crate::models::{
    AuthResponse, Comment, CommentPayload, Credentials, CrewMember, Genre, MovieSummary,
    PageEnvelope, Registration,
};
use crate::storage::{SessionStorage, TOKEN_KEY};

pub const SIGN_IN_PATH: &str = "/api/auth/sign-in";
pub const SIGN_UP_PATH: &str = "/api/auth/sign-up";

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP client for the catalog REST API.
///
/// The bearer token is read from session storage on every request, so a login or
/// logout is picked up without rebuilding the client.
#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    storage: Arc<dyn SessionStorage>,
}

impl HttpApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        storage: Arc<dyn SessionStorage>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            storage,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn bearer_token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Failed to read session token: {}", e);
                None
            }
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

        if !is_auth_path(path) {
            if let Some(token) = self.bearer_token() {
                builder = builder.bearer_auth(token);
            }
        }

        builder
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> ApiResult<Response> {
        tracing::debug!("API request: {} {}", method, path);

        let response = builder.send().await.map_err(|e| {
            tracing::error!("API request error: {} {}: {}", method, path, e);
            ApiError::network(format!("Network error: {}", e))
        })?;

        let status = response.status();
        tracing::debug!("API response: {} {} -> {}", method, path, status.as_u16());

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);
        tracing::error!(
            "API response error: {} {} -> {} {:?}",
            method,
            path,
            status.as_u16(),
            message
        );

        Err(ApiError {
            status: Some(status.as_u16()),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let builder = self.request(Method::GET, path).query(query);
        let response = self.execute(Method::GET, path, builder).await?;
        decode(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path).json(body);
        let response = self.execute(Method::POST, path, builder).await?;
        decode(response).await
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        let builder = self.request(Method::DELETE, path);
        self.execute(Method::DELETE, path, builder).await?;
        Ok(())
    }
}

fn is_auth_path(path: &str) -> bool {
    path.starts_with(SIGN_IN_PATH) || path.starts_with(SIGN_UP_PATH)
}

fn paging(page: u32, size: u32) -> [(&'static str, String); 2] {
    [("page", page.to_string()), ("size", size.to_string())]
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status().as_u16();
    response.json::<T>().await.map_err(|e| ApiError {
        status: Some(status),
        message: Some(format!("Parse error: {}", e)),
    })
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn login(&self, credentials: &Credentials) -> ApiResult<AuthResponse> {
        self.post_json(SIGN_IN_PATH, credentials).await
    }

    async fn register(&self, registration: &Registration) -> ApiResult<AuthResponse> {
        self.post_json(SIGN_UP_PATH, registration).await
    }

    async fn search_movies(
        &self,
        query: &str,
        page: u32,
        size: u32,
    ) -> ApiResult<PageEnvelope<MovieSummary>> {
        let params = [
            ("query", query.to_string()),
            ("page", page.to_string()),
            ("size", size.to_string()),
        ];
        self.get_json("/api/movie/search", &params).await
    }

    async fn list_movies(&self, page: u32, size: u32) -> ApiResult<PageEnvelope<MovieSummary>> {
        self.get_json("/api/movie", &paging(page, size)).await
    }

    async fn get_movie(&self, id: i64) -> ApiResult<MovieSummary> {
        self.get_json(&format!("/api/movie/{}", id), &[]).await
    }

    async fn delete_movie(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/api/movie/{}", id)).await
    }

    async fn list_crew_members(
        &self,
        page: u32,
        size: u32,
    ) -> ApiResult<PageEnvelope<CrewMember>> {
        self.get_json("/api/crew-member/paged", &paging(page, size))
            .await
    }

    async fn delete_crew_member(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/api/crew-member/{}", id)).await
    }

    async fn list_genres(&self, page: u32, size: u32) -> ApiResult<PageEnvelope<Genre>> {
        self.get_json("/api/genre/paged", &paging(page, size)).await
    }

    async fn delete_genre(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/api/genre/{}", id)).await
    }

    async fn list_comments(
        &self,
        movie_id: i64,
        page: u32,
        size: u32,
    ) -> ApiResult<PageEnvelope<Comment>> {
        self.get_json(&format!("/api/comment/{}", movie_id), &paging(page, size))
            .await
    }

    async fn post_comment(&self, payload: &CommentPayload) -> ApiResult<Comment> {
        self.post_json("/api/comment", payload).await
    }
}
