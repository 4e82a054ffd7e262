//! Scripted in-memory `ApiClient` used by unit tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{ApiClient, ApiResult};
use crate::errors::ApiError;
use crate::models::{
    AuthResponse, Comment, CommentPayload, Credentials, CrewMember, Genre, MovieSummary,
    PageEnvelope, Registration, UserSummary,
};

pub const PASSWORD: &str = "secret";

#[derive(Default)]
struct MockState {
    movies: Vec<MovieSummary>,
    crew: Vec<CrewMember>,
    genres: Vec<Genre>,
    comments: Vec<Comment>,
    posted: Vec<CommentPayload>,
    search_delays: HashMap<String, Duration>,
    delays: HashMap<&'static str, Duration>,
    failures: HashMap<&'static str, ApiError>,
    omit_page_meta: bool,
}

/// Fake catalog server. Every call is recorded as `verb:arg:arg`.
#[derive(Default)]
pub struct MockApi {
    calls: Mutex<Vec<String>>,
    state: Mutex<MockState>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(movies: usize, crew: usize, genres: usize) -> Self {
        let api = Self::new();
        {
            let mut state = api.state.lock().unwrap();
            state.movies = (1..=movies as i64)
                .map(|id| MovieSummary::new(id, format!("Movie {}", id)))
                .collect();
            state.crew = (1..=crew as i64)
                .map(|id| CrewMember::new(id, format!("Crew {}", id)))
                .collect();
            state.genres = (1..=genres as i64)
                .map(|id| Genre::new(id, format!("Genre {}", id)))
                .collect();
        }
        api
    }

    pub fn set_movies(&self, titles: &[&str]) {
        self.state.lock().unwrap().movies = titles
            .iter()
            .enumerate()
            .map(|(i, title)| MovieSummary::new(i as i64 + 1, *title))
            .collect();
    }

    pub fn add_comment(&self, id: i64, movie_id: i64, author_id: i64, body: &str) {
        self.state.lock().unwrap().comments.push(Comment {
            id,
            movie_id,
            author_id,
            body: body.to_string(),
            created_at: None,
        });
    }

    pub fn set_search_delay(&self, query: &str, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .search_delays
            .insert(query.to_string(), delay);
    }

    /// Hold every `verb` response for `delay`.
    pub fn set_delay(&self, verb: &'static str, delay: Duration) {
        self.state.lock().unwrap().delays.insert(verb, delay);
    }

    pub fn fail(&self, verb: &'static str, error: ApiError) {
        self.state.lock().unwrap().failures.insert(verb, error);
    }

    pub fn recover(&self, verb: &'static str) {
        self.state.lock().unwrap().failures.remove(verb);
    }

    pub fn omit_page_meta(&self) {
        self.state.lock().unwrap().omit_page_meta = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, verb: &str) -> Vec<String> {
        let prefix = format!("{}:", verb);
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(&prefix) || c == verb)
            .collect()
    }

    pub fn posted(&self) -> Vec<CommentPayload> {
        self.state.lock().unwrap().posted.clone()
    }

    pub fn movie_count(&self) -> usize {
        self.state.lock().unwrap().movies.len()
    }

    fn record(&self, verb: &'static str, args: &[String]) -> ApiResult<()> {
        let mut entry = verb.to_string();
        for arg in args {
            entry.push(':');
            entry.push_str(arg);
        }
        self.calls.lock().unwrap().push(entry);

        match self.state.lock().unwrap().failures.get(verb) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn hold(&self, verb: &'static str) {
        let delay = self.state.lock().unwrap().delays.get(verb).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn envelope<T: Clone>(&self, items: &[T], page: u32, size: u32) -> PageEnvelope<T> {
        let size = size.max(1) as usize;
        let total_pages = items.len().div_ceil(size) as u32;
        let content = items
            .iter()
            .skip(page as usize * size)
            .take(size)
            .cloned()
            .collect();

        if self.state.lock().unwrap().omit_page_meta {
            PageEnvelope::bare(content)
        } else {
            PageEnvelope::new(content, page, total_pages)
        }
    }

    fn user_for(username: &str) -> UserSummary {
        let mut roles = BTreeSet::from(["USER".to_string()]);
        if username == "admin" {
            roles.insert("ADMIN".to_string());
        }
        UserSummary {
            id: if username == "admin" { 1 } else { 42 },
            username: username.to_string(),
            email: None,
            roles,
        }
    }
}

#[async_trait]
impl ApiClient for MockApi {
    async fn login(&self, credentials: &Credentials) -> ApiResult<AuthResponse> {
        self.record("login", &[credentials.username.clone()])?;
        if credentials.password != PASSWORD {
            return Err(ApiError::new(401, "Bad credentials"));
        }
        Ok(AuthResponse {
            token: format!("token-{}", credentials.username),
            user: Self::user_for(&credentials.username),
        })
    }

    async fn register(&self, registration: &Registration) -> ApiResult<AuthResponse> {
        self.record("register", &[registration.username.clone()])?;
        if registration.username == "taken" {
            return Err(ApiError::new(409, "Username already exists"));
        }
        Ok(AuthResponse {
            token: format!("token-{}", registration.username),
            user: Self::user_for(&registration.username),
        })
    }

    async fn search_movies(
        &self,
        query: &str,
        page: u32,
        size: u32,
    ) -> ApiResult<PageEnvelope<MovieSummary>> {
        let delay = self.state.lock().unwrap().search_delays.get(query).copied();
        self.record("search_movies", &[query.to_string(), page.to_string()])?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let needle = query.to_lowercase();
        let matches: Vec<MovieSummary> = self
            .state
            .lock()
            .unwrap()
            .movies
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Ok(self.envelope(&matches, page, size))
    }

    async fn list_movies(&self, page: u32, size: u32) -> ApiResult<PageEnvelope<MovieSummary>> {
        self.record("list_movies", &[page.to_string(), size.to_string()])?;
        self.hold("list_movies").await;
        let movies = self.state.lock().unwrap().movies.clone();
        Ok(self.envelope(&movies, page, size))
    }

    async fn get_movie(&self, id: i64) -> ApiResult<MovieSummary> {
        self.record("get_movie", &[id.to_string()])?;
        self.state
            .lock()
            .unwrap()
            .movies
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| ApiError::new(404, "Movie not found"))
    }

    async fn delete_movie(&self, id: i64) -> ApiResult<()> {
        self.record("delete_movie", &[id.to_string()])?;
        self.state.lock().unwrap().movies.retain(|m| m.id != id);
        Ok(())
    }

    async fn list_crew_members(
        &self,
        page: u32,
        size: u32,
    ) -> ApiResult<PageEnvelope<CrewMember>> {
        self.record("list_crew_members", &[page.to_string(), size.to_string()])?;
        self.hold("list_crew_members").await;
        let crew = self.state.lock().unwrap().crew.clone();
        Ok(self.envelope(&crew, page, size))
    }

    async fn delete_crew_member(&self, id: i64) -> ApiResult<()> {
        self.record("delete_crew_member", &[id.to_string()])?;
        self.state.lock().unwrap().crew.retain(|c| c.id != id);
        Ok(())
    }

    async fn list_genres(&self, page: u32, size: u32) -> ApiResult<PageEnvelope<Genre>> {
        self.record("list_genres", &[page.to_string(), size.to_string()])?;
        self.hold("list_genres").await;
        let genres = self.state.lock().unwrap().genres.clone();
        Ok(self.envelope(&genres, page, size))
    }

    async fn delete_genre(&self, id: i64) -> ApiResult<()> {
        self.record("delete_genre", &[id.to_string()])?;
        self.state.lock().unwrap().genres.retain(|g| g.id != id);
        Ok(())
    }

    async fn list_comments(
        &self,
        movie_id: i64,
        page: u32,
        size: u32,
    ) -> ApiResult<PageEnvelope<Comment>> {
        self.record(
            "list_comments",
            &[movie_id.to_string(), page.to_string(), size.to_string()],
        )?;
        self.hold("list_comments").await;
        let comments: Vec<Comment> = self
            .state
            .lock()
            .unwrap()
            .comments
            .iter()
            .filter(|c| c.movie_id == movie_id)
            .cloned()
            .collect();
        Ok(self.envelope(&comments, page, size))
    }

    async fn post_comment(&self, payload: &CommentPayload) -> ApiResult<Comment> {
        self.record("post_comment", &[payload.movie_id.to_string()])?;
        let mut state = self.state.lock().unwrap();
        let comment = Comment {
            id: state.comments.len() as i64 + 1,
            movie_id: payload.movie_id,
            author_id: payload.user_id,
            body: payload.content.clone(),
            created_at: None,
        };
        state.posted.push(payload.clone());
        state.comments.push(comment.clone());
        Ok(comment)
    }
}
