//! Movie comments.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub movie_id: i64,
    #[serde(alias = "userId")]
    pub author_id: i64,
    #[serde(alias = "content")]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

/// Comment as supplied by the caller, before the author is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub movie_id: i64,
    pub body: String,
}

impl NewComment {
    pub fn new(movie_id: i64, body: impl Into<String>) -> Self {
        Self {
            movie_id,
            body: body.into(),
        }
    }
}

/// Request body for `POST /api/comment`; `user_id` always comes from the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPayload {
    pub movie_id: i64,
    pub content: String,
    pub user_id: i64,
}

/// Comments of the movie most recently fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentList {
    pub movie_id: Option<i64>,
    pub items: Vec<Comment>,
}
