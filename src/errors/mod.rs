//! Error handling module for the catalog client.
//!
//! Transport rejections (`ApiError`) are never handed to consumers directly: every
//! store operation converts them into a typed `StoreError` carrying a readable reason.

use serde::Deserialize;

use crate::models::ResourceKind;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const AUTH_FAILED: &str = "AUTH_FAILED";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const FETCH_FAILED: &str = "FETCH_FAILED";
    pub const POST_FAILED: &str = "POST_FAILED";
    pub const SEARCH_FAILED: &str = "SEARCH_FAILED";
    pub const DELETE_FAILED: &str = "DELETE_FAILED";
    pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
    pub const CANCELLED: &str = "CANCELLED";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
}

/// Rejection produced by an `ApiClient` call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiError {
    /// HTTP status, absent for network-level failures
    pub status: Option<u16>,
    /// `message` field of the error body, when the server sent one
    pub message: Option<String>,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: Some(message.into()),
        }
    }

    pub fn with_status(status: u16) -> Self {
        Self {
            status: Some(status),
            message: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: Some(message.into()),
        }
    }

    /// Server message when present and non-blank, otherwise the fixed default.
    pub fn reason_or(&self, default: &str) -> String {
        match self.message.as_deref().map(str::trim) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => default.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.status, self.message.as_deref()) {
            (Some(status), Some(message)) => write!(f, "HTTP {}: {}", status, message),
            (Some(status), None) => write!(f, "HTTP {}", status),
            (None, Some(message)) => write!(f, "{}", message),
            (None, None) => write!(f, "request failed"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Error body sent by the catalog API.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Typed error raised by store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Login or registration rejected
    Auth { reason: String },
    /// The action needs a session and none is present
    Unauthenticated,
    /// A read failed; `kind` is set for admin collections
    Fetch {
        kind: Option<ResourceKind>,
        reason: String,
    },
    /// Posting a comment failed
    Post { reason: String },
    /// Search request failed
    Search { reason: String },
    /// Delete failed, or the refetch that follows it failed
    Delete { kind: ResourceKind, reason: String },
    /// Unknown resource kind or malformed argument
    InvalidArgument(String),
    /// Debounced search discarded by a reset before it was issued
    Cancelled,
}

impl StoreError {
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::Auth { .. } => codes::AUTH_FAILED,
            StoreError::Unauthenticated => codes::UNAUTHENTICATED,
            StoreError::Fetch { .. } => codes::FETCH_FAILED,
            StoreError::Post { .. } => codes::POST_FAILED,
            StoreError::Search { .. } => codes::SEARCH_FAILED,
            StoreError::Delete { .. } => codes::DELETE_FAILED,
            StoreError::InvalidArgument(_) => codes::INVALID_ARGUMENT,
            StoreError::Cancelled => codes::CANCELLED,
        }
    }

    /// Human-readable reason suitable for display.
    pub fn message(&self) -> String {
        match self {
            StoreError::Auth { reason }
            | StoreError::Fetch { reason, .. }
            | StoreError::Post { reason }
            | StoreError::Search { reason }
            | StoreError::Delete { reason, .. } => reason.clone(),
            StoreError::Unauthenticated => "User is not authenticated".to_string(),
            StoreError::InvalidArgument(msg) => msg.clone(),
            StoreError::Cancelled => "Search was cancelled".to_string(),
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for StoreError {}

/// Durable session storage failure.
#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Encoding(serde_json::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "{}: {}", codes::STORAGE_ERROR, err),
            StorageError::Encoding(err) => write!(f, "{}: {}", codes::STORAGE_ERROR, err),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Encoding(err)
    }
}
