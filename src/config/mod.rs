//! Configuration module for the catalog client.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default debounce window for full-text search.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;

/// Page size conventions per paginated collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizes {
    pub search: u32,
    pub movies: u32,
    pub crew: u32,
    pub genres: u32,
    pub comments: u32,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            search: 12,
            movies: 12,
            crew: 20,
            genres: 20,
            comments: 10,
        }
    }
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the catalog REST API
    pub api_base_url: String,
    /// Path of the durable session file
    pub session_path: PathBuf,
    /// Debounce window applied to search intents
    pub search_debounce: Duration,
    /// Page size conventions
    pub page_sizes: PageSizes,
    /// Transport-level request timeout
    pub request_timeout: Duration,
    /// Clear the session when the API answers 401 to an authenticated call
    pub logout_on_unauthorized: bool,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            session_path: PathBuf::from("./data/session.json"),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            page_sizes: PageSizes::default(),
            request_timeout: Duration::from_secs(30),
            logout_on_unauthorized: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let sizes = defaults.page_sizes;

        let api_base_url = env::var("CATALOG_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        let session_path = env::var("CATALOG_SESSION_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.session_path);

        let search_debounce = Duration::from_millis(parse_or(
            "CATALOG_SEARCH_DEBOUNCE_MS",
            DEFAULT_SEARCH_DEBOUNCE_MS,
        ));

        let page_sizes = PageSizes {
            search: parse_or("CATALOG_SEARCH_PAGE_SIZE", sizes.search),
            movies: parse_or("CATALOG_PAGE_SIZE_MOVIES", sizes.movies),
            crew: parse_or("CATALOG_PAGE_SIZE_CREW", sizes.crew),
            genres: parse_or("CATALOG_PAGE_SIZE_GENRES", sizes.genres),
            comments: parse_or("CATALOG_PAGE_SIZE_COMMENTS", sizes.comments),
        };

        let request_timeout = Duration::from_secs(parse_or("CATALOG_REQUEST_TIMEOUT_SECS", 30));

        let logout_on_unauthorized = parse_or("CATALOG_LOGOUT_ON_UNAUTHORIZED", false);

        let log_level = env::var("CATALOG_LOG_LEVEL").unwrap_or(defaults.log_level);

        Self {
            api_base_url,
            session_path,
            search_debounce,
            page_sizes,
            request_timeout,
            logout_on_unauthorized,
            log_level,
        }
    }
}

/// Read and parse an environment variable, keeping the default when unset or malformed.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}
