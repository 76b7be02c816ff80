//! Typed errors for the discovery pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so each stage can decide
//! which failures it recovers from locally and which abort the run.

use thiserror::Error;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum ScoutError {
    /// Missing or malformed configuration
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Datastore failure that the run cannot recover from
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Configuration errors. These are the only fatal class besides storage.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("{0} must be set")]
    Missing(&'static str),

    /// An environment variable has an unusable value
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Errors from the external keyword search API.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Connection failed or request timed out
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Non-2xx response
    #[error("search API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("failed to parse search response: {0}")]
    Parse(String),
}

/// Errors from the AI analysis service.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Connection failed
    #[error("network error: {0}")]
    Network(String),

    /// The call exceeded its timeout
    #[error("analysis timed out")]
    Timeout,

    /// Non-2xx response, rate limit, invalid request
    #[error("API error: {0}")]
    Api(String),

    /// The model answered with something that is not the expected JSON
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Datastore errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database driver error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Backend-specific failure (used by the in-memory store)
    #[error("{0}")]
    Backend(String),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for search operations.
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Result type alias for analysis operations.
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

/// Result type alias for datastore operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
