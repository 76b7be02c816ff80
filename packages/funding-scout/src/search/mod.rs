//! Search execution: one query per source against a keyword search API.
//!
//! The [`WebSearcher`] trait abstracts the provider; [`SearchExecutor`] wraps it
//! with the run's failure isolation and rate limiting, and normalizes raw items
//! into [`RawHit`]s.

pub mod dates;
pub mod executor;
pub mod serper;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SearchResult;

pub use dates::normalize_published_date;
pub use executor::{SearchExecutor, SearchOutcome, SourceStats};
pub use serper::SerperSearcher;

/// One ranked item as returned by the search provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub link: String,

    #[serde(default)]
    pub snippet: String,

    /// Publish date in whatever format the provider uses.
    #[serde(default)]
    pub date: Option<String>,

    /// Provider fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SearchItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            ..Default::default()
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

/// A normalized search hit tagged with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
    pub published_at: Option<DateTime<Utc>>,
    pub published_raw: Option<String>,
    pub weight: f64,
    pub source_name: String,
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RawHit {
    /// Build a hit directly (tests and replays).
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
        weight: f64,
        source_name: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
            published_at: None,
            published_raw: None,
            weight,
            source_name: source_name.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Keyword search provider.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Run one query and return ranked items.
    ///
    /// `headers` are source-specific extras sent along with the request.
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        headers: &[(String, String)],
    ) -> SearchResult<Vec<SearchItem>>;
}
