//! Testing utilities including mock implementations.
//!
//! These let the pipeline run end to end without network calls.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use crate::error::{AnalysisError, AnalysisResult, SearchError, SearchResult};
use crate::extract::{AnalysisMetadata, AnalysisRequest, AnalysisResponse, CandidateEntity, EntityAnalyzer, NameSource};
use crate::search::{SearchItem, WebSearcher};

/// Mock web searcher with canned items per query.
#[derive(Default)]
pub struct MockWebSearcher {
    items: RwLock<HashMap<String, Vec<SearchItem>>>,
    failures: RwLock<HashSet<String>>,
    delays: RwLock<HashMap<String, Duration>>,
    queries: RwLock<Vec<String>>,
}

impl MockWebSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `items` for `query`.
    pub fn with_items(self, query: &str, items: Vec<SearchItem>) -> Self {
        self.items.write().unwrap().insert(query.to_string(), items);
        self
    }

    /// Fail every search for `query`.
    pub fn with_failure(self, query: &str) -> Self {
        self.failures.write().unwrap().insert(query.to_string());
        self
    }

    /// Sleep this long before answering `query`.
    pub fn with_delay(self, query: &str, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(query.to_string(), delay);
        self
    }

    /// Queries received, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.read().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for MockWebSearcher {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        _headers: &[(String, String)],
    ) -> SearchResult<Vec<SearchItem>> {
        self.queries.write().unwrap().push(query.to_string());

        let delay = self.delays.read().unwrap().get(query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failures.read().unwrap().contains(query) {
            return Err(SearchError::Status {
                status: 503,
                body: "mock outage".into(),
            });
        }

        let mut items = self
            .items
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default();
        items.truncate(max_results);
        Ok(items)
    }
}

/// Mock analyzer keyed by hit link.
///
/// Links without a configured response get `Ok(None)`.
#[derive(Default)]
pub struct MockAnalyzer {
    responses: RwLock<HashMap<String, AnalysisResponse>>,
    failures: RwLock<HashSet<String>>,
    delay: Option<Duration>,
    calls: RwLock<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, link: &str, response: AnalysisResponse) -> Self {
        self.responses.write().unwrap().insert(link.to_string(), response);
        self
    }

    /// Return an API error for `link`.
    pub fn with_failure(self, link: &str) -> Self {
        self.failures.write().unwrap().insert(link.to_string());
        self
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Links analyzed, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Highest number of analyses that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityAnalyzer for MockAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult<Option<AnalysisResponse>> {
        self.calls.write().unwrap().push(request.link.clone());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failures.read().unwrap().contains(&request.link) {
            return Err(AnalysisError::Api("mock failure".into()));
        }

        Ok(self.responses.read().unwrap().get(&request.link).cloned())
    }
}

/// A valid candidate with the given name.
pub fn candidate_named(name: &str) -> CandidateEntity {
    let slug = name.to_lowercase().replace(' ', "-");
    CandidateEntity {
        project_name: name.to_string(),
        description: format!(
            "{name} builds workflow software for logistics teams and just closed a new funding round to expand."
        ),
        company_info: format!("{name} Inc."),
        official_website: Some(format!("https://{slug}.com")),
        funding_amount: Some("$5M".into()),
        funding_round: Some("seed".into()),
        funding_date: None,
        investors: vec!["XYZ Ventures".into()],
        location: Some("Austin, Texas".into()),
        industry_tags: vec!["SaaS".into()],
        source_url: format!("https://news.example.com/{slug}"),
        source_name: "Example News".into(),
        source_title: format!("{name} raises $5M seed round"),
        source_date: None,
        source_weight: 1.0,
        confidence_score: 0.7,
        freshness_score: 0.0,
        analysis_metadata: AnalysisMetadata {
            processing_time_ms: 0,
            name_source: NameSource::Ai,
            processing_steps: Vec::new(),
            ai_metadata: None,
        },
        extra: serde_json::Map::new(),
    }
}
