//! One discovery run: search, dedup, extract, score, persist.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::dedup::deduplicate;
use crate::error::Result;
use crate::extract::{EntityAnalyzer, EntityExtractor};
use crate::persistence::{Persister, SaveReport};
use crate::scoring::{apply_freshness, filter_valid};
use crate::search::{SearchExecutor, SourceStats, WebSearcher};
use crate::sources::{default_sources, SearchSource};
use crate::store::RecordStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchStats {
    /// Hits returned by all sources.
    pub total: usize,
    /// Hits left after dedup.
    pub unique: usize,
    /// Candidates produced by extraction.
    pub processed: usize,
    /// Candidates that passed validation.
    pub valid: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirstResult {
    pub name: String,
    pub source: String,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub message: String,
    /// Records saved, or valid records found in a dry run.
    pub count: usize,
    pub search_stats: SearchStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_result: Option<FirstResult>,
    pub persistence: SaveReport,
    pub rejected: usize,
    pub extraction_failures: usize,
    pub sources: Vec<SourceStats>,
    pub dry_run: bool,
}

/// Response for a run that could not complete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunFailure {
    pub error: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl RunFailure {
    pub fn new(details: impl Into<String>) -> Self {
        Self {
            error: "Funding discovery run failed".to_string(),
            details: details.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Wires the stages together over a searcher, an analyzer and a store.
pub struct Pipeline<W, A, R> {
    searcher: W,
    analyzer: A,
    store: R,
    sources: Vec<SearchSource>,
    config: PipelineConfig,
}

impl<W, A, R> Pipeline<W, A, R>
where
    W: WebSearcher,
    A: EntityAnalyzer,
    R: RecordStore,
{
    /// Pipeline over the built-in sources.
    pub fn new(searcher: W, analyzer: A, store: R, config: PipelineConfig) -> Self {
        Self {
            searcher,
            analyzer,
            store,
            sources: default_sources(),
            config,
        }
    }

    pub fn with_sources(mut self, sources: Vec<SearchSource>) -> Self {
        self.sources = sources;
        self
    }

    pub fn sources(&self) -> &[SearchSource] {
        &self.sources
    }

    pub fn searcher(&self) -> &W {
        &self.searcher
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    pub async fn run(&self, owner_id: Uuid) -> Result<RunSummary> {
        self.run_at(owner_id, Utc::now()).await
    }

    /// Run with a fixed notion of "now" for query windows and freshness.
    pub async fn run_at(&self, owner_id: Uuid, now: DateTime<Utc>) -> Result<RunSummary> {
        let started = Instant::now();
        let config = &self.config;

        info!(
            owner_id = %owner_id,
            sources = self.sources.len(),
            window_days = config.date_window_days,
            dry_run = config.dry_run,
            "Starting funding discovery run"
        );

        let search = SearchExecutor::new(
            &self.searcher,
            config.date_window_days,
            config.source_delay,
            config.request_timeout,
        )
        .execute_all(&self.sources, now)
        .await;
        let total = search.hits.len();

        let dedup = deduplicate(search.hits);
        let unique = dedup.hits.len();
        info!(
            total,
            unique,
            exact_duplicates = dedup.exact_duplicates,
            near_duplicates = dedup.near_duplicates,
            "Deduplicated hits"
        );

        let extraction = EntityExtractor::new(
            &self.analyzer,
            config.extraction_concurrency,
            config.request_timeout,
        )
        .extract_all(dedup.hits)
        .await;
        let processed = extraction.candidates.len();
        let extraction_failures = extraction.failures.len();

        let mut candidates = extraction.candidates;
        apply_freshness(&mut candidates, now);
        let (valid, rejected) = filter_valid(candidates);
        info!(processed, valid = valid.len(), rejected, "Validated candidates");

        let search_stats = SearchStats {
            total,
            unique,
            processed,
            valid: valid.len(),
        };
        let labels: Vec<FirstResult> = valid
            .iter()
            .map(|c| FirstResult {
                name: c.project_name.trim().to_string(),
                source: c.source_name.clone(),
            })
            .collect();

        let (persistence, count, message, first_result) = if config.dry_run {
            let count = valid.len();
            (
                SaveReport::default(),
                count,
                format!("Dry run: found {count} valid funding records"),
                labels.into_iter().next(),
            )
        } else {
            let report = Persister::new(&self.store, config)
                .save(valid, owner_id, now)
                .await?;
            let count = report.saved;
            // First record actually written, not one skipped as a duplicate.
            let first_saved = report
                .saved_names
                .first()
                .and_then(|name| labels.into_iter().find(|label| &label.name == name));
            (
                report,
                count,
                format!("Saved {count} new funding records"),
                first_saved,
            )
        };

        info!(
            count,
            duration_ms = started.elapsed().as_millis() as u64,
            "Funding discovery run finished"
        );

        Ok(RunSummary {
            message,
            count,
            search_stats,
            first_result,
            persistence,
            rejected,
            extraction_failures,
            sources: search.sources,
            dry_run: config.dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_serializes_in_camel_case() {
        let summary = RunSummary {
            message: "Saved 1 new funding records".into(),
            count: 1,
            search_stats: SearchStats { total: 4, unique: 3, processed: 2, valid: 1 },
            first_result: Some(FirstResult { name: "Acme".into(), source: "TechCrunch".into() }),
            persistence: SaveReport { saved: 1, ..Default::default() },
            rejected: 1,
            extraction_failures: 1,
            sources: vec![],
            dry_run: false,
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["searchStats"]["unique"], 3);
        assert_eq!(json["firstResult"]["name"], "Acme");
        assert_eq!(json["extractionFailures"], 1);
        assert_eq!(json["dryRun"], false);
    }

    #[test]
    fn summary_omits_missing_first_result() {
        let summary = RunSummary {
            message: "Saved 0 new funding records".into(),
            count: 0,
            search_stats: SearchStats::default(),
            first_result: None,
            persistence: SaveReport::default(),
            rejected: 0,
            extraction_failures: 0,
            sources: vec![],
            dry_run: true,
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("firstResult").is_none());
    }

    #[test]
    fn failure_has_error_details_and_timestamp() {
        let json = serde_json::to_value(RunFailure::new("SERPER_API_KEY must be set")).unwrap();
        assert_eq!(json["details"], "SERPER_API_KEY must be set");
        assert!(json["error"].is_string());
        assert!(json["timestamp"].is_string());
    }
}
