//! Entity extraction: pattern pass plus AI pass, merged per hit.
//!
//! Hits are processed concurrently up to a fixed number in flight. A hit whose
//! AI call fails is excluded and reported; everything else becomes a
//! [`CandidateEntity`].

pub mod analysis;
pub mod merge;
pub mod openai;
pub mod patterns;

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::search::RawHit;

pub use analysis::{AnalysisRequest, AnalysisResponse, EntityAnalyzer};
pub use merge::merge_entity;
pub use openai::OpenAIAnalyzer;
pub use patterns::{extract_patterns, PatternExtraction};

/// Where the candidate's name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NameSource {
    Ai,
    Pattern,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStep {
    pub step: String,
    pub status: StepStatus,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProcessingStep {
    fn new(step: &str, status: StepStatus, elapsed: Duration) -> Self {
        Self {
            step: step.to_string(),
            status,
            duration_ms: elapsed.as_millis() as u64,
            detail: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// How a candidate was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub processing_time_ms: u64,
    pub name_source: NameSource,
    pub processing_steps: Vec<ProcessingStep>,
    /// Notes returned by the analysis service, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_metadata: Option<serde_json::Value>,
}

/// A merged, scored, not yet persisted funding record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateEntity {
    pub project_name: String,
    pub description: String,
    pub company_info: String,
    pub official_website: Option<String>,
    pub funding_amount: Option<String>,
    pub funding_round: Option<String>,
    pub funding_date: Option<String>,
    pub investors: Vec<String>,
    pub location: Option<String>,
    pub industry_tags: Vec<String>,
    pub source_url: String,
    pub source_name: String,
    pub source_title: String,
    pub source_date: Option<DateTime<Utc>>,
    pub source_weight: f64,
    pub confidence_score: f64,
    pub freshness_score: f64,
    pub analysis_metadata: AnalysisMetadata,
    /// Search provider fields carried through to the record metadata.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A hit dropped because its analysis call failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionFailure {
    pub link: String,
    pub source_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    /// Highest source weight first.
    pub candidates: Vec<CandidateEntity>,
    pub failures: Vec<ExtractionFailure>,
}

/// Runs both passes over every hit with bounded concurrency.
pub struct EntityExtractor<'a, A: EntityAnalyzer> {
    analyzer: &'a A,
    concurrency: usize,
    analysis_timeout: Duration,
}

impl<'a, A: EntityAnalyzer> EntityExtractor<'a, A> {
    pub fn new(analyzer: &'a A, concurrency: usize, analysis_timeout: Duration) -> Self {
        Self {
            analyzer,
            concurrency: concurrency.max(1),
            analysis_timeout,
        }
    }

    /// Extract every hit.
    ///
    /// The output order depends only on the input, never on which analysis
    /// call finished first.
    pub async fn extract_all(&self, hits: Vec<RawHit>) -> ExtractionOutcome {
        let total = hits.len();
        let semaphore = Semaphore::new(self.concurrency);
        let semaphore = &semaphore;

        info!(hits = total, concurrency = self.concurrency, "Extracting entities");

        let tasks = hits.into_iter().map(|hit| async move {
            let _permit = semaphore.acquire().await.ok();
            self.extract_one(hit).await
        });
        let results = join_all(tasks).await;

        let mut outcome = ExtractionOutcome::default();
        for result in results {
            match result {
                Ok(candidate) => outcome.candidates.push(candidate),
                Err(failure) => outcome.failures.push(failure),
            }
        }
        outcome
            .candidates
            .sort_by(|a, b| b.source_weight.total_cmp(&a.source_weight));

        info!(
            candidates = outcome.candidates.len(),
            failures = outcome.failures.len(),
            "Entity extraction finished"
        );

        outcome
    }

    /// Extract a single hit.
    pub async fn extract_one(&self, hit: RawHit) -> Result<CandidateEntity, ExtractionFailure> {
        let started = Instant::now();
        let mut steps = Vec::with_capacity(3);

        let step_start = Instant::now();
        let patterns = extract_patterns(&hit.title, &hit.snippet, &hit.link);
        steps.push(ProcessingStep::new("patterns", StepStatus::Success, step_start.elapsed()));

        let step_start = Instant::now();
        let request = AnalysisRequest::from_hit(&hit);
        let analysis =
            match tokio::time::timeout(self.analysis_timeout, self.analyzer.analyze(&request)).await
            {
                Ok(Ok(analysis)) => analysis,
                Ok(Err(e)) => return Err(self.failure(&hit, e.to_string())),
                Err(_) => return Err(self.failure(&hit, "analysis timed out".to_string())),
            };
        let analysis_step = match &analysis {
            Some(_) => ProcessingStep::new("analysis", StepStatus::Success, step_start.elapsed()),
            None => ProcessingStep::new("analysis", StepStatus::Skipped, step_start.elapsed())
                .with_detail("no usable response"),
        };
        steps.push(analysis_step);

        let step_start = Instant::now();
        let mut candidate = merge_entity(&hit, patterns, analysis.as_ref());
        steps.push(ProcessingStep::new("merge", StepStatus::Success, step_start.elapsed()));

        candidate.analysis_metadata.processing_steps = steps;
        candidate.analysis_metadata.processing_time_ms = started.elapsed().as_millis() as u64;

        debug!(
            name = %candidate.project_name,
            name_source = ?candidate.analysis_metadata.name_source,
            confidence = candidate.confidence_score,
            link = %candidate.source_url,
            "Extracted candidate"
        );

        Ok(candidate)
    }

    fn failure(&self, hit: &RawHit, error: String) -> ExtractionFailure {
        warn!(link = %hit.link, source = %hit.source_name, error = %error, "Extraction failed, skipping hit");
        ExtractionFailure {
            link: hit.link.clone(),
            source_name: hit.source_name.clone(),
            error,
        }
    }
}
