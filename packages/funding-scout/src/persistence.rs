//! Idempotent, batched persistence of validated candidates.
//!
//! Names already stored for the owner are loaded once per call. Candidates
//! whose name is known (case-insensitively) are counted as duplicates, and each
//! accepted name joins the known set so repeats inside the run are caught too.
//! New records are written in fixed-size batches, one batch at a time.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::StoreResult;
use crate::extract::CandidateEntity;
use crate::scoring::normalize_name;
use crate::store::{NewRecord, RecordStore};

/// Case-insensitive set of record names owned by one run.
#[derive(Debug, Clone, Default)]
pub struct KnownNames {
    names: HashSet<String>,
}

impl KnownNames {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| normalize_name(n.as_ref()))
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&normalize_name(name))
    }

    /// Add a name. Returns `false` if it was already known.
    pub fn insert(&mut self, name: &str) -> bool {
        self.names.insert(normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A batch that still failed after every retry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub batch: usize,
    pub names: Vec<String>,
    pub attempts: u32,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReport {
    pub saved: usize,
    /// Names written, in insertion order.
    pub saved_names: Vec<String>,
    pub duplicates: usize,
    pub failed: usize,
    pub errors: Vec<BatchFailure>,
}

pub struct Persister<'a, R: RecordStore> {
    store: &'a R,
    batch_size: usize,
    batch_delay: Duration,
    retry_backoff: Duration,
    max_retries: u32,
}

impl<'a, R: RecordStore> Persister<'a, R> {
    pub fn new(store: &'a R, config: &PipelineConfig) -> Self {
        Self {
            store,
            batch_size: config.batch_size.max(1),
            batch_delay: config.batch_delay,
            retry_backoff: config.retry_backoff,
            max_retries: config.max_batch_retries,
        }
    }

    /// Save candidates for `owner_id`.
    ///
    /// Fails only when the existing names cannot be loaded; batch failures are
    /// reported in the returned [`SaveReport`].
    pub async fn save(
        &self,
        candidates: Vec<CandidateEntity>,
        owner_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<SaveReport> {
        let existing = self.store.existing_names(owner_id).await?;
        let mut known = KnownNames::from_names(&existing);

        info!(owner_id = %owner_id, existing = known.len(), candidates = candidates.len(), "Saving candidates");

        let mut report = SaveReport::default();
        let mut records = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !known.insert(&candidate.project_name) {
                info!(name = %candidate.project_name, "Skipping duplicate record");
                report.duplicates += 1;
                continue;
            }
            records.push(NewRecord::from_candidate(candidate, owner_id, now));
        }

        for (index, batch) in records.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
            self.insert_with_retry(index, batch, &mut report).await;
        }

        info!(
            saved = report.saved,
            duplicates = report.duplicates,
            failed = report.failed,
            "Persistence finished"
        );

        Ok(report)
    }

    async fn insert_with_retry(&self, index: usize, batch: &[NewRecord], report: &mut SaveReport) {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.store.insert_batch(batch).await {
                Ok(rows) => {
                    info!(batch = index, rows, "Inserted batch");
                    report.saved += rows as usize;
                    report
                        .saved_names
                        .extend(batch.iter().map(|r| r.name.clone()));
                    return;
                }
                Err(e) if attempts <= self.max_retries => {
                    warn!(
                        batch = index,
                        attempt = attempts,
                        error = %e,
                        backoff_ms = self.retry_backoff.as_millis() as u64,
                        "Batch insert failed, retrying"
                    );
                    if !self.retry_backoff.is_zero() {
                        tokio::time::sleep(self.retry_backoff).await;
                    }
                }
                Err(e) => {
                    error!(batch = index, attempts, error = %e, "Batch insert failed, giving up");
                    report.failed += batch.len();
                    report.errors.push(BatchFailure {
                        batch: index,
                        names: batch.iter().map(|r| r.name.clone()).collect(),
                        attempts,
                        error: e.to_string(),
                    });
                    return;
                }
            }
        }
    }
}
