//! Datastore seam for funding records.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::extract::CandidateEntity;

pub use memory::MemoryRecordStore;
pub use postgres::PostgresRecordStore;

/// A row ready to be inserted into `funding_records`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NewRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub company_info: String,
    pub website: Option<String>,
    pub funding_amount: Option<String>,
    pub funding_round: Option<String>,
    pub funding_date: Option<String>,
    pub investors: Vec<String>,
    pub location: Option<String>,
    pub industry_tags: Vec<String>,
    pub source_url: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl NewRecord {
    /// Build the row for a validated candidate.
    ///
    /// Provenance, scores and any passthrough fields from the search provider go
    /// into `metadata`.
    pub fn from_candidate(candidate: CandidateEntity, owner_id: Uuid, now: DateTime<Utc>) -> Self {
        let metadata = json!({
            "source": {
                "name": candidate.source_name,
                "title": candidate.source_title,
                "date": candidate.source_date,
                "weight": candidate.source_weight,
            },
            "scores": {
                "confidence": candidate.confidence_score,
                "freshness": candidate.freshness_score,
            },
            "analysis": candidate.analysis_metadata,
            "passthrough": candidate.extra,
        });

        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: candidate.project_name.trim().to_string(),
            description: candidate.description,
            company_info: candidate.company_info,
            website: candidate.official_website,
            funding_amount: candidate.funding_amount,
            funding_round: candidate.funding_round,
            funding_date: candidate.funding_date,
            investors: candidate.investors,
            location: candidate.location,
            industry_tags: candidate.industry_tags,
            source_url: candidate.source_url,
            metadata,
            created_at: now,
        }
    }
}

/// Where records live.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Names of every record the owner already has.
    async fn existing_names(&self, owner_id: Uuid) -> StoreResult<Vec<String>>;

    /// Insert all records atomically. Returns the number of rows written.
    async fn insert_batch(&self, records: &[NewRecord]) -> StoreResult<u64>;
}
