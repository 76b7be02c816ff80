//! In-memory record store for tests.
//!
//! Enforces the same per-owner case-insensitive name uniqueness as the
//! database, and can be told to fail upcoming calls.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{NewRecord, RecordStore};
use crate::error::{StoreError, StoreResult};

#[derive(Default)]
struct State {
    records: Vec<NewRecord>,
    pending_insert_failures: usize,
    fail_existing_names: bool,
    insert_attempts: usize,
}

#[derive(Default)]
pub struct MemoryRecordStore {
    state: Mutex<State>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing record named `name` for `owner_id`.
    pub fn with_existing(mut self, owner_id: Uuid, name: &str) -> Self {
        let record = NewRecord {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            description: String::new(),
            company_info: String::new(),
            website: None,
            funding_amount: None,
            funding_round: None,
            funding_date: None,
            investors: Vec::new(),
            location: None,
            industry_tags: Vec::new(),
            source_url: String::new(),
            metadata: serde_json::Value::Null,
            created_at: chrono::Utc::now(),
        };
        self.state.get_mut().records.push(record);
        self
    }

    /// Make the next `count` calls to `insert_batch` fail.
    pub fn failing_inserts(mut self, count: usize) -> Self {
        self.state.get_mut().pending_insert_failures = count;
        self
    }

    /// Make every `existing_names` call fail.
    pub fn failing_existing_names(mut self) -> Self {
        self.state.get_mut().fail_existing_names = true;
        self
    }

    pub async fn records(&self) -> Vec<NewRecord> {
        self.state.lock().await.records.clone()
    }

    pub async fn insert_attempts(&self) -> usize {
        self.state.lock().await.insert_attempts
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn existing_names(&self, owner_id: Uuid) -> StoreResult<Vec<String>> {
        let state = self.state.lock().await;
        if state.fail_existing_names {
            return Err(StoreError::Backend("existing names unavailable".into()));
        }

        Ok(state
            .records
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .map(|r| r.name.clone())
            .collect())
    }

    async fn insert_batch(&self, records: &[NewRecord]) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        state.insert_attempts += 1;

        if state.pending_insert_failures > 0 {
            state.pending_insert_failures -= 1;
            return Err(StoreError::Backend("injected insert failure".into()));
        }

        let mut taken: HashSet<(Uuid, String)> = state
            .records
            .iter()
            .map(|r| (r.owner_id, r.name.to_lowercase()))
            .collect();
        for record in records {
            if !taken.insert((record.owner_id, record.name.to_lowercase())) {
                return Err(StoreError::Backend(format!(
                    "duplicate name for owner: {}",
                    record.name
                )));
            }
        }

        state.records.extend_from_slice(records);
        Ok(records.len() as u64)
    }
}
