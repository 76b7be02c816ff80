//! Startup funding discovery pipeline.
//!
//! Searches a registry of weighted news sources, collapses duplicate stories,
//! extracts a structured record per story with a pattern pass and an AI pass,
//! scores and filters the candidates, and persists the new ones.
//!
//! # Usage
//!
//! ```rust,ignore
//! use funding_scout::{Pipeline, PipelineConfig, MemoryRecordStore};
//! use funding_scout::testing::{MockAnalyzer, MockWebSearcher};
//!
//! let pipeline = Pipeline::new(
//!     MockWebSearcher::new(),
//!     MockAnalyzer::new(),
//!     MemoryRecordStore::new(),
//!     PipelineConfig::immediate(),
//! );
//! let summary = pipeline.run(owner_id).await?;
//! println!("{}", summary.message);
//! ```
//!
//! # Modules
//!
//! - [`sources`] - Source registry and query templates
//! - [`search`] - Search provider seam and sequential executor
//! - [`dedup`] - Exact and near-duplicate collapsing
//! - [`extract`] - Pattern and AI extraction, merge
//! - [`scoring`] - Freshness and validity rules
//! - [`store`] - Record store seam (Postgres, in-memory)
//! - [`persistence`] - Batched, idempotent saving
//! - [`pipeline`] - Run orchestration and summary
//! - [`testing`] - Mock implementations for testing

pub mod config;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod persistence;
pub mod pipeline;
pub mod scoring;
pub mod search;
pub mod security;
pub mod sources;
pub mod store;
pub mod testing;

pub use config::{Config, PipelineConfig};
pub use error::{AnalysisError, ConfigError, Result, ScoutError, SearchError, StoreError};
pub use extract::{
    AnalysisResponse, CandidateEntity, EntityAnalyzer, EntityExtractor, ExtractionOutcome,
    OpenAIAnalyzer,
};
pub use persistence::{BatchFailure, KnownNames, Persister, SaveReport};
pub use pipeline::{FirstResult, Pipeline, RunFailure, RunSummary, SearchStats};
pub use search::{RawHit, SearchItem, SerperSearcher, WebSearcher};
pub use security::SecretString;
pub use sources::{default_sources, SearchSource};
pub use store::{MemoryRecordStore, NewRecord, PostgresRecordStore, RecordStore};
