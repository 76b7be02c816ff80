//! Configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use uuid::Uuid;

use crate::error::ConfigError;
use crate::security::SecretString;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Only needed when records are saved; dry runs never connect.
    pub database_url: Option<String>,
    pub serper_api_key: SecretString,
    /// Overrides the Serper endpoint (proxies, local stubs)
    pub serper_base_url: Option<String>,
    pub openai_api_key: SecretString,
    pub openai_model: String,
    /// Overrides the OpenAI endpoint (Azure, proxies)
    pub openai_base_url: Option<String>,
    /// Owner the discovered records are persisted under
    pub owner_id: Uuid,
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing API keys are fatal: the run must not start without them.
    /// `DATABASE_URL` is checked later by [`Config::require_database_url`].
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        let _ = dotenv();

        let database_url = optional("DATABASE_URL");
        let serper_api_key = SecretString::new(required("SERPER_API_KEY")?);
        let openai_api_key = SecretString::new(required("OPENAI_API_KEY")?);

        let owner_id = match env::var("SCOUT_OWNER_ID") {
            Ok(raw) => Uuid::parse_str(raw.trim()).map_err(|e| ConfigError::Invalid {
                name: "SCOUT_OWNER_ID",
                reason: e.to_string(),
            })?,
            Err(_) => Uuid::nil(),
        };

        let defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            date_window_days: parsed("SCOUT_DATE_WINDOW_DAYS", defaults.date_window_days)?,
            batch_size: parsed("SCOUT_BATCH_SIZE", defaults.batch_size)?,
            extraction_concurrency: parsed(
                "SCOUT_EXTRACTION_CONCURRENCY",
                defaults.extraction_concurrency,
            )?,
            request_timeout: Duration::from_secs(parsed(
                "SCOUT_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            ..defaults
        };

        Ok(Self {
            database_url,
            serper_api_key,
            serper_base_url: optional("SERPER_BASE_URL"),
            openai_api_key,
            openai_model: optional("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_base_url: optional("OPENAI_BASE_URL"),
            owner_id,
            pipeline,
        })
    }

    /// The database URL, for runs that persist records.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parsed<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Tuning knobs for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Queries only look back this many days.
    ///
    /// Default: 7.
    pub date_window_days: i64,

    /// Pause between consecutive source searches (rate limit courtesy).
    ///
    /// Default: 1s.
    pub source_delay: Duration,

    /// Upper bound on concurrent AI analysis calls.
    ///
    /// Default: 8.
    pub extraction_concurrency: usize,

    /// Records per insert batch.
    ///
    /// Default: 3.
    pub batch_size: usize,

    /// Pause between consecutive insert batches.
    ///
    /// Default: 2s.
    pub batch_delay: Duration,

    /// Wait before retrying a failed batch.
    ///
    /// Default: 5s.
    pub retry_backoff: Duration,

    /// Retries per failed batch before it is reported as failed.
    ///
    /// Default: 3.
    pub max_batch_retries: u32,

    /// Timeout applied to every external HTTP call.
    ///
    /// Default: 15s.
    pub request_timeout: Duration,

    /// Run every stage except persistence.
    pub dry_run: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            date_window_days: 7,
            source_delay: Duration::from_secs(1),
            extraction_concurrency: 8,
            batch_size: 3,
            batch_delay: Duration::from_secs(2),
            retry_backoff: Duration::from_secs(5),
            max_batch_retries: 3,
            request_timeout: Duration::from_secs(15),
            dry_run: false,
        }
    }
}

impl PipelineConfig {
    /// Config with every delay set to zero, for tests.
    pub fn immediate() -> Self {
        Self {
            source_delay: Duration::ZERO,
            batch_delay: Duration::ZERO,
            retry_backoff: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_date_window_days(mut self, days: i64) -> Self {
        self.date_window_days = days;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_extraction_concurrency(mut self, concurrency: usize) -> Self {
        self.extraction_concurrency = concurrency.max(1);
        self
    }

    pub fn with_max_batch_retries(mut self, retries: u32) -> Self {
        self.max_batch_retries = retries;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
