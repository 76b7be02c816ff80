// Entry point for a single discovery run

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use funding_scout::{
    Config, MemoryRecordStore, OpenAIAnalyzer, Pipeline, PostgresRecordStore, RecordStore,
    RunFailure, RunSummary, SerperSearcher,
};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Discover new startup funding records and save them.
#[derive(Debug, Parser)]
#[command(name = "funding-scout", version)]
struct Args {
    /// Owner to save records under (overrides SCOUT_OWNER_ID)
    #[arg(long)]
    owner_id: Option<Uuid>,

    /// Look back this many days (overrides SCOUT_DATE_WINDOW_DAYS)
    #[arg(long)]
    days: Option<i64>,

    /// Records per insert batch (overrides SCOUT_BATCH_SIZE)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Run every stage except saving
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the run result
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,funding_scout=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(summary) => {
            print_json(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Run failed");
            print_json(&RunFailure::new(format!("{e:#}")));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<RunSummary> {
    let mut config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    if let Some(days) = args.days {
        config.pipeline = config.pipeline.with_date_window_days(days);
    }
    if let Some(batch_size) = args.batch_size {
        config.pipeline = config.pipeline.with_batch_size(batch_size);
    }
    config.pipeline = config.pipeline.with_dry_run(args.dry_run);
    let owner_id = args.owner_id.unwrap_or(config.owner_id);

    if config.pipeline.dry_run {
        tracing::info!("Dry run, records will not be saved");
        return execute(&config, MemoryRecordStore::new(), owner_id).await;
    }

    let database_url = config.require_database_url()?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(config.pipeline.request_timeout)
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    let store = PostgresRecordStore::new(pool);
    store.migrate().await.context("Failed to run migrations")?;
    tracing::info!("Database ready");

    execute(&config, store, owner_id).await
}

async fn execute<R: RecordStore>(config: &Config, store: R, owner_id: Uuid) -> Result<RunSummary> {
    let timeout = config.pipeline.request_timeout;
    let mut searcher = SerperSearcher::new(config.serper_api_key.clone(), timeout)?;
    if let Some(url) = &config.serper_base_url {
        searcher = searcher.with_base_url(url);
    }

    let mut analyzer =
        OpenAIAnalyzer::new(config.openai_api_key.clone(), &config.openai_model, timeout)?;
    if let Some(url) = &config.openai_base_url {
        analyzer = analyzer.with_base_url(url);
    }
    tracing::info!(model = analyzer.model(), "Analyzer ready");

    let pipeline = Pipeline::new(searcher, analyzer, store, config.pipeline.clone());
    let summary = pipeline
        .run(owner_id)
        .await
        .context("Discovery run failed")?;

    Ok(summary)
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Failed to serialize run result"),
    }
}
