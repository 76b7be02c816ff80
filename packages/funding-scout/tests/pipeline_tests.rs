//! End-to-end runs over mock search and analysis services.

mod common;

use common::{analyzer, init_tracing, now, searcher, sources};
use funding_scout::testing::MockAnalyzer;
use funding_scout::{
    AnalysisResponse, MemoryRecordStore, Pipeline, PipelineConfig, ScoutError,
};
use uuid::Uuid;

#[tokio::test]
async fn full_run_saves_novel_valid_records() {
    init_tracing();
    let owner = Uuid::new_v4();
    let pipeline = Pipeline::new(searcher(), analyzer(), MemoryRecordStore::new(), PipelineConfig::immediate())
        .with_sources(sources());

    let summary = pipeline.run_at(owner, now()).await.unwrap();

    assert_eq!(summary.search_stats.total, 6);
    assert_eq!(summary.search_stats.unique, 4);
    assert_eq!(summary.search_stats.processed, 3);
    assert_eq!(summary.search_stats.valid, 2);
    assert_eq!(summary.extraction_failures, 1);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.count, 2);
    assert_eq!(summary.persistence.saved, 2);
    assert_eq!(summary.persistence.duplicates, 0);
    assert!(summary.persistence.errors.is_empty());
    assert!(!summary.dry_run);

    let first = summary.first_result.unwrap();
    assert_eq!(first.name, "Acme");
    assert_eq!(first.source, "TechCrunch");

    let hits: Vec<_> = summary.sources.iter().map(|s| (s.name.as_str(), s.hits)).collect();
    assert_eq!(hits, vec![("TechCrunch", 3), ("VentureBeat", 3)]);

    // Only the unique hits reach the analyzer.
    assert_eq!(pipeline.analyzer().calls().len(), 4);
}

#[tokio::test]
async fn syndicated_story_collapses_to_heavier_source() {
    let owner = Uuid::new_v4();
    let pipeline = Pipeline::new(searcher(), analyzer(), MemoryRecordStore::new(), PipelineConfig::immediate())
        .with_sources(sources());

    pipeline.run_at(owner, now()).await.unwrap();

    let records = pipeline.store().records().await;
    let acme: Vec<_> = records.iter().filter(|r| r.name == "Acme").collect();
    assert_eq!(acme.len(), 1);

    let acme = acme[0];
    assert_eq!(acme.funding_round.as_deref(), Some("seed"));
    assert_eq!(acme.investors, vec!["XYZ Ventures"]);
    assert_eq!(acme.website.as_deref(), Some("https://acme.io"));
    assert_eq!(acme.source_url, "https://techcrunch.com/2024/06/14/acme");
    assert_eq!(acme.metadata["source"]["weight"], 1.6);
    assert_eq!(acme.metadata["source"]["name"], "TechCrunch");
    assert_eq!(acme.owner_id, owner);
}

#[tokio::test]
async fn existing_name_in_other_case_is_not_saved_again() {
    let owner = Uuid::new_v4();
    let store = MemoryRecordStore::new().with_existing(owner, "ACME");
    let pipeline = Pipeline::new(searcher(), analyzer(), store, PipelineConfig::immediate())
        .with_sources(sources());

    let summary = pipeline.run_at(owner, now()).await.unwrap();

    assert_eq!(summary.persistence.saved, 1);
    assert_eq!(summary.persistence.duplicates, 1);

    let first = summary.first_result.unwrap();
    assert_eq!(first.name, "Beta Robotics");
    assert_eq!(first.source, "VentureBeat");

    let names: Vec<_> = pipeline.store().records().await.into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["ACME", "Beta Robotics"]);
}

#[tokio::test]
async fn ai_answer_overrides_pattern_fields() {
    let owner = Uuid::new_v4();
    let analyzer = analyzer().with_response(
        "https://venturebeat.com/beta-robotics",
        AnalysisResponse {
            project_name: Some("Beta Robotics Inc".into()),
            project_description: Some(
                "Beta Robotics builds autonomous picking robots for warehouses and raised a Series A.".into(),
            ),
            official_website: Some("https://betarobotics.com".into()),
            company_name: Some("Beta Robotics Inc".into()),
            confidence_score: Some(0.88),
            ..Default::default()
        },
    );
    let pipeline = Pipeline::new(searcher(), analyzer, MemoryRecordStore::new(), PipelineConfig::immediate())
        .with_sources(sources());

    pipeline.run_at(owner, now()).await.unwrap();

    let records = pipeline.store().records().await;
    let beta = records.iter().find(|r| r.name == "Beta Robotics Inc").unwrap();
    assert_eq!(beta.website.as_deref(), Some("https://betarobotics.com"));
    assert_eq!(beta.metadata["scores"]["confidence"], 0.88);
    assert_eq!(beta.investors, vec!["Gamma Capital", "Delta Partners"]);
    assert_eq!(beta.funding_round.as_deref(), Some("series a"));
}

#[tokio::test]
async fn dry_run_leaves_store_untouched() {
    let owner = Uuid::new_v4();
    let config = PipelineConfig::immediate().with_dry_run(true);
    let pipeline = Pipeline::new(searcher(), analyzer(), MemoryRecordStore::new(), config)
        .with_sources(sources());

    let summary = pipeline.run_at(owner, now()).await.unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.count, 2);
    assert_eq!(summary.first_result.unwrap().name, "Acme");
    assert_eq!(summary.persistence.saved, 0);
    assert!(pipeline.store().records().await.is_empty());
    assert_eq!(pipeline.store().insert_attempts().await, 0);
}

#[tokio::test]
async fn queries_use_the_date_window_in_registry_order() {
    let pipeline = Pipeline::new(searcher(), analyzer(), MemoryRecordStore::new(), PipelineConfig::immediate())
        .with_sources(sources());

    pipeline.run_at(Uuid::new_v4(), now()).await.unwrap();

    assert_eq!(
        pipeline.searcher().queries(),
        vec!["tc funding after:2024-06-08", "vb funding after:2024-06-08"]
    );
}

#[tokio::test]
async fn failing_search_provider_still_produces_a_summary() {
    let searcher = funding_scout::testing::MockWebSearcher::new()
        .with_failure("tc funding after:2024-06-08")
        .with_failure("vb funding after:2024-06-08");
    let pipeline = Pipeline::new(searcher, MockAnalyzer::new(), MemoryRecordStore::new(), PipelineConfig::immediate())
        .with_sources(sources());

    let summary = pipeline.run_at(Uuid::new_v4(), now()).await.unwrap();

    assert_eq!(summary.count, 0);
    assert_eq!(summary.search_stats.total, 0);
    assert!(summary.first_result.is_none());
    assert!(pipeline.analyzer().calls().is_empty());
}

#[tokio::test]
async fn unreadable_existing_names_fail_the_run() {
    let store = MemoryRecordStore::new().failing_existing_names();
    let pipeline = Pipeline::new(searcher(), analyzer(), store, PipelineConfig::immediate())
        .with_sources(sources());

    let result = pipeline.run_at(Uuid::new_v4(), now()).await;

    assert!(matches!(result, Err(ScoutError::Storage(_))));
}

#[tokio::test]
async fn persistent_batch_failure_is_reported_not_fatal() {
    let store = MemoryRecordStore::new().failing_inserts(10);
    let config = PipelineConfig::immediate().with_max_batch_retries(3);
    let pipeline = Pipeline::new(searcher(), analyzer(), store, config).with_sources(sources());

    let summary = pipeline.run_at(Uuid::new_v4(), now()).await.unwrap();

    assert_eq!(summary.persistence.saved, 0);
    assert_eq!(summary.persistence.failed, 2);
    assert_eq!(summary.persistence.errors.len(), 1);
    assert_eq!(summary.persistence.errors[0].attempts, 4);
    assert_eq!(pipeline.store().insert_attempts().await, 4);
    assert!(summary.first_result.is_none());
}
