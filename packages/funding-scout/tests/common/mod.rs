//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use funding_scout::testing::{MockAnalyzer, MockWebSearcher};
use funding_scout::{SearchItem, SearchSource};

pub const ACME_SNIPPET: &str = "Acme, an AI-powered SaaS startup based in Austin, Texas, raised $5 million in seed funding led by XYZ Ventures to expand its invoicing platform for small businesses. Visit acme.io for more.";

pub const ACME_SYNDICATED_SNIPPET: &str = "Acme, an AI-powered SaaS startup based in Austin, Texas, raised $5 million in seed funding led by XYZ Ventures to expand its invoicing platform for small businesses. Visit acme.io to learn more.";

pub const BETA_SNIPPET: &str = "Beta Robotics, a Boston-based robotics company, closed a $12 million Series A led by Gamma Capital with participation from Delta Partners. The company builds autonomous warehouse pickers.";

pub const ROUNDUP_SNIPPET: &str = "This week in AI: ten startups raised money across seed and Series A rounds, including several SaaS companies with ambitious expansion plans.";

pub const COBALT_LINK: &str = "https://techcrunch.com/2024/06/13/cobalt";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 2024-06-15 12:00 UTC; with a 7 day window queries ask for `after:2024-06-08`.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

pub fn sources() -> Vec<SearchSource> {
    vec![
        SearchSource::builder()
            .name("TechCrunch")
            .query_template("tc funding after:{after}")
            .weight(1.6)
            .build(),
        SearchSource::builder()
            .name("VentureBeat")
            .query_template("vb funding after:{after}")
            .weight(1.3)
            .build(),
    ]
}

/// Six hits across two sources: one exact duplicate link, one syndicated
/// near-duplicate, one roundup, one hit whose analysis fails.
pub fn searcher() -> MockWebSearcher {
    MockWebSearcher::new()
        .with_items(
            "tc funding after:2024-06-08",
            vec![
                SearchItem::new("Acme raises $5M seed round", "https://techcrunch.com/2024/06/14/acme")
                    .with_snippet(ACME_SNIPPET)
                    .with_date("1 day ago"),
                SearchItem::new("Weekly AI Roundup | Funding news", "https://techcrunch.com/2024/06/14/roundup")
                    .with_snippet(ROUNDUP_SNIPPET)
                    .with_date("2024-06-14"),
                SearchItem::new("Cobalt secures $3M pre-seed", COBALT_LINK)
                    .with_snippet("Cobalt, a fintech startup, secured $3 million in pre-seed funding.")
                    .with_date("2 days ago"),
            ],
        )
        .with_items(
            "vb funding after:2024-06-08",
            vec![
                SearchItem::new("Acme Raises $5 Million in Seed Funding", "https://venturebeat.com/acme-seed")
                    .with_snippet(ACME_SYNDICATED_SNIPPET)
                    .with_date("Jun 14, 2024"),
                SearchItem::new("Beta Robotics lands $12M Series A", "https://venturebeat.com/beta-robotics")
                    .with_snippet(BETA_SNIPPET)
                    .with_date("3 days ago"),
                SearchItem::new("Beta Robotics lands $12M Series A", "https://venturebeat.com/beta-robotics")
                    .with_snippet(BETA_SNIPPET),
            ],
        )
}

pub fn analyzer() -> MockAnalyzer {
    MockAnalyzer::new().with_failure(COBALT_LINK)
}
