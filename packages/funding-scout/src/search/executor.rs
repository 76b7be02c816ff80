//! Sequential, failure-isolated execution of the source registry.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::{normalize_published_date, RawHit, SearchItem, WebSearcher};
use crate::sources::SearchSource;

/// Hits returned by one source in a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceStats {
    pub name: String,
    pub hits: usize,
}

/// All hits of a run plus per-source counts.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub hits: Vec<RawHit>,
    pub sources: Vec<SourceStats>,
}

/// Runs one query per source.
///
/// Sources are searched one after another with a fixed pause in between to
/// respect third-party rate limits. A failing or timed out source contributes
/// zero hits.
pub struct SearchExecutor<'a, W: WebSearcher> {
    searcher: &'a W,
    window_days: i64,
    source_delay: Duration,
    search_timeout: Duration,
}

impl<'a, W: WebSearcher> SearchExecutor<'a, W> {
    pub fn new(
        searcher: &'a W,
        window_days: i64,
        source_delay: Duration,
        search_timeout: Duration,
    ) -> Self {
        Self {
            searcher,
            window_days,
            source_delay,
            search_timeout,
        }
    }

    /// Search a single source. Never fails; errors are logged and yield no hits.
    pub async fn execute(&self, source: &SearchSource, now: DateTime<Utc>) -> Vec<RawHit> {
        let query = source.build_query(now, self.window_days);

        info!(source = %source.name, query = %query, "Running source search");

        let search = self
            .searcher
            .search(&query, source.max_results, &source.headers);
        let items = match tokio::time::timeout(self.search_timeout, search).await {
            Ok(Ok(items)) => items,
            Ok(Err(e)) => {
                warn!(source = %source.name, error = %e, "Search failed, skipping source");
                return Vec::new();
            }
            Err(_) => {
                warn!(
                    source = %source.name,
                    timeout_ms = self.search_timeout.as_millis() as u64,
                    "Search timed out, skipping source"
                );
                return Vec::new();
            }
        };

        let hits: Vec<RawHit> = items
            .into_iter()
            .filter(|item| !item.link.trim().is_empty())
            .map(|item| normalize_item(item, source, now))
            .collect();

        info!(source = %source.name, hits = hits.len(), "Source search returned hits");

        hits
    }

    /// Search every source sequentially.
    pub async fn execute_all(&self, sources: &[SearchSource], now: DateTime<Utc>) -> SearchOutcome {
        let mut outcome = SearchOutcome::default();

        for (i, source) in sources.iter().enumerate() {
            if i > 0 && !self.source_delay.is_zero() {
                tokio::time::sleep(self.source_delay).await;
            }

            let hits = self.execute(source, now).await;
            outcome.sources.push(SourceStats {
                name: source.name.clone(),
                hits: hits.len(),
            });
            outcome.hits.extend(hits);
        }

        outcome
    }
}

fn normalize_item(item: SearchItem, source: &SearchSource, now: DateTime<Utc>) -> RawHit {
    let published_at = item
        .date
        .as_deref()
        .and_then(|raw| normalize_published_date(raw, now));

    RawHit {
        title: item.title.trim().to_string(),
        link: item.link.trim().to_string(),
        snippet: item.snippet.trim().to_string(),
        published_at,
        published_raw: item.date,
        weight: source.weight,
        source_name: source.name.clone(),
        extra: item.extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockWebSearcher;
    use chrono::TimeZone;

    fn source(name: &str, weight: f64) -> SearchSource {
        SearchSource::builder()
            .name(name)
            .query_template(format!("{name} after:{{after}}"))
            .weight(weight)
            .build()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    const TIMEOUT: Duration = Duration::from_secs(15);

    #[tokio::test]
    async fn attaches_source_weight_and_name() {
        let searcher = MockWebSearcher::new().with_items(
            "alpha after:2024-06-08",
            vec![SearchItem::new("Acme raises", "https://a.com/1").with_date("2 days ago")],
        );
        let executor = SearchExecutor::new(&searcher, 7, Duration::ZERO, TIMEOUT);

        let hits = executor.execute(&source("alpha", 1.6), now()).await;

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].weight, 1.6);
        assert_eq!(hits[0].source_name, "alpha");
        assert_eq!(hits[0].published_at, Some(now() - chrono::Duration::days(2)));
    }

    #[tokio::test]
    async fn failing_source_yields_no_hits_and_run_continues() {
        let searcher = MockWebSearcher::new()
            .with_failure("broken after:2024-06-08")
            .with_items(
                "healthy after:2024-06-08",
                vec![SearchItem::new("Beta lands seed", "https://b.com/1")],
            );
        let executor = SearchExecutor::new(&searcher, 7, Duration::ZERO, TIMEOUT);

        let outcome = executor
            .execute_all(&[source("broken", 2.0), source("healthy", 1.0)], now())
            .await;

        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(
            outcome.sources,
            vec![
                SourceStats { name: "broken".into(), hits: 0 },
                SourceStats { name: "healthy".into(), hits: 1 },
            ]
        );
        assert_eq!(searcher.queries().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sources_are_spaced_by_the_delay() {
        let searcher = MockWebSearcher::new();
        let executor = SearchExecutor::new(&searcher, 7, Duration::from_secs(1), TIMEOUT);

        let started = tokio::time::Instant::now();
        executor
            .execute_all(&[source("a", 1.0), source("b", 1.0), source("c", 1.0)], now())
            .await;
        let elapsed = started.elapsed();

        // Two gaps, none after the last source.
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3));
        assert_eq!(searcher.queries().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out_and_run_continues() {
        let searcher = MockWebSearcher::new()
            .with_delay("slow after:2024-06-08", Duration::from_secs(60))
            .with_items(
                "fast after:2024-06-08",
                vec![SearchItem::new("Beta lands seed", "https://b.com/1")],
            );
        let executor = SearchExecutor::new(&searcher, 7, Duration::ZERO, Duration::from_secs(5));

        let outcome = executor
            .execute_all(&[source("slow", 2.0), source("fast", 1.0)], now())
            .await;

        assert_eq!(outcome.sources[0].hits, 0);
        assert_eq!(outcome.sources[1].hits, 1);
        assert_eq!(outcome.hits[0].source_name, "fast");
    }

    #[tokio::test]
    async fn items_without_links_are_dropped() {
        let searcher = MockWebSearcher::new().with_items(
            "alpha after:2024-06-08",
            vec![SearchItem::new("No link", "  ")],
        );
        let executor = SearchExecutor::new(&searcher, 7, Duration::ZERO, TIMEOUT);

        assert!(executor.execute(&source("alpha", 1.0), now()).await.is_empty());
    }
}
