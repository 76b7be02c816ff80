//! Source registry: weighted search sources as data.
//!
//! Every source is a query template plus a trust weight. Templates carry an
//! `{after}` placeholder which is rendered as the lower bound of the date window,
//! so each run only asks for recent content.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use typed_builder::TypedBuilder;

/// Placeholder replaced with the window's lower-bound date (`YYYY-MM-DD`).
pub const AFTER_PLACEHOLDER: &str = "{after}";

/// A weighted search origin.
#[derive(Debug, Clone, PartialEq, TypedBuilder)]
pub struct SearchSource {
    #[builder(setter(into))]
    pub name: String,

    #[builder(setter(into))]
    pub query_template: String,

    /// Relative trust; higher wins dedup ties.
    pub weight: f64,

    /// Extra HTTP headers sent with this source's search request.
    #[builder(default)]
    pub headers: Vec<(String, String)>,

    #[builder(default = 10)]
    pub max_results: usize,
}

impl SearchSource {
    /// Render the query for a run starting at `now`.
    pub fn build_query(&self, now: DateTime<Utc>, window_days: i64) -> String {
        let after = lower_bound_date(now, window_days).format("%Y-%m-%d").to_string();
        self.query_template.replace(AFTER_PLACEHOLDER, &after)
    }
}

/// "today minus D days"; negative windows are treated as zero.
pub fn lower_bound_date(now: DateTime<Utc>, window_days: i64) -> NaiveDate {
    (now - Duration::days(window_days.max(0))).date_naive()
}

/// The built-in registry.
pub fn default_sources() -> Vec<SearchSource> {
    vec![
        SearchSource::builder()
            .name("TechCrunch")
            .query_template("site:techcrunch.com startup raises funding round after:{after}")
            .weight(1.6)
            .build(),
        SearchSource::builder()
            .name("Crunchbase News")
            .query_template(
                "site:news.crunchbase.com raises seed OR \"series a\" OR \"series b\" after:{after}",
            )
            .weight(1.5)
            .build(),
        SearchSource::builder()
            .name("VentureBeat")
            .query_template("site:venturebeat.com startup raises million funding after:{after}")
            .weight(1.3)
            .build(),
        SearchSource::builder()
            .name("PR Newswire")
            .query_template(
                "site:prnewswire.com announces funding round \"led by\" after:{after}",
            )
            .weight(1.2)
            .build(),
        SearchSource::builder()
            .name("Business Wire")
            .query_template("site:businesswire.com secures funding \"led by\" after:{after}")
            .weight(1.2)
            .build(),
        SearchSource::builder()
            .name("EU-Startups")
            .query_template("site:eu-startups.com raises funding after:{after}")
            .weight(1.1)
            .build(),
        SearchSource::builder()
            .name("Open Web")
            .query_template(
                "startup \"raises\" \"seed round\" OR \"series a\" funding after:{after}",
            )
            .weight(1.0)
            .max_results(20)
            .build(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn query_embeds_lower_bound_date() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let source = SearchSource::builder()
            .name("test")
            .query_template("raises seed after:{after}")
            .weight(1.0)
            .build();

        assert_eq!(source.build_query(now, 7), "raises seed after:2024-03-03");
    }

    #[test]
    fn window_crosses_month_boundary() {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 0, 30, 0).unwrap();
        assert_eq!(
            lower_bound_date(now, 7),
            NaiveDate::from_ymd_opt(2024, 2, 24).unwrap()
        );
        assert_eq!(lower_bound_date(now, -3), now.date_naive());
    }

    #[test]
    fn registry_sources_are_distinct_and_weighted() {
        let sources = default_sources();
        assert!(!sources.is_empty());
        let mut names: Vec<_> = sources.iter().map(|s| s.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), sources.len());
        assert!(sources.iter().all(|s| s.weight > 0.0));
        assert!(sources.iter().all(|s| s.query_template.contains(AFTER_PLACEHOLDER)));
    }
}
