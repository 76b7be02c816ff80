//! Freshness scoring and validity filtering of candidates.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use crate::extract::CandidateEntity;

/// Age at which freshness reaches zero.
pub const FRESHNESS_HORIZON_DAYS: f64 = 30.0;

/// Minimum combined length of description and company info.
pub const MIN_DETAIL_CHARS: usize = 100;

pub const MIN_NAME_CHARS: usize = 2;

const STOPWORD_NAMES: &[&str] = &["the", "a", "an", "this", "that", "these", "those"];

const NEWS_KEYWORDS: &[&str] = &["news", "roundup", "weekly", "daily", "update", "report", "summary"];

/// Why a candidate was filtered out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("missing source url")]
    MissingSourceUrl,

    #[error("no industry tags")]
    NoIndustryTags,

    #[error("description and company info too short ({0} chars)")]
    TooLittleDetail(usize),

    #[error("name is a stopword")]
    StopwordName,

    #[error("name too short")]
    NameTooShort,

    #[error("name looks like a news item (contains \"{0}\")")]
    NewsLikeName(&'static str),

    #[error("name has no letters")]
    NoAlphabeticName,
}

/// `1.0` for today, decaying linearly to `0.0` at 30 days. Unknown dates score
/// zero and future dates score one.
pub fn freshness_score(published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(published_at) = published_at else {
        return 0.0;
    };
    let days = (now - published_at).num_seconds() as f64 / 86_400.0;
    (1.0 - days / FRESHNESS_HORIZON_DAYS).clamp(0.0, 1.0)
}

/// Trimmed, lowercased, internal whitespace collapsed.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Check every rule; the first failing rule is reported.
pub fn validate(candidate: &CandidateEntity) -> Result<(), Rejection> {
    if candidate.source_url.trim().is_empty() {
        return Err(Rejection::MissingSourceUrl);
    }
    if candidate.industry_tags.is_empty() {
        return Err(Rejection::NoIndustryTags);
    }

    let detail = candidate.description.chars().count() + candidate.company_info.chars().count();
    if detail < MIN_DETAIL_CHARS {
        return Err(Rejection::TooLittleDetail(detail));
    }

    let name = normalize_name(&candidate.project_name);
    if STOPWORD_NAMES.contains(&name.as_str()) {
        return Err(Rejection::StopwordName);
    }
    if name.chars().count() < MIN_NAME_CHARS {
        return Err(Rejection::NameTooShort);
    }
    if let Some(keyword) = NEWS_KEYWORDS.iter().find(|k| name.contains(*k)) {
        return Err(Rejection::NewsLikeName(*keyword));
    }
    if !name.chars().any(char::is_alphabetic) {
        return Err(Rejection::NoAlphabeticName);
    }

    Ok(())
}

/// Set each candidate's freshness from its source date.
pub fn apply_freshness(candidates: &mut [CandidateEntity], now: DateTime<Utc>) {
    for candidate in candidates {
        candidate.freshness_score = freshness_score(candidate.source_date, now);
    }
}

/// Split candidates into valid ones and the number rejected.
pub fn filter_valid(candidates: Vec<CandidateEntity>) -> (Vec<CandidateEntity>, usize) {
    let total = candidates.len();
    let valid: Vec<CandidateEntity> = candidates
        .into_iter()
        .filter(|candidate| match validate(candidate) {
            Ok(()) => true,
            Err(reason) => {
                warn!(
                    name = %candidate.project_name,
                    link = %candidate.source_url,
                    reason = %reason,
                    "Rejected candidate"
                );
                false
            }
        })
        .collect();
    let rejected = total - valid.len();
    (valid, rejected)
}
