//! Merge of the pattern pass and the AI pass into one candidate.
//!
//! Precedence: AI fields win when present; pattern fields and the raw hit fill
//! the gaps.

use super::analysis::{non_empty, AnalysisResponse};
use super::patterns::{host_of, name_from_title_segment, same_site, PatternExtraction};
use super::{AnalysisMetadata, CandidateEntity, NameSource};
use crate::search::RawHit;

/// Confidence when the service returned a usable entity but no score.
pub const DEFAULT_AI_CONFIDENCE: f64 = 0.7;

/// Ceiling for candidates whose name did not come from the AI pass.
pub const PATTERN_ONLY_CONFIDENCE_CAP: f64 = 0.3;

/// Confidence when the AI pass produced nothing at all.
pub const ABSENT_AI_CONFIDENCE: f64 = 0.0;

/// Combine a hit, its pattern extraction and the optional AI response.
///
/// Scores other than confidence are left at zero for the scorer.
pub fn merge_entity(
    hit: &RawHit,
    patterns: PatternExtraction,
    analysis: Option<&AnalysisResponse>,
) -> CandidateEntity {
    let ai_name = analysis.and_then(|a| a.usable_name());

    let (project_name, name_source) = match (ai_name, patterns.project_name.as_deref()) {
        (Some(name), _) => (name.to_string(), NameSource::Ai),
        (None, Some(name)) => (name.to_string(), NameSource::Pattern),
        (None, None) => (name_from_title_segment(&hit.title), NameSource::Title),
    };

    let description = analysis
        .and_then(|a| {
            non_empty(a.project_description.as_deref())
                .or_else(|| non_empty(a.product_description.as_deref()))
        })
        .unwrap_or(hit.snippet.as_str())
        .to_string();

    let company_info = analysis
        .map(|a| company_info_from(a, &description))
        .filter(|info| !info.is_empty())
        .unwrap_or_else(|| hit.title.clone());

    let official_website = analysis
        .and_then(|a| non_empty(a.official_website.as_deref()))
        .filter(|site| !is_source_domain(site, &hit.link))
        .map(str::to_string)
        .or(patterns.website);

    CandidateEntity {
        project_name,
        description,
        company_info,
        official_website,
        funding_amount: patterns.funding_amount,
        funding_round: patterns.funding_round,
        funding_date: patterns.funding_date,
        investors: patterns.investors,
        location: patterns.location,
        industry_tags: patterns.industry_tags,
        source_url: hit.link.clone(),
        source_name: hit.source_name.clone(),
        source_title: hit.title.clone(),
        source_date: hit.published_at,
        source_weight: hit.weight,
        confidence_score: confidence_for(analysis),
        freshness_score: 0.0,
        analysis_metadata: AnalysisMetadata {
            processing_time_ms: 0,
            name_source,
            processing_steps: Vec::new(),
            ai_metadata: analysis.and_then(|a| a.analysis_metadata.clone()),
        },
        extra: hit.extra.clone(),
    }
}

/// Confidence derived from the AI pass.
pub fn confidence_for(analysis: Option<&AnalysisResponse>) -> f64 {
    let Some(analysis) = analysis else {
        return ABSENT_AI_CONFIDENCE;
    };

    let reported = analysis.confidence_score.map(|s| s.clamp(0.0, 1.0));
    if analysis.usable_name().is_some() {
        reported.unwrap_or(DEFAULT_AI_CONFIDENCE)
    } else {
        reported
            .unwrap_or(ABSENT_AI_CONFIDENCE)
            .min(PATTERN_ONLY_CONFIDENCE_CAP)
    }
}

fn company_info_from(analysis: &AnalysisResponse, description: &str) -> String {
    let mut parts = Vec::new();
    if let Some(company) = non_empty(analysis.company_name.as_deref()) {
        parts.push(company);
    }
    if let Some(product) = non_empty(analysis.product_description.as_deref()) {
        if product != description {
            parts.push(product);
        }
    }
    parts.join(" - ")
}

fn is_source_domain(site: &str, source_url: &str) -> bool {
    match (host_of(site), host_of(source_url)) {
        (Some(site), Some(source)) => same_site(&site, &source),
        _ => false,
    }
}
