//! AI analysis seam.
//!
//! The analyzer receives one hit at a time and answers with a structured entity.
//! `Ok(None)` means the service answered without anything usable; `Err` means
//! the call itself failed and the hit is excluded from the run.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisResult;
use crate::search::RawHit;

/// What the analyzer is shown for one hit.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub title: String,
    pub link: String,
    pub source_name: String,
    pub source_date: Option<String>,
    pub snippet: String,
}

impl AnalysisRequest {
    pub fn from_hit(hit: &RawHit) -> Self {
        Self {
            title: hit.title.clone(),
            link: hit.link.clone(),
            source_name: hit.source_name.clone(),
            source_date: hit
                .published_at
                .map(|d| d.format("%Y-%m-%d").to_string())
                .or_else(|| hit.published_raw.clone()),
            snippet: hit.snippet.clone(),
        }
    }
}

/// Structured entity returned by the analysis service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResponse {
    /// Name of the company or product that raised money
    #[serde(rename = "projectName", default)]
    pub project_name: Option<String>,

    /// Two to four sentences on what the company does and what it raised
    #[serde(rename = "projectDescription", default)]
    pub project_description: Option<String>,

    /// The company's own website, never the news site
    #[serde(rename = "officialWebsite", default)]
    pub official_website: Option<String>,

    /// What the product does for its users
    #[serde(rename = "productDescription", default)]
    pub product_description: Option<String>,

    /// Legal or commonly used company name
    #[serde(rename = "companyName", default)]
    pub company_name: Option<String>,

    /// How certain the extraction is, 0.0 to 1.0
    #[serde(default)]
    pub confidence_score: Option<f64>,

    /// Free-form notes from the analysis
    #[serde(default)]
    pub analysis_metadata: Option<serde_json::Value>,
}

impl AnalysisResponse {
    /// The trimmed project name, if there is one.
    pub fn usable_name(&self) -> Option<&str> {
        non_empty(self.project_name.as_deref())
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Entity analysis service.
#[async_trait]
pub trait EntityAnalyzer: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult<Option<AnalysisResponse>>;
}

pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You analyze startup funding news.

Given one search result (title, source, date and snippet), identify the company that raised money and describe it.

## Rules

- projectName is the company or product that raised, not the investor and not the publication
- officialWebsite must be the company's own site; leave it null if the snippet does not reveal it
- Never invent funding amounts, investors or dates
- confidence_score reflects how sure you are that this result announces a real funding event
- Respond with a single JSON object and nothing else"#;

/// Build the user prompt for one hit.
pub fn format_analysis_prompt(request: &AnalysisRequest) -> String {
    format!(
        "Title: {}\nSource: {}\nURL: {}\nDate: {}\n\nSnippet:\n{}",
        request.title,
        request.source_name,
        request.link,
        request.source_date.as_deref().unwrap_or("unknown"),
        request.snippet,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_uses_service_field_names() {
        let json = r#"{
            "projectName": "  Acme  ",
            "projectDescription": "Acme builds invoicing software.",
            "officialWebsite": "https://acme.io",
            "companyName": "Acme Inc.",
            "confidence_score": 0.82,
            "analysis_metadata": {"model_notes": "clear announcement"},
            "unexpected": true
        }"#;

        let response: AnalysisResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.usable_name(), Some("Acme"));
        assert_eq!(response.confidence_score, Some(0.82));
        assert!(response.product_description.is_none());
        assert!(response.analysis_metadata.is_some());
    }

    #[test]
    fn blank_name_is_not_usable() {
        let response = AnalysisResponse {
            project_name: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(response.usable_name(), None);
    }

    #[test]
    fn prompt_contains_every_input() {
        let hit = RawHit::new(
            "Acme raises $5M",
            "https://techcrunch.com/acme",
            "Acme raised a seed round",
            1.6,
            "TechCrunch",
        );
        let prompt = format_analysis_prompt(&AnalysisRequest::from_hit(&hit));
        assert!(prompt.contains("Acme raises $5M"));
        assert!(prompt.contains("TechCrunch"));
        assert!(prompt.contains("Date: unknown"));
        assert!(prompt.contains("Acme raised a seed round"));
    }
}
