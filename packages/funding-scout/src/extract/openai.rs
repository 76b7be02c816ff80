//! OpenAI chat-completions analyzer.

use async_trait::async_trait;
use schemars::schema_for;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::analysis::{
    format_analysis_prompt, AnalysisRequest, AnalysisResponse, EntityAnalyzer,
    ANALYSIS_SYSTEM_PROMPT,
};
use crate::error::{AnalysisError, AnalysisResult, ConfigError};
use crate::security::SecretString;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Analyzer backed by the OpenAI chat-completions endpoint in JSON mode.
pub struct OpenAIAnalyzer {
    http_client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    system_prompt: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponseRaw {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAIAnalyzer {
    /// Create an analyzer whose every request is bounded by `timeout`.
    pub fn new(
        api_key: SecretString,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        if api_key.is_empty() {
            return Err(ConfigError::Missing("OPENAI_API_KEY"));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http_client,
            api_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            system_prompt: system_prompt_with_schema(),
        })
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn system_prompt_with_schema() -> String {
    let schema = serde_json::to_string_pretty(&schema_for!(AnalysisResponse)).unwrap_or_default();
    format!("{ANALYSIS_SYSTEM_PROMPT}\n\n## Output schema\n\n{schema}")
}

/// Decode the model's message content.
///
/// Empty content means the model had nothing to say; anything else must be the
/// expected JSON object, optionally wrapped in a markdown code fence.
pub fn parse_analysis_content(content: &str) -> AnalysisResult<Option<AnalysisResponse>> {
    let body = strip_code_fence(content);
    if body.is_empty() || body == "null" {
        return Ok(None);
    }

    serde_json::from_str(body)
        .map(Some)
        .map_err(|e| AnalysisError::Parse(format!("invalid analysis JSON: {e}")))
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[async_trait]
impl EntityAnalyzer for OpenAIAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult<Option<AnalysisResponse>> {
        let start = Instant::now();
        let user_prompt = format_analysis_prompt(request);

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(link = %request.link, error = %e, "OpenAI request failed");
                AnalysisError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenAI API error");
            return Err(AnalysisError::Api(format!("{status}: {error_text}")));
        }

        let raw: ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| AnalysisError::Parse(e.to_string()))?;

        debug!(
            model = %self.model,
            link = %request.link,
            duration_ms = start.elapsed().as_millis() as u64,
            "OpenAI analysis completed"
        );

        let content = raw
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        parse_analysis_content(&content)
    }
}
