//! Serper-backed keyword search (Google results as JSON).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{SearchItem, WebSearcher};
use crate::error::{ConfigError, SearchError, SearchResult};
use crate::security::SecretString;

const DEFAULT_BASE_URL: &str = "https://google.serper.dev";

/// Serper API client.
pub struct SerperSearcher {
    api_key: SecretString,
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchItem>,
}

impl SerperSearcher {
    /// Create a client whose every request is bounded by `timeout`.
    pub fn new(api_key: SecretString, timeout: Duration) -> Result<Self, ConfigError> {
        if api_key.is_empty() {
            return Err(ConfigError::Missing("SERPER_API_KEY"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            api_key,
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Set a custom base URL (proxies, local stubs).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Decode a Serper response body, keeping only items that have a link.
pub fn parse_serper_response(body: &str) -> SearchResult<Vec<SearchItem>> {
    let response: SerperResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Parse(e.to_string()))?;

    Ok(response
        .organic
        .into_iter()
        .filter(|item| !item.link.trim().is_empty())
        .collect())
}

#[async_trait]
impl WebSearcher for SerperSearcher {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        headers: &[(String, String)],
    ) -> SearchResult<Vec<SearchItem>> {
        let mut request = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", self.api_key.expose())
            .header("Content-Type", "application/json")
            .json(&SerperRequest {
                q: query,
                num: max_results,
            });

        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(SearchError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(SearchError::Network)?;
        let items = parse_serper_response(&body)?;

        debug!(query, items = items.len(), "Serper search complete");

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_organic_results_with_passthrough_fields() {
        let body = r#"{
            "searchParameters": {"q": "acme"},
            "organic": [
                {
                    "title": "Acme raises $5M seed round",
                    "link": "https://techcrunch.com/acme",
                    "snippet": "Acme, based in Austin...",
                    "date": "2 days ago",
                    "position": 1
                },
                {"title": "No link here", "snippet": "dropped"}
            ]
        }"#;

        let items = parse_serper_response(body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Acme raises $5M seed round");
        assert_eq!(items[0].date.as_deref(), Some("2 days ago"));
        assert_eq!(items[0].extra.get("position"), Some(&serde_json::json!(1)));
    }

    #[test]
    fn missing_organic_is_empty() {
        assert!(parse_serper_response("{}").unwrap().is_empty());
    }

    #[test]
    fn invalid_body_is_parse_error() {
        assert!(matches!(
            parse_serper_response("<html>"),
            Err(SearchError::Parse(_))
        ));
    }

    #[test]
    fn empty_key_is_rejected() {
        let result = SerperSearcher::new(SecretString::new(""), Duration::from_secs(1));
        assert!(matches!(result, Err(ConfigError::Missing("SERPER_API_KEY"))));
    }
}
