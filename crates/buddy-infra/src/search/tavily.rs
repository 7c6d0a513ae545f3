//! TavilySearch -- [`SearchProvider`] implementation for the Tavily search API.
//!
//! Sends `POST {base_url}/search` with bearer authentication and maps the
//! `results` array into [`SearchHit`]s.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use buddy_core::search::SearchProvider;
use buddy_observe::genai_attrs::PROVIDER_TAVILY;
use buddy_types::config::SearchConfig;
use buddy_types::search::{SearchError, SearchHit, SearchQuery, SearchResults};

/// Request body for `POST /search`.
#[derive(Debug, Clone, Serialize)]
pub struct TavilyRequest<'a> {
    pub query: &'a str,
    pub max_results: u32,
    pub topic: &'a str,
    pub search_depth: &'a str,
}

/// Response body of `POST /search`.
#[derive(Debug, Clone, Deserialize)]
pub struct TavilyResponse {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
struct TavilyErrorBody {
    detail: TavilyErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
struct TavilyErrorDetail {
    error: String,
}

/// Tavily web search client.
///
/// Does NOT derive Debug; the API key is a [`SecretString`].
pub struct TavilySearch {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl TavilySearch {
    pub fn new(
        api_key: SecretString,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Request(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build a client from the `[search]` configuration section.
    pub fn from_config(config: &SearchConfig, api_key: SecretString) -> Result<Self, SearchError> {
        Self::new(
            api_key,
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

impl SearchProvider for TavilySearch {
    fn name(&self) -> &str {
        PROVIDER_TAVILY
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, SearchError> {
        let body = TavilyRequest {
            query: &query.query,
            max_results: query.max_results,
            topic: &query.topic,
            search_depth: "basic",
        };

        let response = self
            .client
            .post(self.search_url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout(e.to_string())
                } else {
                    SearchError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(map_status_error(status.as_u16(), &error_body));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Deserialization(e.to_string()))?;

        debug!(query = %query.query, hits = parsed.results.len(), "Search complete");

        Ok(into_results(&query.query, parsed))
    }
}

/// Convert the wire response into [`SearchResults`], keeping Tavily's ranking.
pub fn into_results(query: &str, response: TavilyResponse) -> SearchResults {
    let query = if response.query.is_empty() {
        query.to_string()
    } else {
        response.query
    };
    SearchResults {
        query,
        hits: response.results,
    }
}

/// Map a non-2xx status and its body to a [`SearchError`].
pub fn map_status_error(status: u16, body: &str) -> SearchError {
    match status {
        401 | 403 => SearchError::AuthenticationFailed,
        429 => SearchError::RateLimited,
        _ => {
            let message = serde_json::from_str::<TavilyErrorBody>(body)
                .map(|b| b.detail.error)
                .unwrap_or_else(|_| body.to_string());
            SearchError::Api { status, message }
        }
    }
}
