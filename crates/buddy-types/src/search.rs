//! Web search request/response types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A search request sent to the search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub max_results: u32,
    pub topic: String,
}

/// A single search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Extracted text content of the page.
    pub content: String,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Ordered results for one query, best match first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

impl SearchResults {
    /// Concatenate the content of every hit, separated by a blank line.
    pub fn joined_content(&self) -> String {
        self.hits
            .iter()
            .map(|hit| hit.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Errors from the search provider.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(String),

    #[error("search API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("search authentication failed")]
    AuthenticationFailed,

    #[error("search rate limited")]
    RateLimited,

    #[error("failed to parse search response: {0}")]
    Deserialization(String),

    #[error("search request timed out: {0}")]
    Timeout(String),
}
