//! The `webSearch` tool.

use std::future::Future;

use serde::Deserialize;
use tracing::info;

use buddy_types::llm::ToolDefinition;
use buddy_types::search::SearchQuery;
use buddy_types::tool::ToolError;

use super::Tool;
use crate::search::SearchProvider;

/// Name the model uses to call the search tool.
pub const WEB_SEARCH_TOOL: &str = "webSearch";

/// Tool result when the search returns no hits.
pub const NO_RESULTS: &str = "No results found.";

/// Validated argument record for `webSearch`.
#[derive(Debug, Deserialize)]
struct WebSearchArgs {
    query: String,
}

/// Searches the web through a [`SearchProvider`] and returns the joined page
/// content of every hit.
pub struct WebSearchTool<S> {
    provider: S,
    max_results: u32,
    topic: String,
}

impl<S: SearchProvider> WebSearchTool<S> {
    pub fn new(provider: S) -> Self {
        Self {
            provider,
            max_results: 5,
            topic: "general".to_string(),
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// `raw` here is the re-serialized value; the registry swaps in the
    /// model's original text.
    fn parse_args(args: serde_json::Value) -> Result<WebSearchArgs, ToolError> {
        let raw = args.to_string();
        let parsed: WebSearchArgs =
            serde_json::from_value(args).map_err(|e| ToolError::MalformedArguments {
                tool: WEB_SEARCH_TOOL.to_string(),
                raw: raw.clone(),
                reason: e.to_string(),
            })?;

        if parsed.query.trim().is_empty() {
            return Err(ToolError::MalformedArguments {
                tool: WEB_SEARCH_TOOL.to_string(),
                raw,
                reason: "query must not be empty".to_string(),
            });
        }
        Ok(parsed)
    }
}

impl<S: SearchProvider> Tool for WebSearchTool<S> {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: WEB_SEARCH_TOOL.to_string(),
            description: "Search latest realtime internet data".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query to perform search on.",
                    }
                },
                "required": ["query"],
            }),
        }
    }

    fn call(
        &self,
        args: serde_json::Value,
    ) -> impl Future<Output = Result<String, ToolError>> + Send {
        async move {
            let args = Self::parse_args(args)?;
            let query = SearchQuery {
                query: args.query,
                max_results: self.max_results,
                topic: self.topic.clone(),
            };

            info!(provider = self.provider.name(), query = %query.query, "Searching the web");

            let results =
                self.provider
                    .search(&query)
                    .await
                    .map_err(|e| ToolError::ExecutionFailed {
                        tool: WEB_SEARCH_TOOL.to_string(),
                        message: e.to_string(),
                    })?;

            if results.hits.is_empty() {
                return Ok(NO_RESULTS.to_string());
            }
            Ok(results.joined_content())
        }
    }
}
