//! Web search port.
//!
//! Infrastructure implements [`SearchProvider`] against a concrete search API;
//! the `webSearch` tool only sees this trait.

use std::future::Future;

use buddy_types::search::{SearchError, SearchQuery, SearchResults};

/// Trait for web search backends.
///
/// Uses RPITIT, so it is not object-safe. Tools are generic over the provider
/// and type-erased at the tool boundary instead.
pub trait SearchProvider: Send + Sync {
    /// Human-readable provider name (e.g., "tavily").
    fn name(&self) -> &str;

    /// Run a single query and return its hits, best match first.
    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<SearchResults, SearchError>> + Send;
}
