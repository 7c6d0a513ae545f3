//! Tools the model can call during a turn.
//!
//! A [`Tool`] advertises a [`ToolDefinition`] and executes already-parsed JSON
//! arguments. [`registry::ToolRegistry`] owns the tools, generates the manifest
//! sent to the model, and turns raw argument text into a typed call.

pub mod box_tool;
pub mod registry;
pub mod web_search;

use std::future::Future;

use buddy_types::llm::ToolDefinition;
use buddy_types::tool::ToolError;

/// Trait for a callable tool.
///
/// Uses RPITIT, so it is not object-safe; see [`box_tool::BoxTool`] for the
/// type-erased wrapper the registry stores.
pub trait Tool: Send + Sync {
    /// Name, description and JSON schema advertised to the model.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with parsed arguments and return its textual result.
    fn call(
        &self,
        args: serde_json::Value,
    ) -> impl Future<Output = Result<String, ToolError>> + Send;
}
