//! BoxTool -- object-safe dynamic dispatch wrapper for Tool.

use std::future::Future;
use std::pin::Pin;

use buddy_types::llm::ToolDefinition;
use buddy_types::tool::ToolError;

use super::Tool;

/// Object-safe version of [`Tool`] with boxed futures.
pub trait ToolDyn: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    fn call_boxed(
        &self,
        args: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + '_>>;
}

impl<T: Tool> ToolDyn for T {
    fn definition(&self) -> ToolDefinition {
        Tool::definition(self)
    }

    fn call_boxed(
        &self,
        args: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + '_>> {
        Box::pin(self.call(args))
    }
}

/// Type-erased tool. The definition is captured once at construction.
pub struct BoxTool {
    definition: ToolDefinition,
    inner: Box<dyn ToolDyn>,
}

impl BoxTool {
    /// Wrap a concrete `Tool` in a type-erased box.
    pub fn new<T: Tool + 'static>(tool: T) -> Self {
        let definition = Tool::definition(&tool);
        Self {
            definition,
            inner: Box::new(tool),
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// Execute the wrapped tool.
    pub async fn call(&self, args: serde_json::Value) -> Result<String, ToolError> {
        self.inner.call_boxed(args).await
    }
}

impl std::fmt::Debug for BoxTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxTool")
            .field("name", &self.definition.name)
            .finish()
    }
}
