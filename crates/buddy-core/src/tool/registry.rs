//! Tool registry and dispatch.
//!
//! The registry is the single source of truth for what the model may call:
//! [`ToolRegistry::manifest`] is generated from the registered tools, and
//! [`ToolRegistry::execute`] only dispatches to those same tools.

use tracing::{Instrument, debug, error, info_span};

use buddy_observe::genai_attrs::OP_EXECUTE_TOOL;
use buddy_types::llm::ToolDefinition;
use buddy_types::tool::ToolError;

use super::Tool;
use super::box_tool::BoxTool;

/// Ordered collection of tools, looked up by name.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<BoxTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name replaces the earlier one.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> &mut Self {
        let tool = BoxTool::new(tool);
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.register(tool);
        self
    }

    /// Tool definitions to advertise to the model, in registration order.
    pub fn manifest(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition().clone()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(BoxTool::name).collect()
    }

    pub fn get(&self, name: &str) -> Option<&BoxTool> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Parse `raw` arguments and run the named tool.
    ///
    /// Fails with [`ToolError::MalformedArguments`] when `raw` is not JSON or
    /// the tool rejects it (either way `raw` is carried verbatim), and
    /// [`ToolError::UnknownTool`] when `name` was never registered.
    pub async fn execute(&self, name: &str, raw: &str) -> Result<String, ToolError> {
        let args: serde_json::Value = match serde_json::from_str(raw.trim()) {
            Ok(args) => args,
            Err(e) => {
                error!(tool = %name, raw = %raw, error = %e, "Malformed tool arguments");
                return Err(ToolError::MalformedArguments {
                    tool: name.to_string(),
                    raw: raw.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let Some(tool) = self.get(name) else {
            error!(tool = %name, registered = ?self.names(), "Model requested an unknown tool");
            return Err(ToolError::UnknownTool(name.to_string()));
        };

        let span = info_span!(
            "gen_ai.execute_tool",
            gen_ai.operation.name = OP_EXECUTE_TOOL,
            gen_ai.tool.name = %name,
        );

        async {
            debug!(args = %args, "Dispatching tool call");
            // Tools only see the parsed value; report the model's own text.
            let result = tool.call(args).await.map_err(|e| match e {
                ToolError::MalformedArguments { tool, reason, .. } => {
                    ToolError::MalformedArguments {
                        tool,
                        raw: raw.to_string(),
                        reason,
                    }
                }
                other => other,
            });
            match &result {
                Ok(output) => debug!(output_len = output.len(), "Tool call finished"),
                Err(e) => error!(error = %e, "Tool call failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}
