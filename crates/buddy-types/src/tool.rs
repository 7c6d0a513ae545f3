//! Tool execution errors.

use thiserror::Error;

/// Errors raised while dispatching a tool call requested by the model.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The model produced arguments that are not valid JSON, or valid JSON
    /// that does not match the tool's argument record.
    #[error("malformed arguments for tool '{tool}': {reason} (raw: {raw})")]
    MalformedArguments {
        tool: String,
        raw: String,
        reason: String,
    },

    /// The model asked for a tool that is not in the registry.
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    /// The tool ran but its backing service failed.
    #[error("tool '{tool}' failed: {message}")]
    ExecutionFailed { tool: String, message: String },
}

impl ToolError {
    /// Name of the tool involved in the failure.
    pub fn tool_name(&self) -> &str {
        match self {
            ToolError::MalformedArguments { tool, .. } | ToolError::ExecutionFailed { tool, .. } => {
                tool.as_str()
            }
            ToolError::UnknownTool(name) => name.as_str(),
        }
    }
}
