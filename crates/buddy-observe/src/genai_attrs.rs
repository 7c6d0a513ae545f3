//! OpenTelemetry GenAI Semantic Convention attribute names and values.
//!
//! `tracing` macros need field names as literal tokens, so spans spell the
//! names out inline (`gen_ai.request.model = ...`). The constants here are
//! used where a name is passed at runtime, such as `Span::record`, and as the
//! well-known attribute values.

// --- Attribute names recorded after a span opens ---

/// The number of input tokens consumed.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// The number of output tokens generated.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// The finish reason of the response (e.g., "end_turn", "tool_use").
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

// --- Operation name values ---

/// Standard chat completion operation.
pub const OP_CHAT: &str = "chat";

/// One full user turn through the tool-calling loop.
pub const OP_INVOKE_AGENT: &str = "invoke_agent";

/// A single tool execution requested by the model.
pub const OP_EXECUTE_TOOL: &str = "execute_tool";

// --- Provider name values ---

/// Groq (OpenAI-compatible chat completions).
pub const PROVIDER_GROQ: &str = "groq";

/// Tavily web search.
pub const PROVIDER_TAVILY: &str = "tavily";
