//! System prompt builder for Buddy.
//!
//! The seed System message of every new thread: persona, when to answer
//! directly versus search, a few worked examples, the current UTC time, and
//! the tool-calling rules some open models need spelled out to avoid emitting
//! tool calls as inline markup.

use chrono::{DateTime, Utc};

use buddy_types::llm::ToolDefinition;

/// Opening line used when no persona is configured.
pub const DEFAULT_PERSONA: &str = "You are a smart personal assistant.";

const GUIDANCE: &str = "\
- If you know the answer to a question, answer it directly in plain English.
- If the answer requires real-time, local, or up-to-date information, or if you don't know the answer, use the available tools to find it.
- Decide when to use your own knowledge and when to use a tool.
- Do not mention the tools unless needed.";

const EXAMPLES: &str = "\
Q: What is the capital of France?
A: The capital of France is Paris.

Q: What's the weather in Mumbai right now?
A: (use the search tool to find the latest weather)

Q: Tell me the latest IT news.
A: (use the search tool to get the latest news)";

const TOOL_RULES: &str = "\
TOOL CALLING RULES:
- Use ONLY standard OpenAI-compatible tool calling.
- NEVER write <function>...</function>.
- NEVER write XML or HTML.
- NEVER write code examples.
- When calling a tool, arguments must ALWAYS be valid JSON like:
  {\"query\": \"something\"}
- The arguments field MUST be pure JSON only.
- Do NOT wrap arguments in parentheses.
- Do NOT add text before or after JSON.";

/// Renders the seed System message for a new thread.
#[derive(Debug, Clone)]
pub struct SystemPromptBuilder {
    persona: String,
}

impl SystemPromptBuilder {
    /// Blank personas fall back to [`DEFAULT_PERSONA`].
    pub fn new(persona: Option<&str>) -> Self {
        let persona = persona
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PERSONA)
            .to_string();
        Self { persona }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// Build the prompt as of `now`, listing the advertised `tools`.
    pub fn build(&self, tools: &[ToolDefinition], now: DateTime<Utc>) -> String {
        let mut sections = Vec::with_capacity(5);

        sections.push(format!("{}\n\n{GUIDANCE}", self.persona));

        if !tools.is_empty() {
            let listed = tools
                .iter()
                .map(|t| format!("- {}: {}", t.name, t.description))
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("You have access to the following tools:\n{listed}"));
        }

        sections.push(format!("Example:\n\n{EXAMPLES}"));
        sections.push(format!(
            "Current datetime: {}",
            now.format("%a, %d %b %Y %H:%M:%S GMT")
        ));
        sections.push(TOOL_RULES.to_string());

        sections.join("\n\n")
    }

    /// Build the prompt using the current time.
    pub fn build_now(&self, tools: &[ToolDefinition]) -> String {
        self.build(tools, Utc::now())
    }
}

impl Default for SystemPromptBuilder {
    fn default() -> Self {
        Self::new(None)
    }
}
